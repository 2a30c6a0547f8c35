//! Order Service
//!
//! Validates and creates orders, exposes queries, and enforces the
//! cancellation rules. Settlement is handed off to the engine at placement;
//! the creation event is emitted synchronously once the order is durable.

use crate::error::{Result, TradeError, ValidationError};
use crate::services::{EventBus, SettlementEngine, SqliteStore};
use crate::types::{
    Order, OrderEvent, OrderFilter, OrderKind, OrderPage, OrderStatus, PlaceOrderRequest,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Order lifecycle façade.
#[derive(Clone)]
pub struct OrderService {
    store: Arc<SqliteStore>,
    events: EventBus,
    settlement: SettlementEngine,
}

impl OrderService {
    pub fn new(store: Arc<SqliteStore>, events: EventBus, settlement: SettlementEngine) -> Self {
        Self {
            store,
            events,
            settlement,
        }
    }

    /// Validate and place a new order.
    ///
    /// The order is persisted pending, the creation event emitted, and the
    /// settlement attempt scheduled before this returns.
    pub fn place_order(&self, user_id: &str, request: PlaceOrderRequest) -> Result<Order> {
        validate_request(&request)?;

        let now = chrono::Utc::now().timestamp_millis();
        let order = Order {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            symbol: request.symbol.trim().to_uppercase(),
            kind: request.kind,
            quantity: request.quantity,
            price: request.price,
            limit_price: applicable(request.kind == OrderKind::Limit, request.limit_price),
            stop_price: applicable(request.kind == OrderKind::StopLoss, request.stop_price),
            trailing_amount: applicable(
                request.kind == OrderKind::TrailingStop,
                request.trailing_amount,
            ),
            trailing_percent: applicable(
                request.kind == OrderKind::TrailingStop,
                request.trailing_percent,
            ),
            status: OrderStatus::Pending,
            executed_price: None,
            created_at: now,
            updated_at: now,
        };

        self.store.create_order(&order)?;
        self.events.publish(OrderEvent::created(&order));
        self.settlement.schedule(&order);

        info!(
            "Placed order {}: {} {} x{}",
            order.id, order.kind, order.symbol, order.quantity
        );
        Ok(order)
    }

    /// Get one of the user's orders.
    pub fn get_order(&self, user_id: &str, order_id: &str) -> Result<Order> {
        self.store
            .get_user_order(user_id, order_id)
            .ok_or_else(|| TradeError::OrderNotFound(order_id.to_string()))
    }

    /// List the user's orders matching the filter, newest first by default.
    pub fn list_orders(&self, user_id: &str, filter: &OrderFilter) -> Result<OrderPage> {
        let (orders, total) = self.store.list_orders(user_id, filter)?;
        let page_size = filter.page_size() as u64;

        Ok(OrderPage {
            orders,
            total,
            page: filter.page(),
            total_pages: total.div_ceil(page_size),
        })
    }

    /// Cancel one of the user's pending orders.
    pub fn cancel_order(&self, user_id: &str, order_id: &str) -> Result<Order> {
        self.settlement.cancel(user_id, order_id)
    }
}

fn applicable(required: bool, value: Option<f64>) -> Option<f64> {
    if required {
        value
    } else {
        None
    }
}

fn validate_request(request: &PlaceOrderRequest) -> std::result::Result<(), ValidationError> {
    if request.symbol.trim().is_empty() {
        return Err(ValidationError::MissingSymbol);
    }
    if request.quantity <= 0 {
        return Err(ValidationError::NonPositiveQuantity);
    }
    if request.price <= 0.0 {
        return Err(ValidationError::NonPositivePrice);
    }

    match request.kind {
        OrderKind::Limit => {
            if !is_positive(request.limit_price) {
                return Err(ValidationError::MissingLimitPrice);
            }
        }
        OrderKind::StopLoss => {
            if !is_positive(request.stop_price) {
                return Err(ValidationError::MissingStopPrice);
            }
        }
        OrderKind::TrailingStop => {
            if !is_positive(request.trailing_amount) && !is_positive(request.trailing_percent) {
                return Err(ValidationError::MissingTrailingTrigger);
            }
        }
        OrderKind::Buy | OrderKind::Sell => {}
    }

    Ok(())
}

fn is_positive(value: Option<f64>) -> bool {
    value.is_some_and(|v| v > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(kind: OrderKind) -> PlaceOrderRequest {
        PlaceOrderRequest {
            symbol: "AAPL".to_string(),
            kind,
            quantity: 10,
            price: 150.0,
            limit_price: None,
            stop_price: None,
            trailing_amount: None,
            trailing_percent: None,
        }
    }

    #[test]
    fn test_market_orders_need_no_trigger() {
        assert!(validate_request(&request(OrderKind::Buy)).is_ok());
        assert!(validate_request(&request(OrderKind::Sell)).is_ok());
    }

    #[test]
    fn test_missing_symbol() {
        let mut req = request(OrderKind::Buy);
        req.symbol = "  ".to_string();
        assert_eq!(
            validate_request(&req).unwrap_err(),
            ValidationError::MissingSymbol
        );
    }

    #[test]
    fn test_non_positive_quantity_and_price() {
        let mut req = request(OrderKind::Buy);
        req.quantity = 0;
        assert_eq!(
            validate_request(&req).unwrap_err(),
            ValidationError::NonPositiveQuantity
        );

        let mut req = request(OrderKind::Buy);
        req.price = -1.0;
        assert_eq!(
            validate_request(&req).unwrap_err(),
            ValidationError::NonPositivePrice
        );
    }

    #[test]
    fn test_limit_requires_positive_limit_price() {
        let mut req = request(OrderKind::Limit);
        assert_eq!(
            validate_request(&req).unwrap_err(),
            ValidationError::MissingLimitPrice
        );

        req.limit_price = Some(0.0);
        assert_eq!(
            validate_request(&req).unwrap_err(),
            ValidationError::MissingLimitPrice
        );

        req.limit_price = Some(145.0);
        assert!(validate_request(&req).is_ok());
    }

    #[test]
    fn test_stop_loss_requires_positive_stop_price() {
        let mut req = request(OrderKind::StopLoss);
        assert_eq!(
            validate_request(&req).unwrap_err(),
            ValidationError::MissingStopPrice
        );

        req.stop_price = Some(140.0);
        assert!(validate_request(&req).is_ok());
    }

    #[test]
    fn test_trailing_stop_accepts_either_trigger() {
        let mut req = request(OrderKind::TrailingStop);
        assert_eq!(
            validate_request(&req).unwrap_err(),
            ValidationError::MissingTrailingTrigger
        );

        req.trailing_amount = Some(5.0);
        assert!(validate_request(&req).is_ok());

        req.trailing_amount = None;
        req.trailing_percent = Some(2.0);
        assert!(validate_request(&req).is_ok());

        req.trailing_amount = Some(-1.0);
        req.trailing_percent = Some(-1.0);
        assert_eq!(
            validate_request(&req).unwrap_err(),
            ValidationError::MissingTrailingTrigger
        );
    }
}
