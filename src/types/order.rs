//! Order Types
//!
//! Orders, their lifecycle states, and the request/query shapes the order
//! service consumes.

use serde::{Deserialize, Serialize};

// =============================================================================
// Enums
// =============================================================================

/// Order kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    /// Buy at the current market price
    Buy,
    /// Sell at the current market price
    Sell,
    /// Execute at the limit price or better
    Limit,
    /// Trigger when price drops to the stop price
    StopLoss,
    /// Dynamic stop that follows price by fixed amount or %
    TrailingStop,
}

impl OrderKind {
    /// Whether a completed fill credits (buy side) or debits (sell side) the
    /// caller's holding. Stop and trailing stops trigger sells.
    pub fn is_buy_side(&self) -> bool {
        matches!(self, OrderKind::Buy | OrderKind::Limit)
    }
}

impl std::fmt::Display for OrderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderKind::Buy => write!(f, "buy"),
            OrderKind::Sell => write!(f, "sell"),
            OrderKind::Limit => write!(f, "limit"),
            OrderKind::StopLoss => write!(f, "stop_loss"),
            OrderKind::TrailingStop => write!(f, "trailing_stop"),
        }
    }
}

/// Order status.
///
/// `Pending` is the only non-terminal status; the settlement engine or an
/// explicit cancel moves an order out of it exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Waiting for settlement
    Pending,
    /// Settled successfully
    Completed,
    /// Cancelled before settlement
    Cancelled,
    /// Settlement resolved against the order
    Failed,
}

impl OrderStatus {
    /// A terminal order never changes status again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Order
// =============================================================================

/// A single order and its lifecycle state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub user_id: String,
    /// Normalized uppercase symbol
    pub symbol: String,
    pub kind: OrderKind,
    pub quantity: i64,
    /// Base price supplied with the request
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trailing_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trailing_percent: Option<f64>,
    pub status: OrderStatus,
    /// Set iff status is completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executed_price: Option<f64>,
    /// Milliseconds since epoch
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Only pending orders can be cancelled.
    pub fn can_cancel(&self) -> bool {
        self.status == OrderStatus::Pending
    }
}

// =============================================================================
// Requests & Queries
// =============================================================================

/// Request body for placing an order.
///
/// Trigger fields that don't apply to `kind` are discarded when the order is
/// built, not rejected.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub symbol: String,
    pub kind: OrderKind,
    pub quantity: i64,
    pub price: f64,
    #[serde(default)]
    pub limit_price: Option<f64>,
    #[serde(default)]
    pub stop_price: Option<f64>,
    #[serde(default)]
    pub trailing_amount: Option<f64>,
    #[serde(default)]
    pub trailing_percent: Option<f64>,
}

/// Sortable order fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderSortField {
    CreatedAt,
    Price,
}

impl Default for OrderSortField {
    fn default() -> Self {
        OrderSortField::CreatedAt
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl Default for SortDirection {
    fn default() -> Self {
        SortDirection::Desc
    }
}

/// Filter/sort/pagination options for listing orders.
///
/// Unset fields impose no constraint. Timestamp bounds are inclusive
/// milliseconds since epoch.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFilter {
    #[serde(default)]
    pub kind: Option<OrderKind>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub created_from: Option<i64>,
    #[serde(default)]
    pub created_to: Option<i64>,
    #[serde(default)]
    pub sort_field: OrderSortField,
    #[serde(default)]
    pub sort_direction: SortDirection,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

impl OrderFilter {
    /// Page number, floored at 1.
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size, floored at 1.
    pub fn page_size(&self) -> u32 {
        self.page_size.unwrap_or(10).max(1)
    }
}

/// One page of orders plus pagination totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub total: u64,
    pub page: u32,
    pub total_pages: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_kind_serialization() {
        assert_eq!(serde_json::to_string(&OrderKind::Buy).unwrap(), "\"buy\"");
        assert_eq!(serde_json::to_string(&OrderKind::Sell).unwrap(), "\"sell\"");
        assert_eq!(serde_json::to_string(&OrderKind::Limit).unwrap(), "\"limit\"");
        assert_eq!(serde_json::to_string(&OrderKind::StopLoss).unwrap(), "\"stop_loss\"");
        assert_eq!(serde_json::to_string(&OrderKind::TrailingStop).unwrap(), "\"trailing_stop\"");
    }

    #[test]
    fn test_order_status_serialization() {
        assert_eq!(serde_json::to_string(&OrderStatus::Pending).unwrap(), "\"pending\"");
        assert_eq!(serde_json::to_string(&OrderStatus::Completed).unwrap(), "\"completed\"");
        assert_eq!(serde_json::to_string(&OrderStatus::Cancelled).unwrap(), "\"cancelled\"");
        assert_eq!(serde_json::to_string(&OrderStatus::Failed).unwrap(), "\"failed\"");
    }

    #[test]
    fn test_unknown_kind_rejected() {
        assert!(serde_json::from_str::<OrderKind>("\"short\"").is_err());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(OrderStatus::Failed.is_terminal());
    }

    #[test]
    fn test_place_order_request_camel_case() {
        let req: PlaceOrderRequest = serde_json::from_str(
            r#"{"symbol":"AAPL","kind":"limit","quantity":10,"price":150.0,"limitPrice":145.0}"#,
        )
        .unwrap();

        assert_eq!(req.symbol, "AAPL");
        assert_eq!(req.kind, OrderKind::Limit);
        assert_eq!(req.limit_price, Some(145.0));
        assert_eq!(req.stop_price, None);
    }

    #[test]
    fn test_filter_pagination_floors() {
        let filter = OrderFilter {
            page: Some(0),
            page_size: Some(0),
            ..Default::default()
        };

        assert_eq!(filter.page(), 1);
        assert_eq!(filter.page_size(), 1);
    }
}
