//! Settlement Engine
//!
//! Resolves pending orders to completed/failed after a configurable delay.
//! Each scheduled settlement is an independent spawned task; the delay is a
//! suspension point, never a blocking wait on the caller. The terminal
//! transition goes through the store's conditional update, so a settlement
//! racing a cancel ends with exactly one winner and the loser becomes a
//! no-op.

use crate::error::{Result, TradeError};
use crate::services::{EventBus, PortfolioService, PriceFeed, SqliteStore};
use crate::types::{Order, OrderEvent, OrderStatus};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Outcome of a settlement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementOutcome {
    Complete,
    Fail,
}

/// Decides whether a settlement completes or fails an order.
///
/// Injected so tests can pin the outcome instead of sampling an RNG.
pub trait SettlementPolicy: Send + Sync {
    fn outcome(&self, order: &Order) -> SettlementOutcome;
}

/// Default policy: complete with the configured probability.
pub struct RandomPolicy {
    success_rate: f64,
}

impl RandomPolicy {
    pub fn new(success_rate: f64) -> Self {
        Self {
            success_rate: success_rate.clamp(0.0, 1.0),
        }
    }
}

impl SettlementPolicy for RandomPolicy {
    fn outcome(&self, _order: &Order) -> SettlementOutcome {
        if rand::thread_rng().gen::<f64>() < self.success_rate {
            SettlementOutcome::Complete
        } else {
            SettlementOutcome::Fail
        }
    }
}

/// Fixed-outcome policy for deterministic tests.
pub struct FixedPolicy(pub SettlementOutcome);

impl SettlementPolicy for FixedPolicy {
    fn outcome(&self, _order: &Order) -> SettlementOutcome {
        self.0
    }
}

/// Asynchronous settlement of pending orders.
#[derive(Clone)]
pub struct SettlementEngine {
    store: Arc<SqliteStore>,
    portfolio: PortfolioService,
    events: EventBus,
    price_feed: Arc<PriceFeed>,
    policy: Arc<dyn SettlementPolicy>,
    delay: Duration,
}

impl SettlementEngine {
    pub fn new(
        store: Arc<SqliteStore>,
        portfolio: PortfolioService,
        events: EventBus,
        price_feed: Arc<PriceFeed>,
        policy: Arc<dyn SettlementPolicy>,
        delay: Duration,
    ) -> Self {
        Self {
            store,
            portfolio,
            events,
            price_feed,
            policy,
            delay,
        }
    }

    /// Schedule settlement of an order after the configured delay.
    ///
    /// Returns immediately; the attempt runs on its own task. There is no
    /// way to abort the timer itself; cancellation makes the eventual
    /// attempt a no-op by moving the order out of pending first.
    pub fn schedule(&self, order: &Order) {
        let engine = self.clone();
        let order_id = order.id.clone();

        tokio::spawn(async move {
            tokio::time::sleep(engine.delay).await;
            if let Err(e) = engine.settle(&order_id) {
                error!("Error settling order {}: {}", order_id, e);
            }
        });
    }

    /// Attempt to settle one order.
    ///
    /// A no-op when the order is gone or no longer pending. On success the
    /// terminal status is persisted first, the portfolio mutated second
    /// (completions only), and the status-changed event emitted last.
    pub fn settle(&self, order_id: &str) -> Result<()> {
        let Some(order) = self.store.get_order(order_id) else {
            debug!("Settlement skipped: order {} not found", order_id);
            return Ok(());
        };

        if order.status.is_terminal() {
            debug!(
                "Settlement skipped: order {} already {}",
                order_id, order.status
            );
            return Ok(());
        }

        let (status, executed_price) = match self.policy.outcome(&order) {
            SettlementOutcome::Complete => {
                let fill_price = self.price_feed.price(&order.symbol).unwrap_or(order.price);
                (OrderStatus::Completed, Some(fill_price))
            }
            SettlementOutcome::Fail => (OrderStatus::Failed, None),
        };

        let Some(settled) = self.store.transition_order(order_id, status, executed_price)? else {
            // Lost the race to a cancel
            debug!("Settlement skipped: order {} became terminal", order_id);
            return Ok(());
        };

        if settled.status == OrderStatus::Completed {
            self.portfolio.apply_fill(
                &settled.user_id,
                &settled.symbol,
                settled.quantity,
                settled.kind,
            )?;
        }

        self.events.publish(OrderEvent::status_changed(&settled));
        info!("Order {} settled with status {}", settled.id, settled.status);
        Ok(())
    }

    /// Cancel a pending order on behalf of its owner.
    ///
    /// Shares the same conditional transition as [`settle`](Self::settle):
    /// whichever of the two reaches the store first wins.
    pub fn cancel(&self, user_id: &str, order_id: &str) -> Result<Order> {
        let Some(order) = self.store.get_user_order(user_id, order_id) else {
            return Err(TradeError::OrderNotFound(order_id.to_string()));
        };

        if !order.can_cancel() {
            return Err(TradeError::InvalidState(order.status));
        }

        match self
            .store
            .transition_order(order_id, OrderStatus::Cancelled, None)?
        {
            Some(cancelled) => {
                self.events.publish(OrderEvent::status_changed(&cancelled));
                info!("Cancelled order {}", order_id);
                Ok(cancelled)
            }
            None => {
                // Settlement won the race after our status check
                let current = self
                    .store
                    .get_user_order(user_id, order_id)
                    .map(|o| o.status)
                    .unwrap_or(order.status);
                Err(TradeError::InvalidState(current))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrderKind;

    fn engine_with(policy: Arc<dyn SettlementPolicy>) -> (SettlementEngine, Arc<SqliteStore>) {
        let store = Arc::new(SqliteStore::new_in_memory().unwrap());
        let feed = PriceFeed::new();
        feed.seed("AAPL", 150.0);
        let portfolio = PortfolioService::new(store.clone(), feed.clone());
        let engine = SettlementEngine::new(
            store.clone(),
            portfolio,
            EventBus::new(),
            feed,
            policy,
            Duration::from_millis(10),
        );
        (engine, store)
    }

    fn pending_order(store: &SqliteStore, id: &str, kind: OrderKind) -> Order {
        let now = chrono::Utc::now().timestamp_millis();
        let order = Order {
            id: id.to_string(),
            user_id: "u-1".to_string(),
            symbol: "AAPL".to_string(),
            kind,
            quantity: 10,
            price: 150.0,
            limit_price: None,
            stop_price: None,
            trailing_amount: None,
            trailing_percent: None,
            status: OrderStatus::Pending,
            executed_price: None,
            created_at: now,
            updated_at: now,
        };
        store.create_order(&order).unwrap();
        order
    }

    #[tokio::test]
    async fn test_settle_completes_and_stamps_fill_price() {
        let (engine, store) =
            engine_with(Arc::new(FixedPolicy(SettlementOutcome::Complete)));
        pending_order(&store, "o-1", OrderKind::Buy);

        engine.settle("o-1").unwrap();

        let order = store.get_order("o-1").unwrap();
        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(order.executed_price, Some(150.0));
        assert_eq!(store.get_holding("u-1", "AAPL").unwrap().quantity, 10);
    }

    #[tokio::test]
    async fn test_settle_failure_leaves_portfolio_untouched() {
        let (engine, store) = engine_with(Arc::new(FixedPolicy(SettlementOutcome::Fail)));
        pending_order(&store, "o-1", OrderKind::Buy);

        engine.settle("o-1").unwrap();

        let order = store.get_order("o-1").unwrap();
        assert_eq!(order.status, OrderStatus::Failed);
        assert_eq!(order.executed_price, None);
        assert!(store.get_holding("u-1", "AAPL").is_none());
    }

    #[tokio::test]
    async fn test_settle_is_noop_after_cancel() {
        let (engine, store) =
            engine_with(Arc::new(FixedPolicy(SettlementOutcome::Complete)));
        pending_order(&store, "o-1", OrderKind::Buy);

        engine.cancel("u-1", "o-1").unwrap();
        engine.settle("o-1").unwrap();

        let order = store.get_order("o-1").unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert!(store.get_holding("u-1", "AAPL").is_none());
    }

    #[tokio::test]
    async fn test_cancel_after_settle_is_invalid_state() {
        let (engine, store) =
            engine_with(Arc::new(FixedPolicy(SettlementOutcome::Complete)));
        pending_order(&store, "o-1", OrderKind::Buy);

        engine.settle("o-1").unwrap();

        let err = engine.cancel("u-1", "o-1").unwrap_err();
        assert!(matches!(
            err,
            TradeError::InvalidState(OrderStatus::Completed)
        ));
    }

    #[tokio::test]
    async fn test_cancel_unknown_order_is_not_found() {
        let (engine, _store) =
            engine_with(Arc::new(FixedPolicy(SettlementOutcome::Complete)));

        let err = engine.cancel("u-1", "missing").unwrap_err();
        assert!(matches!(err, TradeError::OrderNotFound(_)));
    }

    #[tokio::test]
    async fn test_cancel_foreign_order_is_not_found() {
        let (engine, store) =
            engine_with(Arc::new(FixedPolicy(SettlementOutcome::Complete)));
        pending_order(&store, "o-1", OrderKind::Buy);

        let err = engine.cancel("u-2", "o-1").unwrap_err();
        assert!(matches!(err, TradeError::OrderNotFound(_)));
    }

    #[tokio::test]
    async fn test_scheduled_settlement_runs_after_delay() {
        let (engine, store) =
            engine_with(Arc::new(FixedPolicy(SettlementOutcome::Complete)));
        let order = pending_order(&store, "o-1", OrderKind::Buy);

        engine.schedule(&order);
        assert_eq!(store.get_order("o-1").unwrap().status, OrderStatus::Pending);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(
            store.get_order("o-1").unwrap().status,
            OrderStatus::Completed
        );
    }

    #[test]
    fn test_random_policy_extremes() {
        let order_template = Order {
            id: "o".into(),
            user_id: "u".into(),
            symbol: "AAPL".into(),
            kind: OrderKind::Buy,
            quantity: 1,
            price: 1.0,
            limit_price: None,
            stop_price: None,
            trailing_amount: None,
            trailing_percent: None,
            status: OrderStatus::Pending,
            executed_price: None,
            created_at: 0,
            updated_at: 0,
        };

        let always = RandomPolicy::new(1.0);
        let never = RandomPolicy::new(0.0);
        for _ in 0..32 {
            assert_eq!(always.outcome(&order_template), SettlementOutcome::Complete);
            assert_eq!(never.outcome(&order_template), SettlementOutcome::Fail);
        }
    }
}
