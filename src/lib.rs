//! Paperdesk - simulated brokerage server with asynchronous order settlement.
//!
//! The library root exists so integration tests can assemble the same state
//! the binary serves.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod types;
pub mod websocket;

use std::sync::Arc;
use std::time::Duration;

use config::Config;
use services::{
    EventBus, OrderService, PortfolioService, PriceFeed, SettlementEngine, SettlementPolicy,
    SqliteStore,
};

// Re-export commonly used types
pub use types::*;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub orders: OrderService,
    pub portfolio: PortfolioService,
    pub settlement: SettlementEngine,
    pub events: EventBus,
    pub price_feed: Arc<PriceFeed>,
}

impl AppState {
    /// Wire the services together over one store and one settlement policy.
    pub fn new(
        config: Arc<Config>,
        store: Arc<SqliteStore>,
        policy: Arc<dyn SettlementPolicy>,
    ) -> Self {
        let events = EventBus::new();

        let price_feed = PriceFeed::new();
        for (symbol, price) in &config.seed_prices {
            price_feed.seed(symbol, *price);
        }

        let portfolio = PortfolioService::new(store.clone(), price_feed.clone());
        let settlement = SettlementEngine::new(
            store.clone(),
            portfolio.clone(),
            events.clone(),
            price_feed.clone(),
            policy,
            Duration::from_millis(config.settlement_delay_ms),
        );
        let orders = OrderService::new(store, events.clone(), settlement.clone());

        Self {
            config,
            orders,
            portfolio,
            settlement,
            events,
            price_feed,
        }
    }
}
