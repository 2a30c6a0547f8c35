pub mod events;
pub mod orders;
pub mod portfolio;
pub mod price_feed;
pub mod settlement;
pub mod store;

pub use events::EventBus;
pub use orders::OrderService;
pub use portfolio::PortfolioService;
pub use price_feed::PriceFeed;
pub use settlement::{
    FixedPolicy, RandomPolicy, SettlementEngine, SettlementOutcome, SettlementPolicy,
};
pub use store::SqliteStore;
