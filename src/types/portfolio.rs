//! Portfolio Types
//!
//! A holding is a user's current position in one symbol. At most one holding
//! exists per (user, symbol) pair; a holding whose quantity reaches zero or
//! below is deleted rather than persisted.

use serde::{Deserialize, Serialize};

/// A user's position in a single symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub id: String,
    pub user_id: String,
    pub symbol: String,
    pub quantity: i64,
    /// Placeholder cost basis; not recomputed on buys.
    pub average_price: f64,
    pub updated_at: i64,
}

/// A holding joined against the current price source.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingView {
    pub symbol: String,
    pub quantity: i64,
    pub average_price: f64,
    /// Zero when the price source has no quote for the symbol.
    pub current_price: f64,
    pub current_value: f64,
}

/// Analytics response: all holdings valued at current prices.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioAnalytics {
    pub holdings: Vec<HoldingView>,
    pub total_value: f64,
}
