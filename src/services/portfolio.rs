//! Portfolio mutation and analytics.

use crate::error::Result;
use crate::services::{PriceFeed, SqliteStore};
use crate::types::{Holding, HoldingView, OrderKind, PortfolioAnalytics};
use std::sync::Arc;
use tracing::{debug, info};

/// Holdings service: applies fills and values portfolios.
#[derive(Clone)]
pub struct PortfolioService {
    store: Arc<SqliteStore>,
    price_feed: Arc<PriceFeed>,
}

impl PortfolioService {
    pub fn new(store: Arc<SqliteStore>, price_feed: Arc<PriceFeed>) -> Self {
        Self { store, price_feed }
    }

    /// Apply a completed fill to the user's holdings.
    ///
    /// Buy-side fills credit the (user, symbol) holding, creating it when
    /// absent; sell-side fills debit it. Sell fills on a missing holding are
    /// a no-op, and a holding driven to zero or below is deleted.
    pub fn apply_fill(
        &self,
        user_id: &str,
        symbol: &str,
        quantity: i64,
        kind: OrderKind,
    ) -> Result<()> {
        if kind.is_buy_side() {
            let holding = self.store.credit_holding(user_id, symbol, quantity)?;
            info!(
                "Credited {} {} to user {} (now {})",
                quantity, symbol, user_id, holding.quantity
            );
        } else {
            match self.store.debit_holding(user_id, symbol, quantity)? {
                Some(holding) => {
                    info!(
                        "Debited {} {} from user {} (now {})",
                        quantity, symbol, user_id, holding.quantity
                    );
                }
                None => {
                    debug!("Sell fill left no {} holding for user {}", symbol, user_id);
                }
            }
        }

        Ok(())
    }

    /// A user's holding in one symbol, if any.
    pub fn holding(&self, user_id: &str, symbol: &str) -> Option<Holding> {
        self.store.get_holding(user_id, &symbol.to_uppercase())
    }

    /// Value all of a user's holdings at current prices.
    ///
    /// A symbol the price source can't quote is valued at zero instead of
    /// failing the whole response; only storage failures surface.
    pub fn analytics(&self, user_id: &str) -> Result<PortfolioAnalytics> {
        let holdings = self.store.get_user_holdings(user_id)?;

        let views: Vec<HoldingView> = holdings
            .into_iter()
            .map(|h| {
                let current_price = self.price_feed.price(&h.symbol).unwrap_or(0.0);
                HoldingView {
                    current_value: h.quantity as f64 * current_price,
                    current_price,
                    symbol: h.symbol,
                    quantity: h.quantity,
                    average_price: h.average_price,
                }
            })
            .collect();

        let total_value = views.iter().map(|v| v.current_value).sum();

        Ok(PortfolioAnalytics {
            holdings: views,
            total_value,
        })
    }
}
