//! Market data API
//!
//! - GET /api/market/price/:symbol - Current price for one symbol
//! - GET /api/market/prices - All current prices

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::error::TradeError;
use crate::types::{PriceQuote, PriceTick};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/price/:symbol", get(get_price))
        .route("/prices", get(list_prices))
}

/// GET /api/market/price/:symbol
async fn get_price(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<PriceQuote>, TradeError> {
    let symbol = symbol.to_uppercase();
    let current_price = state
        .price_feed
        .price(&symbol)
        .ok_or(TradeError::NoPriceData(symbol))?;

    Ok(Json(PriceQuote { current_price }))
}

/// GET /api/market/prices
async fn list_prices(State(state): State<AppState>) -> Json<Vec<PriceTick>> {
    Json(state.price_feed.all_prices())
}
