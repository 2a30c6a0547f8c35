//! Portfolio API
//!
//! - GET /api/portfolio/analytics - Holdings valued at current prices

use axum::{extract::State, routing::get, Json, Router};

use crate::api::UserId;
use crate::error::TradeError;
use crate::types::PortfolioAnalytics;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/analytics", get(get_analytics))
}

/// GET /api/portfolio/analytics
async fn get_analytics(
    State(state): State<AppState>,
    user: UserId,
) -> Result<Json<PortfolioAnalytics>, TradeError> {
    let analytics = state.portfolio.analytics(&user.0)?;
    Ok(Json(analytics))
}
