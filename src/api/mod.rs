pub mod health;
pub mod market;
pub mod orders;
pub mod portfolio;

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    Router,
};

use crate::error::TradeError;
use crate::AppState;

/// Opaque authenticated user id.
///
/// Authentication itself is an external collaborator; by the time a request
/// reaches this server, the auth layer has resolved the caller into the
/// `x-user-id` header.
#[derive(Debug, Clone)]
pub struct UserId(pub String);

#[axum::async_trait]
impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = TradeError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| UserId(v.to_string()))
            .ok_or(TradeError::Unauthorized)
    }
}

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/api/orders", orders::router())
        .nest("/api/portfolio", portfolio::router())
        .nest("/api/market", market::router())
}
