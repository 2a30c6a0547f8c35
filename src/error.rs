//! Error taxonomy for the order engine.
//!
//! Settlement failures are business outcomes (the order resolves to
//! `failed`), not errors; everything here is a fault the immediate caller
//! must see.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::types::OrderStatus;

/// A request field violated an order invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing symbol")]
    MissingSymbol,

    #[error("Quantity must be positive")]
    NonPositiveQuantity,

    #[error("Price must be positive")]
    NonPositivePrice,

    #[error("Limit price must be provided and positive for limit orders")]
    MissingLimitPrice,

    #[error("Stop price must be provided and positive for stop loss orders")]
    MissingStopPrice,

    #[error("Trailing amount or trailing percent must be provided and positive for trailing stop orders")]
    MissingTrailingTrigger,
}

impl ValidationError {
    /// Stable machine-readable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MissingSymbol => "MISSING_SYMBOL",
            ValidationError::NonPositiveQuantity => "NON_POSITIVE_QUANTITY",
            ValidationError::NonPositivePrice => "NON_POSITIVE_PRICE",
            ValidationError::MissingLimitPrice => "MISSING_LIMIT_PRICE",
            ValidationError::MissingStopPrice => "MISSING_STOP_PRICE",
            ValidationError::MissingTrailingTrigger => "MISSING_TRAILING_TRIGGER",
        }
    }
}

/// Order engine errors.
#[derive(Debug, Error)]
pub enum TradeError {
    #[error("Invalid order: {0}")]
    Validation(#[from] ValidationError),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Order cannot be cancelled: status is {0}")]
    InvalidState(OrderStatus),

    #[error("No price data available for {0}")]
    NoPriceData(String),

    #[error("Storage error: {0}")]
    Store(String),

    #[error("Unauthorized: missing user identity")]
    Unauthorized,
}

impl From<rusqlite::Error> for TradeError {
    fn from(e: rusqlite::Error) -> Self {
        TradeError::Store(e.to_string())
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for TradeError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            TradeError::Validation(v) => (StatusCode::BAD_REQUEST, v.code()),
            TradeError::OrderNotFound(_) => (StatusCode::NOT_FOUND, "ORDER_NOT_FOUND"),
            TradeError::InvalidState(_) => (StatusCode::BAD_REQUEST, "INVALID_STATE"),
            TradeError::NoPriceData(_) => (StatusCode::NOT_FOUND, "NO_PRICE_DATA"),
            TradeError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR"),
            TradeError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, TradeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_codes_are_distinct() {
        let codes = [
            ValidationError::MissingSymbol.code(),
            ValidationError::NonPositiveQuantity.code(),
            ValidationError::NonPositivePrice.code(),
            ValidationError::MissingLimitPrice.code(),
            ValidationError::MissingStopPrice.code(),
            ValidationError::MissingTrailingTrigger.code(),
        ];

        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
    }

    #[test]
    fn test_store_error_from_rusqlite() {
        let err = TradeError::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(matches!(err, TradeError::Store(_)));
    }
}
