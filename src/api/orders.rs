//! Orders API
//!
//! - POST /api/orders - Place a new order
//! - GET /api/orders - List orders (with filters)
//! - GET /api/orders/:id - Get order details
//! - DELETE /api/orders/:id - Cancel an order

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};

use crate::api::UserId;
use crate::error::TradeError;
use crate::types::{Order, OrderFilter, OrderPage, PlaceOrderRequest};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(place_order))
        .route("/:id", get(get_order).delete(cancel_order))
}

/// POST /api/orders
async fn place_order(
    State(state): State<AppState>,
    user: UserId,
    Json(request): Json<PlaceOrderRequest>,
) -> Result<Json<Order>, TradeError> {
    let order = state.orders.place_order(&user.0, request)?;
    Ok(Json(order))
}

/// GET /api/orders
async fn list_orders(
    State(state): State<AppState>,
    user: UserId,
    Query(filter): Query<OrderFilter>,
) -> Result<Json<OrderPage>, TradeError> {
    let page = state.orders.list_orders(&user.0, &filter)?;
    Ok(Json(page))
}

/// GET /api/orders/:id
async fn get_order(
    State(state): State<AppState>,
    user: UserId,
    Path(id): Path<String>,
) -> Result<Json<Order>, TradeError> {
    let order = state.orders.get_order(&user.0, &id)?;
    Ok(Json(order))
}

/// DELETE /api/orders/:id
async fn cancel_order(
    State(state): State<AppState>,
    user: UserId,
    Path(id): Path<String>,
) -> Result<Json<Order>, TradeError> {
    let order = state.orders.cancel_order(&user.0, &id)?;
    Ok(Json(order))
}
