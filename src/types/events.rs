//! Event Types
//!
//! Order lifecycle events published by the core and the WebSocket envelope
//! that carries them (plus price ticks) to clients.

use serde::{Deserialize, Serialize};

use super::{Order, OrderStatus, PriceTick};

/// Payload shared by all order lifecycle events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    pub order_id: String,
    pub status: OrderStatus,
    pub user_id: String,
}

/// An order lifecycle event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    #[serde(rename = "order.created")]
    Created(OrderUpdate),
    #[serde(rename = "order.statusChanged")]
    StatusChanged(OrderUpdate),
}

impl OrderEvent {
    pub fn created(order: &Order) -> Self {
        OrderEvent::Created(OrderUpdate {
            order_id: order.id.clone(),
            status: order.status,
            user_id: order.user_id.clone(),
        })
    }

    pub fn status_changed(order: &Order) -> Self {
        OrderEvent::StatusChanged(OrderUpdate {
            order_id: order.id.clone(),
            status: order.status,
            user_id: order.user_id.clone(),
        })
    }

    pub fn update(&self) -> &OrderUpdate {
        match self {
            OrderEvent::Created(u) | OrderEvent::StatusChanged(u) => u,
        }
    }
}

/// Outgoing WebSocket message to client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    #[serde(rename = "order.created")]
    OrderCreated(OrderUpdate),
    #[serde(rename = "order.statusChanged")]
    OrderStatusChanged(OrderUpdate),
    #[serde(rename = "priceUpdate")]
    PriceUpdate(PriceTick),
}

impl From<OrderEvent> for ServerMessage {
    fn from(event: OrderEvent) -> Self {
        match event {
            OrderEvent::Created(u) => ServerMessage::OrderCreated(u),
            OrderEvent::StatusChanged(u) => ServerMessage::OrderStatusChanged(u),
        }
    }
}

impl From<PriceTick> for ServerMessage {
    fn from(tick: PriceTick) -> Self {
        ServerMessage::PriceUpdate(tick)
    }
}
