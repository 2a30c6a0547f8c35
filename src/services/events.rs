//! Order event fan-out.
//!
//! Publishing is fire-and-forget: a send with no receivers (or with lagging
//! receivers) is not an error and never blocks the mutation that triggered
//! the event.

use crate::types::OrderEvent;
use tokio::sync::broadcast;
use tracing::debug;

/// Broadcast bus for order lifecycle events.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<OrderEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1024);
        Self { tx }
    }

    /// Publish an event to all current subscribers, best-effort.
    pub fn publish(&self, event: OrderEvent) {
        debug!("Publishing {:?}", event);
        let _ = self.tx.send(event);
    }

    /// Subscribe to order events.
    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OrderStatus, OrderUpdate};

    #[tokio::test]
    async fn test_publish_without_subscribers_does_not_panic() {
        let bus = EventBus::new();
        bus.publish(OrderEvent::Created(OrderUpdate {
            order_id: "o-1".to_string(),
            status: OrderStatus::Pending,
            user_id: "u-1".to_string(),
        }));
    }

    #[tokio::test]
    async fn test_subscriber_receives_event() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.publish(OrderEvent::Created(OrderUpdate {
            order_id: "o-1".to_string(),
            status: OrderStatus::Pending,
            user_id: "u-1".to_string(),
        }));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.update().order_id, "o-1");
    }
}
