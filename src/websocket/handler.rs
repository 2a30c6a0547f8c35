//! WebSocket fan-out.
//!
//! Every connected client receives every order lifecycle event and every
//! price tick, best-effort. Delivery is at-most-once: a client that lags
//! behind the broadcast channel skips what it missed, and a slow or
//! disconnected client never stalls order processing.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};
use uuid::Uuid;

use crate::types::ServerMessage;
use crate::AppState;

/// WebSocket upgrade handler.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let client_id = Uuid::new_v4();
    info!("WebSocket client connected: {}", client_id);

    let (mut sender, mut receiver) = socket.split();
    let mut events_rx = state.events.subscribe();
    let mut price_rx = state.price_feed.subscribe();

    loop {
        let message = tokio::select! {
            event = events_rx.recv() => match event {
                Ok(event) => ServerMessage::from(event),
                Err(RecvError::Lagged(skipped)) => {
                    debug!("Client {} lagged, skipped {} events", client_id, skipped);
                    continue;
                }
                Err(RecvError::Closed) => break,
            },
            tick = price_rx.recv() => match tick {
                Ok(tick) => ServerMessage::from(tick),
                Err(RecvError::Lagged(skipped)) => {
                    debug!("Client {} lagged, skipped {} ticks", client_id, skipped);
                    continue;
                }
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    debug!("WebSocket error for {}: {}", client_id, e);
                    break;
                }
            },
        };

        let Ok(json) = serde_json::to_string(&message) else {
            continue;
        };
        if sender.send(Message::Text(json)).await.is_err() {
            break;
        }
    }

    info!("WebSocket client disconnected: {}", client_id);
}
