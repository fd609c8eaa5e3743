//! WebSocket session handling.
//!
//! Each connection gets an outbound queue drained by a writer task; inbound
//! frames are decoded and handed to the delivery coordinator.

use crate::delivery::{ClientHandle, DeliveryCoordinator, SubscribeOutcome};
use crate::domain::{ConnectionId, GatewayConfig};
use crate::ws::protocol::{encode_outbound, parse_frame, Inbound};
use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Per-session settings
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Largest inbound frame accepted, in bytes
    pub max_message_size: usize,
    /// Outbound queue size
    pub message_buffer_size: usize,
    /// Inbound event name carrying subscription requests
    pub subscribe_event: String,
}

impl From<&GatewayConfig> for SessionConfig {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            max_message_size: config.websocket.max_message_size,
            message_buffer_size: config.websocket.message_buffer_size,
            subscribe_event: config.delivery.subscribe_event.clone(),
        }
    }
}

/// WebSocket connection handler
pub struct WebSocketHandler {
    coordinator: Arc<DeliveryCoordinator>,
    connection_id: ConnectionId,
    config: SessionConfig,
}

impl WebSocketHandler {
    pub fn new(coordinator: Arc<DeliveryCoordinator>, config: SessionConfig) -> Self {
        Self {
            coordinator,
            connection_id: ConnectionId::new(),
            config,
        }
    }

    /// Handle a WebSocket connection until it closes
    pub async fn handle(self, socket: WebSocket) {
        let (mut ws_tx, mut ws_rx) = socket.split();

        let (client, mut outbound_rx) =
            ClientHandle::channel(self.connection_id, self.config.message_buffer_size);
        self.coordinator.on_connect(self.connection_id, client);
        info!(connection_id = %self.connection_id, "New WebSocket connection");

        let conn_id = self.connection_id;
        let writer = tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                let text = match encode_outbound(&message) {
                    Ok(text) => text,
                    Err(e) => {
                        error!(connection_id = %conn_id, error = %e, "Failed to encode message");
                        continue;
                    }
                };
                if let Err(e) = ws_tx.send(Message::Text(text)).await {
                    debug!(connection_id = %conn_id, error = %e, "WebSocket write failed");
                    break;
                }
            }
        });

        while let Some(result) = ws_rx.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    self.handle_text(&text);
                }
                Ok(Message::Binary(data)) => match std::str::from_utf8(&data) {
                    Ok(text) => {
                        self.handle_text(text);
                    }
                    Err(_) => {
                        warn!(connection_id = %self.connection_id, len = data.len(), "Non-UTF8 binary frame ignored");
                    }
                },
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
                Ok(Message::Close(_)) => {
                    debug!(connection_id = %self.connection_id, "WebSocket close received");
                    break;
                }
                Err(e) => {
                    warn!(connection_id = %self.connection_id, error = %e, "WebSocket error");
                    break;
                }
            }
        }

        self.coordinator.on_disconnect(&self.connection_id);
        writer.abort();

        info!(connection_id = %self.connection_id, "WebSocket connection closed");
    }

    /// Handle a single inbound text frame
    fn handle_text(&self, text: &str) -> Option<SubscribeOutcome> {
        if text.len() > self.config.max_message_size {
            warn!(
                connection_id = %self.connection_id,
                size = text.len(),
                max = self.config.max_message_size,
                "Message exceeds size limit"
            );
            return None;
        }

        match parse_frame(text, &self.config.subscribe_event) {
            Ok(Inbound::Subscribe(request)) => Some(self.coordinator.on_subscribe_request(
                &self.connection_id,
                &request.field_name,
                &request.expected_value,
                &request.topic,
            )),
            Ok(Inbound::Other(event)) => {
                debug!(connection_id = %self.connection_id, event = %event, "Unhandled event");
                None
            }
            Err(e) => {
                warn!(connection_id = %self.connection_id, error = %e, "Invalid frame");
                None
            }
        }
    }
}
