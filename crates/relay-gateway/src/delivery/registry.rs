//! Registry of connected clients.

use crate::domain::ConnectionId;
use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use shared_bus::Payload;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::debug;

/// A named message queued for a client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundMessage {
    /// Channel name, `<value>.<topic>` for deliveries
    #[serde(rename = "event")]
    pub channel: String,
    /// Message body
    pub data: Value,
}

/// Failure to hand a message to a client's outbound queue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    /// The connection's writer is gone
    #[error("client {0} disconnected")]
    Closed(ConnectionId),
    /// The connection's queue is full
    #[error("client {0} outbound queue full")]
    Full(ConnectionId),
}

/// Handle to a connected peer.
///
/// Cloning is cheap; every clone feeds the same outbound queue.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    id: ConnectionId,
    tx: mpsc::Sender<OutboundMessage>,
    dropped: Arc<AtomicU64>,
}

impl ClientHandle {
    pub fn new(id: ConnectionId, tx: mpsc::Sender<OutboundMessage>) -> Self {
        Self {
            id,
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Create a handle together with the receiving end of its queue.
    pub fn channel(id: ConnectionId, capacity: usize) -> (Self, mpsc::Receiver<OutboundMessage>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(id, tx), rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue `payload` under `channel` without waiting.
    pub fn emit(&self, channel: &str, payload: &Payload) -> Result<(), SendError> {
        let message = OutboundMessage {
            channel: channel.to_string(),
            data: payload.value().clone(),
        };
        match self.tx.try_send(message) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Err(SendError::Full(self.id))
            }
            Err(TrySendError::Closed(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Err(SendError::Closed(self.id))
            }
        }
    }

    /// Messages that could not be queued.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Live connections by ID.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: DashMap<ConnectionId, ClientHandle>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly connected client, returning any handle it replaced.
    pub fn put(&self, id: ConnectionId, handle: ClientHandle) -> Option<ClientHandle> {
        let previous = self.clients.insert(id, handle);
        debug!(connection_id = %id, replaced = previous.is_some(), "Client registered");
        previous
    }

    /// Resolve a handle for delivery.
    pub fn get(&self, id: &ConnectionId) -> Option<ClientHandle> {
        self.clients.get(id).map(|r| r.clone())
    }

    /// Evict a client on disconnect.
    pub fn remove(&self, id: &ConnectionId) -> Option<ClientHandle> {
        let removed = self.clients.remove(id).map(|(_, handle)| handle);
        debug!(connection_id = %id, found = removed.is_some(), "Client removed");
        removed
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.clients.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Deliveries dropped across all registered clients.
    pub fn dropped_total(&self) -> u64 {
        self.clients.iter().map(|c| c.value().dropped_count()).sum()
    }
}
