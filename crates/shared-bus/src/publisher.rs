//! # Event Publisher
//!
//! Defines the publishing side of the event bus and the in-memory broker.

use crate::events::{BusEvent, Payload};
use crate::subscriber::{dispatch, BrokerContext, BusError, EventService};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Trait for publishing events to the bus.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a payload on a topic.
    ///
    /// # Returns
    ///
    /// The number of handlers registered for the topic at publish time.
    async fn publish(&self, topic: &str, payload: Payload) -> usize;

    /// Get the total number of events published.
    fn events_published(&self) -> u64;
}

/// In-memory implementation of the event bus.
///
/// Uses `tokio::sync::broadcast` for fan-out; every registered handler owns a
/// receiver and a dispatch task on the current runtime.
pub struct InMemoryEventBus {
    /// Broadcast sender for events.
    sender: broadcast::Sender<BusEvent>,

    /// Registered service names.
    services: RwLock<HashSet<String>>,

    /// Handler count by topic.
    handlers: RwLock<HashMap<String, usize>>,

    /// Total events published.
    events_published: AtomicU64,

    /// Channel capacity.
    capacity: usize,
}

impl InMemoryEventBus {
    /// Create a new in-memory event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new in-memory event bus with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            services: RwLock::new(HashSet::new()),
            handlers: RwLock::new(HashMap::new()),
            events_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Number of handlers registered for a topic.
    #[must_use]
    pub fn handler_count(&self, topic: &str) -> usize {
        self.handlers
            .read()
            .map(|h| h.get(topic).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Number of registered services.
    #[must_use]
    pub fn service_count(&self) -> usize {
        self.services.read().map(|s| s.len()).unwrap_or(0)
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl BrokerContext for InMemoryEventBus {
    fn add_service(&self, service: EventService) -> Result<(), BusError> {
        if service.events.is_empty() {
            return Err(BusError::EmptyService(service.name));
        }
        let runtime = Handle::try_current().map_err(|_| BusError::NoRuntime)?;

        {
            let mut services = self.services.write().unwrap_or_else(|e| e.into_inner());
            if !services.insert(service.name.clone()) {
                return Err(BusError::DuplicateService(service.name));
            }
        }

        for spec in service.events {
            // Subscribe before spawning so publications made after this call
            // returns are never missed.
            let receiver = self.sender.subscribe();
            *self
                .handlers
                .write()
                .unwrap_or_else(|e| e.into_inner())
                .entry(spec.name.clone())
                .or_insert(0) += 1;
            debug!(service = %service.name, topic = %spec.name, "Handler registered");
            runtime.spawn(dispatch(service.name.clone(), spec, receiver));
        }

        Ok(())
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, topic: &str, payload: Payload) -> usize {
        // Always increment counter (event was attempted)
        self.events_published.fetch_add(1, Ordering::Relaxed);

        match self.sender.send(BusEvent::new(topic, payload)) {
            Ok(_) => {
                let handlers = self.handler_count(topic);
                debug!(topic = %topic, handlers = handlers, "Event published");
                handlers
            }
            Err(e) => {
                // No receivers - event is dropped
                warn!(topic = %topic, error = %e, "Event dropped (no handlers)");
                0
            }
        }
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}
