//! # Event Subscriber
//!
//! Defines the handler side of the event bus: named services that react to
//! topics, and the dispatch loop that drives them.

use crate::events::{BusEvent, Payload};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Errors from handler registration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// A service with this name is already registered.
    #[error("service already registered: {0}")]
    DuplicateService(String),

    /// The service declares no events.
    #[error("service {0} declares no events")]
    EmptyService(String),

    /// Handlers need a tokio runtime to run their dispatch task.
    #[error("no async runtime available for dispatch")]
    NoRuntime,
}

/// Callback invoked for every publication on a topic.
pub type EventHandler = Arc<dyn Fn(&Payload) + Send + Sync>;

/// One topic a service listens to.
#[derive(Clone)]
pub struct EventSpec {
    /// Topic name.
    pub name: String,
    /// Handler invoked for each event on the topic.
    pub handler: EventHandler,
}

impl fmt::Debug for EventSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSpec")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A named group of topic handlers registered with the bus.
#[derive(Debug, Clone)]
pub struct EventService {
    /// Unique service name.
    pub name: String,
    /// Topics handled by this service.
    pub events: Vec<EventSpec>,
}

impl EventService {
    /// A service handling a single topic.
    pub fn single<F>(name: impl Into<String>, topic: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Payload) + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            events: vec![EventSpec {
                name: topic.into(),
                handler: Arc::new(handler),
            }],
        }
    }
}

/// The broker capability consumed by the gateway: register handler services.
pub trait BrokerContext: Send + Sync {
    /// Register a service; each of its handlers starts receiving publications
    /// made after this call returns.
    fn add_service(&self, service: EventService) -> Result<(), BusError>;
}

/// Drive one handler until the bus is dropped.
pub(crate) async fn dispatch(
    service: String,
    spec: EventSpec,
    mut receiver: broadcast::Receiver<BusEvent>,
) {
    loop {
        let event = match receiver.recv().await {
            Ok(e) => e,
            Err(broadcast::error::RecvError::Closed) => break,
            Err(broadcast::error::RecvError::Lagged(count)) => {
                warn!(
                    service = %service,
                    topic = %spec.name,
                    lagged = count,
                    "Handler lagged, some events dropped"
                );
                continue;
            }
        };

        if event.topic == spec.name {
            (spec.handler)(&event.payload);
        }
    }
    debug!(service = %service, topic = %spec.name, "Dispatch loop ended");
}
