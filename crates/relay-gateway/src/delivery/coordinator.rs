//! Subscription request handling and one-time bus attachment per topic.

use crate::delivery::registry::{ClientHandle, ClientRegistry};
use crate::delivery::topic::{DeliveryEntry, TopicSubscription};
use crate::domain::ConnectionId;
use dashmap::DashMap;
use serde::Serialize;
use shared_bus::{BrokerContext, EventService};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Prefix of the bus service registered for each topic.
pub const SERVICE_PREFIX: &str = "socket_io-events_delivery-";

/// Bus service name for a topic.
pub fn service_name(topic: &str) -> String {
    format!("{SERVICE_PREFIX}{topic}")
}

/// What happened to a subscription request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    /// The connection is not registered; nothing was recorded.
    UnknownClient,
    /// Entry recorded. `attached` is true when this request registered the
    /// topic's bus handler.
    Registered { attached: bool },
    /// Entry recorded but the bus refused the handler; the next request for
    /// the topic retries.
    AttachFailed,
}

/// Snapshot of coordinator state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoordinatorStats {
    pub clients: usize,
    pub topics: usize,
    pub attached_topics: usize,
    pub entries: usize,
    /// Deliveries connected clients could not queue
    pub dropped: u64,
}

/// Owns the client registry and the topic map.
pub struct DeliveryCoordinator {
    broker: Arc<dyn BrokerContext>,
    clients: ClientRegistry,
    topics: DashMap<String, Arc<TopicSubscription>>,
}

impl DeliveryCoordinator {
    pub fn new(broker: Arc<dyn BrokerContext>) -> Self {
        Self {
            broker,
            clients: ClientRegistry::new(),
            topics: DashMap::new(),
        }
    }

    /// Subscription state for a topic, if any request has named it.
    pub fn topic(&self, name: &str) -> Option<Arc<TopicSubscription>> {
        self.topics.get(name).map(|r| Arc::clone(r.value()))
    }

    pub fn on_connect(&self, id: ConnectionId, handle: ClientHandle) {
        debug!(connection_id = %id, "Client connected");
        self.clients.put(id, handle);
    }

    /// Forget the client. Its delivery entries stay until the next sweep.
    pub fn on_disconnect(&self, id: &ConnectionId) {
        debug!(connection_id = %id, "Client disconnected");
        self.clients.remove(id);
    }

    /// Record that `connection_id` wants events on `topic` whose `field_name`
    /// equals `expected_value`, attaching the topic's bus handler on first use.
    pub fn on_subscribe_request(
        &self,
        connection_id: &ConnectionId,
        field_name: &str,
        expected_value: &str,
        topic: &str,
    ) -> SubscribeOutcome {
        debug!(
            connection_id = %connection_id,
            field = %field_name,
            value = %expected_value,
            topic = %topic,
            "Subscription request"
        );

        let Some(client) = self.clients.get(connection_id) else {
            debug!(connection_id = %connection_id, topic = %topic, "Unknown client, request dropped");
            return SubscribeOutcome::UnknownClient;
        };

        let subscription = Arc::clone(
            self.topics
                .entry(topic.to_string())
                .or_insert_with(|| Arc::new(TopicSubscription::new(topic)))
                .value(),
        );

        subscription.register(DeliveryEntry::new(client, field_name, expected_value));

        let handler_target = Arc::clone(&subscription);
        let broker = Arc::clone(&self.broker);
        let result = subscription.ensure_attached(move || {
            broker.add_service(EventService::single(
                service_name(topic),
                topic,
                move |payload| {
                    handler_target.deliver(payload);
                },
            ))
        });

        match result {
            Ok(attached) => SubscribeOutcome::Registered { attached },
            Err(e) => {
                error!(topic = %topic, error = %e, "Failed to attach event handler");
                SubscribeOutcome::AttachFailed
            }
        }
    }

    /// Remove entries whose client is no longer registered. Returns the
    /// number of entries removed across all topics.
    pub fn sweep(&self) -> usize {
        let removed: usize = self
            .topics
            .iter()
            .map(|t| t.value().prune(|id| self.clients.contains(id)))
            .sum();
        if removed > 0 {
            info!(removed = removed, "Pruned stale delivery entries");
        }
        removed
    }

    pub fn stats(&self) -> CoordinatorStats {
        let mut stats = CoordinatorStats {
            clients: self.clients.len(),
            dropped: self.clients.dropped_total(),
            ..CoordinatorStats::default()
        };
        for topic in self.topics.iter() {
            stats.topics += 1;
            stats.entries += topic.value().len();
            if topic.value().is_attached() {
                stats.attached_topics += 1;
            }
        }
        stats
    }
}
