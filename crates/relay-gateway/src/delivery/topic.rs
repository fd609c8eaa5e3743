//! Per-topic subscription state and fan-out.

use crate::delivery::filter;
use crate::delivery::registry::{ClientHandle, SendError};
use crate::domain::ConnectionId;
use parking_lot::{Mutex, RwLock};
use shared_bus::Payload;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// Channel name a delivery is tagged with.
pub fn channel_name(expected_value: &str, topic: &str) -> String {
    format!("{expected_value}.{topic}")
}

/// One subscriber's filter for one topic.
#[derive(Debug, Clone)]
pub struct DeliveryEntry {
    pub client: ClientHandle,
    pub field_name: String,
    pub expected_value: String,
}

impl DeliveryEntry {
    pub fn new(
        client: ClientHandle,
        field_name: impl Into<String>,
        expected_value: impl Into<String>,
    ) -> Self {
        Self {
            client,
            field_name: field_name.into(),
            expected_value: expected_value.into(),
        }
    }
}

/// Outcome of delivering one publication.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Entries whose filter matched
    pub matched: usize,
    /// Matches queued to their client
    pub delivered: usize,
    /// Matches whose client could not take the message
    pub failed: usize,
}

/// Subscription state for a single topic.
///
/// Shared behind an `Arc`; every holder sees the same entries and latch.
#[derive(Debug)]
pub struct TopicSubscription {
    topic: String,
    entries: RwLock<Vec<DeliveryEntry>>,
    /// Serializes the check-and-set of `attached` across the attach call.
    attach_lock: Mutex<()>,
    /// One-way latch, set once the bus handler is registered.
    attached: AtomicBool,
}

impl TopicSubscription {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            entries: RwLock::new(Vec::new()),
            attach_lock: Mutex::new(()),
            attached: AtomicBool::new(false),
        }
    }

    /// Append an entry. Duplicates are kept and each fires on its own.
    pub fn register(&self, entry: DeliveryEntry) {
        debug!(
            topic = %self.topic,
            connection_id = %entry.client.id(),
            field = %entry.field_name,
            value = %entry.expected_value,
            "Delivery entry registered"
        );
        self.entries.write().push(entry);
    }

    /// Run `attach` unless a previous call already succeeded.
    ///
    /// The attach lock is held across `attach`, so concurrent first callers
    /// run it at most once. A failed attach leaves the latch unset. Returns
    /// whether this call performed the attach.
    pub fn ensure_attached<F, E>(&self, attach: F) -> Result<bool, E>
    where
        F: FnOnce() -> Result<(), E>,
    {
        if self.attached.load(Ordering::Acquire) {
            return Ok(false);
        }
        let _guard = self.attach_lock.lock();
        if self.attached.load(Ordering::Acquire) {
            return Ok(false);
        }
        attach()?;
        self.attached.store(true, Ordering::Release);
        debug!(topic = %self.topic, "Delivery started for topic");
        Ok(true)
    }

    /// Whether the bus handler is registered. Never waits on an in-flight attach.
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    /// Send `payload` to every entry whose filter matches, in registration order.
    pub fn deliver(&self, payload: &Payload) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        let entries = self.entries.read();

        for entry in entries.iter() {
            if !filter::matches(payload, &entry.field_name, &entry.expected_value) {
                continue;
            }
            report.matched += 1;

            let channel = channel_name(&entry.expected_value, &self.topic);
            match entry.client.emit(&channel, payload) {
                Ok(()) => report.delivered += 1,
                Err(e @ SendError::Closed(_)) => {
                    report.failed += 1;
                    debug!(topic = %self.topic, error = %e, "Skipping disconnected client");
                }
                Err(e @ SendError::Full(_)) => {
                    report.failed += 1;
                    warn!(topic = %self.topic, error = %e, "Dropped delivery");
                }
            }
        }

        debug!(
            topic = %self.topic,
            entries = entries.len(),
            matched = report.matched,
            delivered = report.delivered,
            "Event delivered"
        );
        report
    }

    /// Drop entries whose client is no longer live. Returns how many were removed.
    pub fn prune<F>(&self, is_live: F) -> usize
    where
        F: Fn(&ConnectionId) -> bool,
    {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|e| is_live(&e.client.id()));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
