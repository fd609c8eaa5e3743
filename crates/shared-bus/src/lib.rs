//! # Shared Bus - Topic Event Bus
//!
//! Publish/subscribe collaborator for the relay gateway. Producers publish JSON
//! payloads on named topics; consumers register named services whose handlers are
//! invoked from the bus's own dispatch tasks.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────────────┐
//! │  Producer    │                    │  EventService        │
//! │              │    publish()       │  (topic → handler)   │
//! │              │ ──────┐            │                      │
//! └──────────────┘       │            └──────────────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  add_service()
//! ```
//!
//! ## Rules
//!
//! - Service names are unique; registering a name twice is rejected.
//! - Each handler runs on its own dispatch task and sees events in publish order.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{BusEvent, Payload};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{BrokerContext, BusError, EventHandler, EventService, EventSpec};

/// Maximum events to buffer per handler before it starts lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        assert_eq!(DEFAULT_CHANNEL_CAPACITY, 1000);
    }
}
