//! Delivery bridge: re-emits bus events to the clients that asked for them.
//!
//! ```text
//! client ──subscribe(name, value, topic)──→ DeliveryCoordinator
//!                                               │ first request only
//!                                               ▼
//!                                      add_service(topic handler) ──→ Event Bus
//!                                                                        │
//!   ClientHandle ←──emit("<value>.<topic>")── TopicSubscription::deliver ←┘
//! ```

pub mod coordinator;
pub mod filter;
pub mod registry;
pub mod topic;

pub use coordinator::{service_name, CoordinatorStats, DeliveryCoordinator, SubscribeOutcome};
pub use filter::matches;
pub use registry::{ClientHandle, ClientRegistry, OutboundMessage, SendError};
pub use topic::{channel_name, DeliveryEntry, DeliveryReport, TopicSubscription};
