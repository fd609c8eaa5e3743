//! Relay Gateway - re-emits event bus topics to WebSocket clients.
//!
//! A client asks for the events of one topic whose field equals a value; the
//! gateway registers a single bus handler per topic and forwards each matching
//! event to every client that asked for it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      RELAY GATEWAY                           │
//! │                                                              │
//! │   WebSocket sessions ──subscribe──→ DeliveryCoordinator      │
//! │          ↑                            │        │             │
//! │          │                    ClientRegistry   topics        │
//! │          │                                     │             │
//! │          └────── emit("<value>.<topic>") ── TopicSubscription│
//! │                                                ↑             │
//! └────────────────────────────────────────────────┼─────────────┘
//!                                                  │ one handler per topic
//!                                              Event Bus
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use relay_gateway::{GatewayConfig, GatewayService};
//! use shared_bus::InMemoryEventBus;
//!
//! let bus = Arc::new(InMemoryEventBus::new());
//! let service = GatewayService::new(GatewayConfig::from_env(), bus)?;
//! service.run(async { let _ = tokio::signal::ctrl_c().await; }).await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod delivery;
pub mod domain;
pub mod service;
pub mod telemetry;
pub mod ws;

// Re-exports for public API
pub use delivery::{
    ClientHandle, ClientRegistry, DeliveryCoordinator, DeliveryEntry, SubscribeOutcome,
    TopicSubscription,
};
pub use domain::{ConnectionId, GatewayConfig, GatewayError, GatewayResult};
pub use service::{GatewayService, RunningServer};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
