//! Domain types for the Relay Gateway.
//!
//! Connection identity, configuration, and error handling.

pub mod config;
pub mod connection;
pub mod error;

// Re-exports for convenience
pub use config::{BusConfig, ConfigError, DeliveryConfig, GatewayConfig, WebSocketConfig};
pub use connection::ConnectionId;
pub use error::{GatewayError, GatewayResult};
