//! Gateway configuration with validation.

use serde::{Deserialize, Serialize};
use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Main gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// WebSocket server configuration
    pub websocket: WebSocketConfig,
    /// Delivery bridge configuration
    pub delivery: DeliveryConfig,
    /// Event bus configuration
    pub bus: BusConfig,
}

impl GatewayConfig {
    /// Build configuration from the defaults overlaid with environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `RELAY_WS_HOST`: WebSocket bind address (default: 0.0.0.0)
    /// - `RELAY_WS_PORT`: WebSocket port (default: 8546)
    /// - `RELAY_WS_PATH`: WebSocket route (default: /)
    /// - `RELAY_SUBSCRIBE_EVENT`: Inbound subscription event name (default: delivery)
    /// - `RELAY_SWEEP_INTERVAL_SECS`: Stale entry sweep interval, 0 disables (default: 60)
    /// - `RELAY_BUS_CAPACITY`: Event bus channel capacity (default: 1000)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("RELAY_WS_HOST").and_then(|v| v.parse().ok()) {
            config.websocket.host = host;
        }
        if let Some(port) = lookup("RELAY_WS_PORT").and_then(|v| v.parse().ok()) {
            config.websocket.port = port;
        }
        if let Some(path) = lookup("RELAY_WS_PATH") {
            config.websocket.path = path;
        }
        if let Some(event) = lookup("RELAY_SUBSCRIBE_EVENT") {
            config.delivery.subscribe_event = event;
        }
        if let Some(secs) = lookup("RELAY_SWEEP_INTERVAL_SECS").and_then(|v| v.parse::<u64>().ok())
        {
            config.delivery.sweep_enabled = secs > 0;
            if secs > 0 {
                config.delivery.sweep_interval = Duration::from_secs(secs);
            }
        }
        if let Some(capacity) = lookup("RELAY_BUS_CAPACITY").and_then(|v| v.parse().ok()) {
            config.bus.channel_capacity = capacity;
        }

        config
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.websocket.path.starts_with('/') {
            return Err(ConfigError::InvalidPath(self.websocket.path.clone()));
        }

        if self.websocket.message_buffer_size == 0 {
            return Err(ConfigError::InvalidLimit(
                "message_buffer_size cannot be 0".into(),
            ));
        }

        if self.websocket.max_message_size == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_message_size cannot be 0".into(),
            ));
        }

        if self.delivery.subscribe_event.is_empty() {
            return Err(ConfigError::Invalid(
                "subscribe_event cannot be empty".into(),
            ));
        }

        if self.delivery.sweep_enabled && self.delivery.sweep_interval.is_zero() {
            return Err(ConfigError::InvalidInterval(
                "sweep_interval cannot be 0 when sweeping is enabled".into(),
            ));
        }

        if self.bus.channel_capacity == 0 {
            return Err(ConfigError::InvalidLimit(
                "channel_capacity cannot be 0".into(),
            ));
        }

        Ok(())
    }

    /// Get WebSocket server bind address
    pub fn ws_addr(&self) -> SocketAddr {
        SocketAddr::new(self.websocket.host, self.websocket.port)
    }
}

/// WebSocket server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSocketConfig {
    /// Bind address
    pub host: IpAddr,
    /// Port (default: 8546)
    pub port: u16,
    /// Route the upgrade is served on
    pub path: String,
    /// Enable WebSocket server
    pub enabled: bool,
    /// Outbound queue size per connection
    pub message_buffer_size: usize,
    /// Largest inbound frame accepted, in bytes
    pub max_message_size: usize,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 8546,
            path: "/".to_string(),
            enabled: true,
            message_buffer_size: 1024,
            max_message_size: 64 * 1024,
        }
    }
}

/// Delivery bridge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Name of the inbound event carrying subscription requests
    pub subscribe_event: String,
    /// Periodically prune entries whose client disconnected
    pub sweep_enabled: bool,
    /// Interval between sweeps
    #[serde(with = "humantime_serde")]
    pub sweep_interval: Duration,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            subscribe_event: "delivery".to_string(),
            sweep_enabled: true,
            sweep_interval: Duration::from_secs(60),
        }
    }
}

/// Event bus configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Events buffered per handler before it lags
    pub channel_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            channel_capacity: shared_bus::DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// WebSocket route is not absolute
    #[error("invalid websocket path: {0}")]
    InvalidPath(String),
    /// Invalid size or count limit
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
    /// Invalid interval value
    #[error("invalid interval: {0}")]
    InvalidInterval(String),
    /// General configuration error
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
