//! Logging setup for the gateway binary.

use std::env;
use tracing_subscriber::{fmt, EnvFilter};

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Filter directive (trace, debug, info, warn, error, or a full `EnvFilter` spec)
    pub log_level: String,
    /// Emit JSON formatted logs
    pub json_logs: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl LogConfig {
    /// Create configuration from environment variables.
    ///
    /// - `RELAY_LOG_LEVEL` or `RUST_LOG`: Log filter (default: info)
    /// - `RELAY_JSON_LOGS`: Enable JSON logs (default: false)
    pub fn from_env() -> Self {
        Self {
            log_level: env::var("RELAY_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),
            json_logs: env::var("RELAY_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(false),
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.log_level).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Install the global tracing subscriber.
pub fn init_tracing(config: &LogConfig) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let builder = fmt()
        .with_env_filter(config.filter())
        .with_target(true)
        .with_thread_ids(true);

    if config.json_logs {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    }
}
