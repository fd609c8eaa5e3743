//! Gateway error types.

use crate::domain::config::ConfigError;

/// Gateway service error
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Server socket bind error
    #[error("server bind error: {0}")]
    Bind(#[source] std::io::Error),

    /// Server stopped with an I/O failure
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Result alias for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;
