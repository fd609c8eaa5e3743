//! # Relay Gateway
//!
//! Runs the WebSocket delivery bridge on top of an in-process event bus.
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging
//! 2. Load configuration from the environment
//! 3. Create the event bus
//! 4. Serve until Ctrl+C

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};

use relay_gateway::telemetry::{init_tracing, LogConfig};
use relay_gateway::{GatewayConfig, GatewayService};
use shared_bus::{EventPublisher, InMemoryEventBus};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(&LogConfig::from_env()).context("failed to install tracing subscriber")?;

    let config = GatewayConfig::from_env();
    let bus = Arc::new(InMemoryEventBus::with_capacity(config.bus.channel_capacity));

    let service = match GatewayService::new(config, bus.clone()) {
        Ok(service) => service,
        Err(e) => {
            error!(error = %e, "Error creating relay gateway");
            return Err(e.into());
        }
    };

    info!(
        version = relay_gateway::VERSION,
        bus_capacity = bus.capacity(),
        "Starting relay gateway"
    );
    service
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for Ctrl+C");
            }
        })
        .await?;

    info!(events_published = bus.events_published(), "Relay gateway exited");
    Ok(())
}
