//! Relay Gateway service - main entry point.
//!
//! Serves the WebSocket route plus `/health` and `/stats`, and runs the
//! periodic stale-entry sweep.

use crate::delivery::DeliveryCoordinator;
use crate::domain::{GatewayConfig, GatewayError, GatewayResult};
use crate::ws::{SessionConfig, WebSocketHandler};
use axum::{
    extract::{ws::WebSocketUpgrade, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use shared_bus::BrokerContext;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Relay Gateway service state
pub struct GatewayService {
    config: GatewayConfig,
    coordinator: Arc<DeliveryCoordinator>,
}

impl GatewayService {
    /// Create a new gateway service on top of an event bus
    pub fn new(config: GatewayConfig, broker: Arc<dyn BrokerContext>) -> GatewayResult<Self> {
        config.validate()?;

        Ok(Self {
            config,
            coordinator: Arc::new(DeliveryCoordinator::new(broker)),
        })
    }

    pub fn coordinator(&self) -> Arc<DeliveryCoordinator> {
        Arc::clone(&self.coordinator)
    }

    /// Build the HTTP router
    pub fn router(&self) -> Router {
        let state = AppState {
            coordinator: Arc::clone(&self.coordinator),
            session: SessionConfig::from(&self.config),
        };

        let mut router = Router::new()
            .route("/health", get(health_check))
            .route("/stats", get(stats));
        if self.config.websocket.enabled {
            router = router.route(&self.config.websocket.path, get(ws_upgrade));
        }

        router.layer(TraceLayer::new_for_http()).with_state(state)
    }

    /// Bind the configured address and start serving in the background
    pub async fn listen(&self) -> GatewayResult<RunningServer> {
        let addr = self.config.ws_addr();
        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            error!(addr = %addr, error = %e, "Failed to bind gateway listener");
            GatewayError::Bind(e)
        })?;
        let local_addr = listener.local_addr().map_err(GatewayError::Bind)?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let sweeper = if self.config.delivery.sweep_enabled {
            Some(tokio::spawn(sweep_loop(
                Arc::clone(&self.coordinator),
                self.config.delivery.sweep_interval,
                shutdown_rx.clone(),
            )))
        } else {
            None
        };

        let router = self.router();
        let mut server_shutdown = shutdown_rx;
        let server = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = server_shutdown.changed().await;
                })
                .await
                .map_err(GatewayError::Serve)
        });

        info!(addr = %local_addr, path = %self.config.websocket.path, "Relay gateway listening");

        Ok(RunningServer {
            addr: local_addr,
            shutdown_tx,
            server,
            sweeper,
        })
    }

    /// Serve until `shutdown` resolves or the server fails
    pub async fn run<F>(self, shutdown: F) -> GatewayResult<()>
    where
        F: Future<Output = ()>,
    {
        let mut running = self.listen().await?;

        tokio::select! {
            _ = shutdown => {
                info!("Received shutdown signal");
                running.shutdown().await
            }
            result = &mut running.server => {
                running.stop_sweeper();
                let result = flatten(result);
                if let Err(e) = &result {
                    error!(error = %e, "Gateway server error");
                }
                result
            }
        }
    }
}

/// A gateway bound to an address and serving in the background
pub struct RunningServer {
    addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    server: JoinHandle<GatewayResult<()>>,
    sweeper: Option<JoinHandle<()>>,
}

impl RunningServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting connections and wait for the server to finish
    pub async fn shutdown(&mut self) -> GatewayResult<()> {
        let _ = self.shutdown_tx.send(true);
        self.stop_sweeper();
        let result = flatten((&mut self.server).await);
        info!("Relay gateway stopped");
        result
    }

    fn stop_sweeper(&mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
        }
    }
}

fn flatten(result: Result<GatewayResult<()>, tokio::task::JoinError>) -> GatewayResult<()> {
    match result {
        Ok(inner) => inner,
        Err(e) => Err(GatewayError::Serve(std::io::Error::other(e))),
    }
}

/// Prune stale delivery entries every `interval` until shutdown
pub async fn sweep_loop(
    coordinator: Arc<DeliveryCoordinator>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    // Skip the immediate first tick
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                coordinator.sweep();
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    coordinator: Arc<DeliveryCoordinator>,
    session: SessionConfig,
}

async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    let max_message_size = state.session.max_message_size;
    ws.max_message_size(max_message_size).on_upgrade(move |socket| async move {
        WebSocketHandler::new(state.coordinator, state.session)
            .handle(socket)
            .await;
    })
}

async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.coordinator.stats())
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "relay-gateway",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
