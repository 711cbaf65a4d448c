//! Health Check Server - Liveness and Readiness Probes
//!
//! Exposes /live and /ready endpoints via axum 0.7 for container
//! health checks. Every route is wrapped in the request
//! instrumentation layer, so probes show up in the `requests` metric.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use tokio::sync::broadcast;
use tracing::{info, instrument};

use super::instrumentation::ObservedRouter;
use crate::domain::registry::MetricRegistry;

/// Shared readiness flag polled by the readiness probe.
#[derive(Debug, Clone)]
pub struct HealthState {
    /// Cleared when graceful shutdown begins.
    pub ready: Arc<AtomicBool>,
}

impl HealthState {
    /// Create a new health state (ready by default).
    pub fn new() -> Self {
        Self {
            ready: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Check if the service is ready to serve traffic.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }

    /// Flip readiness off ahead of shutdown.
    pub fn mark_not_ready(&self) {
        self.ready.store(false, Ordering::Relaxed);
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

/// Axum-based health check HTTP server.
pub struct HealthServer {
    /// Health state shared with `main`.
    state: HealthState,
    /// Registry fed by the instrumentation layer.
    registry: Arc<MetricRegistry>,
    /// Bind address, e.g. `0.0.0.0:3000`.
    bind_address: String,
}

impl HealthServer {
    /// Create a new health server.
    pub fn new(state: HealthState, registry: Arc<MetricRegistry>, bind_address: String) -> Self {
        Self {
            state,
            registry,
            bind_address,
        }
    }

    /// Routes served by this server, instrumented.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/live", get(Self::liveness))
            .route("/ready", get(Self::readiness))
            .with_state(self.state.clone())
            .with_request_metrics(Arc::clone(&self.registry))
    }

    /// Serve until the shutdown broadcast fires.
    #[instrument(skip(self, shutdown_rx), fields(address = %self.bind_address))]
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) -> anyhow::Result<()> {
        let app = self.router();
        let listener = tokio::net::TcpListener::bind(&self.bind_address).await?;

        info!(address = %self.bind_address, "Health server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }

    /// Liveness probe: always returns 200 if the process is running.
    async fn liveness() -> impl IntoResponse {
        (StatusCode::OK, "OK")
    }

    /// Readiness probe: 503 once shutdown has begun.
    async fn readiness(State(state): State<HealthState>) -> impl IntoResponse {
        if state.is_ready() {
            (StatusCode::OK, "READY")
        } else {
            (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
        }
    }
}
