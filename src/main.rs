//! Pizza Telemetry — Entry Point
//!
//! Wires configuration, logging, the shared metric registry, the
//! periodic exporter, and the instrumented health server. Runs until
//! SIGINT.
//!
//! Wiring sequence:
//! 1. Load config.toml + validate (METRICS_API_KEY overrides the key)
//! 2. Init tracing (JSON structured logging), then log the loaded config
//! 3. Create the process-wide MetricRegistry
//! 4. Create OtlpHttpSink + HostSampler, spawn the Exporter
//! 5. Spawn health server with request instrumentation
//! 6. Wait for SIGINT → mark not ready → broadcast shutdown

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use pizza_telemetry::adapters::collector::OtlpHttpSink;
use pizza_telemetry::adapters::http::{HealthServer, HealthState};
use pizza_telemetry::adapters::system::HostSampler;
use pizza_telemetry::config::{self, CONFIG_PATH_ENV};
use pizza_telemetry::domain::MetricRegistry;
use pizza_telemetry::usecases::Exporter;

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration ───────────────────────────────
    let config_path =
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config.toml".to_string());
    let config = config::loader::load_config(&config_path)
        .context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(&config.service.log_level)
                }),
        )
        .json()
        .init();

    // The loader ran before any subscriber existed.
    info!(
        url = %config.metrics.url,
        source = %config.metrics.source,
        period_ms = config.metrics.period_ms,
        "Configuration loaded successfully"
    );
    if !config.metrics.has_api_key() {
        warn!("Metrics API key is empty, collector may reject pushes");
    }

    info!(
        name = %config.service.name,
        version = env!("CARGO_PKG_VERSION"),
        collector = %config.metrics.url,
        period_ms = config.metrics.period_ms,
        "Starting pizza telemetry"
    );

    // ── 3. Shutdown signal channel ──────────────────────────
    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);

    // ── 4. Shared registry ──────────────────────────────────
    let registry = Arc::new(MetricRegistry::new());

    // ── 5. Exporter: host sampler + OTLP/HTTP sink ──────────
    let sink = Arc::new(
        OtlpHttpSink::new(config.collector()).context("Failed to create collector client")?,
    );
    let sampler = Arc::new(HostSampler::new(config.metrics.precision));
    let exporter = Exporter::new(
        Arc::clone(&registry),
        sampler,
        sink,
        config.exporter(),
    );
    let exporter_shutdown = shutdown_tx.subscribe();
    let exporter_handle = tokio::spawn(async move {
        exporter.run(exporter_shutdown).await;
    });

    // ── 6. Health server with request instrumentation ───────
    let health = HealthState::new();
    let server = HealthServer::new(
        health.clone(),
        Arc::clone(&registry),
        config.service.bind_address.clone(),
    );
    let server_shutdown = shutdown_tx.subscribe();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.run(server_shutdown).await {
            error!(error = %e, "Health server failed");
        }
    });

    info!("All tasks spawned, telemetry is running");

    // ── 7. Wait for SIGINT ──────────────────────────────────
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for SIGINT");
    }
    info!("SIGINT received, initiating graceful shutdown");

    health.mark_not_ready();
    let _ = shutdown_tx.send(());

    let _ = tokio::time::timeout(Duration::from_secs(5), server_handle).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), exporter_handle).await;

    info!("Shutdown complete");
    Ok(())
}
