//! Exporter Use Case - Periodic Metrics Flush
//!
//! Every period: snapshot the registry, sample the host, build the
//! payload, and push it to the collector. Each cycle is an error
//! boundary: a failure is logged and the cycle dropped, and the next
//! cycle runs on schedule with fresh cumulative values.
//!
//! Flush flow:
//! 1. Snapshot `MetricRegistry`
//! 2. Sample CPU / memory (0 on failure)
//! 3. Build the OTLP/JSON payload
//! 4. Send through the `MetricSink`

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use crate::domain::payload::{self, PayloadContext};
use crate::domain::registry::MetricRegistry;
use crate::error::ExportError;
use crate::ports::sampler::{SystemSampler, sample_or_default};
use crate::ports::sink::MetricSink;

/// Default flush period.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(10);

/// Exporter tuning.
#[derive(Debug, Clone)]
pub struct ExporterSettings {
  /// Time between flush cycles.
  pub period: Duration,
  /// Static attributes and resource identity for every payload.
  pub context: PayloadContext,
}

impl Default for ExporterSettings {
  fn default() -> Self {
    Self {
      period: DEFAULT_PERIOD,
      context: PayloadContext::default(),
    }
  }
}

/// Result of a single flush cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
  /// The collector accepted the payload.
  Delivered,
  /// The cycle failed and its payload was discarded.
  Dropped,
}

/// Periodic background exporter.
///
/// Only reads the registry; a failed or successful send leaves every
/// counter untouched.
pub struct Exporter {
  registry: Arc<MetricRegistry>,
  sampler: Arc<dyn SystemSampler>,
  sink: Arc<dyn MetricSink>,
  settings: ExporterSettings,
  /// Cycles delivered since start.
  delivered: AtomicU64,
  /// Cycles dropped since start.
  dropped: AtomicU64,
}

impl Exporter {
  /// Create a new exporter.
  pub fn new(
    registry: Arc<MetricRegistry>,
    sampler: Arc<dyn SystemSampler>,
    sink: Arc<dyn MetricSink>,
    settings: ExporterSettings,
  ) -> Self {
    Self {
      registry,
      sampler,
      sink,
      settings,
      delivered: AtomicU64::new(0),
      dropped: AtomicU64::new(0),
    }
  }

  /// Run flush cycles until the shutdown broadcast fires.
  ///
  /// The first cycle runs one full period after start. Cycles run
  /// inline, so a slow send delays the next tick instead of overlapping
  /// it; ticks missed meanwhile are skipped.
  #[instrument(skip(self, shutdown_rx), fields(period = ?self.settings.period))]
  pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) {
    let period = self.settings.period;
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("Metrics exporter started");

    loop {
      tokio::select! {
        biased;
        _ = shutdown_rx.recv() => {
          info!(
            delivered = self.delivered_count(),
            dropped = self.dropped_count(),
            "Metrics exporter stopped"
          );
          return;
        }
        _ = ticker.tick() => {
          self.flush().await;
        }
      }
    }
  }

  /// Run one cycle, logging and swallowing any failure.
  #[instrument(skip(self))]
  pub async fn flush(&self) -> FlushOutcome {
    match self.run_cycle().await {
      Ok(()) => {
        let delivered = self.delivered.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(delivered, "Metrics flush delivered");
        FlushOutcome::Delivered
      }
      Err(e) => {
        let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
        warn!(error = %e, dropped, "Metrics flush dropped");
        FlushOutcome::Dropped
      }
    }
  }

  /// Snapshot, sample, build, and send once.
  ///
  /// # Errors
  /// Returns the sink's `ExportError`; sampling failures are absorbed.
  #[instrument(skip(self))]
  pub async fn run_cycle(&self) -> Result<(), ExportError> {
    let snapshot = self.registry.snapshot();
    let system = sample_or_default(self.sampler.as_ref());
    let payload = payload::build(&snapshot, &system, &self.settings.context);

    debug!(
      endpoints = snapshot.requests.len(),
      cpu = system.cpu_percent,
      memory = system.memory_percent,
      "Metrics payload built"
    );

    self.sink.send(&payload).await
  }

  /// Cycles delivered since start.
  pub fn delivered_count(&self) -> u64 {
    self.delivered.load(Ordering::Relaxed)
  }

  /// Cycles dropped since start.
  pub fn dropped_count(&self) -> u64 {
    self.dropped.load(Ordering::Relaxed)
  }
}
