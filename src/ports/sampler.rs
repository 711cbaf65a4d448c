//! System Sampler Port - Host Utilization Readings
//!
//! Defines how the exporter obtains CPU and memory utilization at
//! flush time. Readings are point samples with no history.

use tracing::warn;

use crate::domain::system::SystemSample;
use crate::error::SamplingError;

/// Source of host CPU and memory utilization.
pub trait SystemSampler: Send + Sync + 'static {
  /// 1-minute load average per logical core, as a percentage.
  ///
  /// # Errors
  /// Returns `SamplingError` if the host statistic cannot be read.
  fn sample_cpu(&self) -> Result<f64, SamplingError>;

  /// Used memory as a percentage of total memory.
  ///
  /// # Errors
  /// Returns `SamplingError` if the host statistic cannot be read.
  fn sample_memory(&self) -> Result<f64, SamplingError>;
}

/// Sample both readings, substituting `0.0` for any that fail.
pub fn sample_or_default(sampler: &dyn SystemSampler) -> SystemSample {
  let cpu_percent = sampler.sample_cpu().unwrap_or_else(|e| {
    warn!(error = %e, "CPU sample unavailable, reporting 0");
    0.0
  });
  let memory_percent = sampler.sample_memory().unwrap_or_else(|e| {
    warn!(error = %e, "Memory sample unavailable, reporting 0");
    0.0
  });

  SystemSample {
    cpu_percent,
    memory_percent,
  }
}
