//! Configuration Module - TOML-based Service Configuration
//!
//! Loads and validates configuration from `config.toml` with
//! environment variable overrides for secrets. The collector URL,
//! credential, source tag, and flush period all live here.

pub mod loader;

use std::time::Duration;

use serde::Deserialize;

use crate::adapters::collector::CollectorConfig;
use crate::domain::payload::PayloadContext;
use crate::usecases::exporter::ExporterSettings;

/// Env var holding the collector bearer credential.
pub const API_KEY_ENV: &str = "METRICS_API_KEY";

/// Env var overriding the config file path.
pub const CONFIG_PATH_ENV: &str = "PIZZA_TELEMETRY_CONFIG";

/// Top-level service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Service identity and HTTP binding.
  pub service: ServiceConfig,
  /// Metrics export settings.
  pub metrics: MetricsConfig,
}

/// Service identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
  /// Service name, reported as the resource `service.name`.
  #[serde(default = "default_service_name")]
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// HTTP bind address for the health probes.
  #[serde(default = "default_bind_address")]
  pub bind_address: String,
}

/// Metrics collector configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
  /// OTLP/HTTP JSON metrics endpoint.
  pub url: String,
  /// Bearer credential. `METRICS_API_KEY` takes precedence.
  #[serde(default)]
  pub api_key: String,
  /// Static `source` attribute on every data point.
  pub source: String,
  /// Flush period (milliseconds).
  #[serde(default = "default_period_ms")]
  pub period_ms: u64,
  /// Timeout for a single push (milliseconds).
  #[serde(default = "default_timeout_ms")]
  pub timeout_ms: u64,
  /// Decimal places kept in CPU/memory percentages.
  #[serde(default = "default_precision")]
  pub precision: u32,
}

impl MetricsConfig {
  /// Whether a bearer credential is configured. An empty key is allowed
  /// but startup warns about it.
  pub fn has_api_key(&self) -> bool {
    !self.api_key.is_empty()
  }
}

impl AppConfig {
  /// Collector client settings.
  pub fn collector(&self) -> CollectorConfig {
    CollectorConfig {
      url: self.metrics.url.clone(),
      api_key: self.metrics.api_key.clone(),
      timeout: Duration::from_millis(self.metrics.timeout_ms),
    }
  }

  /// Exporter schedule and payload identity.
  pub fn exporter(&self) -> ExporterSettings {
    let mut context = PayloadContext::with_source(self.metrics.source.clone());
    context.service_name = Some(self.service.name.clone());

    ExporterSettings {
      period: Duration::from_millis(self.metrics.period_ms),
      context,
    }
  }
}

// Default value functions for serde

fn default_service_name() -> String {
  "jwt-pizza-service".to_string()
}

fn default_log_level() -> String {
  "info".to_string()
}

fn default_bind_address() -> String {
  "0.0.0.0:3000".to_string()
}

fn default_period_ms() -> u64 {
  10_000
}

fn default_timeout_ms() -> u64 {
  5_000
}

fn default_precision() -> u32 {
  2
}
