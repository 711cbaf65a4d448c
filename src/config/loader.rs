//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, applying environment overrides,
//! validating all parameters, and providing clear error messages for
//! misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};

use super::{API_KEY_ENV, AppConfig};

/// Load and validate configuration from a TOML file.
///
/// Runs before logging is installed (the log level lives in the file),
/// so it reports nothing itself. The caller logs the outcome, including
/// an empty API key (see [`super::MetricsConfig::has_api_key`]).
///
/// # Arguments
/// * `path` - Path to the config.toml file
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  parse_config(&content, std::env::var(API_KEY_ENV).ok())
}

/// Parse TOML content, apply the credential override, and validate.
///
/// # Errors
/// Returns an error if parsing or validation fails.
pub fn parse_config(content: &str, api_key_override: Option<String>) -> Result<AppConfig> {
  let mut config: AppConfig =
    toml::from_str(content).with_context(|| "Failed to parse config.toml")?;

  if let Some(key) = api_key_override.filter(|k| !k.is_empty()) {
    config.metrics.api_key = key;
  }

  validate_config(&config)?;

  Ok(config)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - A usable collector URL
/// - Non-empty source tag
/// - Positive period and timeout
/// - Sensible percentage precision
fn validate_config(config: &AppConfig) -> Result<()> {
  let metrics = &config.metrics;

  anyhow::ensure!(!metrics.url.is_empty(), "Metrics URL must not be empty");
  anyhow::ensure!(
    metrics.url.starts_with("http://") || metrics.url.starts_with("https://"),
    "Metrics URL must be http(s), got {}",
    metrics.url
  );
  anyhow::ensure!(
    !metrics.source.is_empty(),
    "Metrics source tag must not be empty"
  );
  anyhow::ensure!(
    metrics.period_ms > 0,
    "Metrics period_ms must be positive"
  );
  anyhow::ensure!(
    metrics.timeout_ms > 0,
    "Metrics timeout_ms must be positive"
  );
  anyhow::ensure!(
    metrics.precision <= 6,
    "Metrics precision must be in [0, 6], got {}",
    metrics.precision
  );

  anyhow::ensure!(
    !config.service.bind_address.is_empty(),
    "Service bind_address must not be empty"
  );

  Ok(())
}
