//! OTLP/HTTP Collector Client - JSON Metrics Push
//!
//! Wraps reqwest to POST a built payload to the configured collector
//! with bearer authentication. One attempt per call; a failed push is
//! reported to the exporter, which drops the cycle.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, instrument};

use crate::domain::payload::MetricPayload;
use crate::error::ExportError;
use crate::ports::sink::MetricSink;

/// Configuration for the collector client.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
  /// Full metrics ingestion URL.
  pub url: String,
  /// Bearer credential sent in the `Authorization` header.
  pub api_key: String,
  /// Upper bound on a single push.
  pub timeout: Duration,
}

impl Default for CollectorConfig {
  fn default() -> Self {
    Self {
      url: "http://127.0.0.1:4318/v1/metrics".to_string(),
      api_key: String::new(),
      timeout: Duration::from_secs(5),
    }
  }
}

/// HTTP sink pushing OTLP/JSON payloads to a single collector.
pub struct OtlpHttpSink {
  /// Underlying HTTP client.
  http: Client,
  /// Client configuration.
  config: CollectorConfig,
}

impl OtlpHttpSink {
  /// Create a new collector client.
  pub fn new(config: CollectorConfig) -> Result<Self> {
    let http = Client::builder()
      .timeout(config.timeout)
      .pool_max_idle_per_host(1)
      .build()
      .context("Failed to build HTTP client")?;

    Ok(Self { http, config })
  }

  /// Collector URL this sink pushes to.
  pub fn url(&self) -> &str {
    &self.config.url
  }
}

#[async_trait]
impl MetricSink for OtlpHttpSink {
  #[instrument(skip(self, payload), fields(url = %self.config.url))]
  async fn send(&self, payload: &MetricPayload) -> Result<(), ExportError> {
    let body = serde_json::to_vec(payload)?;
    let bytes = body.len();

    let response = self
      .http
      .post(&self.config.url)
      .bearer_auth(&self.config.api_key)
      .header(CONTENT_TYPE, "application/json")
      .body(body)
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(ExportError::Status {
        status: status.as_u16(),
        body,
      });
    }

    debug!(status = %status, bytes, "Metrics pushed");
    Ok(())
  }
}
