//! Metric Sink Port - Payload Delivery Interface
//!
//! Defines the trait for delivering one flush cycle's payload to a
//! remote collector. Implementations make a single attempt per call;
//! the exporter never retries.

use async_trait::async_trait;

use crate::domain::payload::MetricPayload;
use crate::error::ExportError;

/// Destination for exported metric payloads.
#[async_trait]
pub trait MetricSink: Send + Sync + 'static {
  /// Deliver one payload.
  ///
  /// # Errors
  /// Returns `ExportError` on serialization failure, transport failure,
  /// or a non-2xx response from the collector.
  async fn send(&self, payload: &MetricPayload) -> Result<(), ExportError>;
}
