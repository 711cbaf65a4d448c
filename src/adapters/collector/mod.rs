//! Collector Adapters
//!
//! Delivers metric payloads to a remote OTLP/HTTP JSON endpoint
//! (Grafana Cloud, an OpenTelemetry Collector, etc.).

pub mod otlp_http;

pub use otlp_http::{CollectorConfig, OtlpHttpSink};
