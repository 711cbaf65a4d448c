//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the exporter requires from the
//! outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `SystemSampler`: Host CPU and memory readings
//! - `MetricSink`: Delivery of a built payload to a collector

pub mod sampler;
pub mod sink;

pub use sampler::{SystemSampler, sample_or_default};
pub use sink::MetricSink;
