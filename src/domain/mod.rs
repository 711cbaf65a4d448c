//! Domain layer - Metric state and wire schema.
//!
//! Pure telemetry logic: the shared counter registry, host utilization
//! math, and the OTLP/JSON payload builder. No I/O happens here.

pub mod payload;
pub mod registry;
pub mod system;

// Re-export core types for convenience
pub use payload::{MetricKind, MetricPayload, PayloadContext};
pub use registry::{
    EndpointKey, LatencyKind, MetricRegistry, RegistrySnapshot, SessionChange,
};
pub use system::SystemSample;
