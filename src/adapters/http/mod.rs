//! HTTP Server Adapters
//!
//! Request instrumentation middleware for the host application's router,
//! plus the service's own health probes.

pub mod health;
pub mod instrumentation;

pub use health::{HealthServer, HealthState};
pub use instrumentation::{ObservedRouter, track_requests};
