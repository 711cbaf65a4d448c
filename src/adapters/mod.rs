//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (HTTP client, host statistics) and provides
//! the axum middleware the host application mounts.
//!
//! Adapter categories:
//! - `collector`: OTLP/HTTP JSON push to the metrics collector
//! - `http`: Request instrumentation middleware and health probes
//! - `system`: Host CPU and memory sampling via sysinfo

pub mod collector;
pub mod http;
pub mod system;
