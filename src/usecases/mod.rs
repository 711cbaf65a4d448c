//! Use Cases Layer - Application Workflows
//!
//! Orchestrates domain logic with port interfaces.
//!
//! Use cases:
//! - `Exporter`: Periodic snapshot → build → send flush loop

pub mod exporter;

pub use exporter::{Exporter, ExporterSettings, FlushOutcome};
