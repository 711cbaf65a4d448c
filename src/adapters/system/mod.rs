//! Host system adapters.

pub mod host;

pub use host::HostSampler;
