//! Telemetry Error Taxonomy
//!
//! Errors produced inside the metrics pipeline. None of them are fatal:
//! sampling errors are replaced by a default value and export errors
//! drop the current flush cycle.

use thiserror::Error;

/// Host statistics could not be read.
#[derive(Debug, Error)]
pub enum SamplingError {
    /// The requested host statistic is unavailable on this platform.
    #[error("host statistic unavailable: {0}")]
    Unavailable(String),
}

/// A flush cycle failed to reach the collector.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The payload could not be encoded as JSON.
    #[error("failed to serialize metrics payload: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The request never produced a response (DNS, connect, timeout).
    #[error("metrics transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The collector answered with a non-2xx status.
    #[error("collector rejected metrics with HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },
}
