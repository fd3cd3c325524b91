//! Telemetry surface errors.

use std::net::SocketAddr;
use thiserror::Error;

/// Errors raised while standing up or tearing down the telemetry HTTP surface.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Binding the metrics or health listener failed.
    #[error("failed to bind telemetry listener on {addr}: {source}")]
    Bind {
        /// The address that failed to bind.
        addr: SocketAddr,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The server task panicked or was dropped before shutdown completed.
    #[error("telemetry server task failed: {0}")]
    Join(String),
}

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
