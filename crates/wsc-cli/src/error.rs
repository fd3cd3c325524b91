//! CLI-level errors: configuration validation, audit-log path rejection, and
//! the one-shot `--health-check` request.

use crate::logpath::LogPathError;
use thiserror::Error;

/// Errors surfaced by `wsc-cli` before or during startup.
#[derive(Debug, Error)]
pub enum CliError {
    /// `ClientConfig::validate` rejected the assembled configuration.
    #[error("invalid configuration: {0}")]
    Config(#[from] wsc_core::ConfigError),

    /// The audit-log path failed the log-file path contract.
    #[error("invalid audit log path: {0}")]
    LogPath(#[from] LogPathError),

    /// Opening or writing the audit log file failed.
    #[error("audit log I/O error: {0}")]
    AuditLogIo(#[from] std::io::Error),

    /// Starting the telemetry HTTP surface failed.
    #[error("failed to start telemetry surface: {0}")]
    Telemetry(#[from] wsc_telemetry::TelemetryError),

    /// The one-shot `--health-check` request could not be completed.
    #[error("health check request failed: {0}")]
    HealthCheck(#[from] reqwest::Error),
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;
