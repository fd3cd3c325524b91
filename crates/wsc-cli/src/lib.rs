//! # wsc-cli
//!
//! Command-line entry point for the wsc WebSocket client connection
//! lifecycle engine: argument parsing, startup wiring (config, audit log,
//! telemetry surface), and the signal-driven shutdown sequence.

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::must_use_candidate
)]

pub mod callbacks;
pub mod cli;
pub mod error;
pub mod logpath;

use callbacks::ConsoleCallbacks;
use cli::Cli;
use clap::{CommandFactory, Parser};
use error::{CliError, CliResult};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use wsc_core::{ClientConfig, SessionId};
use wsc_telemetry::TelemetryServer;
use wsc_transport::{AuditLog, WsClient};

/// Crate version, reported by `--version` (handled by clap) and `--build-info`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run the CLI to completion. Returns the process exit code: 0 on a
/// user-input error (usage is printed first), 0 on normal shutdown, and a
/// non-zero code reserved for internal faults (a telemetry bind failure, for
/// instance) per the CLI's exit-code contract.
pub async fn run() -> i32 {
    let cli = Cli::parse();

    if cli.build_info {
        print_build_info();
        return 0;
    }

    if cli.health_check {
        return match health_check(&cli).await {
            Ok(code) => code,
            Err(err) => {
                eprintln!("error: {err}");
                1
            }
        };
    }

    let Some(url) = cli.url.clone() else {
        eprintln!("{}", Cli::command().render_usage());
        return 0;
    };

    let _log_guard = init_tracing(&cli);

    let config = match build_config(&cli, url) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return 0;
        }
    };

    let session_id = SessionId::generate();

    let audit = match open_audit_log(&cli, &session_id, &config) {
        Ok(audit) => audit,
        Err(err) => {
            eprintln!("error: {err}");
            return 0;
        }
    };

    let monitoring_enabled = config.monitoring_enabled;
    let metrics_port = config.metrics_port;
    let health_port = config.health_port;

    let callbacks = Arc::new(ConsoleCallbacks::new(cli.verbose));
    let client = WsClient::spawn(config, callbacks, audit, Some(session_id.clone()));

    let telemetry = if monitoring_enabled {
        match TelemetryServer::spawn(metrics_port, health_port, client.stats_handle(), client.state_handle(), session_id).await {
            Ok(server) => Some(server),
            Err(err) => {
                eprintln!("error: {err}");
                client.stop().await;
                return 1;
            }
        }
    } else {
        None
    };

    wait_for_shutdown_signal().await;

    client.stop().await;
    if let Some(telemetry) = telemetry {
        telemetry.shutdown().await;
    }

    0
}

fn build_config(cli: &Cli, url: String) -> CliResult<ClientConfig> {
    let mut config = ClientConfig::new(url);
    config.tls_policy = cli.tls_policy();
    config.auto_ping_disabled = cli.no_auto_ping;

    if let Some(n) = cli.max_fast_retries {
        config = config.with_max_fast_retries(n);
    }
    if let Some(secs) = cli.slow_retry_delay {
        config = config.with_slow_retry_delay(Duration::from_secs(secs));
    }
    if cli.monitoring_enabled() {
        config = config.with_monitoring(cli.metrics_port.unwrap_or(9090), cli.health_port.unwrap_or(8080));
    }

    config.validate()?;
    Ok(config)
}

fn open_audit_log(cli: &Cli, session_id: &SessionId, config: &ClientConfig) -> CliResult<Option<Arc<AuditLog>>> {
    let Some(raw) = &cli.audit_log else {
        return Ok(None);
    };
    let cwd = std::env::current_dir().map_err(CliError::AuditLogIo)?;
    let path = if raw.is_empty() {
        logpath::auto_generate_path(&cwd, session_id.as_str())
    } else {
        logpath::validate_log_path(&cwd, Path::new(raw))?
    };
    let log = AuditLog::open(&path, session_id, &config.url, VERSION).map_err(CliError::AuditLogIo)?;
    Ok(Some(Arc::new(log)))
}

fn init_tracing(cli: &Cli) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if let Some(path) = &cli.log_file {
        match std::fs::OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                let (non_blocking, guard) = tracing_appender::non_blocking(file);
                let _ = fmt().with_env_filter(filter).with_writer(non_blocking).with_ansi(false).try_init();
                return Some(guard);
            }
            Err(err) => {
                eprintln!("warning: failed to open log file {}: {err}; logging to stderr", path.display());
            }
        }
    }
    let _ = fmt().with_env_filter(filter).try_init();
    None
}

fn print_build_info() {
    println!("wsc {VERSION}");
    println!("target: {}-{}", std::env::consts::ARCH, std::env::consts::OS);
}

async fn health_check(cli: &Cli) -> CliResult<i32> {
    let port = cli.health_port.unwrap_or(8080);
    let url = format!("http://127.0.0.1:{port}/health");
    let response = reqwest::get(&url).await?;
    let healthy = response.status().is_success();
    let body = response.text().await.unwrap_or_default();
    println!("{body}");
    Ok(i32::from(!healthy))
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sig) => sig,
            Err(err) => {
                tracing::warn!(%err, "failed to install SIGTERM handler; watching SIGINT only");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_config_rejects_bad_url() {
        let cli = Cli::parse_from(["wsc", "not-a-url"]);
        let err = build_config(&cli, "not-a-url".to_string()).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn build_config_applies_retry_overrides() {
        let cli = Cli::parse_from(["wsc", "wss://example/ws", "-r", "2", "-t", "10"]);
        let config = build_config(&cli, "wss://example/ws".to_string()).unwrap();
        assert_eq!(config.max_fast_retries, 2);
        assert_eq!(config.slow_retry_delay, Duration::from_secs(10));
    }

    #[test]
    fn build_config_enables_monitoring_from_metrics_port() {
        let cli = Cli::parse_from(["wsc", "wss://example/ws", "--metrics-port", "9900"]);
        let config = build_config(&cli, "wss://example/ws".to_string()).unwrap();
        assert!(config.monitoring_enabled);
        assert_eq!(config.metrics_port, 9900);
        assert_eq!(config.health_port, 8080);
    }
}
