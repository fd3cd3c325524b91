//! CLI argument parsing: the flag contract of a single `wsc` invocation.

use clap::Parser;

/// Connect to a WebSocket endpoint and drive the connection lifecycle engine
/// until shutdown.
#[derive(Parser, Debug)]
#[command(name = "wsc", version, about = "WebSocket client connection lifecycle engine")]
pub struct Cli {
    /// Target URL; must begin with ws:// or wss://. Omitted when using
    /// --build-info or --health-check.
    pub url: Option<String>,

    /// Skip TLS certificate verification quietly. For trusted test fixtures only.
    #[arg(short = 'n', long = "skip-verify")]
    pub skip_verify: bool,

    /// Force TLS certificate verification even if -n was also given.
    #[arg(short = 'f', long = "force-verify")]
    pub force_verify: bool,

    /// Disable the Heartbeat Scheduler's outbound pings (inbound pings are still answered).
    #[arg(short = 'd', long = "no-auto-ping")]
    pub no_auto_ping: bool,

    /// Verbose logging, including accounting-only ping/pong frames.
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Interactive REPL mode. Reserved: the current build runs non-interactively.
    #[arg(short = 'i', long = "interactive")]
    pub interactive: bool,

    /// Enable per-frame audit logging. Omit PATH to auto-generate a
    /// session-named file in the current working directory.
    #[arg(short = 'l', long = "audit-log", num_args = 0..=1, default_missing_value = "", value_name = "PATH")]
    pub audit_log: Option<String>,

    /// Operational log file (distinct from the audit log).
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<std::path::PathBuf>,

    /// Maximum fast-retry count before the retry policy enters its slow,
    /// unlimited phase.
    #[arg(short = 'r', long = "max-fast-retries", value_name = "N")]
    pub max_fast_retries: Option<u32>,

    /// Delay between slow-phase retries, in seconds (1-60).
    #[arg(short = 't', long = "slow-retry-delay", value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..=60))]
    pub slow_retry_delay: Option<u64>,

    /// Enable the telemetry HTTP surface.
    #[arg(long = "metrics")]
    pub metrics: bool,

    /// `/metrics` bind port. Implies --metrics.
    #[arg(long = "metrics-port", value_name = "PORT")]
    pub metrics_port: Option<u16>,

    /// `/health`, `/ready`, and `/stats` bind port.
    #[arg(long = "health-port", value_name = "PORT")]
    pub health_port: Option<u16>,

    /// Print build metadata (version, target) and exit.
    #[arg(long = "build-info")]
    pub build_info: bool,

    /// Perform a one-shot GET of a running instance's /health endpoint and exit.
    #[arg(long = "health-check")]
    pub health_check: bool,
}

impl Cli {
    /// Resolve the effective TLS policy from `-n`/`-f`, logging a warning
    /// when both were given since `-f` takes precedence.
    #[must_use]
    pub fn tls_policy(&self) -> wsc_core::TlsPolicy {
        if self.force_verify {
            if self.skip_verify {
                tracing::warn!("-f/--force-verify overrides -n/--skip-verify; verifying certificates");
            }
            wsc_core::TlsPolicy::ForceVerify
        } else if self.skip_verify {
            wsc_core::TlsPolicy::SkipVerifyQuiet
        } else {
            wsc_core::TlsPolicy::ForceVerify
        }
    }

    /// Whether the telemetry HTTP surface should be started.
    #[must_use]
    pub fn monitoring_enabled(&self) -> bool {
        self.metrics || self.metrics_port.is_some() || self.health_port.is_some()
    }
}
