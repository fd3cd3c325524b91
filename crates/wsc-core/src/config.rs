//! Client configuration: immutable after construction, validated eagerly.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the Transport Connector treats TLS certificate validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TlsPolicy {
    /// Skip certificate verification, no warning logged. For trusted test fixtures only.
    SkipVerifyQuiet,
    /// Skip certificate verification, log a warning on every connect.
    SkipVerifyWarn,
    /// Always verify the peer certificate. Default.
    #[default]
    ForceVerify,
}

/// Rate limiter configuration (Open Question #2 of the design notes): a sliding
/// window over a request count, exposed as configuration rather than hard-coded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimiterConfig {
    /// Maximum operations permitted per `window`.
    pub max_requests: u32,
    /// The sliding window duration.
    pub window: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(60),
        }
    }
}

/// Security checker configuration: a blocklist of substrings rejected from
/// outbound text payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityCheckerConfig {
    /// Substrings that cause a payload to be rejected with `SecurityViolation`.
    pub blocklist: Vec<String>,
}

impl Default for SecurityCheckerConfig {
    fn default() -> Self {
        Self {
            blocklist: vec![
                "<script".to_string(),
                "javascript:".to_string(),
                "onerror=".to_string(),
                "onload=".to_string(),
                "eval(".to_string(),
            ],
        }
    }
}

/// Optional CPU/memory-adaptive buffer sizing (Open Question #1). Disabled by
/// default; the tiered buffer pool alone satisfies the Writer Gate's contract.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveBufferConfig {
    /// CPU utilization fraction (0.0-1.0) above which buffer sizes shrink.
    pub cpu_threshold: f64,
    /// Resident memory in bytes above which buffer sizes shrink.
    pub memory_threshold_bytes: u64,
    /// Multiplier applied to buffer size when the CPU threshold is exceeded.
    pub cpu_backoff_multiplier: f64,
    /// Multiplier applied to buffer size when the memory threshold is exceeded.
    pub memory_backoff_multiplier: f64,
}

impl Default for AdaptiveBufferConfig {
    fn default() -> Self {
        Self {
            cpu_threshold: 0.80,
            memory_threshold_bytes: 100 * 1024 * 1024,
            cpu_backoff_multiplier: 0.8,
            memory_backoff_multiplier: 0.9,
        }
    }
}

/// Immutable client configuration, validated at construction time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Target URL; must begin with `ws://` or `wss://`.
    pub url: String,
    /// Maximum fast-retry count. `0` means "5 fast retries then unlimited slow retries".
    pub max_fast_retries: u32,
    /// Delay between slow-phase retries, bounded 1-60s.
    pub slow_retry_delay: Duration,
    /// Handshake (dial) timeout.
    pub handshake_timeout: Duration,
    /// Read timeout; re-armed on every successful frame read.
    pub read_timeout: Duration,
    /// Write timeout for a single frame.
    pub write_timeout: Duration,
    /// Interval between heartbeat pings.
    pub ping_interval: Duration,
    /// When true, the Heartbeat Scheduler never emits pings (still answers them).
    pub auto_ping_disabled: bool,
    /// Read buffer size in bytes.
    pub read_buffer_size: usize,
    /// Write buffer size in bytes.
    pub write_buffer_size: usize,
    /// Maximum accepted frame size in bytes.
    pub max_message_size: usize,
    /// TLS verification policy.
    pub tls_policy: TlsPolicy,
    /// Optional audit-log file path.
    pub log_file: Option<String>,
    /// Whether the telemetry HTTP surface is enabled.
    pub monitoring_enabled: bool,
    /// `/metrics` bind port.
    pub metrics_port: u16,
    /// `/health` and `/ready` bind port.
    pub health_port: u16,
    /// Rate limiter applied by the Writer Gate.
    pub rate_limiter: RateLimiterConfig,
    /// Security checker applied by the Writer Gate.
    pub security_checker: SecurityCheckerConfig,
    /// Optional CPU/memory-adaptive buffer sizing. `None` disables it.
    pub adaptive_buffer: Option<AdaptiveBufferConfig>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_fast_retries: 5,
            slow_retry_delay: Duration::from_secs(3),
            handshake_timeout: Duration::from_secs(15),
            read_timeout: Duration::from_secs(60),
            write_timeout: Duration::from_secs(5),
            ping_interval: Duration::from_secs(30),
            auto_ping_disabled: false,
            read_buffer_size: 4096,
            write_buffer_size: 4096,
            max_message_size: 32_768,
            tls_policy: TlsPolicy::ForceVerify,
            log_file: None,
            monitoring_enabled: false,
            metrics_port: 9090,
            health_port: 8080,
            rate_limiter: RateLimiterConfig::default(),
            security_checker: SecurityCheckerConfig::default(),
            adaptive_buffer: None,
        }
    }
}

impl ClientConfig {
    /// Start building a configuration targeting `url`. Other fields take their defaults.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Preset for local test fixtures: skip TLS verification quietly, short timeouts.
    #[must_use]
    pub fn insecure_test(url: impl Into<String>) -> Self {
        Self {
            tls_policy: TlsPolicy::SkipVerifyQuiet,
            handshake_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(2),
            ..Self::new(url)
        }
    }

    /// Preset for production use against untrusted endpoints: force verification,
    /// a tight message-size cap, and the default rate limiter/security checker.
    #[must_use]
    pub fn strict(url: impl Into<String>) -> Self {
        Self {
            tls_policy: TlsPolicy::ForceVerify,
            max_message_size: 16_384,
            ..Self::new(url)
        }
    }

    /// Builder method: override `max_fast_retries`.
    #[must_use]
    pub const fn with_max_fast_retries(mut self, n: u32) -> Self {
        self.max_fast_retries = n;
        self
    }

    /// Builder method: override `slow_retry_delay`.
    #[must_use]
    pub const fn with_slow_retry_delay(mut self, d: Duration) -> Self {
        self.slow_retry_delay = d;
        self
    }

    /// Builder method: override `ping_interval`.
    #[must_use]
    pub const fn with_ping_interval(mut self, d: Duration) -> Self {
        self.ping_interval = d;
        self
    }

    /// Builder method: override `max_message_size`.
    #[must_use]
    pub const fn with_max_message_size(mut self, n: usize) -> Self {
        self.max_message_size = n;
        self
    }

    /// Builder method: enable monitoring with explicit ports.
    #[must_use]
    pub const fn with_monitoring(mut self, metrics_port: u16, health_port: u16) -> Self {
        self.monitoring_enabled = true;
        self.metrics_port = metrics_port;
        self.health_port = health_port;
        self
    }

    /// Validate the configuration. Called once at construction by the Session
    /// Supervisor; the engine never reads an unvalidated `ClientConfig`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.url.starts_with("ws://") || self.url.starts_with("wss://")) {
            return Err(ConfigError::InvalidUrl(self.url.clone()));
        }
        let slow = self.slow_retry_delay.as_secs();
        if !(1..=60).contains(&slow) {
            return Err(ConfigError::OutOfRange {
                field: "slow_retry_delay",
                value: slow,
                min: 1,
                max: 60,
            });
        }
        if self.metrics_port == 0 {
            return Err(ConfigError::OutOfRange {
                field: "metrics_port",
                value: 0,
                min: 1,
                max: 65_535,
            });
        }
        if self.health_port == 0 {
            return Err(ConfigError::OutOfRange {
                field: "health_port",
                value: 0,
                min: 1,
                max: 65_535,
            });
        }
        if self.max_message_size == 0 {
            return Err(ConfigError::MissingParameter("max_message_size"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let cfg = ClientConfig::new("wss://echo.example/ws");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_non_ws_url() {
        let cfg = ClientConfig::new("https://example.com");
        let err = cfg.validate().unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidURL);
    }

    #[test]
    fn rejects_out_of_range_slow_retry_delay() {
        let cfg = ClientConfig::new("ws://localhost").with_slow_retry_delay(Duration::from_secs(90));
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn insecure_test_preset_skips_verification_quietly() {
        let cfg = ClientConfig::insecure_test("ws://localhost:9999");
        assert_eq!(cfg.tls_policy, TlsPolicy::SkipVerifyQuiet);
    }

    #[test]
    fn adaptive_buffer_disabled_by_default() {
        let cfg = ClientConfig::default();
        assert!(cfg.adaptive_buffer.is_none());
    }
}
