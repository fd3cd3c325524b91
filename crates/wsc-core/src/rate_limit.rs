//! Rate limiter and security checker consulted by the Writer Gate before a
//! frame is accepted, and the [`MessageProcessor`] implementation that
//! wraps them for outbound validation and inbound accounting.

use crate::config::{RateLimiterConfig, SecurityCheckerConfig};
use crate::error::ErrorKind;
use crate::traits::{FrameKind, MessageProcessor, ProcessOutcome};
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Sliding-window request-count limiter.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    timestamps: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Construct a limiter from configuration.
    #[must_use]
    pub fn new(config: &RateLimiterConfig) -> Self {
        Self {
            max_requests: config.max_requests,
            window: config.window,
            timestamps: Mutex::new(VecDeque::new()),
        }
    }

    /// Returns `true` if another request is permitted right now, recording it
    /// if so.
    pub fn allow(&self) -> bool {
        let now = Instant::now();
        let mut timestamps = self.timestamps.lock();
        while let Some(&front) = timestamps.front() {
            if now.duration_since(front) > self.window {
                timestamps.pop_front();
            } else {
                break;
            }
        }
        if timestamps.len() as u32 >= self.max_requests {
            return false;
        }
        timestamps.push_back(now);
        true
    }
}

/// Blocklist-substring payload checker.
pub struct SecurityChecker {
    blocklist: Vec<String>,
}

impl SecurityChecker {
    /// Construct a checker from configuration.
    #[must_use]
    pub fn new(config: &SecurityCheckerConfig) -> Self {
        Self {
            blocklist: config.blocklist.iter().map(|s| s.to_ascii_lowercase()).collect(),
        }
    }

    /// Returns `true` if `text` contains none of the configured blocklist
    /// substrings (case-insensitive).
    #[must_use]
    pub fn allow(&self, text: &str) -> bool {
        let lower = text.to_ascii_lowercase();
        !self.blocklist.iter().any(|pattern| lower.contains(pattern.as_str()))
    }
}

/// The [`MessageProcessor`] used by the Writer Gate and Reader Task: size
/// bound plus rate limiter and security checker on the way out, size bound
/// plus ping/pong accounting on the way in.
pub struct DefaultMessageProcessor {
    rate_limiter: RateLimiter,
    security_checker: SecurityChecker,
}

impl DefaultMessageProcessor {
    /// Construct a processor from its two consulted components.
    #[must_use]
    pub fn new(rate_limiter: RateLimiter, security_checker: SecurityChecker) -> Self {
        Self { rate_limiter, security_checker }
    }
}

impl MessageProcessor for DefaultMessageProcessor {
    fn validate_outbound(&self, kind: FrameKind, bytes: &[u8], max_message_size: usize) -> ProcessOutcome {
        if bytes.len() > max_message_size {
            return ProcessOutcome::Rejected(ErrorKind::MessageTooLarge);
        }
        if !self.rate_limiter.allow() {
            return ProcessOutcome::Rejected(ErrorKind::RateLimitExceeded);
        }
        if matches!(kind, FrameKind::Text) {
            if let Ok(text) = std::str::from_utf8(bytes) {
                if !self.security_checker.allow(text) {
                    return ProcessOutcome::Rejected(ErrorKind::SecurityViolation);
                }
            }
        }
        ProcessOutcome::Forwarded
    }

    fn process_inbound(&self, kind: FrameKind, bytes: &Bytes, max_message_size: usize) -> ProcessOutcome {
        if bytes.len() > max_message_size {
            return ProcessOutcome::Rejected(ErrorKind::MessageTooLarge);
        }
        match kind {
            FrameKind::Ping | FrameKind::Pong => ProcessOutcome::AccountedOnly,
            _ => ProcessOutcome::Forwarded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limiter_allows_up_to_max() {
        let limiter = RateLimiter::new(&RateLimiterConfig {
            max_requests: 3,
            window: Duration::from_secs(60),
        });
        assert!(limiter.allow());
        assert!(limiter.allow());
        assert!(limiter.allow());
        assert!(!limiter.allow());
    }

    #[test]
    fn security_checker_rejects_blocklisted_payload() {
        let checker = SecurityChecker::new(&SecurityCheckerConfig::default());
        assert!(!checker.allow("<script>alert(1)</script>"));
        assert!(checker.allow("hello world"));
    }

    fn make_processor(max_requests: u32) -> DefaultMessageProcessor {
        DefaultMessageProcessor::new(
            RateLimiter::new(&RateLimiterConfig { max_requests, window: Duration::from_secs(60) }),
            SecurityChecker::new(&SecurityCheckerConfig::default()),
        )
    }

    #[test]
    fn processor_rejects_oversized_outbound_frame() {
        let processor = make_processor(1000);
        let outcome = processor.validate_outbound(FrameKind::Binary, &[0u8; 16], 8);
        assert_eq!(outcome, ProcessOutcome::Rejected(ErrorKind::MessageTooLarge));
    }

    #[test]
    fn processor_rejects_blocklisted_outbound_text() {
        let processor = make_processor(1000);
        let outcome = processor.validate_outbound(FrameKind::Text, b"<script>x</script>", 1000);
        assert_eq!(outcome, ProcessOutcome::Rejected(ErrorKind::SecurityViolation));
    }

    #[test]
    fn processor_forwards_clean_outbound_text() {
        let processor = make_processor(1000);
        let outcome = processor.validate_outbound(FrameKind::Text, b"hello", 1000);
        assert_eq!(outcome, ProcessOutcome::Forwarded);
    }

    #[test]
    fn processor_accounts_inbound_ping_only() {
        let processor = make_processor(1000);
        let outcome = processor.process_inbound(FrameKind::Ping, &Bytes::from_static(b""), 1000);
        assert_eq!(outcome, ProcessOutcome::AccountedOnly);
    }

    #[test]
    fn processor_rejects_oversized_inbound_frame() {
        let processor = make_processor(1000);
        let outcome = processor.process_inbound(FrameKind::Binary, &Bytes::from_static(&[0u8; 16]), 8);
        assert_eq!(outcome, ProcessOutcome::Rejected(ErrorKind::MessageTooLarge));
    }
}
