//! Recovery strategy selection: a pure mapping from `ErrorKind` to
//! `RecoveryStrategy`, plus a selector that tracks per-kind recovery history.

use crate::error::ErrorKind;
use crate::traits::ErrorRecovery;
use parking_lot::Mutex;
use std::collections::HashMap;

/// The Supervisor's response policy, selected from a classified error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RecoveryStrategy {
    /// No automatic action; surface the error to the caller.
    None,
    /// Retry the same operation without tearing down the connection.
    Retry,
    /// Tear down and re-dial via the Session Supervisor's reconnect loop.
    Reconnect,
    /// Reset the connection in place (e.g. after a steady-state timeout).
    Reset,
    /// Fall back to degraded behavior; the session continues.
    Fallback,
}

/// Pure function mapping an [`ErrorKind`] to a [`RecoveryStrategy`]. Same input
/// always yields the same strategy (law L3).
#[must_use]
pub const fn strategy(kind: ErrorKind) -> RecoveryStrategy {
    match kind {
        ErrorKind::ConnectionRefused
        | ErrorKind::ConnectionTimeout
        | ErrorKind::ConnectionLost
        | ErrorKind::DNSError
        | ErrorKind::TLSError => RecoveryStrategy::Reconnect,

        ErrorKind::SendTimeout | ErrorKind::ReceiveTimeout | ErrorKind::HandshakeFailed => {
            RecoveryStrategy::Reset
        }

        ErrorKind::MessageTooLarge | ErrorKind::InvalidMessage | ErrorKind::EncodingError => {
            RecoveryStrategy::Fallback
        }

        ErrorKind::RateLimitExceeded
        | ErrorKind::SecurityViolation
        | ErrorKind::SuspiciousActivity
        | ErrorKind::MaxRetriesExceeded
        | ErrorKind::RetryTimeout => RecoveryStrategy::None,

        ErrorKind::InvalidURL
        | ErrorKind::InvalidConfig
        | ErrorKind::MissingParameter
        | ErrorKind::FileSystemError
        | ErrorKind::MemoryError => RecoveryStrategy::None,

        ErrorKind::Unknown => RecoveryStrategy::Retry,
    }
}

/// Stateful wrapper around [`strategy`] that also accumulates a per-kind
/// recovery count, reset on every successful `Connected` transition (the
/// conservative policy documented for Open Question #3).
#[derive(Debug, Default)]
pub struct RecoverySelector {
    history: Mutex<HashMap<ErrorKind, u32>>,
}

impl RecoverySelector {
    /// Construct a selector with empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a strategy for `kind`, incrementing its historical count.
    pub fn select(&self, kind: ErrorKind) -> RecoveryStrategy {
        let mut history = self.history.lock();
        *history.entry(kind).or_insert(0) += 1;
        strategy(kind)
    }

    /// Number of times `kind` has been selected since the last reset.
    #[must_use]
    pub fn history_count(&self, kind: ErrorKind) -> u32 {
        *self.history.lock().get(&kind).unwrap_or(&0)
    }

    /// Clear all recovery history. Called by the Session Supervisor on every
    /// successful `Connected` transition.
    pub fn reset(&self) {
        self.history.lock().clear();
    }
}

impl ErrorRecovery for RecoverySelector {
    fn select(&self, kind: ErrorKind) -> RecoveryStrategy {
        Self::select(self, kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_class_reconnects() {
        assert_eq!(strategy(ErrorKind::ConnectionRefused), RecoveryStrategy::Reconnect);
        assert_eq!(strategy(ErrorKind::DNSError), RecoveryStrategy::Reconnect);
    }

    #[test]
    fn content_class_falls_back() {
        assert_eq!(strategy(ErrorKind::MessageTooLarge), RecoveryStrategy::Fallback);
    }

    #[test]
    fn security_class_does_not_retry() {
        assert_eq!(strategy(ErrorKind::SecurityViolation), RecoveryStrategy::None);
        assert_eq!(strategy(ErrorKind::RateLimitExceeded), RecoveryStrategy::None);
    }

    #[test]
    fn unknown_is_conservative_retry() {
        assert_eq!(strategy(ErrorKind::Unknown), RecoveryStrategy::Retry);
    }

    #[test]
    fn strategy_is_pure() {
        assert_eq!(strategy(ErrorKind::TLSError), strategy(ErrorKind::TLSError));
    }

    #[test]
    fn selector_tracks_and_resets_history() {
        let selector = RecoverySelector::new();
        selector.select(ErrorKind::ConnectionLost);
        selector.select(ErrorKind::ConnectionLost);
        assert_eq!(selector.history_count(ErrorKind::ConnectionLost), 2);
        selector.reset();
        assert_eq!(selector.history_count(ErrorKind::ConnectionLost), 0);
    }

    #[test]
    fn selector_is_usable_as_an_error_recovery_trait_object() {
        let selector: std::sync::Arc<dyn ErrorRecovery> = std::sync::Arc::new(RecoverySelector::new());
        assert_eq!(selector.select(ErrorKind::TLSError), RecoveryStrategy::Reconnect);
    }
}
