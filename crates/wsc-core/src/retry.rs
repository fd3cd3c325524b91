//! Two-phase backoff retry policy.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// The outcome of a [`RetryPolicy::next`] query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Proceed with the next attempt, after the returned delay (zero in the fast phase).
    Proceed {
        /// Delay to wait before dialing again.
        delay: Duration,
        /// Whether this attempt falls in the fast or slow phase.
        phase: Phase,
        /// The 1-based attempt number about to be made.
        attempt: u32,
    },
    /// Give up: the attempt budget is exhausted, or cancellation fired.
    GiveUp,
}

/// Which half of the retry policy an attempt falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No delay before the next attempt.
    Fast,
    /// `slow_retry_delay` inserted before the next attempt.
    Slow,
}

/// Two-phase backoff state: an attempt counter and the fast/slow boundary `n`.
///
/// Behavior per query, following spec section 4.D:
/// - attempt <= n: fast phase, no delay.
/// - n < attempt <= 2n: slow phase, `slow_retry_delay` delay.
/// - attempt > 2n and n > 0: give up (`MaxRetriesExceeded`).
/// - n == 0: unlimited — fast phase lasts attempts 1-5, then every attempt
///   thereafter waits `slow_retry_delay` and proceeds indefinitely.
#[derive(Debug)]
pub struct RetryPolicy {
    max_fast_retries: u32,
    slow_retry_delay: Duration,
    attempt: AtomicU32,
}

/// Fast-phase length used when `max_fast_retries == 0` (unlimited mode).
const UNLIMITED_FAST_PHASE: u32 = 5;

impl RetryPolicy {
    /// Construct a policy from the fast-retry count and slow-phase delay.
    #[must_use]
    pub const fn new(max_fast_retries: u32, slow_retry_delay: Duration) -> Self {
        Self {
            max_fast_retries,
            slow_retry_delay,
            attempt: AtomicU32::new(0),
        }
    }

    /// Query the next decision and advance the attempt counter if proceeding.
    #[must_use]
    pub fn next(&self) -> Decision {
        let current = self.attempt.fetch_add(1, Ordering::SeqCst) + 1;
        let n = self.max_fast_retries;

        if n == 0 {
            return if current <= UNLIMITED_FAST_PHASE {
                Decision::Proceed {
                    delay: Duration::ZERO,
                    phase: Phase::Fast,
                    attempt: current,
                }
            } else {
                Decision::Proceed {
                    delay: self.slow_retry_delay,
                    phase: Phase::Slow,
                    attempt: current,
                }
            };
        }

        if current <= n {
            Decision::Proceed {
                delay: Duration::ZERO,
                phase: Phase::Fast,
                attempt: current,
            }
        } else if current <= 2 * n {
            Decision::Proceed {
                delay: self.slow_retry_delay,
                phase: Phase::Slow,
                attempt: current,
            }
        } else {
            Decision::GiveUp
        }
    }

    /// Wait for the decision's delay, honoring cancellation. Returns `true` if
    /// the wait completed normally, `false` if cancellation fired first.
    pub async fn wait(delay: Duration, cancel: &CancellationToken) -> bool {
        if delay.is_zero() {
            return !cancel.is_cancelled();
        }
        tokio::select! {
            () = tokio::time::sleep(delay) => true,
            () = cancel.cancelled() => false,
        }
    }

    /// Reset the attempt counter to zero. Called on every successful
    /// `Connected` transition (invariant I6).
    pub fn reset(&self) {
        self.attempt.store(0, Ordering::SeqCst);
    }

    /// Current attempt count (for diagnostics/tests).
    #[must_use]
    pub fn attempt_count(&self) -> u32 {
        self.attempt.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_retries_exhaust_after_2n() {
        let policy = RetryPolicy::new(2, Duration::from_millis(1));
        assert!(matches!(policy.next(), Decision::Proceed { phase: Phase::Fast, attempt: 1, .. }));
        assert!(matches!(policy.next(), Decision::Proceed { phase: Phase::Fast, attempt: 2, .. }));
        assert!(matches!(policy.next(), Decision::Proceed { phase: Phase::Slow, attempt: 3, .. }));
        assert!(matches!(policy.next(), Decision::Proceed { phase: Phase::Slow, attempt: 4, .. }));
        assert_eq!(policy.next(), Decision::GiveUp);
    }

    #[test]
    fn unlimited_never_gives_up() {
        let policy = RetryPolicy::new(0, Duration::from_millis(1));
        for _ in 0..UNLIMITED_FAST_PHASE {
            assert!(matches!(policy.next(), Decision::Proceed { phase: Phase::Fast, .. }));
        }
        for _ in 0..50 {
            assert!(matches!(policy.next(), Decision::Proceed { phase: Phase::Slow, .. }));
        }
    }

    #[test]
    fn reset_restores_fast_phase() {
        let policy = RetryPolicy::new(1, Duration::from_millis(1));
        policy.next();
        policy.next();
        policy.reset();
        assert_eq!(policy.attempt_count(), 0);
        assert!(matches!(policy.next(), Decision::Proceed { phase: Phase::Fast, attempt: 1, .. }));
    }

    #[tokio::test]
    async fn cancellation_short_circuits_slow_wait() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let completed = RetryPolicy::wait(Duration::from_secs(60), &cancel).await;
        assert!(!completed);
    }

    #[tokio::test]
    async fn zero_delay_wait_completes_immediately() {
        let cancel = CancellationToken::new();
        let completed = RetryPolicy::wait(Duration::ZERO, &cancel).await;
        assert!(completed);
    }
}
