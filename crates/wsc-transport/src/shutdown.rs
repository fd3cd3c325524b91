//! Shutdown Coordinator: a root cancellation token plus an idempotency guard
//! so `stop()` is safe to call from any thread, any number of times (law L1).

use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;

/// Coordinates the stop sequence's single entry point.
#[derive(Debug)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
    stopped: AtomicBool,
}

impl ShutdownCoordinator {
    /// Construct a coordinator with a fresh, uncancelled root token.
    #[must_use]
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            stopped: AtomicBool::new(false),
        }
    }

    /// A clone of the root cancellation token, to be propagated into every
    /// suspension point (dial, read, write, retry wait).
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Whether shutdown has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Request shutdown. Returns `true` if this call is the one that actually
    /// initiated it (cancels the token); returns `false` on every subsequent
    /// call, making `stop()` idempotent.
    pub fn begin_stop(&self) -> bool {
        let already = self.stopped.swap(true, Ordering::SeqCst);
        if !already {
            self.token.cancel();
        }
        !already
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_stop_call_initiates_cancellation() {
        let coord = ShutdownCoordinator::new();
        assert!(coord.begin_stop());
        assert!(coord.is_cancelled());
    }

    #[test]
    fn second_stop_call_is_a_no_op() {
        let coord = ShutdownCoordinator::new();
        assert!(coord.begin_stop());
        assert!(!coord.begin_stop());
        assert!(!coord.begin_stop());
    }
}
