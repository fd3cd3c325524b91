//! Lock-acquisition watchdog: diagnostic-only background task that reports
//! (but never intervenes on) a Writer Gate critical section held beyond a
//! configurable threshold.

use crate::writer::WriterGate;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio_util::sync::CancellationToken;

/// Default threshold past which a held write lock is reported as a
/// potential deadlock.
pub const DEFAULT_THRESHOLD: Duration = Duration::from_secs(30);

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Sample `writer.held_since_ms()` every `poll_interval` and log a warning
/// whenever it has been non-zero for longer than `threshold`.
pub async fn run(writer: Arc<WriterGate>, threshold: Duration, poll_interval: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(poll_interval);
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            _ = ticker.tick() => {
                let held_since = writer.held_since_ms();
                if held_since == 0 {
                    continue;
                }
                let held_for = now_millis().saturating_sub(held_since);
                if held_for as u128 > threshold.as_millis() {
                    tracing::warn!(held_for_ms = held_for, "writer gate critical section held beyond threshold");
                }
            }
        }
    }
}
