//! Heartbeat Scheduler: periodic ping emission through the Writer Gate.
//! Incoming pings are answered by the Reader Task directly; this scheduler
//! only owns the *outbound* tick.

use crate::writer::WriterGate;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wsc_core::traits::FrameKind;

/// Why the heartbeat loop stopped.
#[derive(Debug, PartialEq, Eq)]
pub enum HeartbeatExit {
    /// The cancellation token fired.
    Cancelled,
}

/// Run the periodic ping loop until cancelled. Write failures are logged but
/// not fatal — the next read-timeout will surface connectivity loss.
pub async fn run(writer: Arc<WriterGate>, url: String, ping_interval: Duration, cancel: CancellationToken) -> HeartbeatExit {
    let mut ticker = tokio::time::interval(ping_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // Consume the immediate first tick so the first ping fires one interval in.
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return HeartbeatExit::Cancelled,
            _ = ticker.tick() => {
                if let Err(err) = writer.send(FrameKind::Ping, &[], &url).await {
                    tracing::warn!(kind = %err.kind, "heartbeat ping write failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_variant_is_comparable() {
        assert_eq!(HeartbeatExit::Cancelled, HeartbeatExit::Cancelled);
    }
}
