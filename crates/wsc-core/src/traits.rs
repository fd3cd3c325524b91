//! Capability traits expressing the engine's three pluggable components
//! (Connector, MessageProcessor, ErrorRecovery) and the four user-facing
//! callback hooks, as constructor-injected dependencies rather than
//! duck-typed components.

use crate::config::ClientConfig;
use crate::error::{ConnectionFailure, ErrorKind};
use crate::recovery::RecoveryStrategy;
use crate::state::SessionId;
use async_trait::async_trait;
use bytes::Bytes;
use tokio_util::sync::CancellationToken;

/// A WebSocket frame kind, as seen by [`MessageProcessor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// UTF-8 text frame.
    Text,
    /// Opaque binary frame.
    Binary,
    /// Control ping.
    Ping,
    /// Control pong.
    Pong,
    /// Close frame.
    Close,
}

/// A connection handle abstraction: whatever the Transport Connector hands
/// back to the Session Supervisor on a successful dial. Opaque to wsc-core;
/// concrete transports (e.g. the WebSocket implementation in wsc-transport)
/// define their own handle type satisfying this marker.
pub trait ConnectionHandle: Send + 'static {}

/// Performs a single dial + handshake, returning a live handle or a typed
/// failure. No internal retry: retry is the Session Supervisor's concern.
#[async_trait]
pub trait Connector: Send + Sync {
    /// The handle type this connector produces.
    type Handle: ConnectionHandle;

    /// Dial once, bounded by `config.handshake_timeout` and `cancel`.
    async fn connect(
        &self,
        cancel: &CancellationToken,
        config: &ClientConfig,
    ) -> Result<Self::Handle, ConnectionFailure>;

    /// Send a normal-closure frame with the given reason, then release the handle.
    async fn close(&self, handle: Self::Handle, reason: &str) -> Result<(), ConnectionFailure>;

    /// Best-effort liveness probe: a write-control ping with a 5s deadline.
    /// Success implies the handle is currently writable, not that the peer is responsive.
    async fn probe(&self, handle: &mut Self::Handle) -> bool;
}

/// Outcome of [`MessageProcessor::process`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The frame was accepted and forwarded to the user callback.
    Forwarded,
    /// The frame was accepted for accounting only (ping/pong, non-verbose mode).
    AccountedOnly,
    /// The frame was rejected; carries the classified kind.
    Rejected(ErrorKind),
}

/// Validates and accounts for frames crossing the Writer Gate (outbound) or
/// Reader Task (inbound).
pub trait MessageProcessor: Send + Sync {
    /// Validate an outbound frame before it is handed to the Writer Gate:
    /// size bound, rate limiter, security checker.
    fn validate_outbound(&self, kind: FrameKind, bytes: &[u8], max_message_size: usize) -> ProcessOutcome;

    /// Process an inbound frame after it has passed the size check.
    fn process_inbound(&self, kind: FrameKind, bytes: &Bytes, max_message_size: usize) -> ProcessOutcome;
}

/// Given a classified error, selects and (optionally) enacts a recovery
/// strategy. The default implementation defers entirely to
/// [`crate::recovery::strategy`]; callers needing a stateful selector should
/// use [`crate::recovery::RecoverySelector`] directly.
pub trait ErrorRecovery: Send + Sync {
    /// Select a strategy for `kind`.
    fn select(&self, kind: ErrorKind) -> RecoveryStrategy;
}

/// User-facing lifecycle hooks. All methods default to a no-op so callers
/// only override what they need. `on_error` is always invoked on a
/// spawned, short-lived task by the caller so a slow implementation cannot
/// stall the control plane.
#[async_trait]
pub trait Callbacks: Send + Sync {
    /// Invoked after a successful `Connected` transition.
    async fn on_connect(&self, _session: &SessionId) {}

    /// Invoked after a transition out of `Connected` (loss or graceful close).
    async fn on_disconnect(&self, _session: &SessionId, _reason: &str) {}

    /// Invoked for every inbound frame the Reader forwards (subject to verbose
    /// configuration for ping/pong accounting-only frames).
    async fn on_message(&self, _session: &SessionId, _kind: FrameKind, _bytes: &Bytes) {}

    /// Invoked for every classified error, regardless of recoverability.
    async fn on_error(&self, _session: &SessionId, _kind: ErrorKind, _message: &str) {}
}

/// A [`Callbacks`] implementation that does nothing; the default when a
/// caller does not supply their own.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCallbacks;

#[async_trait]
impl Callbacks for NoopCallbacks {}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_callbacks_do_not_panic() {
        let cb = NoopCallbacks;
        let session = SessionId::generate();
        cb.on_connect(&session).await;
        cb.on_disconnect(&session, "test").await;
        cb.on_message(&session, FrameKind::Text, &Bytes::from_static(b"hi")).await;
        cb.on_error(&session, ErrorKind::Unknown, "test").await;
    }
}
