//! The CLI's [`Callbacks`] implementation: logs lifecycle events through
//! `tracing` and echoes inbound frames to stdout. Interactive REPL mode is
//! out of scope for this build (see `Cli::interactive`'s doc comment); this
//! is the non-interactive behavior used regardless of `-i`.

use async_trait::async_trait;
use bytes::Bytes;
use wsc_core::traits::{Callbacks, FrameKind};
use wsc_core::{ErrorKind, SessionId};

/// Prints received text frames to stdout and logs every lifecycle event at
/// the granularity `verbose` requests.
#[derive(Debug)]
pub struct ConsoleCallbacks {
    verbose: bool,
}

impl ConsoleCallbacks {
    /// Construct a new callback sink. `verbose` additionally forwards
    /// accounting-only ping/pong frames for logging.
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

#[async_trait]
impl Callbacks for ConsoleCallbacks {
    async fn on_connect(&self, session: &SessionId) {
        tracing::info!(%session, "connected");
    }

    async fn on_disconnect(&self, session: &SessionId, reason: &str) {
        tracing::info!(%session, reason, "disconnected");
    }

    async fn on_message(&self, session: &SessionId, kind: FrameKind, bytes: &Bytes) {
        match kind {
            FrameKind::Text => println!("{}", String::from_utf8_lossy(bytes)),
            FrameKind::Binary => println!("<binary {} bytes>", bytes.len()),
            FrameKind::Ping | FrameKind::Pong if self.verbose => {
                tracing::debug!(%session, ?kind, "control frame");
            }
            _ => {}
        }
    }

    async fn on_error(&self, session: &SessionId, kind: ErrorKind, message: &str) {
        tracing::warn!(%session, %kind, code = kind.code(), message, "classified error");
    }
}
