//! Reader Task: pulls frames from the transport, dispatches them, and
//! updates stats. Never writes to the transport directly — pong responses go
//! through the Writer Gate.

use crate::audit::AuditLog;
use crate::connector::WsStream;
use crate::writer::WriterGate;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use wsc_core::error::ClassifyInput;
use wsc_core::traits::{Callbacks, FrameKind, MessageProcessor, ProcessOutcome};
use wsc_core::{classify, ErrorKind, SessionId, Stats};

/// Why the Reader Task's loop ended.
#[derive(Debug)]
pub enum ReaderExit {
    /// The cancellation token fired; shutdown is in progress.
    Cancelled,
    /// The peer sent a close frame.
    Closed,
    /// A classified failure occurred; the Supervisor should invoke recovery.
    Failed(ErrorKind),
}

/// Run the reader loop to completion, returning why it stopped. Intended to
/// be driven inside `tokio::spawn` by the Session Supervisor.
#[allow(clippy::too_many_arguments)]
pub async fn run(
    mut stream: WsStream,
    writer: Arc<WriterGate>,
    processor: Arc<dyn MessageProcessor>,
    stats: Arc<Stats>,
    callbacks: Arc<dyn Callbacks>,
    audit: Option<Arc<AuditLog>>,
    session: SessionId,
    read_timeout: Duration,
    max_message_size: usize,
    verbose: bool,
    cancel: CancellationToken,
) -> ReaderExit {
    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => return ReaderExit::Cancelled,
            res = tokio::time::timeout(read_timeout, stream.next()) => res,
        };

        let frame = match next {
            Ok(Some(Ok(msg))) => msg,
            Ok(Some(Err(err))) => {
                let kind = classify(ClassifyInput::Message(&err.to_string()));
                stats.errors.record(kind);
                return ReaderExit::Failed(kind);
            }
            Ok(None) => {
                // Stream closed without an explicit Close frame (EOF).
                stats.errors.record(ErrorKind::ConnectionLost);
                return ReaderExit::Failed(ErrorKind::ConnectionLost);
            }
            Err(_elapsed) => {
                stats.errors.record(ErrorKind::ReceiveTimeout);
                return ReaderExit::Failed(ErrorKind::ReceiveTimeout);
            }
        };

        stats.touch_last_message();

        match frame {
            Message::Text(text) => {
                let payload = bytes::Bytes::copy_from_slice(text.as_bytes());
                match processor.process_inbound(FrameKind::Text, &payload, max_message_size) {
                    ProcessOutcome::Rejected(kind) => stats.errors.record(kind),
                    ProcessOutcome::Forwarded | ProcessOutcome::AccountedOnly => {
                        stats.record_received(payload.len());
                        if let Some(audit) = &audit {
                            audit.record_recv("TEXT", &payload);
                        }
                        callbacks.on_message(&session, FrameKind::Text, &payload).await;
                    }
                }
            }
            Message::Binary(data) => {
                let payload = bytes::Bytes::copy_from_slice(&data);
                match processor.process_inbound(FrameKind::Binary, &payload, max_message_size) {
                    ProcessOutcome::Rejected(kind) => stats.errors.record(kind),
                    ProcessOutcome::Forwarded | ProcessOutcome::AccountedOnly => {
                        stats.record_received(payload.len());
                        if let Some(audit) = &audit {
                            audit.record_recv("BINARY", &payload);
                        }
                        callbacks.on_message(&session, FrameKind::Binary, &payload).await;
                    }
                }
            }
            Message::Ping(payload) => {
                if let Some(audit) = &audit {
                    audit.record_recv("PING", &payload);
                }
                let _ = writer.send(FrameKind::Pong, &payload, "").await;
                let bytes = bytes::Bytes::copy_from_slice(&payload);
                if verbose && processor.process_inbound(FrameKind::Ping, &bytes, max_message_size) != ProcessOutcome::Rejected(ErrorKind::MessageTooLarge) {
                    callbacks.on_message(&session, FrameKind::Ping, &bytes).await;
                }
            }
            Message::Pong(payload) => {
                if let Some(audit) = &audit {
                    audit.record_recv("PONG", &payload);
                }
                let bytes = bytes::Bytes::copy_from_slice(&payload);
                if verbose && processor.process_inbound(FrameKind::Pong, &bytes, max_message_size) != ProcessOutcome::Rejected(ErrorKind::MessageTooLarge) {
                    callbacks.on_message(&session, FrameKind::Pong, &bytes).await;
                }
            }
            Message::Close(_frame) => {
                if let Some(audit) = &audit {
                    audit.record_recv("CLOSE", &[]);
                }
                return ReaderExit::Closed;
            }
            Message::Frame(_) => {
                // Raw frames are not surfaced above the tungstenite API boundary
                // during normal reads; nothing to account for.
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_exit_is_debug_printable() {
        let exit = ReaderExit::Failed(ErrorKind::ConnectionLost);
        assert!(format!("{exit:?}").contains("ConnectionLost"));
    }
}
