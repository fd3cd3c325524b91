//! Session Supervisor: the top-level reconnect loop. Invokes the connector,
//! spawns the Reader and Heartbeat, awaits termination, and drives
//! reconnection through the Retry Policy and Recovery Selector.

use crate::audit::AuditLog;
use crate::connector::WebSocketConnector;
use crate::heartbeat;
use crate::reader::{self, ReaderExit};
use crate::shutdown::ShutdownCoordinator;
use crate::watchdog;
use crate::writer::WriterGate;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use wsc_core::traits::{Callbacks, Connector, ErrorRecovery, FrameKind, MessageProcessor};
use wsc_core::{
    ClientConfig, ConnectionState, Decision, DefaultMessageProcessor, ErrorKind, RateLimiter,
    RecoverySelector, RecoveryStrategy, SecurityChecker, SessionId, Stats,
};
use wsc_core::state::AtomicConnectionState;
use wsc_core::retry::RetryPolicy;

/// Shared handle to the currently-live Writer Gate, published by the
/// Supervisor and consulted by anything that wants to send a message
/// (the top-level client's public `send` method).
pub type CurrentWriter = Arc<RwLock<Option<Arc<WriterGate>>>>;

/// Drives dial -> connect -> serve -> recover -> reconnect until shutdown.
pub struct Supervisor {
    config: ClientConfig,
    connector: WebSocketConnector,
    state: Arc<AtomicConnectionState>,
    retry: RetryPolicy,
    recovery: Arc<RecoverySelector>,
    processor: Arc<dyn MessageProcessor>,
    stats: Arc<Stats>,
    callbacks: Arc<dyn Callbacks>,
    audit: Option<Arc<AuditLog>>,
    shutdown: Arc<ShutdownCoordinator>,
    session_id: SessionId,
    current_writer: CurrentWriter,
}

impl Supervisor {
    /// Construct a supervisor. `current_writer` is shared with the top-level
    /// client so user `send` calls can reach whatever Writer Gate is live.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        config: ClientConfig,
        state: Arc<AtomicConnectionState>,
        stats: Arc<Stats>,
        callbacks: Arc<dyn Callbacks>,
        audit: Option<Arc<AuditLog>>,
        shutdown: Arc<ShutdownCoordinator>,
        session_id: SessionId,
        current_writer: CurrentWriter,
    ) -> Self {
        let retry = RetryPolicy::new(config.max_fast_retries, config.slow_retry_delay);
        let processor = Arc::new(DefaultMessageProcessor::new(
            RateLimiter::new(&config.rate_limiter),
            SecurityChecker::new(&config.security_checker),
        ));
        Self {
            connector: WebSocketConnector,
            retry,
            recovery: Arc::new(RecoverySelector::new()),
            processor,
            config,
            state,
            stats,
            callbacks,
            audit,
            shutdown,
            session_id,
            current_writer,
        }
    }

    /// Fire `Callbacks::on_error` on a spawned, short-lived task per
    /// `traits.rs`'s documented contract, so a slow user callback can never
    /// stall the reconnect loop.
    fn spawn_on_error(&self, kind: ErrorKind, message: String) {
        let callbacks = Arc::clone(&self.callbacks);
        let session_id = self.session_id.clone();
        tokio::spawn(async move {
            callbacks.on_error(&session_id, kind, &message).await;
        });
    }

    /// Run the reconnect loop until `Stopping` is reached, then transition to
    /// `Stopped` and return.
    pub async fn run(self: Arc<Self>) {
        let cancel = self.shutdown.token();

        loop {
            if self.shutdown.is_cancelled() {
                self.state.store(ConnectionState::Stopping);
                break;
            }

            match self.retry.next() {
                Decision::GiveUp => {
                    tracing::error!("retry budget exhausted; giving up");
                    self.stats.errors.record(ErrorKind::MaxRetriesExceeded);
                    self.state.store(ConnectionState::Stopping);
                    break;
                }
                Decision::Proceed { delay, phase, attempt } => {
                    tracing::info!(?phase, attempt, "reconnect attempt");
                    if !delay.is_zero() && !RetryPolicy::wait(delay, &cancel).await {
                        self.state.store(ConnectionState::Stopping);
                        break;
                    }
                }
            }

            self.state.store(ConnectionState::Connecting);
            match self.connector.connect(&cancel, &self.config).await {
                Ok(handle) => {
                    self.retry.reset();
                    self.recovery.reset();
                    self.stats.mark_connected();
                    self.state.store(ConnectionState::Connected);
                    self.callbacks.on_connect(&self.session_id).await;

                    let writer = Arc::new(WriterGate::new(
                        handle.sink,
                        self.config.max_message_size,
                        self.config.write_timeout,
                        Arc::clone(&self.processor),
                        Arc::clone(&self.stats),
                        Arc::clone(&self.recovery) as Arc<dyn ErrorRecovery>,
                        true,
                        self.audit.clone(),
                    ));
                    *self.current_writer.write() = Some(Arc::clone(&writer));

                    let watchdog_handle = tokio::spawn(watchdog::run(
                        Arc::clone(&writer),
                        watchdog::DEFAULT_THRESHOLD,
                        Duration::from_secs(5),
                        cancel.clone(),
                    ));

                    let reader_cancel = cancel.clone();
                    let reader_handle = tokio::spawn(reader::run(
                        handle.stream,
                        Arc::clone(&writer),
                        Arc::clone(&self.processor),
                        Arc::clone(&self.stats),
                        Arc::clone(&self.callbacks),
                        self.audit.clone(),
                        self.session_id.clone(),
                        self.config.read_timeout,
                        self.config.max_message_size,
                        false,
                        reader_cancel,
                    ));

                    let heartbeat_handle = if self.config.auto_ping_disabled {
                        None
                    } else {
                        Some(tokio::spawn(heartbeat::run(
                            Arc::clone(&writer),
                            self.config.url.clone(),
                            self.config.ping_interval,
                            cancel.clone(),
                        )))
                    };

                    let exit = reader_handle.await.unwrap_or(ReaderExit::Cancelled);
                    if let Some(hb) = heartbeat_handle {
                        hb.abort();
                    }
                    watchdog_handle.abort();

                    let _ = writer.send(FrameKind::Close, b"client initiated", &self.config.url).await;
                    *self.current_writer.write() = None;

                    self.callbacks
                        .on_disconnect(&self.session_id, &format!("{exit:?}"))
                        .await;

                    match exit {
                        ReaderExit::Cancelled => {
                            self.state.store(ConnectionState::Stopping);
                            break;
                        }
                        ReaderExit::Closed => {
                            if self.shutdown.is_cancelled() {
                                self.state.store(ConnectionState::Stopping);
                                break;
                            }
                            self.stats.record_reconnect();
                            self.state.store(ConnectionState::Reconnecting);
                        }
                        ReaderExit::Failed(kind) => {
                            let strategy = self.recovery.select(kind);
                            self.spawn_on_error(kind, "reader task failed".to_string());
                            if matches!(strategy, RecoveryStrategy::None) || self.shutdown.is_cancelled() {
                                self.state.store(ConnectionState::Stopping);
                                break;
                            }
                            self.stats.record_reconnect();
                            self.state.store(ConnectionState::Reconnecting);
                        }
                    }
                }
                Err(failure) => {
                    self.stats.errors.record(failure.kind);
                    let _ = self.recovery.select(failure.kind);
                    self.spawn_on_error(failure.kind, failure.cause.clone());
                    self.state.store(ConnectionState::Disconnected);
                }
            }
        }

        self.state.store(ConnectionState::Stopped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wsc_core::traits::NoopCallbacks;

    #[tokio::test]
    async fn give_up_on_invalid_url_reaches_stopped() {
        let config = ClientConfig::new("not-a-ws-url").with_max_fast_retries(1);
        let state = Arc::new(AtomicConnectionState::new());
        let stats = Arc::new(Stats::new());
        let shutdown = Arc::new(ShutdownCoordinator::new());
        let current_writer: CurrentWriter = Arc::new(RwLock::new(None));
        let supervisor = Arc::new(Supervisor::new(
            config,
            Arc::clone(&state),
            stats,
            Arc::new(NoopCallbacks),
            None,
            Arc::clone(&shutdown),
            SessionId::generate(),
            current_writer,
        ));

        // max_fast_retries=1 means give-up after 2 attempts; invalid URL fails
        // immediately each time without consuming wall-clock time.
        let result = tokio::time::timeout(std::time::Duration::from_secs(5), supervisor.run()).await;
        assert!(result.is_ok());
        assert_eq!(state.load(), ConnectionState::Stopped);
    }

    #[tokio::test]
    async fn pre_cancelled_shutdown_token_gives_up_immediately() {
        let config = ClientConfig::new("ws://localhost:1");
        let state = Arc::new(AtomicConnectionState::new());
        let stats = Arc::new(Stats::new());
        let shutdown = Arc::new(ShutdownCoordinator::new());
        shutdown.begin_stop();
        let current_writer: CurrentWriter = Arc::new(RwLock::new(None));
        let supervisor = Arc::new(Supervisor::new(
            config,
            Arc::clone(&state),
            stats,
            Arc::new(NoopCallbacks),
            None,
            Arc::clone(&shutdown),
            SessionId::generate(),
            current_writer,
        ));

        let result = tokio::time::timeout(std::time::Duration::from_secs(2), supervisor.run()).await;
        assert!(result.is_ok());
        assert_eq!(state.load(), ConnectionState::Stopped);
    }
}
