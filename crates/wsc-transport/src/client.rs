//! `WsClient`: the public entry point wiring Supervisor, Writer Gate access,
//! stats, and the shutdown sequence together into a single handle.

use crate::audit::AuditLog;
use crate::supervisor::{CurrentWriter, Supervisor};
use crate::shutdown::ShutdownCoordinator;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::task::JoinHandle;
use wsc_core::state::AtomicConnectionState;
use wsc_core::traits::{Callbacks, FrameKind};
use wsc_core::{ClientConfig, ConnectionFailure, ConnectionState, ErrorKind, SessionId, Stats, StatsSnapshot};

/// A running WebSocket client session: one [`Supervisor`] driving reconnects,
/// reachable through a stable handle regardless of how many physical
/// connections come and go underneath it.
pub struct WsClient {
    state: Arc<AtomicConnectionState>,
    stats: Arc<Stats>,
    shutdown: Arc<ShutdownCoordinator>,
    session_id: SessionId,
    current_writer: CurrentWriter,
    audit: Option<Arc<AuditLog>>,
    supervisor_task: RwLock<Option<JoinHandle<()>>>,
}

impl WsClient {
    /// Construct a client and spawn its Session Supervisor. `config` must
    /// already be validated (see [`ClientConfig::validate`]). `session_id`
    /// lets a caller that already generated one (e.g. to open the audit log
    /// before the client exists) supply it; `None` generates a fresh one.
    #[must_use]
    pub fn spawn(
        config: ClientConfig,
        callbacks: Arc<dyn Callbacks>,
        audit: Option<Arc<AuditLog>>,
        session_id: Option<SessionId>,
    ) -> Arc<Self> {
        let state = Arc::new(AtomicConnectionState::new());
        let stats = Arc::new(Stats::new());
        let shutdown = Arc::new(ShutdownCoordinator::new());
        let session_id = session_id.unwrap_or_else(SessionId::generate);
        let current_writer: CurrentWriter = Arc::new(RwLock::new(None));

        let supervisor = Arc::new(Supervisor::new(
            config,
            Arc::clone(&state),
            Arc::clone(&stats),
            callbacks,
            audit.clone(),
            Arc::clone(&shutdown),
            session_id.clone(),
            Arc::clone(&current_writer),
        ));

        let supervisor_task = tokio::spawn(async move {
            supervisor.run().await;
        });

        Arc::new(Self {
            state,
            stats,
            shutdown,
            session_id,
            current_writer,
            audit,
            supervisor_task: RwLock::new(Some(supervisor_task)),
        })
    }

    /// Current connection state. Never blocks the control plane.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state.sample()
    }

    /// This client's stable session identifier.
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// A snapshot of the stats and error book, as served by `/stats`.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Reference to the shared stats block, for the telemetry surface.
    #[must_use]
    pub fn stats_handle(&self) -> Arc<Stats> {
        Arc::clone(&self.stats)
    }

    /// Reference to the shared state cell, for the telemetry surface.
    #[must_use]
    pub fn state_handle(&self) -> Arc<AtomicConnectionState> {
        Arc::clone(&self.state)
    }

    fn not_connected() -> ConnectionFailure {
        ConnectionFailure {
            kind: ErrorKind::ConnectionLost,
            op: wsc_core::error::Operation::Send,
            url: String::new(),
            cause: "no live connection".to_string(),
            retryable: true,
        }
    }

    /// Send a text frame. Fails immediately if no connection is currently live.
    pub async fn send_text(&self, text: &str) -> Result<(), ConnectionFailure> {
        let writer = self.current_writer.read().clone();
        match writer {
            Some(writer) => writer.send(FrameKind::Text, text.as_bytes(), "").await,
            None => Err(Self::not_connected()),
        }
    }

    /// Send a binary frame. Fails immediately if no connection is currently live.
    pub async fn send_binary(&self, data: &[u8]) -> Result<(), ConnectionFailure> {
        let writer = self.current_writer.read().clone();
        match writer {
            Some(writer) => writer.send(FrameKind::Binary, data, "").await,
            None => Err(Self::not_connected()),
        }
    }

    /// Stop sequence (spec section 4.L, steps 1-4 and 6): cancel the root
    /// token, let the Supervisor close the transport and join Reader/Heartbeat,
    /// then flush and close the audit log. Idempotent and safe to call from
    /// any thread; a second call after completion is a no-op (law L1).
    ///
    /// Telemetry server shutdown (step 5, its own 5s budget) is the caller's
    /// responsibility since `WsClient` does not own the telemetry servers —
    /// see `wsc-cli::main` for the full orchestration.
    pub async fn stop(&self) {
        if !self.shutdown.begin_stop() {
            return;
        }
        let task = self.supervisor_task.write().take();
        if let Some(task) = task {
            let _ = task.await;
        }
        if let Some(audit) = &self.audit {
            audit.close(&self.session_id);
        }
    }
}
