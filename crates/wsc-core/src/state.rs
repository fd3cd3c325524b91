//! Connection state machine and session identity.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// The connection lifecycle state. Stored atomically; transitions are
/// monotonic except for the `Connected` <-> `Reconnecting` cycle. `Stopped` is
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[repr(u8)]
pub enum ConnectionState {
    /// No transport handle, no dial in progress.
    Disconnected = 0,
    /// A dial + handshake is in progress.
    Connecting = 1,
    /// A live transport handle exists; Reader and (optionally) Heartbeat are running.
    Connected = 2,
    /// The previous handle was lost; awaiting the next dial attempt.
    Reconnecting = 3,
    /// Shutdown is in progress; no further reconnection attempts will be made.
    Stopping = 4,
    /// Terminal. All tasks joined, all resources released.
    Stopped = 5,
}

impl ConnectionState {
    const fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Disconnected,
            1 => Self::Connecting,
            2 => Self::Connected,
            3 => Self::Reconnecting,
            4 => Self::Stopping,
            _ => Self::Stopped,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Lock-free atomic cell holding the current [`ConnectionState`]. Reads are
/// acquire loads; writes are release stores, giving every transition a
/// happens-before edge to any subsequent read (invariant I7 of the spec's
/// testable properties).
#[derive(Debug)]
pub struct AtomicConnectionState(AtomicU8);

impl AtomicConnectionState {
    /// Construct a new cell initialized to `Disconnected`.
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicU8::new(ConnectionState::Disconnected as u8))
    }

    /// Load the current state.
    #[must_use]
    pub fn load(&self) -> ConnectionState {
        ConnectionState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Store a new state unconditionally. Callers are responsible for only
    /// performing legal transitions (see `ConnectionState`'s module docs).
    pub fn store(&self, state: ConnectionState) {
        self.0.store(state as u8, Ordering::Release);
    }

    /// Atomically observe the current state, logging nothing — used by
    /// telemetry endpoints that must never block the control plane.
    #[must_use]
    pub fn sample(&self) -> ConnectionState {
        self.load()
    }
}

impl Default for AtomicConnectionState {
    fn default() -> Self {
        Self::new()
    }
}

/// A string unique per client instance: a creation timestamp plus a
/// cryptographically random suffix, stable across all reconnects within the
/// same process lifetime.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a new session id from the current time.
    #[must_use]
    pub fn generate() -> Self {
        let now = chrono::Utc::now();
        let suffix = uuid::Uuid::new_v4();
        Self(format!("{}-{}", now.format("%Y%m%d%H%M%S"), suffix.simple()))
    }

    /// Borrow the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_disconnected() {
        let cell = AtomicConnectionState::new();
        assert_eq!(cell.load(), ConnectionState::Disconnected);
    }

    #[test]
    fn store_then_load_round_trips() {
        let cell = AtomicConnectionState::new();
        cell.store(ConnectionState::Connected);
        assert_eq!(cell.load(), ConnectionState::Connected);
    }

    #[test]
    fn session_ids_are_unique() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn session_id_contains_timestamp_prefix() {
        let id = SessionId::generate();
        let year_prefix = chrono::Utc::now().format("%Y").to_string();
        assert!(id.as_str().starts_with(&year_prefix));
    }
}
