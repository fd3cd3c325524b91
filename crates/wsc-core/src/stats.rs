//! Atomic counters and the error book: a bounded, mutex-guarded record of
//! error history consulted by the telemetry surface.

use crate::error::ErrorKind;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Capacity of the error trend ring buffer (invariant I3: never exceeded).
pub const ERROR_TREND_CAPACITY: usize = 1000;

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// A single point in the error trend: when a given kind was observed.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ErrorTrendPoint {
    /// Unix epoch milliseconds.
    pub timestamp_ms: i64,
    /// The kind observed.
    pub kind: ErrorKind,
}

/// Error history: total count, last error, per-kind tally, and a bounded
/// trend sequence. Guarded by a single mutex with short, append-only critical
/// sections — no scans happen while the lock is held.
#[derive(Debug, Default)]
struct ErrorBookInner {
    total_errors: u64,
    last_error: Option<ErrorKind>,
    last_error_time_ms: i64,
    by_kind: HashMap<ErrorKind, u64>,
    trend: VecDeque<ErrorTrendPoint>,
}

/// Thread-safe error book.
#[derive(Debug, Default)]
pub struct ErrorBook(Mutex<ErrorBookInner>);

/// A point-in-time, lock-free-to-read snapshot of the error book, suitable for
/// serializing into `/stats` or rendering to Prometheus text.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBookSnapshot {
    /// Total errors recorded since construction.
    pub total_errors: u64,
    /// The most recently recorded kind, if any.
    pub last_error: Option<ErrorKind>,
    /// Epoch milliseconds of the most recent error.
    pub last_error_time_ms: i64,
    /// Count of errors observed per kind.
    pub by_kind: HashMap<ErrorKind, u64>,
    /// The bounded trend sequence, oldest first.
    pub trend: Vec<ErrorTrendPoint>,
}

impl ErrorBook {
    /// Construct an empty error book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an occurrence of `kind`. Appends to the trend, evicting the
    /// oldest entry if the buffer is already at capacity.
    pub fn record(&self, kind: ErrorKind) {
        let mut inner = self.0.lock();
        inner.total_errors += 1;
        inner.last_error = Some(kind);
        inner.last_error_time_ms = now_millis();
        *inner.by_kind.entry(kind).or_insert(0) += 1;
        if inner.trend.len() >= ERROR_TREND_CAPACITY {
            inner.trend.pop_front();
        }
        let timestamp_ms = inner.last_error_time_ms;
        inner.trend.push_back(ErrorTrendPoint {
            timestamp_ms,
            kind,
        });
    }

    /// Clone the current state into a [`ErrorBookSnapshot`], releasing the
    /// lock before any formatting happens.
    #[must_use]
    pub fn snapshot(&self) -> ErrorBookSnapshot {
        let inner = self.0.lock();
        ErrorBookSnapshot {
            total_errors: inner.total_errors,
            last_error: inner.last_error,
            last_error_time_ms: inner.last_error_time_ms,
            by_kind: inner.by_kind.clone(),
            trend: inner.trend.iter().copied().collect(),
        }
    }
}

/// Atomic, monotonically-nondecreasing counters plus connect/last-message
/// timestamps and an embedded [`ErrorBook`].
#[derive(Debug, Default)]
pub struct Stats {
    connect_time_ms: AtomicI64,
    last_message_time_ms: AtomicI64,
    messages_sent: AtomicU64,
    messages_received: AtomicU64,
    bytes_sent: AtomicU64,
    bytes_received: AtomicU64,
    reconnect_count: AtomicU64,
    connect_count: AtomicU64,
    /// Error history. Public so callers can record/snapshot directly.
    pub errors: ErrorBook,
}

/// A JSON-serializable snapshot of [`Stats`], as served by `/stats`.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    /// Epoch milliseconds of the earliest connect in the current live connection.
    pub connect_time_ms: i64,
    /// Epoch milliseconds of the last message sent or received.
    pub last_message_time_ms: i64,
    /// Total messages sent.
    pub messages_sent: u64,
    /// Total messages received.
    pub messages_received: u64,
    /// Total bytes sent.
    pub bytes_sent: u64,
    /// Total bytes received.
    pub bytes_received: u64,
    /// Total successful reconnects.
    pub reconnect_count: u64,
    /// Total successful connects (including the first).
    pub connect_count: u64,
    /// Total errors recorded.
    pub errors_total: u64,
    /// Error book summary.
    pub error_book: ErrorBookSnapshot,
}

impl Stats {
    /// Construct a fresh, all-zero stats block.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fresh connection's start time and increment the connect counter.
    pub fn mark_connected(&self) {
        self.connect_time_ms.store(now_millis(), Ordering::Relaxed);
        self.connect_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful outbound message of `bytes` length.
    pub fn record_sent(&self, bytes: usize) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
        self.last_message_time_ms.store(now_millis(), Ordering::Relaxed);
    }

    /// Record a successful inbound message of `bytes` length.
    pub fn record_received(&self, bytes: usize) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes as u64, Ordering::Relaxed);
        self.last_message_time_ms.store(now_millis(), Ordering::Relaxed);
    }

    /// Touch the last-message timestamp without counting a message — used by
    /// the Heartbeat Scheduler when a pong re-arms the read deadline.
    pub fn touch_last_message(&self) {
        self.last_message_time_ms.store(now_millis(), Ordering::Relaxed);
    }

    /// Record one successful reconnect.
    pub fn record_reconnect(&self) {
        self.reconnect_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Current value of `last_message_time_ms`.
    #[must_use]
    pub fn last_message_time_ms(&self) -> i64 {
        self.last_message_time_ms.load(Ordering::Relaxed)
    }

    /// Clone all counters plus the error book into a serializable snapshot.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        let error_book = self.errors.snapshot();
        StatsSnapshot {
            connect_time_ms: self.connect_time_ms.load(Ordering::Relaxed),
            last_message_time_ms: self.last_message_time_ms.load(Ordering::Relaxed),
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            reconnect_count: self.reconnect_count.load(Ordering::Relaxed),
            connect_count: self.connect_count.load(Ordering::Relaxed),
            errors_total: error_book.total_errors,
            error_book,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero() {
        let stats = Stats::new();
        let snap = stats.snapshot();
        assert_eq!(snap.messages_sent, 0);
        assert_eq!(snap.errors_total, 0);
    }

    #[test]
    fn record_sent_is_monotonic() {
        let stats = Stats::new();
        stats.record_sent(5);
        stats.record_sent(7);
        let snap = stats.snapshot();
        assert_eq!(snap.messages_sent, 2);
        assert_eq!(snap.bytes_sent, 12);
    }

    #[test]
    fn error_trend_capped_at_1000() {
        let book = ErrorBook::new();
        for _ in 0..1500 {
            book.record(ErrorKind::Unknown);
        }
        let snap = book.snapshot();
        assert_eq!(snap.trend.len(), ERROR_TREND_CAPACITY);
        assert_eq!(snap.total_errors, 1500);
    }

    #[test]
    fn by_kind_tally_accumulates() {
        let book = ErrorBook::new();
        book.record(ErrorKind::ConnectionRefused);
        book.record(ErrorKind::ConnectionRefused);
        book.record(ErrorKind::DNSError);
        let snap = book.snapshot();
        assert_eq!(snap.by_kind.get(&ErrorKind::ConnectionRefused), Some(&2));
        assert_eq!(snap.by_kind.get(&ErrorKind::DNSError), Some(&1));
    }
}
