//! Prometheus text-format (v0.0.4) rendering of [`StatsSnapshot`] and
//! connection state, per spec section 4.K. Hand-rendered rather than routed
//! through a metrics-registry crate: the exact counter/gauge/label set is
//! small and closed, so a pure formatting function keeps the surface easy to
//! test without a global recorder.

use std::fmt::Write as _;
use wsc_core::{ConnectionState, StatsSnapshot};

/// Render a full `/metrics` response body from a stats snapshot and the
/// current connection state.
#[must_use]
pub fn render(snapshot: &StatsSnapshot, state: ConnectionState) -> String {
    let mut out = String::new();

    write_counter(
        &mut out,
        "wsc_connections_total",
        "Total successful connection attempts",
        snapshot.connect_count,
    );
    write_counter(
        &mut out,
        "wsc_reconnections_total",
        "Total successful reconnects after a connection loss",
        snapshot.reconnect_count,
    );
    write_counter(
        &mut out,
        "wsc_messages_sent_total",
        "Total messages sent",
        snapshot.messages_sent,
    );
    write_counter(
        &mut out,
        "wsc_messages_received_total",
        "Total messages received",
        snapshot.messages_received,
    );
    write_counter(
        &mut out,
        "wsc_bytes_sent_total",
        "Total bytes sent",
        snapshot.bytes_sent,
    );
    write_counter(
        &mut out,
        "wsc_bytes_received_total",
        "Total bytes received",
        snapshot.bytes_received,
    );
    write_counter(
        &mut out,
        "wsc_errors_total",
        "Total classified errors recorded",
        snapshot.errors_total,
    );

    let active = u8::from(matches!(state, ConnectionState::Connected));
    let _ = writeln!(out, "# HELP wsc_connections_active Whether a live connection is currently established (0 or 1)");
    let _ = writeln!(out, "# TYPE wsc_connections_active gauge");
    let _ = writeln!(out, "wsc_connections_active {active}");

    let _ = writeln!(out, "# HELP wsc_errors_by_code_total Classified errors by stable numeric code and name");
    let _ = writeln!(out, "# TYPE wsc_errors_by_code_total counter");
    let mut by_kind: Vec<_> = snapshot.error_book.by_kind.iter().collect();
    by_kind.sort_by_key(|(kind, _)| kind.code());
    for (kind, count) in by_kind {
        let _ = writeln!(
            out,
            "wsc_errors_by_code_total{{error_code=\"{}\",error_name=\"{}\"}} {count}",
            kind.code(),
            kind.name(),
        );
    }

    out
}

fn write_counter(out: &mut String, name: &str, help: &str, value: u64) {
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} counter");
    let _ = writeln!(out, "{name} {value}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use wsc_core::{ErrorBook, ErrorKind, Stats};

    #[test]
    fn renders_cumulative_counters() {
        let stats = Stats::new();
        stats.record_sent(5);
        stats.record_received(7);
        let text = render(&stats.snapshot(), ConnectionState::Connected);
        assert!(text.contains("wsc_messages_sent_total 1"));
        assert!(text.contains("wsc_bytes_received_total 7"));
        assert!(text.contains("wsc_connections_active 1"));
    }

    #[test]
    fn active_gauge_reflects_state() {
        let stats = Stats::new();
        let text = render(&stats.snapshot(), ConnectionState::Reconnecting);
        assert!(text.contains("wsc_connections_active 0"));
    }

    #[test]
    fn error_labels_include_code_and_name() {
        let book = ErrorBook::new();
        book.record(ErrorKind::ConnectionRefused);
        let stats = Stats::new();
        stats.errors.record(ErrorKind::ConnectionRefused);
        let text = render(&stats.snapshot(), ConnectionState::Disconnected);
        assert!(text.contains(r#"wsc_errors_by_code_total{error_code="1001",error_name="connection_refused"} 1"#));
        let _ = book;
    }
}
