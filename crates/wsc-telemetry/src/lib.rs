//! # wsc-telemetry
//!
//! The telemetry HTTP surface of the connection lifecycle engine: Prometheus
//! text-format metrics and JSON health/readiness/stats endpoints over the
//! [`wsc_core::Stats`] and [`wsc_core::AtomicConnectionState`] the transport
//! layer maintains.
//!
//! ## Architecture
//!
//! ```text
//! wsc-telemetry/
//! ├── metrics.rs  # Prometheus text-format rendering of a stats snapshot
//! ├── server.rs   # Two axum listeners: /metrics, and /health + /ready + /stats
//! └── error.rs    # Bind/join failure modes for the HTTP surface
//! ```
//!
//! Unlike the teacher crate this one is derived from, there is no
//! OpenTelemetry/OTLP exporter here: the engine's telemetry contract (spec
//! section 4.K) is a closed, small set of counters and gauges scraped
//! on-demand, so a hand-rendered Prometheus formatter is sufficient and the
//! `metrics`/`opentelemetry` crates are not part of this crate's dependency
//! surface (see DESIGN.md).

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![deny(unsafe_code)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::must_use_candidate
)]

pub mod error;
pub mod metrics;
pub mod server;

pub use error::{TelemetryError, TelemetryResult};
pub use server::TelemetryServer;
