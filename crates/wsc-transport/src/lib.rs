//! # wsc-transport
//!
//! The WebSocket transport implementation of the connection lifecycle engine:
//! the Transport Connector, Writer Gate, Reader Task, Heartbeat Scheduler,
//! Session Supervisor, Shutdown Coordinator, lock watchdog, and audit log,
//! wired together behind a single [`WsClient`] handle.
//!
//! ## Architecture
//!
//! ```text
//! wsc-transport/
//! ├── connector.rs   # Transport Connector: single dial + handshake
//! ├── writer.rs      # Writer Gate: serialized outbound frames
//! ├── reader.rs      # Reader Task: inbound frame loop
//! ├── heartbeat.rs   # Heartbeat Scheduler: periodic ping emission
//! ├── supervisor.rs  # Session Supervisor: the reconnect loop
//! ├── shutdown.rs    # Shutdown Coordinator: idempotent stop()
//! ├── watchdog.rs    # Lock-acquisition watchdog (diagnostic only)
//! ├── audit.rs       # Per-frame audit log, distinct from operational tracing
//! └── client.rs      # WsClient: the public handle tying it all together
//! ```

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

pub mod audit;
pub mod client;
pub mod connector;
pub mod heartbeat;
pub mod reader;
pub mod shutdown;
pub mod supervisor;
pub mod watchdog;
pub mod writer;

pub use audit::AuditLog;
pub use client::WsClient;
pub use connector::{WebSocketConnector, WsHandle, WsSink, WsStream};
pub use heartbeat::HeartbeatExit;
pub use reader::ReaderExit;
pub use shutdown::ShutdownCoordinator;
pub use supervisor::{CurrentWriter, Supervisor};
pub use writer::WriterGate;
