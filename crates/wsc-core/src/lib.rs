//! # wsc-core
//!
//! Configuration, connection state machine, error taxonomy, recovery policy
//! and retry policy shared by every piece of the wsc WebSocket client engine.
//! This crate is the foundational abstraction layer: it defines the types and
//! capability traits that `wsc-transport` implements and `wsc-telemetry`
//! observes.
//!
//! ## Overview
//!
//! This crate defines:
//! - **Config**: [`ClientConfig`], [`TlsPolicy`], [`RateLimiterConfig`], [`SecurityCheckerConfig`]
//! - **State**: [`ConnectionState`], [`AtomicConnectionState`], [`SessionId`]
//! - **Errors**: [`ErrorKind`], [`ConnectionFailure`], [`RetryFailure`], [`classify`]
//! - **Policy**: [`RecoveryStrategy`], [`strategy`], [`RecoverySelector`], [`RetryPolicy`]
//! - **Stats**: [`Stats`], [`ErrorBook`]
//! - **Traits**: [`Connector`], [`MessageProcessor`], [`ErrorRecovery`], [`Callbacks`]
//! - **Resources**: [`BufferPool`], [`RateLimiter`], [`SecurityChecker`]

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

pub mod buffer_pool;
pub mod config;
pub mod error;
pub mod rate_limit;
pub mod recovery;
pub mod retry;
pub mod state;
pub mod stats;
pub mod traits;

pub use buffer_pool::{BufferPool, PooledBuffer, GLOBAL_BUFFER_POOL};
pub use config::{AdaptiveBufferConfig, ClientConfig, RateLimiterConfig, SecurityCheckerConfig, TlsPolicy};
pub use error::{classify, ClassifyInput, ConfigError, ConnectionFailure, ErrorKind, Operation, RetryFailure};
pub use rate_limit::{DefaultMessageProcessor, RateLimiter, SecurityChecker};
pub use recovery::{strategy, RecoverySelector, RecoveryStrategy};
pub use retry::{Decision, Phase, RetryPolicy};
pub use state::{AtomicConnectionState, ConnectionState, SessionId};
pub use stats::{ErrorBook, ErrorBookSnapshot, ErrorTrendPoint, Stats, StatsSnapshot};
pub use traits::{Callbacks, ConnectionHandle, Connector, ErrorRecovery, FrameKind, MessageProcessor, NoopCallbacks, ProcessOutcome};
