//! The telemetry HTTP surface: two listeners, one serving `/metrics`
//! (Prometheus text v0.0.4), the other serving `/health`, `/ready`, `/stats`
//! (JSON), over the same [`Stats`]/[`AtomicConnectionState`] the engine
//! already maintains. `axum::serve` over a bound `TcpListener`, with graceful
//! shutdown via a cooperative signal future.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tower_http::timeout::TimeoutLayer;
use tracing::{info, warn};
use wsc_core::state::AtomicConnectionState;
use wsc_core::{ConnectionState, SessionId, Stats};

use crate::error::{TelemetryError, TelemetryResult};
use crate::metrics;

/// Per-request timeout applied to both listeners (spec 4.K: `Read/Write
/// Timeout = 30s`). `ReadHeaderTimeout <= 10s` and `IdleTimeout = 60s` are not
/// separately expressible through `axum::serve`'s default hyper-auto
/// acceptor without dropping to the lower-level `hyper_util` connection
/// builder; this implementation accepts the single request-timeout knob
/// `tower_http` exposes and notes the gap in DESIGN.md.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Budget for joining both server tasks during shutdown (spec 4.L step 5).
const SHUTDOWN_BUDGET: Duration = Duration::from_secs(5);

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[derive(Clone)]
struct TelemetryState {
    stats: Arc<Stats>,
    state: Arc<AtomicConnectionState>,
    session_id: SessionId,
}

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
    state: String,
    session_id: String,
    timestamp: i64,
}

#[derive(Debug, Serialize)]
struct ReadyBody {
    ready: bool,
    state: String,
    session_id: String,
    timestamp: i64,
}

async fn metrics_handler(State(st): State<TelemetryState>) -> Response {
    let snapshot = st.stats.snapshot();
    let body = metrics::render(&snapshot, st.state.sample());
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response()
}

async fn health_handler(State(st): State<TelemetryState>) -> Response {
    let current = st.state.sample();
    let unhealthy = matches!(current, ConnectionState::Stopping | ConnectionState::Stopped);
    let body = HealthBody {
        status: if unhealthy { "unhealthy" } else { "healthy" },
        state: current.to_string(),
        session_id: st.session_id.as_str().to_string(),
        timestamp: now_millis(),
    };
    let code = if unhealthy { StatusCode::SERVICE_UNAVAILABLE } else { StatusCode::OK };
    (code, Json(body)).into_response()
}

async fn ready_handler(State(st): State<TelemetryState>) -> Response {
    let current = st.state.sample();
    let ready = matches!(current, ConnectionState::Connected);
    let body = ReadyBody {
        ready,
        state: current.to_string(),
        session_id: st.session_id.as_str().to_string(),
        timestamp: now_millis(),
    };
    let code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (code, Json(body)).into_response()
}

async fn stats_handler(State(st): State<TelemetryState>) -> Response {
    (StatusCode::OK, Json(st.stats.snapshot())).into_response()
}

/// A running telemetry HTTP surface. Spawned at construction when
/// `monitoring_enabled` is set; joined during Stopping with a 5s shutdown
/// budget (spec section 3's "Telemetry servers" lifecycle).
pub struct TelemetryServer {
    metrics_task: JoinHandle<()>,
    health_task: JoinHandle<()>,
    metrics_shutdown: watch::Sender<bool>,
    health_shutdown: watch::Sender<bool>,
}

impl TelemetryServer {
    /// Bind both listeners and spawn their serve loops. `metrics_port` serves
    /// `GET /metrics`; `health_port` serves `GET /health`, `/ready`, `/stats`.
    pub async fn spawn(
        metrics_port: u16,
        health_port: u16,
        stats: Arc<Stats>,
        state: Arc<AtomicConnectionState>,
        session_id: SessionId,
    ) -> TelemetryResult<Self> {
        let telemetry_state = TelemetryState {
            stats,
            state,
            session_id,
        };

        let metrics_app = Router::new()
            .route("/metrics", get(metrics_handler))
            .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
            .with_state(telemetry_state.clone());

        let health_app = Router::new()
            .route("/health", get(health_handler))
            .route("/ready", get(ready_handler))
            .route("/stats", get(stats_handler))
            .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
            .with_state(telemetry_state);

        let metrics_addr = SocketAddr::from(([0, 0, 0, 0], metrics_port));
        let health_addr = SocketAddr::from(([0, 0, 0, 0], health_port));

        let metrics_listener = TcpListener::bind(metrics_addr)
            .await
            .map_err(|source| TelemetryError::Bind { addr: metrics_addr, source })?;
        let health_listener = TcpListener::bind(health_addr)
            .await
            .map_err(|source| TelemetryError::Bind { addr: health_addr, source })?;

        info!(%metrics_addr, "metrics endpoint listening");
        info!(%health_addr, "health/ready/stats endpoints listening");

        let (metrics_shutdown, mut metrics_rx) = watch::channel(false);
        let (health_shutdown, mut health_rx) = watch::channel(false);

        let metrics_task = tokio::spawn(async move {
            let serve = axum::serve(metrics_listener, metrics_app)
                .with_graceful_shutdown(async move {
                    let _ = metrics_rx.changed().await;
                });
            if let Err(err) = serve.await {
                warn!(error = %err, "metrics server exited with error");
            }
        });

        let health_task = tokio::spawn(async move {
            let serve = axum::serve(health_listener, health_app)
                .with_graceful_shutdown(async move {
                    let _ = health_rx.changed().await;
                });
            if let Err(err) = serve.await {
                warn!(error = %err, "health server exited with error");
            }
        });

        Ok(Self {
            metrics_task,
            health_task,
            metrics_shutdown,
            health_shutdown,
        })
    }

    /// Signal graceful shutdown on both listeners and wait up to the 5s
    /// shutdown budget before abandoning them.
    pub async fn shutdown(self) {
        let _ = self.metrics_shutdown.send(true);
        let _ = self.health_shutdown.send(true);
        let joined = tokio::time::timeout(SHUTDOWN_BUDGET, async {
            let _ = self.metrics_task.await;
            let _ = self.health_task.await;
        })
        .await;
        if joined.is_err() {
            warn!("telemetry servers did not shut down within the 5s budget");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wsc_core::traits::FrameKind;
    use wsc_core::SessionId as WscSessionId;

    async fn free_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    #[tokio::test]
    async fn health_and_ready_reflect_connection_state() {
        let stats = Arc::new(Stats::new());
        let state = Arc::new(AtomicConnectionState::new());
        let session = WscSessionId::generate();

        let metrics_port = free_port().await;
        let health_port = free_port().await;

        let server = TelemetryServer::spawn(metrics_port, health_port, Arc::clone(&stats), Arc::clone(&state), session)
            .await
            .unwrap();

        let client = reqwest::Client::new();

        // Disconnected: healthy but not ready.
        let health = client.get(format!("http://127.0.0.1:{health_port}/health")).send().await.unwrap();
        assert_eq!(health.status(), reqwest::StatusCode::OK);
        let ready = client.get(format!("http://127.0.0.1:{health_port}/ready")).send().await.unwrap();
        assert_eq!(ready.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);

        state.store(ConnectionState::Connected);
        let ready = client.get(format!("http://127.0.0.1:{health_port}/ready")).send().await.unwrap();
        assert_eq!(ready.status(), reqwest::StatusCode::OK);

        state.store(ConnectionState::Stopping);
        let health = client.get(format!("http://127.0.0.1:{health_port}/health")).send().await.unwrap();
        assert_eq!(health.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);

        server.shutdown().await;
        let _ = FrameKind::Text;
    }

    #[tokio::test]
    async fn metrics_endpoint_serves_prometheus_text() {
        let stats = Arc::new(Stats::new());
        stats.record_sent(5);
        let state = Arc::new(AtomicConnectionState::new());
        let session = WscSessionId::generate();

        let metrics_port = free_port().await;
        let health_port = free_port().await;
        let server = TelemetryServer::spawn(metrics_port, health_port, stats, state, session)
            .await
            .unwrap();

        let resp = reqwest::get(format!("http://127.0.0.1:{metrics_port}/metrics")).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let content_type = resp.headers().get(reqwest::header::CONTENT_TYPE).unwrap().to_str().unwrap().to_string();
        assert!(content_type.contains("text/plain"));
        let body = resp.text().await.unwrap();
        assert!(body.contains("wsc_messages_sent_total 1"));

        server.shutdown().await;
    }

    #[tokio::test]
    async fn stats_endpoint_serves_json_snapshot() {
        let stats = Arc::new(Stats::new());
        let state = Arc::new(AtomicConnectionState::new());
        let session = WscSessionId::generate();

        let metrics_port = free_port().await;
        let health_port = free_port().await;
        let server = TelemetryServer::spawn(metrics_port, health_port, stats, state, session)
            .await
            .unwrap();

        let resp = reqwest::get(format!("http://127.0.0.1:{health_port}/stats")).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let json: serde_json::Value = resp.json().await.unwrap();
        assert!(json.get("messages_sent").is_some());

        server.shutdown().await;
    }
}
