//! Transport Connector: a single dial + handshake, bounded by the handshake
//! timeout and the root cancellation token. No internal retry.

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{Connector as TlsConnector, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use wsc_core::error::{ClassifyInput, Operation};
use wsc_core::{classify, ClientConfig, ConnectionFailure, ErrorKind, TlsPolicy};
use wsc_core::traits::{ConnectionHandle, Connector};

/// The write half of a live WebSocket connection.
pub type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
/// The read half of a live WebSocket connection.
pub type WsStream = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// A live connection, already split into independently-owned halves: the
/// Writer Gate takes `sink`, the Reader Task takes `stream`.
#[derive(Debug)]
pub struct WsHandle {
    /// Outbound half, serialized exclusively by the Writer Gate.
    pub sink: WsSink,
    /// Inbound half, consumed exclusively by the Reader Task.
    pub stream: WsStream,
}

impl ConnectionHandle for WsHandle {}

/// Default [`Connector`] implementation, dialing real WebSocket endpoints via
/// `tokio-tungstenite`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebSocketConnector;

fn tls_connector_for(policy: TlsPolicy) -> Option<TlsConnector> {
    match policy {
        TlsPolicy::ForceVerify => None,
        TlsPolicy::SkipVerifyQuiet | TlsPolicy::SkipVerifyWarn => {
            if matches!(policy, TlsPolicy::SkipVerifyWarn) {
                tracing::warn!("TLS certificate verification disabled (SkipVerifyWarn policy)");
            }
            let tls = native_tls::TlsConnector::builder()
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true)
                .build()
                .expect("native-tls connector builder is infallible for this configuration");
            Some(TlsConnector::NativeTls(tls))
        }
    }
}

#[async_trait::async_trait]
impl Connector for WebSocketConnector {
    type Handle = WsHandle;

    async fn connect(
        &self,
        cancel: &CancellationToken,
        config: &ClientConfig,
    ) -> Result<Self::Handle, ConnectionFailure> {
        let fail = |kind: ErrorKind, cause: String| ConnectionFailure {
            kind,
            op: Operation::Connect,
            url: config.url.clone(),
            cause,
            retryable: !matches!(
                wsc_core::strategy(kind),
                wsc_core::RecoveryStrategy::None
            ),
        };

        if !(config.url.starts_with("ws://") || config.url.starts_with("wss://")) {
            return Err(fail(ErrorKind::InvalidURL, config.url.clone()));
        }

        let connector = tls_connector_for(config.tls_policy);
        let dial = tokio_tungstenite::connect_async_tls_with_config(
            &config.url,
            None,
            false,
            connector,
        );

        tracing::debug!(url = %config.url, timeout_ms = config.handshake_timeout.as_millis(), "dialing");

        let result = tokio::select! {
            res = tokio::time::timeout(config.handshake_timeout, dial) => res,
            () = cancel.cancelled() => {
                return Err(fail(ErrorKind::ConnectionTimeout, "cancelled during dial".to_string()));
            }
        };

        match result {
            Ok(Ok((stream, _response))) => {
                let (sink, stream) = stream.split();
                Ok(WsHandle { sink, stream })
            }
            Ok(Err(err)) => {
                let kind = classify_tungstenite(&err);
                Err(fail(kind, err.to_string()))
            }
            Err(_elapsed) => Err(fail(
                ErrorKind::ConnectionTimeout,
                format!("handshake exceeded {:?}", config.handshake_timeout),
            )),
        }
    }

    async fn close(&self, mut handle: Self::Handle, reason: &str) -> Result<(), ConnectionFailure> {
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: reason.to_string().into(),
        };
        let result = handle.sink.send(Message::Close(Some(frame))).await;
        let _ = handle.sink.close().await;
        result.map_err(|err| ConnectionFailure {
            kind: classify_tungstenite(&err),
            op: Operation::Close,
            url: String::new(),
            cause: err.to_string(),
            retryable: false,
        })
    }

    async fn probe(&self, handle: &mut Self::Handle) -> bool {
        let deadline = Duration::from_secs(5);
        tokio::time::timeout(deadline, handle.sink.send(Message::Ping(Vec::new().into())))
            .await
            .map(|res| res.is_ok())
            .unwrap_or(false)
    }
}

fn classify_tungstenite(err: &tokio_tungstenite::tungstenite::Error) -> ErrorKind {
    use tokio_tungstenite::tungstenite::Error as WsError;
    match err {
        WsError::Io(io_err) => classify(ClassifyInput::Io(io_err)),
        WsError::Tls(_) => ErrorKind::TLSError,
        WsError::Http(response) => {
            if response.status().is_client_error() || response.status().is_server_error() {
                ErrorKind::HandshakeFailed
            } else {
                ErrorKind::Unknown
            }
        }
        WsError::ConnectionClosed | WsError::AlreadyClosed => ErrorKind::ConnectionLost,
        WsError::Url(_) => ErrorKind::InvalidURL,
        other => classify(ClassifyInput::Message(&other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn force_verify_uses_default_connector() {
        assert!(tls_connector_for(TlsPolicy::ForceVerify).is_none());
    }

    #[test]
    fn skip_verify_quiet_builds_insecure_connector() {
        assert!(tls_connector_for(TlsPolicy::SkipVerifyQuiet).is_some());
    }

    #[tokio::test]
    async fn invalid_url_rejected_before_dial() {
        let connector = WebSocketConnector;
        let cancel = CancellationToken::new();
        let config = ClientConfig::new("https://example.com");
        let err = connector.connect(&cancel, &config).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidURL);
    }

    #[tokio::test]
    async fn cancellation_during_dial_is_reported_as_timeout() {
        let connector = WebSocketConnector;
        let cancel = CancellationToken::new();
        cancel.cancel();
        // Unroutable TEST-NET-1 address: connect_async will hang until the
        // cancellation branch wins the select.
        let config = ClientConfig::new("ws://192.0.2.1:9");
        let err = connector.connect(&cancel, &config).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ConnectionTimeout);
    }
}
