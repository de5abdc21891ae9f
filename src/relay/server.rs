//! WebSocket Relay Server
//!
//! Async front door for fee-sponsored submission. Accepts operation
//! bundles, checks the allow-list, forwards to the execution backend, and
//! reports a transaction id or an error. The relay never retries; retry
//! policy belongs to the caller.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::relay::allowlist::AllowList;
use crate::relay::protocol::{OperationBundle, RejectReason, RelayRequest, RelayResponse};

/// Backend failures, surfaced to the caller as a rejection.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The execution environment refused the bundle.
    #[error("bundle rejected: {0}")]
    Rejected(String),

    /// The execution environment could not be reached.
    #[error("execution environment unavailable: {0}")]
    Unavailable(String),
}

/// Submits bundles to the underlying execution environment.
pub trait ExecutionBackend: Send + Sync {
    /// Submit a bundle, returning its transaction identifier.
    fn submit(&self, bundle: &OperationBundle) -> Result<String, BackendError>;
}

/// Backend that records every submitted bundle and returns fresh
/// transaction ids. Used by tests and the demo.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    submitted: Mutex<Vec<OperationBundle>>,
}

impl RecordingBackend {
    /// Create an empty recording backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bundles submitted so far, in order.
    pub fn submitted(&self) -> Vec<OperationBundle> {
        self.submitted.lock().unwrap().clone()
    }
}

impl ExecutionBackend for RecordingBackend {
    fn submit(&self, bundle: &OperationBundle) -> Result<String, BackendError> {
        self.submitted.lock().unwrap().push(bundle.clone());
        Ok(Uuid::new_v4().to_string())
    }
}

/// Relay server configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Server version string.
    pub version: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:9090".parse().unwrap(),
            max_connections: 1000,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Relay server errors.
#[derive(Debug, Error)]
pub enum RelayServerError {
    /// Failed to bind to address.
    #[error("failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// The gas-sponsorship relay.
pub struct RelayServer {
    config: RelayConfig,
    allowlist: Arc<AllowList>,
    backend: Arc<dyn ExecutionBackend>,
    connections: Arc<Mutex<usize>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl RelayServer {
    /// Create a relay over the given allow-list and backend.
    pub fn new(config: RelayConfig, allowlist: AllowList, backend: Arc<dyn ExecutionBackend>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            config,
            allowlist: Arc::new(allowlist),
            backend,
            connections: Arc::new(Mutex::new(0)),
            shutdown_tx,
        }
    }

    /// Handle one request against the allow-list and backend.
    ///
    /// Pure request handling, shared by the server loop and tests.
    pub fn handle_request(
        allowlist: &AllowList,
        backend: &dyn ExecutionBackend,
        request: RelayRequest,
    ) -> RelayResponse {
        match request {
            RelayRequest::Sponsor(bundle) => {
                if let Err(reason) = allowlist.check(&bundle.target, &bundle.selector) {
                    warn!(
                        target = %bundle.target,
                        selector = %bundle.selector,
                        ?reason,
                        "bundle rejected by allow-list"
                    );
                    return RelayResponse::Rejected {
                        request_id: Some(bundle.request_id),
                        reason,
                        message: format!(
                            "operation {}::{} is not sponsored",
                            bundle.target, bundle.selector
                        ),
                    };
                }

                match backend.submit(&bundle) {
                    Ok(tx_id) => {
                        info!(
                            request_id = %bundle.request_id,
                            selector = %bundle.selector,
                            tx_id = %tx_id,
                            "bundle sponsored"
                        );
                        RelayResponse::Sponsored {
                            request_id: bundle.request_id,
                            tx_id,
                        }
                    }
                    Err(e) => {
                        warn!(request_id = %bundle.request_id, error = %e, "backend refused bundle");
                        RelayResponse::Rejected {
                            request_id: Some(bundle.request_id),
                            reason: RejectReason::BackendRejected,
                            message: e.to_string(),
                        }
                    }
                }
            }
            RelayRequest::Ping { timestamp } => RelayResponse::Pong {
                timestamp,
                server_time: unix_millis(),
            },
        }
    }

    /// Run the accept loop until shutdown.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<(), RelayServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!("relay listening on {}", self.config.bind_addr);

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let active = *self.connections.lock().unwrap();
                            if active >= self.config.max_connections {
                                warn!("connection limit reached, rejecting {}", addr);
                                continue;
                            }
                            debug!("new connection from {}", addr);
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("shutdown signal received");
                    break;
                }
            }
        }
        Ok(())
    }

    /// Signal the server to stop accepting connections.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Handle one WebSocket connection on its own task.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let allowlist = self.allowlist.clone();
        let backend = self.backend.clone();
        let connections = self.connections.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        *connections.lock().unwrap() += 1;

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    error!("websocket handshake failed for {}: {}", addr, e);
                    *connections.lock().unwrap() -= 1;
                    return;
                }
            };

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();

            loop {
                tokio::select! {
                    msg = ws_receiver.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                let response = match RelayRequest::from_json(&text) {
                                    Ok(request) => Self::handle_request(&allowlist, backend.as_ref(), request),
                                    Err(e) => {
                                        debug!("invalid message from {}: {}", addr, e);
                                        RelayResponse::Rejected {
                                            request_id: None,
                                            reason: RejectReason::MalformedRequest,
                                            message: "invalid message format".to_string(),
                                        }
                                    }
                                };
                                let text = match response.to_json() {
                                    Ok(t) => t,
                                    Err(e) => {
                                        error!("failed to serialize response: {}", e);
                                        continue;
                                    }
                                };
                                if ws_sender.send(Message::Text(text)).await.is_err() {
                                    break;
                                }
                            }
                            Some(Ok(Message::Close(_))) | None => break,
                            Some(Ok(_)) => {} // ignore binary/ping frames
                            Some(Err(e)) => {
                                debug!("websocket error from {}: {}", addr, e);
                                break;
                            }
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        let notice = RelayResponse::Shutdown { reason: "relay stopping".into() };
                        if let Ok(text) = notice.to_json() {
                            let _ = ws_sender.send(Message::Text(text)).await;
                        }
                        break;
                    }
                }
            }

            *connections.lock().unwrap() -= 1;
            debug!("connection {} closed", addr);
        });
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle(target: &str, selector: &str) -> OperationBundle {
        OperationBundle {
            request_id: Uuid::new_v4(),
            sender: "0xabc".into(),
            target: target.into(),
            selector: selector.into(),
            payload: serde_json::json!({}),
            signature: "deadbeef".into(),
        }
    }

    #[test]
    fn test_allowed_bundle_is_sponsored() {
        let allowlist = AllowList::escrow_default("chess-escrow");
        let backend = RecordingBackend::new();

        let request = RelayRequest::Sponsor(bundle("chess-escrow", "capture_piece"));
        let response = RelayServer::handle_request(&allowlist, &backend, request);

        assert!(matches!(response, RelayResponse::Sponsored { .. }));
        assert_eq!(backend.submitted().len(), 1);
    }

    #[test]
    fn test_disallowed_target_never_reaches_backend() {
        let allowlist = AllowList::escrow_default("chess-escrow");
        let backend = RecordingBackend::new();

        let request = RelayRequest::Sponsor(bundle("other-contract", "capture_piece"));
        let response = RelayServer::handle_request(&allowlist, &backend, request);

        assert!(matches!(
            response,
            RelayResponse::Rejected { reason: RejectReason::TargetNotAllowed, .. }
        ));
        assert!(backend.submitted().is_empty());
    }

    #[test]
    fn test_disallowed_selector_rejected() {
        let allowlist = AllowList::escrow_default("chess-escrow");
        let backend = RecordingBackend::new();

        let request = RelayRequest::Sponsor(bundle("chess-escrow", "withdraw_all"));
        let response = RelayServer::handle_request(&allowlist, &backend, request);

        assert!(matches!(
            response,
            RelayResponse::Rejected { reason: RejectReason::SelectorNotAllowed, .. }
        ));
        assert!(backend.submitted().is_empty());
    }

    #[test]
    fn test_backend_failure_reported_as_rejection() {
        struct FailingBackend;
        impl ExecutionBackend for FailingBackend {
            fn submit(&self, _bundle: &OperationBundle) -> Result<String, BackendError> {
                Err(BackendError::Unavailable("chain down".into()))
            }
        }

        let allowlist = AllowList::escrow_default("chess-escrow");
        let request = RelayRequest::Sponsor(bundle("chess-escrow", "end_game"));
        let response = RelayServer::handle_request(&allowlist, &FailingBackend, request);

        assert!(matches!(
            response,
            RelayResponse::Rejected { reason: RejectReason::BackendRejected, .. }
        ));
    }

    #[test]
    fn test_ping_pong() {
        let allowlist = AllowList::new();
        let backend = RecordingBackend::new();

        let response = RelayServer::handle_request(
            &allowlist,
            &backend,
            RelayRequest::Ping { timestamp: 42 },
        );
        assert!(matches!(response, RelayResponse::Pong { timestamp: 42, .. }));
    }
}
