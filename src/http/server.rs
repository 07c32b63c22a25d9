//! Proxy server: accept loop and per-connection handling.
//!
//! # Responsibilities
//! - Accept connections until shutdown is signalled
//! - Spawn one independent task per connection
//! - Drive each connection through read → fetch → rewrite → respond → close
//! - Drain in-flight connections on shutdown
//!
//! # Design Decisions
//! - A failed fetch aborts the connection without writing anything, unless
//!   `hardening.gateway_timeout_on_fetch_failure` is enabled
//! - The upstream session lives exactly as long as the handler call

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tracing::Instrument;

use crate::config::ProxyConfig;
use crate::http::request::read_request;
use crate::http::response::RawResponse;
use crate::net::{ConnectionGuard, ConnectionState, ConnectionTracker, Listener, ListenerError};
use crate::rewrite::{rewrite_body, RewriteContext};
use crate::upstream::{FetchError, UpstreamSession};

/// Why a connection ended without a rewritten response.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The upstream fetch failed or timed out.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Writing to the client failed.
    #[error("client I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The trademark proxy server.
#[derive(Debug)]
pub struct ProxyServer {
    config: Arc<ProxyConfig>,
    tracker: ConnectionTracker,
}

impl ProxyServer {
    /// Create a new server with the given configuration.
    pub fn new(config: ProxyConfig) -> Self {
        Self {
            config: Arc::new(config),
            tracker: ConnectionTracker::new(),
        }
    }

    /// Accept connections until `shutdown` fires, then release the listening
    /// socket and wait for in-flight connections.
    pub async fn run(
        &self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ListenerError> {
        tracing::info!(
            address = ?listener.local_addr().ok(),
            upstream = %self.config.upstream.origin,
            "Proxy server starting"
        );

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer_addr, permit)) => {
                        let config = Arc::clone(&self.config);
                        let connection = self.tracker.track();
                        let span = tracing::info_span!(
                            "connection",
                            connection_id = %connection.id(),
                            peer_addr = %peer_addr,
                        );
                        tokio::spawn(
                            async move {
                                let _permit = permit;
                                serve_connection(stream, peer_addr, &config, connection).await;
                            }
                            .instrument(span),
                        );
                    }
                    Err(ListenerError::LimiterClosed) => return Err(ListenerError::LimiterClosed),
                    Err(e) => tracing::error!(error = %e, "Failed to accept connection"),
                },
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, no longer accepting");
                    break;
                }
            }
        }

        drop(listener);

        let drain = Duration::from_secs(self.config.timeouts.drain_secs);
        if tokio::time::timeout(drain, self.tracker.wait_for_drain())
            .await
            .is_err()
        {
            tracing::warn!(
                active_connections = self.tracker.active_count(),
                "Drain timeout elapsed, abandoning in-flight connections"
            );
        }

        tracing::info!("Proxy server stopped");
        Ok(())
    }
}

async fn serve_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    config: &ProxyConfig,
    mut connection: ConnectionGuard,
) {
    match handle_connection(stream, peer_addr, config, &mut connection).await {
        Ok(()) => {}
        Err(ProxyError::Fetch(e)) => {
            tracing::error!(error = %e, "Upstream fetch failed, dropping connection");
        }
        Err(e) => {
            tracing::error!(error = %e, "Connection failed");
        }
    }
}

/// Handle one accepted connection from request to close.
///
/// Nothing is written to the client until the rewritten body is complete.
/// The connection is `Closed` on return, whether or not the exchange succeeded.
pub async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    config: &ProxyConfig,
    connection: &mut ConnectionGuard,
) -> Result<(), ProxyError> {
    let result = exchange(stream, peer_addr, config, connection).await;
    connection.advance(ConnectionState::Closed);
    result
}

async fn exchange(
    mut stream: TcpStream,
    peer_addr: SocketAddr,
    config: &ProxyConfig,
    connection: &mut ConnectionGuard,
) -> Result<(), ProxyError> {
    let session = UpstreamSession::open(
        config.upstream.origin.as_str(),
        Duration::from_secs(config.timeouts.fetch_secs),
    )?;

    let (read_half, mut write_half) = stream.split();

    connection.advance(ConnectionState::ReadingRequest);
    let mut reader = BufReader::new(read_half);
    let request = read_request(
        &mut reader,
        Duration::from_secs(config.timeouts.request_line_secs),
    )
    .await;
    tracing::info!(path = %request.path(), outcome = ?request.outcome(), "Request path resolved");

    connection.advance(ConnectionState::Fetching);
    let upstream = match session.fetch(request.path()).await {
        Ok(upstream) => upstream,
        Err(e) => {
            if config.hardening.gateway_timeout_on_fetch_failure {
                connection.advance(ConnectionState::Responding);
                write_half
                    .write_all(&RawResponse::gateway_timeout().into_bytes())
                    .await?;
                write_half.shutdown().await?;
            }
            return Err(e.into());
        }
    };

    connection.advance(ConnectionState::Rewriting);
    let ctx = RewriteContext {
        origin: &config.upstream.origin,
        peer_ip: peer_addr.ip(),
        advertised_port: config.rewrite.advertised_port,
    };
    let body = rewrite_body(&upstream.body, &ctx);

    connection.advance(ConnectionState::Responding);
    let content_length = body.byte_len();
    write_half
        .write_all(&RawResponse::ok(body).into_bytes())
        .await?;
    write_half.shutdown().await?;

    tracing::info!(content_length, "Response written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    /// Upstream that answers one request with `body`.
    async fn one_shot_upstream(body: &'static str) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
        });
        addr
    }

    /// A port with nothing listening on it.
    async fn refused_addr() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    }

    fn config_for(upstream: SocketAddr) -> ProxyConfig {
        let mut config = ProxyConfig::default();
        config.listener.bind_address = Ipv4Addr::LOCALHOST;
        config.upstream.origin = format!("http://{upstream}");
        config.timeouts.fetch_secs = 2;
        config
    }

    /// Run `handle_connection` for a client that sends `GET /` and half-closes.
    async fn serve_one(config: &ProxyConfig) -> (Result<(), ProxyError>, ConnectionState, Vec<u8>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = tokio::spawn(async move {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            stream.write_all(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();
            stream.shutdown().await.unwrap();
            let mut response = Vec::new();
            let _ = stream.read_to_end(&mut response).await;
            response
        });

        let (stream, peer_addr) = listener.accept().await.unwrap();
        let tracker = ConnectionTracker::new();
        let mut connection = tracker.track();
        let result = handle_connection(stream, peer_addr, config, &mut connection).await;
        let state = connection.state();
        drop(connection);

        (result, state, client.await.unwrap())
    }

    #[tokio::test]
    async fn successful_exchange_ends_closed() {
        let config = config_for(one_shot_upstream("<p>target1</p>").await);

        let (result, state, response) = serve_one(&config).await;

        assert!(result.is_ok());
        assert_eq!(state, ConnectionState::Closed);
        assert!(response.ends_with(b"<p>target1</p>"));
    }

    #[tokio::test]
    async fn failed_fetch_ends_closed() {
        let config = config_for(refused_addr().await);

        let (result, state, response) = serve_one(&config).await;

        assert!(matches!(result, Err(ProxyError::Fetch(_))));
        assert_eq!(state, ConnectionState::Closed);
        assert!(response.is_empty());
    }

    #[tokio::test]
    async fn hardened_failed_fetch_ends_closed_after_504() {
        let mut config = config_for(refused_addr().await);
        config.hardening.gateway_timeout_on_fetch_failure = true;

        let (result, state, response) = serve_one(&config).await;

        assert!(result.is_err());
        assert_eq!(state, ConnectionState::Closed);
        assert!(response.starts_with(b"HTTP/1.1 504 Gateway Timeout\r\n"));
    }
}
