//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use trademark_proxy::config::ListenerConfig;
use trademark_proxy::net::Listener;
use trademark_proxy::{ProxyConfig, ProxyServer, Shutdown};

/// Paths requested from a mock upstream, in arrival order.
pub type SeenPaths = Arc<Mutex<Vec<String>>>;

/// Start a mock upstream that answers every request with `body`.
pub async fn start_mock_upstream(body: &'static str) -> (SocketAddr, SeenPaths) {
    start_programmable_upstream(move |_| async move { (Duration::ZERO, body.to_string()) }).await
}

/// Start a mock upstream whose delay and body are chosen per request path.
pub async fn start_programmable_upstream<F, Fut>(f: F) -> (SocketAddr, SeenPaths)
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (Duration, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen: SeenPaths = Arc::default();
    let f = Arc::new(f);

    let seen_by_task = Arc::clone(&seen);
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = Arc::clone(&f);
            let seen = Arc::clone(&seen_by_task);
            tokio::spawn(async move {
                let path = read_request_path(&mut socket).await;
                seen.lock().unwrap().push(path.clone());

                let (delay, body) = f(path).await;
                tokio::time::sleep(delay).await;

                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, seen)
}

/// Read request headers and return the request target.
async fn read_request_path(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buf)
        .split_whitespace()
        .nth(1)
        .unwrap_or_default()
        .to_string()
}

/// Proxy configuration on an ephemeral loopback port pointed at `upstream`.
pub fn proxy_config(upstream: SocketAddr) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener = ListenerConfig {
        bind_address: Ipv4Addr::LOCALHOST,
        port: 0,
        ..ListenerConfig::default()
    };
    config.upstream.origin = format!("http://{upstream}");
    config.timeouts.request_line_secs = 2;
    config.timeouts.drain_secs = 1;
    config
}

/// Start the proxy and return its address with the shutdown handle.
pub async fn start_proxy(config: ProxyConfig) -> (SocketAddr, Shutdown) {
    let listener = Listener::bind(&config.listener).unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let server = ProxyServer::new(config);
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// Send `request`, optionally half-close, and read until the proxy closes.
pub async fn exchange(proxy: SocketAddr, request: &[u8], half_close: bool) -> Vec<u8> {
    let mut stream = TcpStream::connect(proxy).await.unwrap();
    stream.write_all(request).await.unwrap();
    if half_close {
        stream.shutdown().await.unwrap();
    }

    let mut response = Vec::new();
    let _ = tokio::time::timeout(Duration::from_secs(10), stream.read_to_end(&mut response)).await;
    response
}

/// Exact bytes the proxy emits for a rewritten `body`.
pub fn expected_response(body: &str) -> String {
    format!(
        "\nHTTP/1.1: 200 OK\nContent-Type: text/html; charset=UTF-8\nContent-Length: {}\nConnection: close\n{}",
        body.len(),
        body
    )
}
