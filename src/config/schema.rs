//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! Every field has a default reproducing the fixed behaviour of the binary;
//! only the listening port is supplied from the command line.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Root configuration for the trademark proxy.
#[derive(Debug, Clone, Default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, port, backpressure).
    pub listener: ListenerConfig,

    /// Upstream site whose content is fetched and rewritten.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Content rewriting settings.
    pub rewrite: RewriteConfig,

    /// Opt-in deviations from the default failure behaviour.
    pub hardening: HardeningConfig,
}

impl ProxyConfig {
    /// Default configuration listening on the given port.
    pub fn with_port(port: u16) -> Self {
        let mut config = Self::default();
        config.listener.port = port;
        config
    }
}

/// Listener configuration.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Bind address (IPv4, `0.0.0.0` by default).
    pub bind_address: Ipv4Addr,

    /// Listening port.
    pub port: u16,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,

    /// Pending connection queue length passed to `listen(2)`.
    pub backlog: i32,
}

impl ListenerConfig {
    /// Full socket address to bind.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(self.bind_address), self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: Ipv4Addr::UNSPECIFIED,
            port: 0,
            max_connections: 10_000,
            backlog: 1024,
        }
    }
}

/// Upstream origin configuration.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Scheme and authority with no trailing slash, e.g. `https://habr.com`.
    /// Request paths are appended verbatim and absolute links starting with
    /// this string are rewritten back to the proxy.
    pub origin: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            origin: "https://habr.com".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Maximum wait for a single inbound line, in seconds.
    pub request_line_secs: u64,

    /// Overall upstream fetch timeout, in seconds.
    pub fetch_secs: u64,

    /// How long shutdown waits for in-flight connections, in seconds.
    pub drain_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_line_secs: 10,
            fetch_secs: 5,
            drain_secs: 5,
        }
    }
}

/// Content rewriting configuration.
#[derive(Debug, Clone)]
pub struct RewriteConfig {
    /// Port advertised in rewritten links (`http://<peer-ip>:<port>`).
    /// Independent of the listening port.
    pub advertised_port: u16,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            advertised_port: 3333,
        }
    }
}

/// Opt-in hardening switches. All disabled by default.
#[derive(Debug, Clone, Default)]
pub struct HardeningConfig {
    /// Answer with `504 Gateway Timeout` when the upstream fetch fails
    /// instead of dropping the connection silently.
    pub gateway_timeout_on_fetch_failure: bool,
}
