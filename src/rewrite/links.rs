//! Absolute link rewriting.

use std::net::{IpAddr, SocketAddr};

/// Origin the client should use to reach the proxy, e.g. `http://203.0.113.5:3333`.
pub fn proxy_origin(peer_ip: IpAddr, port: u16) -> String {
    format!("http://{}", SocketAddr::new(peer_ip, port))
}

/// Replace every literal occurrence of `origin` with the proxy's own origin.
pub fn rewrite_links(body: &str, origin: &str, peer_ip: IpAddr, port: u16) -> String {
    if origin.is_empty() {
        return body.to_owned();
    }
    body.replace(origin, &proxy_origin(peer_ip, port))
}
