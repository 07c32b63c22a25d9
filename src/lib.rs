//! Trademark Proxy Library
//!
//! Fetches pages from a fixed upstream site, annotates every six-character
//! word with `&trade;`, points absolute upstream links back at the proxy and
//! streams the result to the client.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod rewrite;
pub mod upstream;

pub use config::ProxyConfig;
pub use http::ProxyServer;
pub use lifecycle::Shutdown;
