//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Accepted TCP connection
//!     → server.rs (per-connection task, state machine)
//!     → request.rs (line reads under deadline, GET path extraction)
//!     → [upstream fetch]
//!     → [content rewrite]
//!     → response.rs (legacy header block + body)
//!     → Send to client, close
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{read_request, InboundRequest, ReadOutcome, DEFAULT_PATH};
pub use response::{RawResponse, ResponseHeaders};
pub use server::{handle_connection, ProxyError, ProxyServer};
