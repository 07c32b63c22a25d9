//! Upstream fetching subsystem.
//!
//! # Data Flow
//! ```text
//! Resolved request path
//!     → client.rs (origin + path, single GET under a deadline)
//!     → UpstreamResponse (status, raw body)
//! ```
//!
//! # Design Decisions
//! - One session per inbound connection, released on drop
//! - No retries; a failed or slow fetch surfaces as a FetchError
//! - Deadline covers the body read, not just the headers

pub mod client;
pub mod types;

pub use client::UpstreamSession;
pub use types::{FetchError, FetchResult, UpstreamResponse};
