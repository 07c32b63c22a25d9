//! Upstream response and error definitions.

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur while fetching from the upstream origin.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Origin plus path did not form a valid URL.
    #[error("invalid upstream URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The whole fetch (connect, headers and body) exceeded its deadline.
    #[error("upstream fetch timed out after {0:?}")]
    Timeout(Duration),

    /// Connection or protocol failure while talking to the upstream.
    #[error("upstream request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The HTTP client could not be constructed.
    #[error("failed to build upstream client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Result type for upstream operations.
pub type FetchResult<T> = Result<T, FetchError>;

/// A fully read upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    /// Status reported by the upstream. Not interpreted.
    pub status: StatusCode,
    /// Raw body bytes.
    pub body: Vec<u8>,
}
