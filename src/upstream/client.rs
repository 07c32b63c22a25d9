//! Upstream HTTP session with an overall fetch deadline.
//!
//! # Responsibilities
//! - Own one HTTP client for the lifetime of a single inbound connection
//! - Build the target URL as origin + path, verbatim
//! - Enforce the fetch timeout over connect, headers and body together

use std::time::Duration;

use tokio::time::timeout;
use url::Url;

use crate::upstream::types::{FetchError, FetchResult, UpstreamResponse};

/// An outbound client session scoped to one inbound connection.
///
/// The underlying connection pool is released when the session is dropped.
#[derive(Debug)]
pub struct UpstreamSession {
    client: reqwest::Client,
    origin: String,
    timeout_duration: Duration,
}

impl UpstreamSession {
    /// Open a session against `origin` with the given fetch deadline.
    pub fn open(origin: impl Into<String>, timeout_duration: Duration) -> FetchResult<Self> {
        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            origin: origin.into(),
            timeout_duration,
        })
    }

    /// URL fetched for `path`.
    pub fn url_for(&self, path: &str) -> FetchResult<Url> {
        let url = format!("{}{}", self.origin, path);
        Url::parse(&url).map_err(|e| FetchError::InvalidUrl {
            url,
            reason: e.to_string(),
        })
    }

    /// GET `origin + path` and read the whole body.
    ///
    /// Any upstream status is accepted; only transport failures and the
    /// deadline are errors.
    pub async fn fetch(&self, path: &str) -> FetchResult<UpstreamResponse> {
        let url = self.url_for(path)?;
        tracing::debug!(url = %url, timeout = ?self.timeout_duration, "Fetching upstream");

        let request = async {
            let response = self.client.get(url).send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>(UpstreamResponse {
                status,
                body: body.to_vec(),
            })
        };

        match timeout(self.timeout_duration, request).await {
            Ok(Ok(response)) => {
                tracing::debug!(
                    status = %response.status,
                    bytes = response.body.len(),
                    "Upstream response received"
                );
                Ok(response)
            }
            Ok(Err(e)) => Err(FetchError::Request(e)),
            Err(_) => Err(FetchError::Timeout(self.timeout_duration)),
        }
    }
}
