//! Hand-assembled client responses.
//!
//! # Responsibilities
//! - Keep response headers in insertion order
//! - Serialize the rewritten body with its header block
//! - Provide the opt-in `504 Gateway Timeout` for failed fetches
//!
//! # Design Decisions
//! - The success response reproduces the legacy framing byte for byte:
//!   a leading blank line, `\n`-joined `name: value` lines with the status
//!   as a pseudo-header (`HTTP/1.1: 200 OK`), one `\n`, then the body
//! - Responses are fully built in memory before anything is written

use crate::rewrite::RewrittenBody;

pub const CONTENT_TYPE_HTML: &str = "text/html; charset=UTF-8";

/// Ordered `name: value` pairs. Names are unique and keep their first position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeaders {
    entries: Vec<(String, String)>,
}

impl ResponseHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to `value`, replacing an existing value in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `name: value` lines joined with `\n`, no trailing newline.
    pub fn to_block(&self) -> String {
        self.iter()
            .map(|(name, value)| format!("{name}: {value}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A response ready to be written to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawResponse {
    /// The rewritten page in the legacy framing.
    Rewritten {
        headers: ResponseHeaders,
        body: RewrittenBody,
    },
    /// Well-formed 504 used only when hardening is enabled.
    GatewayTimeout,
}

impl RawResponse {
    /// Success response for a rewritten body.
    pub fn ok(body: RewrittenBody) -> Self {
        let mut headers = ResponseHeaders::new();
        headers.insert("HTTP/1.1", "200 OK");
        headers.insert("Content-Type", CONTENT_TYPE_HTML);
        headers.insert("Content-Length", body.byte_len().to_string());
        headers.insert("Connection", "close");
        Self::Rewritten { headers, body }
    }

    /// Response sent on fetch failure when hardening is enabled.
    pub fn gateway_timeout() -> Self {
        Self::GatewayTimeout
    }

    /// Headers of a rewritten response.
    pub fn headers(&self) -> Option<&ResponseHeaders> {
        match self {
            Self::Rewritten { headers, .. } => Some(headers),
            Self::GatewayTimeout => None,
        }
    }

    /// Serialize to the exact bytes written on the wire.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Rewritten { headers, body } => {
                let head = format!("\n{}\n", headers.to_block());
                let mut bytes = Vec::with_capacity(head.len() + body.byte_len());
                bytes.extend_from_slice(head.as_bytes());
                bytes.extend_from_slice(&body.into_bytes());
                bytes
            }
            Self::GatewayTimeout => b"HTTP/1.1 504 Gateway Timeout\r\n\
                Content-Length: 0\r\n\
                Connection: close\r\n\r\n"
                .to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::{rewrite_body, RewriteContext};
    use std::net::{IpAddr, Ipv4Addr};

    fn body(raw: &str) -> RewrittenBody {
        let ctx = RewriteContext {
            origin: "https://habr.com",
            peer_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            advertised_port: 3333,
        };
        rewrite_body(raw.as_bytes(), &ctx)
    }

    #[test]
    fn headers_keep_insertion_order() {
        let mut headers = ResponseHeaders::new();
        assert!(headers.is_empty());
        headers.insert("B", "1");
        headers.insert("A", "2");
        headers.insert("B", "3");

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.iter().collect::<Vec<_>>(), vec![("B", "3"), ("A", "2")]);
        assert_eq!(headers.to_block(), "B: 3\nA: 2");
    }

    #[test]
    fn ok_response_uses_legacy_framing() {
        let bytes = RawResponse::ok(body("<p>target1</p>")).into_bytes();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "\nHTTP/1.1: 200 OK\n\
             Content-Type: text/html; charset=UTF-8\n\
             Content-Length: 14\n\
             Connection: close\n\
             <p>target1</p>"
        );
    }

    #[test]
    fn content_length_counts_encoded_bytes() {
        let response = RawResponse::ok(body("<p>привет</p>"));
        let headers = response.headers().unwrap();
        let expected = "<p>привет &trade;</p>".len();
        assert_eq!(headers.get("Content-Length"), Some(expected.to_string().as_str()));
    }

    #[test]
    fn gateway_timeout_is_well_formed() {
        let bytes = RawResponse::gateway_timeout().into_bytes();
        assert!(bytes.starts_with(b"HTTP/1.1 504 Gateway Timeout\r\n"));
        assert!(bytes.ends_with(b"\r\n\r\n"));
    }
}
