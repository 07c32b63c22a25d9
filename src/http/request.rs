//! Inbound request-line parsing.
//!
//! # Responsibilities
//! - Read the client stream line by line, each read under its own deadline
//! - Log every raw line (lossy UTF-8)
//! - Capture the path of the first `GET <path> HTTP...` line
//!
//! # Design Decisions
//! - Reading continues after a match until end-of-stream or a line timeout
//! - A timeout is not an error; it ends reading with whatever was found
//! - Anything other than a GET line is ignored; the path defaults to `/`

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::timeout;

/// Path used when no request line was recognised.
pub const DEFAULT_PATH: &str = "/";

static REQUEST_LINE: OnceLock<Regex> = OnceLock::new();

fn request_line() -> &'static Regex {
    REQUEST_LINE.get_or_init(|| Regex::new(r"GET\s(.+)\sHTTP").expect("request line pattern is valid"))
}

/// Extract the requested path from a single line, if it is a GET line.
///
/// Captures that do not start with `/` are rejected.
pub fn extract_path(line: &str) -> Option<&str> {
    request_line()
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|path| path.starts_with('/'))
}

/// Why reading the inbound stream stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The client closed its side of the connection.
    EndOfStream,
    /// A single line read exceeded the deadline.
    TimedOut,
    /// The socket reported an error; treated like end-of-stream.
    Failed,
}

/// Everything read from one client before fetching.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    raw_lines: Vec<Vec<u8>>,
    path: Option<String>,
    outcome: ReadOutcome,
}

impl InboundRequest {
    /// Requested path, or `/` when none was found.
    pub fn path(&self) -> &str {
        self.path.as_deref().unwrap_or(DEFAULT_PATH)
    }

    /// Whether a GET line was recognised.
    pub fn has_request_line(&self) -> bool {
        self.path.is_some()
    }

    /// Raw lines in arrival order, terminators included.
    pub fn raw_lines(&self) -> &[Vec<u8>] {
        &self.raw_lines
    }

    /// How reading ended.
    pub fn outcome(&self) -> ReadOutcome {
        self.outcome
    }
}

/// Read lines from `reader` until end-of-stream or until one line takes
/// longer than `line_timeout`.
pub async fn read_request<R>(reader: &mut R, line_timeout: Duration) -> InboundRequest
where
    R: AsyncBufRead + Unpin,
{
    let mut raw_lines = Vec::new();
    let mut path: Option<String> = None;

    let outcome = loop {
        let mut line = Vec::new();
        match timeout(line_timeout, reader.read_until(b'\n', &mut line)).await {
            Err(_) => {
                tracing::debug!(timeout = ?line_timeout, "Request line read timed out");
                break ReadOutcome::TimedOut;
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Failed to read from client");
                break ReadOutcome::Failed;
            }
            Ok(Ok(0)) => break ReadOutcome::EndOfStream,
            Ok(Ok(_)) => {
                let text = String::from_utf8_lossy(&line);
                tracing::info!(line = %text.trim_end(), "Inbound line");
                if path.is_none() {
                    path = extract_path(&text).map(str::to_owned);
                }
                raw_lines.push(line);
            }
        }
    };

    InboundRequest {
        raw_lines,
        path,
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncWriteExt, BufReader};

    const LONG: Duration = Duration::from_secs(5);

    #[test]
    fn extracts_get_path() {
        assert_eq!(extract_path("GET /foo HTTP/1.1\r\n"), Some("/foo"));
        assert_eq!(extract_path("GET /ru/post/1/?a=b HTTP/1.0"), Some("/ru/post/1/?a=b"));
    }

    #[test]
    fn ignores_other_lines() {
        assert_eq!(extract_path("POST /foo HTTP/1.1\r\n"), None);
        assert_eq!(extract_path("Host: habr.com\r\n"), None);
        assert_eq!(extract_path("GET foo HTTP/1.1\r\n"), None);
        assert_eq!(extract_path("GET /foo\r\n"), None);
    }

    #[tokio::test]
    async fn finds_path_and_drains_to_end() {
        let input: &[u8] = b"GET /foo HTTP/1.1\r\nHost: example\r\nGET /bar HTTP/1.1\r\n\r\n";
        let mut reader = BufReader::new(input);

        let request = read_request(&mut reader, LONG).await;
        assert_eq!(request.path(), "/foo");
        assert!(request.has_request_line());
        assert_eq!(request.raw_lines().len(), 4);
        assert_eq!(request.outcome(), ReadOutcome::EndOfStream);
    }

    #[tokio::test]
    async fn defaults_to_root_without_get_line() {
        let input: &[u8] = b"PUT /foo HTTP/1.1\r\nHost: example\r\n\r\n";
        let mut reader = BufReader::new(input);

        let request = read_request(&mut reader, LONG).await;
        assert_eq!(request.path(), "/");
        assert!(!request.has_request_line());
    }

    #[tokio::test]
    async fn empty_stream_defaults_to_root() {
        let input: &[u8] = b"";
        let mut reader = BufReader::new(input);

        let request = read_request(&mut reader, LONG).await;
        assert_eq!(request.path(), "/");
        assert!(request.raw_lines().is_empty());
    }

    #[tokio::test]
    async fn tolerates_invalid_utf8() {
        let input: &[u8] = b"\xff\xfe garbage\r\nGET /ok HTTP/1.1\r\n";
        let mut reader = BufReader::new(input);

        let request = read_request(&mut reader, LONG).await;
        assert_eq!(request.path(), "/ok");
    }

    #[tokio::test]
    async fn line_timeout_stops_reading_and_keeps_path() {
        let (client, server) = tokio::io::duplex(1024);
        let (_client_read, mut client_write) = tokio::io::split(client);
        client_write
            .write_all(b"GET /slow HTTP/1.1\r\nHost: exa")
            .await
            .unwrap();

        let mut reader = BufReader::new(server);
        let request = read_request(&mut reader, Duration::from_millis(100)).await;

        assert_eq!(request.path(), "/slow");
        assert_eq!(request.outcome(), ReadOutcome::TimedOut);
        assert_eq!(request.raw_lines().len(), 1);
    }
}
