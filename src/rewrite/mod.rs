//! Content rewriting subsystem.
//!
//! # Data Flow
//! ```text
//! Upstream body bytes
//!     → lossy UTF-8 decode
//!     → scripts.rs (drop <script>/<noscript> spans)      ┐
//!     → markup.rs (keep text nodes, decode references)  │ word discovery only
//!     → words.rs (six-character tokens)                 ┘
//!     → words.rs (annotate the full decoded body, tags included)
//!     → links.rs (upstream origin → http://<peer-ip>:<port>)
//!     → RewrittenBody
//! ```
//!
//! # Design Decisions
//! - Pure functions over strings; nothing here can fail
//! - Textual matching, not structural HTML parsing, so output stays
//!   byte-compatible with the substring semantics
//! - Patterns compiled once per process and shared

pub mod links;
pub mod markup;
pub mod scripts;
pub mod words;

use std::net::IpAddr;

pub use links::rewrite_links;
pub use markup::strip_tags;
pub use scripts::strip_scripts;
pub use words::{annotate, find_six_char_words, TRADEMARK};

/// Per-connection inputs to the rewrite.
#[derive(Debug, Clone, Copy)]
pub struct RewriteContext<'a> {
    /// Upstream origin whose absolute links are redirected.
    pub origin: &'a str,
    /// Address of the connected client.
    pub peer_ip: IpAddr,
    /// Port advertised in rewritten links.
    pub advertised_port: u16,
}

/// Final text sent to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenBody {
    text: String,
}

impl RewrittenBody {
    /// The rewritten text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length of the UTF-8 encoding, in bytes.
    pub fn byte_len(&self) -> usize {
        self.text.len()
    }

    /// Consume into the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.text.into_bytes()
    }
}

/// Words that will be annotated in `html`.
pub fn discover_words(html: &str) -> Vec<String> {
    let without_scripts = strip_scripts(html);
    let text = strip_tags(&without_scripts);
    find_six_char_words(&text)
}

/// Run the full rewrite chain over a raw upstream body.
pub fn rewrite_body(raw: &[u8], ctx: &RewriteContext<'_>) -> RewrittenBody {
    let decoded = String::from_utf8_lossy(raw);
    let words = discover_words(&decoded);
    tracing::debug!(words = words.len(), "Discovered six-character words");

    let annotated = annotate(&decoded, &words);
    let text = rewrite_links(&annotated, ctx.origin, ctx.peer_ip, ctx.advertised_port);

    RewrittenBody { text }
}
