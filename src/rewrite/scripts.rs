//! Script block removal.
//!
//! Removes `<script ...>...script>` and `<noscript ...>...script>` spans by
//! plain substring matching. The match is lazy, case-sensitive, spans
//! newlines and does not nest: it ends at the first literal `script>`.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;

static SCRIPT_BLOCK: OnceLock<Regex> = OnceLock::new();

fn script_block() -> &'static Regex {
    SCRIPT_BLOCK.get_or_init(|| {
        Regex::new(r"(?s)<(?:script|noscript).*?script>").expect("script pattern is valid")
    })
}

/// Remove every script and noscript block from `html`.
///
/// Borrows the input unchanged when there is nothing to remove.
pub fn strip_scripts(html: &str) -> Cow<'_, str> {
    script_block().replace_all(html, "")
}
