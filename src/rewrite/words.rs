//! Six-character word discovery and trademark annotation.

use std::sync::OnceLock;

use regex::Regex;

/// Suffix appended after every occurrence of a discovered word.
pub const TRADEMARK: &str = "&trade;";

/// Characters turned into spaces before splitting text into words.
const SEPARATORS: &[char] = &[
    '.', ',', '\\', '/', '#', '!', '$', '%', '^', '&', '*', ';', ':', '{', '}', '=', '-', '_',
    '`', '~', '(', ')', ']', '\n',
];

static SIX_CHAR_WORD: OnceLock<Regex> = OnceLock::new();

fn six_char_word() -> &'static Regex {
    SIX_CHAR_WORD.get_or_init(|| Regex::new(r"^\w{6}$").expect("word pattern is valid"))
}

/// Find every whitespace-delimited token of exactly six word characters.
///
/// Duplicates are kept, in order of appearance, case preserved.
pub fn find_six_char_words(text: &str) -> Vec<String> {
    let spaced = text.replace(SEPARATORS, " ");
    spaced
        .split_whitespace()
        .filter(|token| six_char_word().is_match(token))
        .map(str::to_owned)
        .collect()
}

/// Append the trademark sign after every occurrence of each word.
///
/// Each entry of `words` triggers one global substring replacement over the
/// text produced by the previous one, so repeated words annotate repeatedly
/// and a word also matches inside longer words.
pub fn annotate(body: &str, words: &[String]) -> String {
    let mut annotated = body.to_owned();
    for word in words {
        annotated = annotated.replace(word.as_str(), &format!("{word} {TRADEMARK}"));
    }
    annotated
}
