//! Text extraction from HTML.
//!
//! A permissive scanner that keeps only the text between tags and decodes
//! character references. It never fails; malformed markup degrades to
//! over- or under-stripping.

use std::borrow::Cow;

/// Longest reference we try to decode, `&` and `;` included. The longest
/// HTML5 entity name has 31 characters.
const MAX_REFERENCE_LEN: usize = 40;

/// What follows a `<` in the input.
enum Markup {
    /// A tag, comment, declaration or processing instruction of this many
    /// bytes after the `<`, closing delimiter included.
    Skip(usize),
    /// Not markup; the `<` is text.
    Literal,
    /// Markup that never closes. Everything from here on is dropped.
    Unterminated,
}

/// Strip all markup from `html`, returning its text content.
pub fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(lt) = rest.find('<') {
        push_decoded(&mut text, &rest[..lt]);
        let after = &rest[lt + 1..];
        match classify(after) {
            Markup::Skip(len) => rest = &after[len..],
            Markup::Literal => {
                text.push('<');
                rest = after;
            }
            Markup::Unterminated => return text,
        }
    }

    push_decoded(&mut text, rest);
    text
}

fn classify(after: &str) -> Markup {
    if let Some(comment) = after.strip_prefix("!--") {
        return match comment.find("-->") {
            Some(end) => Markup::Skip("!--".len() + end + "-->".len()),
            None => Markup::Unterminated,
        };
    }

    let end = match after.chars().next() {
        Some(c) if c.is_ascii_alphabetic() || c == '/' => tag_end(after),
        Some('!' | '?') => after.find('>'),
        Some(_) => return Markup::Literal,
        None => return Markup::Unterminated,
    };

    match end {
        Some(end) => Markup::Skip(end + 1),
        None => Markup::Unterminated,
    }
}

/// Offset of the `>` closing a tag. A `>` inside a quoted attribute value
/// does not count; if a quote never closes, the first `>` ends the tag.
fn tag_end(tag: &str) -> Option<usize> {
    let mut quote = None;
    let mut after_equals = false;

    for (i, b) in tag.bytes().enumerate() {
        match quote {
            Some(q) if b == q => {
                quote = None;
                after_equals = false;
            }
            Some(_) => {}
            None => match b {
                b'>' => return Some(i),
                b'"' | b'\'' if after_equals => quote = Some(b),
                b'=' => after_equals = true,
                b if b.is_ascii_whitespace() => {}
                _ => after_equals = false,
            },
        }
    }

    tag.find('>')
}

/// Append `text` to `out`, decoding character references.
fn push_decoded(out: &mut String, text: &str) {
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp..];
        match push_reference(out, candidate) {
            Some(consumed) => rest = &candidate[consumed..],
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }

    out.push_str(rest);
}

/// Decode the reference at the start of `input` (which begins with `&`)
/// into `out`. Returns the number of bytes consumed, or `None` when `input`
/// does not start with a known reference.
fn push_reference(out: &mut String, input: &str) -> Option<usize> {
    let (semi, _) = input
        .char_indices()
        .take(MAX_REFERENCE_LEN)
        .find(|&(_, c)| c == ';')?;

    match input[1..semi].strip_prefix('#') {
        Some(number) => out.push(decode_numeric(number)?),
        None => out.push_str(&named_reference(&input[..=semi])?),
    }

    Some(semi + 1)
}

fn decode_numeric(number: &str) -> Option<char> {
    let code = match number.strip_prefix(['x', 'X']) {
        Some(hex) if !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()) => {
            u32::from_str_radix(hex, 16).ok()?
        }
        None if !number.is_empty() && number.chars().all(|c| c.is_ascii_digit()) => {
            number.parse().ok()?
        }
        _ => return None,
    };

    match code {
        0 => Some(char::REPLACEMENT_CHARACTER),
        _ => Some(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)),
    }
}

/// Look up a complete `&name;` reference in the HTML5 named entity table.
fn named_reference(reference: &str) -> Option<Cow<'_, str>> {
    let name = &reference[1..reference.len() - 1];
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }

    // Unknown names come back unchanged.
    let decoded = html_escape::decode_html_entities(reference);
    (decoded != reference).then_some(decoded)
}
