//! Helpers for the rich-text markup produced by the browser editor.
//!
//! The editor emits a small HTML subset (paragraphs, headings 1-3, lists,
//! inline emphasis, marks and links). Nothing here tries to be a general
//! HTML parser.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::Heading;

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

static BLOCK_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</(p|h[1-6]|li|div|blockquote|pre|ul|ol)\s*>|<br\s*/?>").expect("valid regex")
});

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h([1-3])\b[^>]*>(.*?)</h[1-3]\s*>").expect("valid regex"));

/// Remove every tag and decode entities. Block boundaries are not preserved.
pub fn strip_tags(markup: &str) -> String {
    decode_entities(&TAG.replace_all(markup, ""))
}

/// Plain text with one line per block element.
pub fn to_plain_text(markup: &str) -> String {
    let with_breaks = BLOCK_END.replace_all(markup, "\n");
    strip_tags(&with_breaks)
}

/// Headings of level 1 to 3, in document order.
pub fn extract_headings(markup: &str) -> Vec<Heading> {
    HEADING
        .captures_iter(markup)
        .filter_map(|caps| {
            let level = caps[1].parse::<u8>().ok()?;
            let text = strip_tags(&caps[2]).trim().to_string();
            (!text.is_empty()).then_some((level, text))
        })
        .enumerate()
        .map(|(index, (level, text))| Heading {
            id: format!("heading-{}", index),
            level,
            text,
        })
        .collect()
}

pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Escape plain text for insertion into editor markup.
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// First `max` characters of `text`, never splitting a code point.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte, _)) => text[..byte].to_string(),
        None => text.to_string(),
    }
}
