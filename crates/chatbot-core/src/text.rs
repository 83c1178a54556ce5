//! Plain-text helpers for content that ends up rendered as HTML

use regex::Regex;
use std::sync::LazyLock;

static SCRIPT_BLOCK: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>").ok());

static TAG: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").ok());

static WHITESPACE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\s+").ok());

/// Escape a string so it renders as literal text inside HTML, including
/// inside a double-quoted attribute (the widget turns URLs into links).
///
/// Existing entities are decoded first, which makes the operation
/// idempotent: history the widget echoes back is not escaped twice.
/// Control characters other than newline and tab are dropped.
pub fn neutralize(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect();
    let decoded = html_escape::decode_html_entities(&cleaned);
    html_escape::encode_double_quoted_attribute(&decoded).into_owned()
}

/// Remove markup from an HTML fragment and collapse whitespace.
pub fn strip_markup(html: &str) -> String {
    let mut text = html.to_string();
    for pattern in [&*SCRIPT_BLOCK, &*TAG] {
        if let Some(re) = pattern {
            text = re.replace_all(&text, " ").into_owned();
        }
    }
    let decoded = html_escape::decode_html_entities(&text).into_owned();
    match &*WHITESPACE {
        Some(re) => re.replace_all(decoded.trim(), " ").into_owned(),
        None => decoded.trim().to_string(),
    }
}

/// Keep at most `max_chars` characters, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
