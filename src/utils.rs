//! Utility functions for text truncation and markup stripping.
//!
//! Regex patterns use the `lazy-regex` crate: patterns are validated at
//! compile time and initialized on first use.

use lazy_regex::lazy_regex;

/// Match `<br>` line-break tags in any of their spellings
static RE_BR: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"(?i)<br\s*/?>");

/// Match any remaining HTML/markup tag
static RE_TAG: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"<[^>]+>");

/// Match 3+ consecutive newlines
static RE_MULTI_NEWLINE: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"\n{3,}");

/// Safely truncates a string to a maximum character length (not bytes).
/// This is UTF-8 safe and will not panic on multi-byte characters.
pub fn truncate_chars(s: impl AsRef<str>, max_chars: usize) -> String {
    let s = s.as_ref();
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    s.char_indices()
        .nth(max_chars)
        .map_or_else(|| s.to_string(), |(pos, _)| s[..pos].to_string())
}

/// Strip HTML-ish markup from provider text: `<br>` becomes a newline,
/// other tags are dropped, entities are decoded, and runs of 3+ newlines
/// collapse to 2.
pub fn strip_markup(text: &str) -> String {
    let text = RE_BR.replace_all(text, "\n");
    let text = RE_TAG.replace_all(&text, "");
    let text = html_escape::decode_html_entities(&text);
    RE_MULTI_NEWLINE
        .replace_all(&text, "\n\n")
        .trim()
        .to_string()
}
