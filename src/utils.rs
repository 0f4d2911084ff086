//! Utility functions for word-budget handling and log-friendly string trimming.
//!
//! This module provides helper functions used throughout the application:
//! - Word counting and word-boundary truncation for summary budgets
//! - Character-prefix extraction for article introductions
//! - String truncation for logging API responses

/// Count whitespace-delimited words in `text`.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Limit `text` to its first `words` whitespace-delimited tokens.
///
/// Tokens are rejoined with single spaces, so the output is whitespace
/// normalized even when no truncation happens.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_text("one two  three", 2), "one two");
/// assert_eq!(truncate_text("one\ntwo", 10), "one two");
/// assert_eq!(truncate_text("anything", 0), "");
/// ```
pub fn truncate_text(text: &str, words: usize) -> String {
    text.split_whitespace()
        .take(words)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Return at most the first `max` characters of `s`.
///
/// Counts `char`s rather than bytes so multi-byte text is never split.
pub fn first_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` characters with an ellipsis and
/// byte count indicator appended.
///
/// # Returns
///
/// The original string if shorter than `max`, otherwise a truncated version
/// with `"…(+N bytes)"` appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let head = first_chars(s, max);
    if head.len() == s.len() {
        s.to_string()
    } else {
        format!("{}…(+{} bytes)", head, s.len() - head.len())
    }
}
