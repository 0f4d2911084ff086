//! Markdown generation for the news summary and the article draft.
//!
//! # Summary section layout
//!
//! ```markdown
//! ### {title}
//!
//! - Date: {date}
//!
//! - URL: {url}
//!
//! #### Introduction
//!
//! {first 500 characters of the article}
//!
//! #### Summary
//!
//! {generated summary}
//!
//! ---
//! ```

use crate::models::SearchResult;
use crate::utils::first_chars;

/// Number of characters of raw article text shown as the introduction.
pub const INTRODUCTION_CHARS: usize = 500;

/// Render one article's section of the news summary.
pub fn summary_section(result: &SearchResult, summary: &str) -> String {
    let text = result.text.as_deref().unwrap_or_default();
    let mut md = String::new();
    md.push_str(&format!("### {}\n\n", result.title));
    md.push_str(&format!("- Date: {}\n\n", result.date));
    md.push_str(&format!("- URL: {}\n\n", result.url));
    md.push_str(&format!(
        "#### Introduction\n\n{}\n\n",
        first_chars(text, INTRODUCTION_CHARS)
    ));
    md.push_str("#### Summary\n\n");
    md.push_str(summary);
    md.push_str("\n\n---\n\n");
    md
}

/// Render the draft shown before the article is composed.
pub fn article_draft(topic: &str, news_summary: &str) -> String {
    let mut md = format!("# Topic: {}\n\n", topic);
    if !news_summary.is_empty() {
        md.push_str("## Summary of News Articles\n\n");
        md.push_str(&format!(
            "This section provides a summary of the news articles about {}.\n\n",
            topic
        ));
        md.push_str(news_summary);
        md.push_str("\n\n");
    }
    md
}
