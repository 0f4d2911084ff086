//! News search and article extraction collaborators.
//!
//! The pipeline talks to the outside world through two traits:
//!
//! | Trait | Implementation | Source |
//! |-------|----------------|--------|
//! | [`NewsSearch`] | [`duckduckgo::DuckDuckGoNews`] | DuckDuckGo news JSON endpoint |
//! | [`ArticleExtractor`] | [`article::WebArticleExtractor`] | Plain HTTP GET + HTML parsing |
//!
//! Both are constructed once at startup with their own `reqwest::Client`
//! (timeout and user agent from [`crate::config::Settings`]) and never mutated.

use crate::error::Result;
use crate::models::NewsRecord;
use std::future::Future;

pub mod article;
pub mod duckduckgo;

/// A news search backend.
pub trait NewsSearch {
    /// Return at most `max_results` raw news rows for `keywords`.
    fn news(
        &self,
        keywords: &str,
        max_results: usize,
    ) -> impl Future<Output = Result<Vec<NewsRecord>>> + Send;
}

/// Pulls readable body text out of an article URL.
pub trait ArticleExtractor {
    /// Return the article body, or `None` when nothing usable was found.
    ///
    /// Failures are logged by the implementation and reported as `None`.
    fn extract(&self, url: &str) -> impl Future<Output = Option<String>> + Send;
}
