//! In-memory collaborators for driving the pipeline in tests.

use crate::api::AskAsync;
use crate::error::{Error, Result};
use crate::models::{Model, NewsRecord};
use crate::scrapers::{ArticleExtractor, NewsSearch};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn record(title: &str, url: Option<&str>) -> NewsRecord {
    NewsRecord {
        title: Some(title.to_string()),
        url: url.map(str::to_string),
        date: Some("2025-05-06T14:30:00+00:00".to_string()),
        excerpt: Some(format!("Excerpt for {}", title)),
        source: Some("Example News".to_string()),
        image: None,
    }
}

#[derive(Debug, Default)]
pub struct FakeSearch {
    records: Vec<NewsRecord>,
    fail: bool,
    calls: AtomicUsize,
}

impl FakeSearch {
    pub fn new(records: Vec<NewsRecord>) -> Self {
        Self {
            records,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl NewsSearch for FakeSearch {
    async fn news(&self, _keywords: &str, max_results: usize) -> Result<Vec<NewsRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Search("search backend unavailable".to_string()));
        }
        Ok(self.records.iter().take(max_results).cloned().collect())
    }
}

/// Returns text only for URLs it was seeded with.
#[derive(Debug, Default)]
pub struct FakeExtractor {
    texts: HashMap<String, String>,
}

impl FakeExtractor {
    pub fn with_texts<I>(texts: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            texts: texts.into_iter().collect(),
        }
    }
}

impl ArticleExtractor for FakeExtractor {
    async fn extract(&self, url: &str) -> Option<String> {
        self.texts.get(url).cloned()
    }
}

/// Answers summary prompts with `summary` and everything else with `article`,
/// recording each prompt and model.
#[derive(Debug)]
pub struct FakeLlm {
    summary: String,
    article: String,
    fail: bool,
    calls: Mutex<Vec<(String, Model)>>,
}

impl Default for FakeLlm {
    fn default() -> Self {
        Self::new("A summary.", "An article.")
    }
}

impl FakeLlm {
    pub fn new(summary: &str, article: &str) -> Self {
        Self {
            summary: summary.to_string(),
            article: article.to_string(),
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, Model)> {
        self.calls.lock().unwrap().clone()
    }
}

impl AskAsync for FakeLlm {
    async fn ask(&self, prompt: &str, model: Model) -> Result<String> {
        self.calls.lock().unwrap().push((prompt.to_string(), model));
        if self.fail {
            return Err(Error::Api {
                service: "Groq",
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                body: "upstream exploded".to_string(),
            });
        }
        if prompt.starts_with("Summarize the following article:") {
            Ok(self.summary.clone())
        } else {
            Ok(self.article.clone())
        }
    }
}
