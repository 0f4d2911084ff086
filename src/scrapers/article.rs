//! Article body extraction from arbitrary news pages.
//!
//! Extraction tries, in order:
//!
//! 1. A JSON-LD `articleBody` (most publishers embed one for search engines)
//! 2. Paragraphs inside `<article>`, then inside `<main>`
//! 3. Every `<p>` in the document
//!
//! Pages yielding fewer than [`MIN_ARTICLE_CHARS`] characters are treated as
//! having no text (paywalls, consent walls, video pages).

use crate::config::Settings;
use crate::error::Result;
use crate::scrapers::ArticleExtractor;
use crate::utils::truncate_for_log;
use reqwest::Client;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

pub const MIN_ARTICLE_CHARS: usize = 100;

/// Fetches article pages over HTTP and extracts their body text.
#[derive(Debug)]
pub struct WebArticleExtractor {
    client: Client,
}

impl WebArticleExtractor {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeouts.scrape())
            .user_agent(settings.user_agent.as_str())
            .build()?;
        Ok(Self { client })
    }

    async fn fetch_html(&self, url: &str) -> Result<Option<String>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(%status, "Article fetch returned non-success status");
            return Ok(None);
        }
        Ok(Some(response.text().await?))
    }
}

impl ArticleExtractor for WebArticleExtractor {
    #[instrument(level = "info", skip(self))]
    async fn extract(&self, url: &str) -> Option<String> {
        let html = match self.fetch_html(url).await {
            Ok(Some(html)) => html,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Article fetch failed");
                return None;
            }
        };

        match extract_article_text(&html) {
            Some(text) => {
                info!(chars = text.chars().count(), "Extracted article text");
                debug!(preview = %truncate_for_log(&text, 200), "Article text");
                Some(text)
            }
            None => {
                warn!(html_bytes = html.len(), "No usable article text");
                None
            }
        }
    }
}

/// Extract the readable body of an article page.
pub fn extract_article_text(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    if let Some(body) = json_ld_article_body(&document) {
        if body.chars().count() >= MIN_ARTICLE_CHARS {
            return Some(body);
        }
    }

    ["article p", "main p", "p"]
        .iter()
        .filter_map(|sel| Selector::parse(sel).ok())
        .map(|sel| paragraphs(&document, &sel))
        .find(|text| text.chars().count() >= MIN_ARTICLE_CHARS)
}

fn paragraphs(document: &Html, selector: &Selector) -> String {
    document
        .select(selector)
        .map(|p| collapse(&p.text().collect::<String>()))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn json_ld_article_body(document: &Html) -> Option<String> {
    let selector = Selector::parse(r#"script[type="application/ld+json"]"#).ok()?;
    document
        .select(&selector)
        .filter_map(|script| {
            serde_json::from_str::<Value>(script.text().collect::<String>().trim()).ok()
        })
        .find_map(|json| find_article_body(&json))
}

/// Search a JSON-LD value for `articleBody`, descending into arrays and `@graph`.
fn find_article_body(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => items.iter().find_map(find_article_body),
        Value::Object(map) => {
            if let Some(Value::String(body)) = map.get("articleBody") {
                let body = body.trim();
                if !body.is_empty() {
                    return Some(body.to_string());
                }
            }
            map.get("@graph").and_then(find_article_body)
        }
        _ => None,
    }
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
