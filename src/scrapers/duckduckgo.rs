//! DuckDuckGo news search.
//!
//! The news endpoint needs a `vqd` token that is embedded in the regular
//! search page, so every search is two requests:
//!
//! 1. `GET https://duckduckgo.com/?q=...` and scrape the `vqd` value
//! 2. `GET https://duckduckgo.com/news.js?...&vqd=...` for JSON rows
//!
//! Rows carry a UNIX `date`, which is rendered as RFC 3339 UTC.

use crate::config::{SafeSearch, Settings};
use crate::error::{Error, Result};
use crate::models::NewsRecord;
use crate::scrapers::NewsSearch;
use chrono::DateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use scraper::Html;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::{debug, info, instrument};

const DDG_BASE_URL: &str = "https://duckduckgo.com";

static VQD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"vqd=["']?(\d[\d-]*)"#).unwrap());

#[derive(Debug, Deserialize)]
struct NewsPage {
    #[serde(default)]
    results: Vec<NewsRow>,
}

#[derive(Debug, Deserialize)]
struct NewsRow {
    date: Option<i64>,
    title: Option<String>,
    excerpt: Option<String>,
    url: Option<String>,
    image: Option<String>,
    source: Option<String>,
}

/// News search against DuckDuckGo.
#[derive(Debug)]
pub struct DuckDuckGoNews {
    client: Client,
    region: String,
    safesearch: SafeSearch,
}

impl DuckDuckGoNews {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeouts.search())
            .user_agent(settings.user_agent.as_str())
            .build()?;
        Ok(Self {
            client,
            region: settings.search.region.clone(),
            safesearch: settings.search.safesearch,
        })
    }

    #[instrument(level = "debug", skip(self))]
    async fn fetch_vqd(&self, keywords: &str) -> Result<String> {
        let html = self
            .client
            .get(DDG_BASE_URL)
            .query(&[("q", keywords)])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        extract_vqd(&html)
            .ok_or_else(|| Error::Search(format!("no vqd token in search page for {:?}", keywords)))
    }
}

impl NewsSearch for DuckDuckGoNews {
    #[instrument(level = "info", skip(self))]
    async fn news(&self, keywords: &str, max_results: usize) -> Result<Vec<NewsRecord>> {
        let vqd = self.fetch_vqd(keywords).await?;
        debug!(%vqd, "Obtained vqd token");

        let body = self
            .client
            .get(format!("{}/news.js", DDG_BASE_URL))
            .header(reqwest::header::REFERER, format!("{}/", DDG_BASE_URL))
            .query(&[
                ("l", self.region.as_str()),
                ("o", "json"),
                ("noamp", "1"),
                ("q", keywords),
                ("vqd", vqd.as_str()),
                ("p", self.safesearch.param()),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let records = parse_news_page(&body, max_results)?;
        info!(count = records.len(), "DuckDuckGo news search complete");
        Ok(records)
    }
}

/// Find the `vqd` token in a DuckDuckGo search page.
fn extract_vqd(html: &str) -> Option<String> {
    VQD_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Decode a `news.js` body into at most `max_results` records, dropping
/// repeated URLs.
fn parse_news_page(body: &str, max_results: usize) -> Result<Vec<NewsRecord>> {
    let page: NewsPage = serde_json::from_str(body)?;
    let mut seen = HashSet::new();
    let records = page
        .results
        .into_iter()
        .filter(|row| match &row.url {
            Some(url) => seen.insert(url.clone()),
            None => true,
        })
        .take(max_results)
        .map(|row| NewsRecord {
            title: row.title.as_deref().map(normalize),
            url: row.url,
            date: row
                .date
                .and_then(|ts| DateTime::from_timestamp(ts, 0))
                .map(|d| d.to_rfc3339()),
            excerpt: row.excerpt.as_deref().map(normalize),
            source: row.source,
            image: row.image,
        })
        .collect();
    Ok(records)
}

/// Strip markup and decode entities in titles and excerpts (`<b>AI</b> &amp; jobs`).
fn normalize(raw: &str) -> String {
    let fragment = Html::parse_fragment(raw);
    let text: String = fragment.root_element().text().collect();
    text.trim().to_string()
}
