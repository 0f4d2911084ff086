//! Data models for a single article-writing run.
//!
//! This module defines the core data structures used throughout the application:
//! - [`NewsRecord`]: Raw row returned by the news search collaborator
//! - [`SearchResult`]: A usable search hit, later enriched with article text
//! - [`Model`]: The fixed set of LLM model identifiers offered in the UI
//! - [`RunParams`]: The user's inputs for one run, with range validation
//! - [`RunState`] and [`PipelineEvent`]: The run state machine and the progress
//!   messages streamed to the UI
//!
//! Nothing here is persisted; every value lives for one run.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// A raw news row as returned by the search collaborator.
///
/// Every field is optional because the upstream JSON is not guaranteed to
/// carry all of them. Rows without a URL are unusable downstream.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct NewsRecord {
    pub title: Option<String>,
    pub url: Option<String>,
    /// Publication date, already rendered as RFC 3339.
    pub date: Option<String>,
    pub excerpt: Option<String>,
    pub source: Option<String>,
    pub image: Option<String>,
}

impl NewsRecord {
    /// Convert into a [`SearchResult`], or `None` when the row has no URL.
    pub fn into_result(self) -> Option<SearchResult> {
        let url = self.url.map(|u| u.trim().to_string()).filter(|u| is_web_url(u))?;
        Some(SearchResult {
            title: self.title.unwrap_or_default(),
            url,
            date: self.date.unwrap_or_default(),
            excerpt: self.excerpt.unwrap_or_default(),
            source: self.source.unwrap_or_default(),
            image: self.image,
            text: None,
        })
    }
}

fn is_web_url(raw: &str) -> bool {
    url::Url::parse(raw).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
}

/// A news search hit with a usable URL.
///
/// `text` is attached once by the article extractor; results whose text could
/// not be extracted are dropped before summarization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub date: String,
    pub excerpt: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// LLM model identifiers selectable for summarizing and for writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum Model {
    #[serde(rename = "llama3-8b-8192")]
    #[value(name = "llama3-8b-8192")]
    Llama3_8b,
    #[serde(rename = "mixtral-8x7b-32768")]
    #[value(name = "mixtral-8x7b-32768")]
    Mixtral8x7b,
    #[serde(rename = "llama3-70b-8192")]
    #[value(name = "llama3-70b-8192")]
    Llama3_70b,
}

impl Model {
    pub const ALL: [Model; 3] = [Model::Llama3_8b, Model::Mixtral8x7b, Model::Llama3_70b];

    /// Identifier sent to the chat completions API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Model::Llama3_8b => "llama3-8b-8192",
            Model::Mixtral8x7b => "mixtral-8x7b-32768",
            Model::Llama3_70b => "llama3-70b-8192",
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const DEFAULT_TOPIC: &str = "ai and its impact";
pub const DEFAULT_SUMMARY_MODEL: Model = Model::Llama3_8b;
pub const DEFAULT_WRITER_MODEL: Model = Model::Llama3_70b;

pub const NUM_RESULTS: RangeInclusive<usize> = 3..=20;
pub const DEFAULT_NUM_RESULTS: usize = 7;

pub const PER_ARTICLE_SUMMARY_LENGTH: RangeInclusive<usize> = 100..=2000;
pub const DEFAULT_PER_ARTICLE_SUMMARY_LENGTH: usize = 800;

pub const NEWS_SUMMARY_LENGTH: RangeInclusive<usize> = 1000..=10000;
pub const NEWS_SUMMARY_LENGTH_STEP: usize = 100;
pub const DEFAULT_NEWS_SUMMARY_LENGTH: usize = 5000;

/// The user's inputs for one run.
///
/// Deserializes from the `/api/write` query string; omitted fields take the
/// same defaults the UI controls start with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunParams {
    pub topic: String,
    pub summary_model: Model,
    pub writer_model: Model,
    /// Maximum number of search results to request.
    pub num_results: usize,
    /// Word cap applied to each generated summary.
    pub per_article_summary_length: usize,
    /// Word ceiling for the accumulated summary of all articles.
    pub news_summary_length: usize,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            topic: DEFAULT_TOPIC.to_string(),
            summary_model: DEFAULT_SUMMARY_MODEL,
            writer_model: DEFAULT_WRITER_MODEL,
            num_results: DEFAULT_NUM_RESULTS,
            per_article_summary_length: DEFAULT_PER_ARTICLE_SUMMARY_LENGTH,
            news_summary_length: DEFAULT_NEWS_SUMMARY_LENGTH,
        }
    }
}

impl RunParams {
    /// Check every numeric control against the range the UI offers.
    ///
    /// The topic is not validated: a blank topic is a legitimate input that
    /// ends the run with the "no results" message.
    pub fn validate(&self) -> Result<()> {
        check_range("num_results", self.num_results, &NUM_RESULTS)?;
        check_range(
            "per_article_summary_length",
            self.per_article_summary_length,
            &PER_ARTICLE_SUMMARY_LENGTH,
        )?;
        check_range(
            "news_summary_length",
            self.news_summary_length,
            &NEWS_SUMMARY_LENGTH,
        )?;
        if self.news_summary_length % NEWS_SUMMARY_LENGTH_STEP != 0 {
            return Err(Error::InvalidParams(format!(
                "news_summary_length must be a multiple of {}, got {}",
                NEWS_SUMMARY_LENGTH_STEP, self.news_summary_length
            )));
        }
        Ok(())
    }
}

fn check_range(name: &str, value: usize, range: &RangeInclusive<usize>) -> Result<()> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidParams(format!(
            "{} must be between {} and {}, got {}",
            name,
            range.start(),
            range.end(),
            value
        )))
    }
}

/// A numeric control as described to the UI.
#[derive(Debug, Clone, Serialize)]
pub struct Control {
    pub min: usize,
    pub max: usize,
    pub step: usize,
    pub default: usize,
}

impl Control {
    fn new(range: &RangeInclusive<usize>, step: usize, default: usize) -> Self {
        Self {
            min: *range.start(),
            max: *range.end(),
            step,
            default,
        }
    }
}

/// Everything the page needs to build its input widgets.
#[derive(Debug, Clone, Serialize)]
pub struct UiControls {
    pub models: Vec<Model>,
    pub default_summary_model: Model,
    pub default_writer_model: Model,
    pub default_topic: &'static str,
    pub num_results: Control,
    pub per_article_summary_length: Control,
    pub news_summary_length: Control,
}

impl Default for UiControls {
    fn default() -> Self {
        Self {
            models: Model::ALL.to_vec(),
            default_summary_model: DEFAULT_SUMMARY_MODEL,
            default_writer_model: DEFAULT_WRITER_MODEL,
            default_topic: DEFAULT_TOPIC,
            num_results: Control::new(&NUM_RESULTS, 1, DEFAULT_NUM_RESULTS),
            per_article_summary_length: Control::new(
                &PER_ARTICLE_SUMMARY_LENGTH,
                1,
                DEFAULT_PER_ARTICLE_SUMMARY_LENGTH,
            ),
            news_summary_length: Control::new(
                &NEWS_SUMMARY_LENGTH,
                NEWS_SUMMARY_LENGTH_STEP,
                DEFAULT_NEWS_SUMMARY_LENGTH,
            ),
        }
    }
}

/// States of one run.
///
/// ```text
/// fetching -> summarizing -> composing -> done
///     |            |             |
///     +-> done_empty            +-> failed
/// ```
///
/// Before the first event and after a restart the page is idle; that state
/// lives only in the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Fetching,
    Summarizing,
    Composing,
    Done,
    DoneEmpty,
    Failed,
}

/// Progress messages streamed to the UI while a run advances.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineEvent {
    State { state: RunState },
    /// One more result whose text was extracted, sent without the text.
    News { result: SearchResult },
    /// The summary accumulator after the latest appended section.
    Summary { markdown: String },
    Draft { markdown: String },
    Article { markdown: String },
    Empty { message: String },
    /// A collaborator failed; the run ends in [`RunState::Failed`].
    Failure { message: String },
}

impl PipelineEvent {
    /// SSE event name for this message.
    ///
    /// Failures are not named `error`; browsers reserve that event name on
    /// `EventSource` for transport errors.
    pub fn name(&self) -> &'static str {
        match self {
            PipelineEvent::State { .. } => "state",
            PipelineEvent::News { .. } => "news",
            PipelineEvent::Summary { .. } => "summary",
            PipelineEvent::Draft { .. } => "draft",
            PipelineEvent::Article { .. } => "article",
            PipelineEvent::Empty { .. } => "empty",
            PipelineEvent::Failure { .. } => "failure",
        }
    }
}
