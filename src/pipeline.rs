//! The article-writing run: fetch news, extract, summarize, compose.
//!
//! A [`Pipeline`] owns the three collaborators (search, extraction, LLM) and
//! runs one linear sequence per call to [`Pipeline::run`]. Every step is
//! awaited in order; nothing is fetched or summarized concurrently.
//!
//! Progress is reported through a [`Progress`] handle as
//! [`PipelineEvent`]s. When the receiving side goes away (browser closed the
//! stream, user pressed restart) the next send fails and the run is abandoned.

use crate::api::AskAsync;
use crate::error::{Error, Result};
use crate::models::{Model, PipelineEvent, RunParams, RunState, SearchResult};
use crate::outputs::markdown::{article_draft, summary_section};
use crate::scrapers::{ArticleExtractor, NewsSearch};
use crate::utils::{truncate_text, word_count};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

pub const NO_RESULTS_MESSAGE: &str =
    "Sorry, could not find any news or web search results. Please try again.";

const SUMMARY_PROMPT: &str = "Summarize the following article:\n";

/// Sending half of a run's progress channel.
#[derive(Debug, Clone)]
pub struct Progress {
    tx: mpsc::Sender<PipelineEvent>,
}

impl Progress {
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<PipelineEvent>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx }, rx)
    }

    pub async fn emit(&self, event: PipelineEvent) -> Result<()> {
        self.tx.send(event).await.map_err(|_| Error::Disconnected)
    }

    async fn state(&self, state: RunState) -> Result<()> {
        self.emit(PipelineEvent::State { state }).await
    }
}

/// Growing Markdown summary of all processed articles.
///
/// The word ceiling is checked after each append, so the final text may
/// exceed it by at most one section. Blank summaries add no section.
#[derive(Debug)]
pub struct SummaryAccumulator {
    markdown: String,
    max_words: usize,
    sections: usize,
}

impl SummaryAccumulator {
    pub fn new(max_words: usize) -> Self {
        Self {
            markdown: String::new(),
            max_words,
            sections: 0,
        }
    }

    /// Append the section for `result` unless `summary` is blank; returns
    /// `true` once the ceiling is exceeded and no further section should be
    /// added.
    pub fn push(&mut self, result: &SearchResult, summary: &str) -> bool {
        if !summary.trim().is_empty() {
            self.markdown.push_str(&summary_section(result, summary));
            self.sections += 1;
        }
        self.budget_reached()
    }

    pub fn sections(&self) -> usize {
        self.sections
    }

    pub fn budget_reached(&self) -> bool {
        word_count(&self.markdown) > self.max_words
    }

    pub fn as_str(&self) -> &str {
        &self.markdown
    }

    pub fn is_empty(&self) -> bool {
        self.sections == 0
    }
}

/// Collaborators for a run, constructed once at startup.
#[derive(Debug)]
pub struct Pipeline<S, X, L> {
    search: S,
    extractor: X,
    llm: L,
}

impl<S, X, L> Pipeline<S, X, L>
where
    S: NewsSearch + Sync,
    X: ArticleExtractor + Sync,
    L: AskAsync + Sync,
{
    pub fn new(search: S, extractor: X, llm: L) -> Self {
        Self {
            search,
            extractor,
            llm,
        }
    }

    /// Search for news on `topic`, keeping at most `limit` results that carry
    /// a URL.
    ///
    /// Search failures are logged and reported as no results. A blank topic
    /// never reaches the search backend.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch_news(&self, topic: &str, limit: usize) -> Vec<SearchResult> {
        let topic = topic.trim();
        if topic.is_empty() {
            info!("Blank topic; skipping search");
            return Vec::new();
        }

        let records = match self.search.news(topic, limit).await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "News search failed; treating as no results");
                return Vec::new();
            }
        };

        let total = records.len();
        let results: Vec<SearchResult> = records
            .into_iter()
            .filter_map(|r| r.into_result())
            .take(limit)
            .collect();
        if results.len() < total {
            debug!(dropped = total - results.len(), "Dropped records without a URL");
        }
        info!(count = results.len(), "Fetched news results");
        results
    }

    /// Summarize one article, capping the summary at `max_words`.
    #[instrument(level = "info", skip(self, text), fields(%model, text_chars = text.len()))]
    pub async fn summarize(&self, text: &str, model: Model, max_words: usize) -> Result<String> {
        let prompt = format!("{}{}", SUMMARY_PROMPT, text);
        let response = self.llm.ask(&prompt, model).await?;
        let summary = response.trim();
        let words = word_count(summary);
        if words > max_words {
            debug!(words, max_words, "Truncating summary");
            Ok(truncate_text(summary, max_words))
        } else {
            Ok(summary.to_string())
        }
    }

    /// Write the final article about `topic` from the accumulated summary.
    #[instrument(level = "info", skip(self, summary), fields(%model, summary_words = word_count(summary)))]
    pub async fn compose(&self, topic: &str, summary: &str, model: Model) -> Result<String> {
        let prompt = format!(
            "Write an article about {} using the following summary:\n{}",
            topic, summary
        );
        let response = self.llm.ask(&prompt, model).await?;
        Ok(response.trim().to_string())
    }

    /// Drive one run to a terminal state, reporting every step to `progress`.
    ///
    /// Collaborator errors end the run in [`RunState::Failed`] after a
    /// [`PipelineEvent::Failure`] is sent.
    #[instrument(level = "info", skip_all, fields(topic = %params.topic))]
    pub async fn run(&self, params: &RunParams, progress: &Progress) -> RunState {
        match self.execute(params, progress).await {
            Ok(state) => {
                info!(?state, "Run finished");
                state
            }
            Err(Error::Disconnected) => {
                warn!("Progress receiver gone; run abandoned");
                RunState::Failed
            }
            Err(e) => {
                error!(error = %e, "Run failed");
                let _ = progress
                    .emit(PipelineEvent::Failure {
                        message: e.to_string(),
                    })
                    .await;
                let _ = progress.state(RunState::Failed).await;
                RunState::Failed
            }
        }
    }

    async fn execute(&self, params: &RunParams, progress: &Progress) -> Result<RunState> {
        progress.state(RunState::Fetching).await?;

        let mut news_results = Vec::new();
        for mut result in self.fetch_news(&params.topic, params.num_results).await {
            match self.extractor.extract(&result.url).await {
                Some(text) => {
                    progress
                        .emit(PipelineEvent::News {
                            result: result.clone(),
                        })
                        .await?;
                    result.text = Some(text);
                    news_results.push(result);
                }
                None => debug!(url = %result.url, "Skipping result without text"),
            }
        }
        info!(count = news_results.len(), "News search complete");

        if news_results.is_empty() {
            return finish_empty(progress).await;
        }

        progress.state(RunState::Summarizing).await?;
        let mut accumulator = SummaryAccumulator::new(params.news_summary_length);
        for result in &news_results {
            let text = result.text.as_deref().unwrap_or_default();
            let summary = self
                .summarize(text, params.summary_model, params.per_article_summary_length)
                .await?;
            if summary.is_empty() {
                warn!(url = %result.url, "Blank summary; article left out");
                continue;
            }
            let budget_reached = accumulator.push(result, &summary);
            progress
                .emit(PipelineEvent::Summary {
                    markdown: accumulator.as_str().to_string(),
                })
                .await?;
            if budget_reached {
                info!(
                    words = word_count(accumulator.as_str()),
                    max_words = params.news_summary_length,
                    "Summary length budget reached"
                );
                break;
            }
        }

        if accumulator.is_empty() {
            info!("No article produced a summary");
            return finish_empty(progress).await;
        }

        info!(sections = accumulator.sections(), "Draft ready");
        progress
            .emit(PipelineEvent::Draft {
                markdown: article_draft(&params.topic, accumulator.as_str()),
            })
            .await?;

        progress.state(RunState::Composing).await?;
        let article = self
            .compose(&params.topic, accumulator.as_str(), params.writer_model)
            .await?;
        progress
            .emit(PipelineEvent::Article { markdown: article })
            .await?;

        progress.state(RunState::Done).await?;
        Ok(RunState::Done)
    }
}

async fn finish_empty(progress: &Progress) -> Result<RunState> {
    progress
        .emit(PipelineEvent::Empty {
            message: NO_RESULTS_MESSAGE.to_string(),
        })
        .await?;
    progress.state(RunState::DoneEmpty).await?;
    Ok(RunState::DoneEmpty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeExtractor, FakeLlm, FakeSearch, record};

    fn pipeline(
        search: FakeSearch,
        extractor: FakeExtractor,
        llm: FakeLlm,
    ) -> Pipeline<FakeSearch, FakeExtractor, FakeLlm> {
        Pipeline::new(search, extractor, llm)
    }

    async fn run_collect(
        p: &Pipeline<FakeSearch, FakeExtractor, FakeLlm>,
        params: &RunParams,
    ) -> (RunState, Vec<PipelineEvent>) {
        let (progress, mut rx) = Progress::channel(256);
        let state = p.run(params, &progress).await;
        drop(progress);
        let mut events = Vec::new();
        while let Some(e) = rx.recv().await {
            events.push(e);
        }
        (state, events)
    }

    fn states(events: &[PipelineEvent]) -> Vec<RunState> {
        events
            .iter()
            .filter_map(|e| match e {
                PipelineEvent::State { state } => Some(*state),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_fetch_news_skips_records_without_url() {
        let search = FakeSearch::new(vec![
            record("a", Some("https://example.com/a")),
            record("no-url", None),
            record("b", Some("https://example.com/b")),
        ]);
        let p = pipeline(search, FakeExtractor::default(), FakeLlm::default());
        let results = p.fetch_news("ai", 7).await;
        let urls: Vec<&str> = results.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, ["https://example.com/a", "https://example.com/b"]);
    }

    #[tokio::test]
    async fn test_fetch_news_caps_results() {
        let records = (0..10)
            .map(|i| record(&format!("t{}", i), Some(&format!("https://example.com/{}", i))))
            .collect();
        let p = pipeline(FakeSearch::new(records), FakeExtractor::default(), FakeLlm::default());
        assert_eq!(p.fetch_news("ai", 3).await.len(), 3);
    }

    #[tokio::test]
    async fn test_fetch_news_blank_topic_skips_search() {
        let search = FakeSearch::new(vec![record("a", Some("https://example.com/a"))]);
        let p = pipeline(search, FakeExtractor::default(), FakeLlm::default());
        assert!(p.fetch_news("   ", 7).await.is_empty());
        assert_eq!(p.search.calls(), 0);
    }

    #[tokio::test]
    async fn test_fetch_news_search_failure_is_empty() {
        let p = pipeline(FakeSearch::failing(), FakeExtractor::default(), FakeLlm::default());
        assert!(p.fetch_news("ai", 7).await.is_empty());
    }

    #[tokio::test]
    async fn test_summarize_trims_and_truncates() {
        let llm = FakeLlm::new("  one two three four five  ", "article");
        let p = pipeline(FakeSearch::default(), FakeExtractor::default(), llm);
        let summary = p.summarize("body", Model::Llama3_8b, 3).await.unwrap();
        assert_eq!(summary, "one two three");

        let summary = p.summarize("body", Model::Llama3_8b, 10).await.unwrap();
        assert_eq!(summary, "one two three four five");

        let calls = p.llm.calls();
        assert_eq!(calls[0].0, "Summarize the following article:\nbody");
        assert_eq!(calls[0].1, Model::Llama3_8b);
    }

    #[tokio::test]
    async fn test_compose_prompt_and_model() {
        let llm = FakeLlm::new("summary", "\n# The Article\n");
        let p = pipeline(FakeSearch::default(), FakeExtractor::default(), llm);
        let article = p
            .compose("ai and its impact", "### S", Model::Mixtral8x7b)
            .await
            .unwrap();
        assert_eq!(article, "# The Article");
        let calls = p.llm.calls();
        assert_eq!(
            calls[0].0,
            "Write an article about ai and its impact using the following summary:\n### S"
        );
        assert_eq!(calls[0].1, Model::Mixtral8x7b);
    }

    #[test]
    fn test_accumulator_budget() {
        let result = SearchResult {
            title: "T".to_string(),
            url: "https://example.com".to_string(),
            date: "d".to_string(),
            excerpt: String::new(),
            source: String::new(),
            image: None,
            text: Some("x".to_string()),
        };
        let mut acc = SummaryAccumulator::new(20);
        assert!(acc.is_empty());
        assert!(!acc.push(&result, "short"));
        assert!(!acc.is_empty());
        assert!(acc.push(&result, &vec!["w"; 20].join(" ")));
        assert!(word_count(acc.as_str()) > 20);
        assert_eq!(acc.sections(), 2);
    }

    #[test]
    fn test_accumulator_ignores_blank_summary() {
        let result = SearchResult {
            title: "T".to_string(),
            url: "https://example.com".to_string(),
            date: "d".to_string(),
            excerpt: String::new(),
            source: String::new(),
            image: None,
            text: Some("x".to_string()),
        };
        let mut acc = SummaryAccumulator::new(1000);
        assert!(!acc.push(&result, " \n "));
        assert!(acc.is_empty());
        assert_eq!(acc.as_str(), "");
    }

    #[tokio::test]
    async fn test_run_end_to_end() {
        let records = (0..7)
            .map(|i| record(&format!("Story {}", i), Some(&format!("https://example.com/{}", i))))
            .collect();
        // Two of the seven pages yield no text.
        let extractor = FakeExtractor::with_texts(
            [0, 1, 3, 4, 6]
                .iter()
                .map(|i| (format!("https://example.com/{}", i), format!("Body of story {}.", i))),
        );
        let llm = FakeLlm::new("A concise summary.", "  The final article.  ");
        let p = pipeline(FakeSearch::new(records), extractor, llm);
        let params = RunParams {
            num_results: 7,
            summary_model: Model::Llama3_8b,
            writer_model: Model::Llama3_70b,
            ..Default::default()
        };

        let (state, events) = run_collect(&p, &params).await;
        assert_eq!(state, RunState::Done);
        assert_eq!(
            states(&events),
            [
                RunState::Fetching,
                RunState::Summarizing,
                RunState::Composing,
                RunState::Done
            ]
        );

        let summary = events
            .iter()
            .rev()
            .find_map(|e| match e {
                PipelineEvent::Summary { markdown } => Some(markdown.clone()),
                _ => None,
            })
            .unwrap();
        let titles: Vec<&str> = summary
            .lines()
            .filter_map(|l| l.strip_prefix("### "))
            .collect();
        assert_eq!(titles, ["Story 0", "Story 1", "Story 3", "Story 4", "Story 6"]);

        let listed: Vec<&SearchResult> = events
            .iter()
            .filter_map(|e| match e {
                PipelineEvent::News { result } => Some(result),
                _ => None,
            })
            .collect();
        assert_eq!(listed.len(), 5);
        assert_eq!(listed[2].title, "Story 3");
        assert!(listed.iter().all(|r| r.text.is_none()));

        let draft = events.iter().find_map(|e| match e {
            PipelineEvent::Draft { markdown } => Some(markdown.clone()),
            _ => None,
        });
        assert!(draft.unwrap().starts_with("# Topic: ai and its impact\n\n"));

        let article: Vec<&PipelineEvent> = events
            .iter()
            .filter(|e| matches!(e, PipelineEvent::Article { .. }))
            .collect();
        assert_eq!(
            article,
            [&PipelineEvent::Article {
                markdown: "The final article.".to_string()
            }]
        );

        let calls = p.llm.calls();
        assert_eq!(calls.len(), 6);
        assert!(calls[..5].iter().all(|(_, m)| *m == Model::Llama3_8b));
        assert_eq!(calls[5].1, Model::Llama3_70b);
    }

    #[tokio::test]
    async fn test_run_stops_at_summary_ceiling() {
        let records = (0..5)
            .map(|i| record(&format!("S{}", i), Some(&format!("https://example.com/{}", i))))
            .collect();
        let extractor = FakeExtractor::with_texts(
            (0..5).map(|i| (format!("https://example.com/{}", i), "text".to_string())),
        );
        // Each section is well over 600 words, so the 1000-word ceiling is
        // crossed by the second section.
        let long_summary = vec!["word"; 600].join(" ");
        let llm = FakeLlm::new(&long_summary, "article");
        let p = pipeline(FakeSearch::new(records), extractor, llm);
        let params = RunParams {
            news_summary_length: 1000,
            per_article_summary_length: 2000,
            ..Default::default()
        };

        let (state, events) = run_collect(&p, &params).await;
        assert_eq!(state, RunState::Done);
        let summaries = events
            .iter()
            .filter(|e| matches!(e, PipelineEvent::Summary { .. }))
            .count();
        assert_eq!(summaries, 2);
        // Two summaries plus one composition.
        assert_eq!(p.llm.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_run_per_article_length_is_applied() {
        let records = vec![record("S", Some("https://example.com/s"))];
        let extractor =
            FakeExtractor::with_texts([("https://example.com/s".to_string(), "text".to_string())]);
        let llm = FakeLlm::new(&vec!["word"; 300].join(" "), "article");
        let p = pipeline(FakeSearch::new(records), extractor, llm);
        let params = RunParams {
            per_article_summary_length: 100,
            ..Default::default()
        };
        let (_, events) = run_collect(&p, &params).await;
        let summary = events
            .iter()
            .find_map(|e| match e {
                PipelineEvent::Summary { markdown } => Some(markdown.clone()),
                _ => None,
            })
            .unwrap();
        let generated = summary
            .split("#### Summary\n\n")
            .nth(1)
            .and_then(|s| s.split("\n\n---").next())
            .unwrap();
        assert_eq!(word_count(generated), 100);
    }

    #[tokio::test]
    async fn test_run_empty_topic_ends_empty() {
        let search = FakeSearch::new(vec![record("a", Some("https://example.com/a"))]);
        let p = pipeline(search, FakeExtractor::default(), FakeLlm::default());
        let params = RunParams {
            topic: String::new(),
            ..Default::default()
        };
        let (state, events) = run_collect(&p, &params).await;
        assert_eq!(state, RunState::DoneEmpty);
        assert!(events.contains(&PipelineEvent::Empty {
            message: NO_RESULTS_MESSAGE.to_string()
        }));
        assert!(p.llm.calls().is_empty());
    }

    #[tokio::test]
    async fn test_run_no_extractable_text_ends_empty() {
        let search = FakeSearch::new(vec![
            record("a", Some("https://example.com/a")),
            record("b", Some("https://example.com/b")),
        ]);
        let p = pipeline(search, FakeExtractor::default(), FakeLlm::default());
        let (state, events) = run_collect(&p, &RunParams::default()).await;
        assert_eq!(state, RunState::DoneEmpty);
        assert_eq!(states(&events), [RunState::Fetching, RunState::DoneEmpty]);
        assert!(p.llm.calls().is_empty());
    }

    #[tokio::test]
    async fn test_run_blank_summaries_end_empty() {
        let search = FakeSearch::new(vec![
            record("a", Some("https://example.com/a")),
            record("b", Some("https://example.com/b")),
        ]);
        let extractor = FakeExtractor::with_texts([
            ("https://example.com/a".to_string(), "text a".to_string()),
            ("https://example.com/b".to_string(), "text b".to_string()),
        ]);
        let p = pipeline(search, extractor, FakeLlm::new("   ", "article"));
        let (state, events) = run_collect(&p, &RunParams::default()).await;

        assert_eq!(state, RunState::DoneEmpty);
        assert_eq!(
            states(&events),
            [RunState::Fetching, RunState::Summarizing, RunState::DoneEmpty]
        );
        assert!(events.contains(&PipelineEvent::Empty {
            message: NO_RESULTS_MESSAGE.to_string()
        }));
        assert!(!events.iter().any(|e| matches!(
            e,
            PipelineEvent::Summary { .. } | PipelineEvent::Draft { .. } | PipelineEvent::Article { .. }
        )));

        let calls = p.llm.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls
            .iter()
            .all(|(prompt, _)| prompt.starts_with(SUMMARY_PROMPT)));
    }

    #[tokio::test]
    async fn test_run_llm_failure_reports_error() {
        let search = FakeSearch::new(vec![record("a", Some("https://example.com/a"))]);
        let extractor =
            FakeExtractor::with_texts([("https://example.com/a".to_string(), "text".to_string())]);
        let p = pipeline(search, extractor, FakeLlm::failing());
        let (state, events) = run_collect(&p, &RunParams::default()).await;
        assert_eq!(state, RunState::Failed);
        assert!(events
            .iter()
            .any(|e| matches!(e, PipelineEvent::Failure { message } if message.contains("Groq"))));
        assert_eq!(states(&events).last(), Some(&RunState::Failed));
        assert!(!events.iter().any(|e| matches!(e, PipelineEvent::Article { .. })));
    }

    #[tokio::test]
    async fn test_run_abandoned_when_receiver_dropped() {
        let search = FakeSearch::new(vec![record("a", Some("https://example.com/a"))]);
        let extractor =
            FakeExtractor::with_texts([("https://example.com/a".to_string(), "text".to_string())]);
        let p = pipeline(search, extractor, FakeLlm::default());
        let (progress, rx) = Progress::channel(4);
        drop(rx);
        let state = p.run(&RunParams::default(), &progress).await;
        assert_eq!(state, RunState::Failed);
        assert_eq!(p.search.calls(), 0);
    }
}
