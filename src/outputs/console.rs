//! Terminal rendering of pipeline progress.
//!
//! Progress goes to stderr so that stdout carries only the final article and
//! can be redirected to a file.

use crate::models::{PipelineEvent, RunState};
use tokio::sync::mpsc;

/// Turns progress events into terminal lines.
///
/// Summary events carry the whole accumulator; only the part not yet printed
/// is emitted.
#[derive(Debug, Default)]
pub struct ConsoleRenderer {
    printed_summary: usize,
}

impl ConsoleRenderer {
    /// Text to print on stderr for `event`, if any.
    pub fn progress_line(&mut self, event: &PipelineEvent) -> Option<String> {
        match event {
            PipelineEvent::State { state } => state_label(*state).map(|l| format!("==> {}", l)),
            PipelineEvent::News { result } => Some(format!("  - {} ({})", result.title, result.url)),
            PipelineEvent::Summary { markdown } => {
                let fresh = markdown.get(self.printed_summary..).unwrap_or_default();
                self.printed_summary = markdown.len();
                (!fresh.trim().is_empty()).then(|| fresh.trim_end().to_string())
            }
            PipelineEvent::Draft { markdown } => Some(format!(
                "Draft ready ({} words)",
                crate::utils::word_count(markdown)
            )),
            PipelineEvent::Article { .. } => None,
            PipelineEvent::Empty { message } => Some(message.clone()),
            PipelineEvent::Failure { message } => Some(format!("error: {}", message)),
        }
    }
}

fn state_label(state: RunState) -> Option<&'static str> {
    match state {
        RunState::Fetching => Some("Reading news"),
        RunState::Summarizing => Some("Summarizing news"),
        RunState::Composing => Some("Writing article"),
        RunState::Done => Some("Article complete"),
        RunState::DoneEmpty | RunState::Failed => None,
    }
}

/// Print progress until the pipeline drops its sender; return the final article.
pub async fn render(mut rx: mpsc::Receiver<PipelineEvent>) -> Option<String> {
    let mut renderer = ConsoleRenderer::default();
    let mut article = None;
    while let Some(event) = rx.recv().await {
        if let Some(line) = renderer.progress_line(&event) {
            eprintln!("{}", line);
        }
        if let PipelineEvent::Article { markdown } = event {
            article = Some(markdown);
        }
    }
    article
}
