//! LLM API interaction over an OpenAI-compatible chat completions endpoint.
//!
//! # Architecture
//!
//! - [`AskAsync`]: Core trait defining async LLM interaction
//! - [`GroqClient`]: Implementation backed by the Groq chat completions API
//!
//! The pipeline only depends on [`AskAsync`], so tests drive it with an
//! in-memory fake. No retries are performed; a failed call is returned to the
//! caller as an [`Error`].

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::models::Model;
use crate::utils::truncate_for_log;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Trait for async LLM interaction.
///
/// Implementors send a single user prompt to `model` and return the raw
/// completion text.
pub trait AskAsync {
    fn ask(&self, prompt: &str, model: Model) -> impl Future<Output = Result<String>> + Send;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

/// Chat completions client for the Groq API.
///
/// Constructed once at startup and shared read-only by every run.
pub struct GroqClient {
    client: Client,
    api_key: String,
    completions_url: String,
}

impl fmt::Debug for GroqClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroqClient")
            .field("api_key", &"<redacted>")
            .field("completions_url", &self.completions_url)
            .finish()
    }
}

impl GroqClient {
    pub fn new(api_key: String, settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeouts.llm())
            .build()?;
        Ok(Self {
            client,
            api_key,
            completions_url: completions_url(&settings.llm.base_url),
        })
    }
}

fn completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

/// Pull the first choice's text out of a chat completions response body.
fn parse_completion(body: &str, model: Model) -> Result<String> {
    let response: ChatResponse = serde_json::from_str(body)?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| Error::EmptyCompletion(model.to_string()))
}

impl AskAsync for GroqClient {
    #[instrument(level = "info", skip_all, fields(%model, prompt_bytes = prompt.len()))]
    async fn ask(&self, prompt: &str, model: Model) -> Result<String> {
        let t0 = Instant::now();
        let request = ChatRequest {
            model: model.as_str(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.completions_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let dt = t0.elapsed();

        if !status.is_success() {
            warn!(
                elapsed_ms = dt.as_millis() as u64,
                %status,
                body = %truncate_for_log(&body, 300),
                "Chat completion failed"
            );
            return Err(Error::Api {
                service: "Groq",
                status,
                body: truncate_for_log(&body, 1000),
            });
        }

        let content = parse_completion(&body, model)?;
        info!(
            elapsed_ms = dt.as_millis() as u64,
            reply_bytes = content.len(),
            "Chat completion succeeded"
        );
        Ok(content)
    }
}
