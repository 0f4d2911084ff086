//! Startup configuration: the LLM credential and optional YAML settings.
//!
//! The credential comes from the environment (`GROQ_API_KEY`, bound through
//! the CLI and optionally populated from a `.env` file). Everything else has a
//! default and may be overridden from a YAML file passed with `--config`:
//!
//! ```yaml
//! llm:
//!   base_url: https://api.groq.com/openai/v1
//! search:
//!   region: us-en
//!   safesearch: off
//! timeouts:
//!   search_secs: 15
//!   scrape_secs: 20
//!   llm_secs: 120
//! user_agent: "Mozilla/5.0 (compatible; news_article/0.1)"
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, instrument};

/// Name of the environment variable holding the LLM API key.
pub const API_KEY_VAR: &str = "GROQ_API_KEY";

/// Validate the credential read from the environment.
///
/// A missing or blank value is fatal: the program must stop before any UI is
/// served.
pub fn require_credential(value: Option<String>) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(Error::MissingCredential(API_KEY_VAR))
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub llm: LlmSettings,
    pub search: SearchSettings,
    pub timeouts: Timeouts,
    /// Sent with search and scraping requests.
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            llm: LlmSettings::default(),
            search: SearchSettings::default(),
            timeouts: Timeouts::default(),
            user_agent: format!(
                "Mozilla/5.0 (compatible; news_article/{})",
                env!("CARGO_PKG_VERSION")
            ),
        }
    }
}

impl Settings {
    /// Load settings from `path`, or return the defaults when no path is given.
    #[instrument(level = "info")]
    pub fn load(path: Option<&str>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)?;
        let settings = Self::from_yaml(&raw)?;
        info!(path, "Loaded settings");
        Ok(settings)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmSettings {
    /// OpenAI-compatible API root; `/chat/completions` is appended.
    pub base_url: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchSettings {
    /// DuckDuckGo region code, e.g. `wt-wt` (no region) or `us-en`.
    pub region: String,
    pub safesearch: SafeSearch,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            region: "wt-wt".to_string(),
            safesearch: SafeSearch::Moderate,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SafeSearch {
    On,
    Moderate,
    Off,
}

impl SafeSearch {
    /// Value of the `p` query parameter on the news endpoint.
    pub fn param(&self) -> &'static str {
        match self {
            SafeSearch::On => "1",
            SafeSearch::Moderate => "-1",
            SafeSearch::Off => "-2",
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Timeouts {
    pub search_secs: u64,
    pub scrape_secs: u64,
    pub llm_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            search_secs: 15,
            scrape_secs: 20,
            llm_secs: 120,
        }
    }
}

impl Timeouts {
    pub fn search(&self) -> Duration {
        Duration::from_secs(self.search_secs)
    }

    pub fn scrape(&self) -> Duration {
        Duration::from_secs(self.scrape_secs)
    }

    pub fn llm(&self) -> Duration {
        Duration::from_secs(self.llm_secs)
    }
}
