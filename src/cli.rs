//! Command-line interface definitions.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! The credential and the listen address can also come from environment
//! variables (or a `.env` file in the working directory).

use crate::models::{
    DEFAULT_NEWS_SUMMARY_LENGTH, DEFAULT_NUM_RESULTS, DEFAULT_PER_ARTICLE_SUMMARY_LENGTH,
    DEFAULT_SUMMARY_MODEL, DEFAULT_TOPIC, DEFAULT_WRITER_MODEL, Model, RunParams,
};
use clap::{Args, Parser, Subcommand};

pub const BIND_VAR: &str = "NEWS_ARTICLE_BIND";
pub const DEFAULT_BIND: &str = "127.0.0.1:8501";

/// Command-line arguments for the news article writer.
///
/// # Examples
///
/// ```sh
/// # Serve the browser UI on the default address
/// news_article
///
/// # Serve on a different address with custom timeouts
/// news_article --config settings.yaml serve --bind 0.0.0.0:8080
///
/// # Write one article in the terminal
/// news_article write --topic "rust in the kernel" > article.md
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML settings file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Groq API key
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true, global = true)]
    pub groq_api_key: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the browser UI (default)
    Serve {
        /// Address to listen on
        #[arg(short, long, env = BIND_VAR, default_value = DEFAULT_BIND)]
        bind: String,
    },
    /// Run one article in the terminal and print it to stdout
    Write(WriteArgs),
}

/// No subcommand means `serve`; clap doesn't see the bind variable then.
impl Default for Command {
    fn default() -> Self {
        Command::Serve {
            bind: std::env::var(BIND_VAR).unwrap_or_else(|_| DEFAULT_BIND.to_string()),
        }
    }
}

#[derive(Args, Debug)]
pub struct WriteArgs {
    /// Topic to research
    #[arg(short, long, default_value = DEFAULT_TOPIC)]
    pub topic: String,

    /// Model used for per-article summaries
    #[arg(long, value_enum, default_value_t = DEFAULT_SUMMARY_MODEL)]
    pub summary_model: Model,

    /// Model used to write the final article
    #[arg(long, value_enum, default_value_t = DEFAULT_WRITER_MODEL)]
    pub writer_model: Model,

    /// Number of search results (3-20)
    #[arg(short, long, default_value_t = DEFAULT_NUM_RESULTS)]
    pub num_results: usize,

    /// Word cap for each article summary (100-2000)
    #[arg(long, default_value_t = DEFAULT_PER_ARTICLE_SUMMARY_LENGTH)]
    pub per_article_summary_length: usize,

    /// Word ceiling for the combined summary (1000-10000, step 100)
    #[arg(long, default_value_t = DEFAULT_NEWS_SUMMARY_LENGTH)]
    pub news_summary_length: usize,
}

impl From<WriteArgs> for RunParams {
    fn from(args: WriteArgs) -> Self {
        RunParams {
            topic: args.topic,
            summary_model: args.summary_model,
            writer_model: args.writer_model,
            num_results: args.num_results,
            per_article_summary_length: args.per_article_summary_length,
            news_summary_length: args.news_summary_length,
        }
    }
}
