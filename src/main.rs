//! # News Article
//!
//! Research a topic in the news and write an article about it with a
//! Groq-hosted LLM, live in the browser.
//!
//! ## Usage
//!
//! ```sh
//! GROQ_API_KEY=gsk_... news_article            # serve the UI on 127.0.0.1:8501
//! news_article write --topic "ai and its impact"
//! ```
//!
//! ## Architecture
//!
//! One run is a linear pipeline:
//! 1. **Fetching**: Search DuckDuckGo news for the topic
//! 2. **Extracting**: Download each result and pull out the article text
//! 3. **Summarizing**: Summarize each article with the summary model until the
//!    combined summary reaches its word budget
//! 4. **Composing**: Write the final article from the combined summary with
//!    the writer model
//!
//! Progress is streamed to the browser over Server-Sent Events, or printed to
//! stderr by the `write` subcommand.

use clap::Parser;
use std::error::Error;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod error;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
#[cfg(test)]
mod testing;
mod utils;
mod web;

use api::GroqClient;
use cli::{Cli, Command};
use config::{Settings, require_credential};
use models::RunParams;
use outputs::console;
use pipeline::{Pipeline, Progress};
use scrapers::article::WebArticleExtractor;
use scrapers::duckduckgo::DuckDuckGoNews;
use web::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Populate the environment before clap reads env-bound arguments.
    dotenvy::dotenv().ok();

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    info!(version = env!("CARGO_PKG_VERSION"), "news_article starting up");

    let api_key = require_credential(args.groq_api_key).inspect_err(|e| {
        error!(error = %e, "Missing LLM credential");
    })?;
    let settings = Settings::load(args.config.as_deref()).inspect_err(|e| {
        error!(error = %e, "Failed to load settings");
    })?;

    let pipeline = Pipeline::new(
        DuckDuckGoNews::new(&settings)?,
        WebArticleExtractor::new(&settings)?,
        GroqClient::new(api_key, &settings)?,
    );

    match args.command.unwrap_or_default() {
        Command::Serve { bind } => {
            web::serve(&bind, AppState::new(pipeline)).await?;
        }
        Command::Write(write_args) => {
            let params = RunParams::from(write_args);
            params.validate()?;

            let start_time = std::time::Instant::now();
            let (progress, rx) = Progress::channel(32);
            let printer = tokio::spawn(console::render(rx));
            let state = pipeline.run(&params, &progress).await;
            drop(progress);

            if let Some(article) = printer.await? {
                println!("{}", article);
            }
            let elapsed = start_time.elapsed();
            info!(?state, secs = elapsed.as_secs(), "Execution complete");
        }
    }

    Ok(())
}
