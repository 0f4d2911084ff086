//! Crate-wide error type.
//!
//! Collaborator failures (search, scraping, LLM) and startup failures
//! (credential, settings file) share one enum so the pipeline can propagate
//! them with `?` and the drivers can decide how to present them.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(
        "{0} is not set. Export it or add `{0}=...` to a .env file in the working directory"
    )]
    MissingCredential(&'static str),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} API error: {status} - {body}")]
    Api {
        service: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("LLM returned an empty completion for model {0}")]
    EmptyCompletion(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("progress receiver dropped; run abandoned")]
    Disconnected,
}

pub type Result<T> = std::result::Result<T, Error>;
