//! Browser UI: a single page plus a Server-Sent Events endpoint per run.
//!
//! | Route | Handler | Purpose |
//! |-------|---------|---------|
//! | `GET /` | [`handlers::index`] | The widget page |
//! | `GET /health` | [`handlers::health`] | Liveness probe |
//! | `GET /api/models` | [`handlers::controls`] | Model list, defaults and control ranges |
//! | `GET /api/write` | [`handlers::write`] | Start a run; progress as an SSE stream |
//!
//! Each `/api/write` request spawns the pipeline on its own task. The server
//! keeps no state between runs: "restart" is handled entirely in the page.

use crate::api::AskAsync;
use crate::error::Result;
use crate::pipeline::Pipeline;
use crate::scrapers::{ArticleExtractor, NewsSearch};
use axum::Router;
use axum::routing::get;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod handlers;

/// Shared, read-only handle on the collaborators.
pub struct AppState<S, X, L> {
    pub pipeline: Arc<Pipeline<S, X, L>>,
}

impl<S, X, L> AppState<S, X, L> {
    pub fn new(pipeline: Pipeline<S, X, L>) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

impl<S, X, L> Clone for AppState<S, X, L> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
        }
    }
}

pub fn router<S, X, L>(state: AppState<S, X, L>) -> Router
where
    S: NewsSearch + Send + Sync + 'static,
    X: ArticleExtractor + Send + Sync + 'static,
    L: AskAsync + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/models", get(handlers::controls))
        .route("/api/write", get(handlers::write::<S, X, L>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve the UI until the process is stopped.
pub async fn serve<S, X, L>(addr: &str, state: AppState<S, X, L>) -> Result<()>
where
    S: NewsSearch + Send + Sync + 'static,
    X: ArticleExtractor + Send + Sync + 'static,
    L: AskAsync + Send + Sync + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Serving news article UI");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
