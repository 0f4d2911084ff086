use crate::api::AskAsync;
use crate::models::{PipelineEvent, RunParams, UiControls};
use crate::pipeline::Progress;
use crate::scrapers::{ArticleExtractor, NewsSearch};
use crate::web::AppState;
use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{Html, IntoResponse, Response};
use futures::stream;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

const INDEX_HTML: &str = include_str!("index.html");

/// Events buffered between the pipeline task and the SSE writer.
const EVENT_BUFFER: usize = 32;

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn controls() -> Json<UiControls> {
    Json(UiControls::default())
}

/// Validate the run parameters and stream the run's progress as SSE.
///
/// Each [`PipelineEvent`] becomes one SSE message named by
/// [`PipelineEvent::name`] with the event as JSON data. The stream ends when
/// the run reaches a terminal state.
pub async fn write<S, X, L>(
    State(state): State<AppState<S, X, L>>,
    Query(params): Query<RunParams>,
) -> Response
where
    S: NewsSearch + Send + Sync + 'static,
    X: ArticleExtractor + Send + Sync + 'static,
    L: AskAsync + Send + Sync + 'static,
{
    if let Err(e) = params.validate() {
        warn!(error = %e, "Rejected run parameters");
        let body = ErrorBody {
            error: e.to_string(),
        };
        return (StatusCode::BAD_REQUEST, Json(body)).into_response();
    }

    info!(
        topic = %params.topic,
        summary_model = %params.summary_model,
        writer_model = %params.writer_model,
        num_results = params.num_results,
        "Starting run"
    );

    let (progress, rx) = Progress::channel(EVENT_BUFFER);
    let pipeline = Arc::clone(&state.pipeline);
    tokio::spawn(async move {
        pipeline.run(&params, &progress).await;
    });

    let events = stream::unfold(rx, |mut rx| async move {
        let event = rx.recv().await?;
        Some((to_sse(&event), rx))
    });
    Sse::new(events)
        .keep_alive(KeepAlive::default())
        .into_response()
}

fn to_sse(event: &PipelineEvent) -> Result<Event, axum::Error> {
    Event::default().event(event.name()).json_data(event)
}
