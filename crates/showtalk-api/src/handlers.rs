//! Route handler functions for all API endpoints.
//!
//! Each handler extracts its input via axum extractors, calls into the
//! chat orchestrator held by AppState, and returns JSON or an SSE stream.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::{header, HeaderName, HeaderValue};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use showtalk_chat::{AnswerStream, ChatReply};
use showtalk_core::types::{EpisodeRecord, GroundingStrategy};

use crate::error::ApiError;
use crate::state::AppState;

const X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

// =============================================================================
// Request types
// =============================================================================

/// POST /chat body. A missing or non-string `message` counts as empty.
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EpisodeParams {
    pub title: Option<String>,
}

// =============================================================================
// Response types
// =============================================================================

/// Complete (non-streamed) chat answer.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub strategy: GroundingStrategy,
    pub episode_count: u64,
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /chat - answer one message.
///
/// Under the decided strategy the answer streams back as SSE events
/// (`data: {"content": ...}` per delta, `data: {"error": ...}` on failure);
/// under the naive strategy it is returned whole as `{"content": ...}`.
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request_id = Uuid::new_v4();
    let message = match payload {
        Ok(Json(body)) => body.message.unwrap_or_default(),
        Err(rejection) => {
            tracing::debug!(%request_id, error = %rejection, "Unreadable chat body");
            String::new()
        }
    };

    tracing::info!(
        %request_id,
        strategy = ?state.orchestrator.strategy(),
        chars = message.len(),
        "Chat request"
    );

    match state.orchestrator.handle(&message).await? {
        ChatReply::Complete(reply) => Ok(Json(ChatResponse {
            content: reply.content,
        })
        .into_response()),
        ChatReply::Stream(events) => Ok(answer_stream_response(events)),
    }
}

/// Wrap answer events as an SSE response with proxy buffering disabled.
fn answer_stream_response(events: AnswerStream) -> Response {
    let stream = events.map(|event| {
        let data = serde_json::to_string(&event).unwrap_or_default();
        Ok::<_, Infallible>(Event::default().data(data))
    });

    let sse = Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)));
    (
        [
            (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
            (X_ACCEL_BUFFERING, HeaderValue::from_static("no")),
        ],
        sse,
    )
        .into_response()
}

/// GET /episodes?title= - direct catalog search. A blank title searches
/// with the default keyword.
pub async fn episodes(
    State(state): State<AppState>,
    Query(params): Query<EpisodeParams>,
) -> Result<Json<Vec<EpisodeRecord>>, ApiError> {
    let title = params.title.unwrap_or_default();
    let records = state.orchestrator.gateway().search_async(&title).await?;
    Ok(Json(records))
}

/// GET /health - liveness plus catalog size.
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let gateway = state.orchestrator.gateway().clone();
    let episode_count = tokio::task::spawn_blocking(move || gateway.catalog_size())
        .await
        .map_err(|e| ApiError::Internal(format!("health task failed: {}", e)))??;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        strategy: state.orchestrator.strategy(),
        episode_count,
    }))
}
