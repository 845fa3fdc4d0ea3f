// Parley HTTP API
//
// One GET endpoint per output shape, all driven through the response facade

use std::convert::Infallible;

use axum::{
    body::Body,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use futures::future;
use futures::stream::{Stream, StreamExt};
use parley_core::{OutputShape, ResponseFacade, ShapedResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::error::ApiError;

const NDJSON: &str = "application/x-ndjson";

const DEFAULT_GREETING: &str = "Say Hello to me";
const DEFAULT_MATH: &str = "add 2 and 2";
const DEFAULT_STRUCTURED: &str = "name 10 countries with their capital cities";

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    facade: ResponseFacade,
}

impl AppState {
    pub fn new(facade: ResponseFacade) -> Self {
        Self { facade }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ai/generate", get(generate_handler))
        .route("/ai/generate/stream", get(stream_handler))
        .route("/ai/generate/stream/mono", get(mono_handler))
        .route("/ai/generate/stream/chunks", get(chunks_handler))
        .route("/ai/math", get(math_handler))
        .route("/ai/generate/structured", get(structured_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `?userInput=` with a per-endpoint default
#[derive(Debug, Default, Deserialize)]
pub struct UserInputQuery {
    #[serde(rename = "userInput")]
    user_input: Option<String>,
}

impl UserInputQuery {
    fn or(self, default: &str) -> String {
        self.user_input.unwrap_or_else(|| default.to_string())
    }
}

async fn generate_handler(
    State(state): State<AppState>,
    Query(q): Query<UserInputQuery>,
) -> Result<Response, ApiError> {
    respond(&state, OutputShape::Text, q.or(DEFAULT_GREETING)).await
}

async fn stream_handler(
    State(state): State<AppState>,
    Query(q): Query<UserInputQuery>,
) -> Result<Response, ApiError> {
    respond(&state, OutputShape::Stream, q.or(DEFAULT_GREETING)).await
}

async fn mono_handler(
    State(state): State<AppState>,
    Query(q): Query<UserInputQuery>,
) -> Result<Response, ApiError> {
    respond(&state, OutputShape::StreamAggregated, q.or(DEFAULT_GREETING)).await
}

async fn chunks_handler(
    State(state): State<AppState>,
    Query(q): Query<UserInputQuery>,
) -> Result<Response, ApiError> {
    respond(&state, OutputShape::Chunks, q.or(DEFAULT_GREETING)).await
}

async fn math_handler(
    State(state): State<AppState>,
    Query(q): Query<UserInputQuery>,
) -> Result<Response, ApiError> {
    respond(&state, OutputShape::Tools, q.or(DEFAULT_MATH)).await
}

async fn structured_handler(
    State(state): State<AppState>,
    Query(q): Query<UserInputQuery>,
) -> Result<Response, ApiError> {
    respond(&state, OutputShape::Structured, q.or(DEFAULT_STRUCTURED)).await
}

async fn respond(state: &AppState, shape: OutputShape, input: String) -> Result<Response, ApiError> {
    info!(target: "http", ?shape, input = %input, "Request received");
    let shaped = state.facade.respond(shape, &input).await?;

    let response = match (shape, shaped) {
        (OutputShape::Text, ShapedResponse::Text(content)) => {
            Json(json!({ "content": content })).into_response()
        }
        (_, ShapedResponse::Text(text)) => text.into_response(),
        (_, ShapedResponse::Stream(fragments)) => ndjson(fragments),
        (_, ShapedResponse::Chunks(chunks)) => ndjson(chunks),
        (_, ShapedResponse::Structured(entity)) => Json(entity).into_response(),
    };
    info!(target: "http", ?shape, "Response generated");
    Ok(response)
}

/// Stream items as one JSON document per line. A failed item becomes a
/// single `{"error": ...}` line and ends the body.
fn ndjson<S, T>(items: S) -> Response
where
    S: Stream<Item = parley_core::Result<T>> + Send + 'static,
    T: Serialize + Send + 'static,
{
    let lines = items
        .scan(false, |ended, item| {
            if *ended {
                return future::ready(None);
            }
            let encoded = item
                .map_err(|e| e.to_string())
                .and_then(|v| serde_json::to_string(&v).map_err(|e| e.to_string()));
            let line = match encoded {
                Ok(line) => line,
                Err(message) => {
                    warn!(target: "http", error = %message, "Stream ended with error");
                    *ended = true;
                    json!({ "error": message }).to_string()
                }
            };
            future::ready(Some(Ok::<_, Infallible>(format!("{line}\n"))))
        });

    ([(header::CONTENT_TYPE, NDJSON)], Body::from_stream(lines)).into_response()
}
