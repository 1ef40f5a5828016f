//! HTTP handlers
//!
//! Handlers hold no logic of their own: model and inference routes go to the
//! upstream client (through the relay when streaming), conversation routes
//! go to the store.

use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::error::ApiError;
use super::AppState;
use crate::error::GatewayError;
use crate::relay::relay;
use crate::storage::{ConversationDocument, ConversationInput, IndexEntry};

/// Content type of streamed inference responses
pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

type ApiResult<T> = std::result::Result<T, ApiError>;

/// `GET /api/models`
pub async fn list_models(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    Ok(Json(state.upstream.get_json("/tags").await?))
}

/// `GET /api/running`
pub async fn list_running(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    Ok(Json(state.upstream.get_json("/ps").await?))
}

/// `POST /api/pull`
pub async fn pull(State(state): State<AppState>, body: Bytes) -> ApiResult<Response> {
    forward(&state, "/pull", parse_body(&body)?).await
}

/// `POST /api/chat`
pub async fn chat(State(state): State<AppState>, body: Bytes) -> ApiResult<Response> {
    forward(&state, "/chat", parse_body(&body)?).await
}

/// `POST /api/generate`
pub async fn generate(State(state): State<AppState>, body: Bytes) -> ApiResult<Response> {
    forward(&state, "/generate", parse_body(&body)?).await
}

/// `GET /api/conversations`
pub async fn list_conversations(State(state): State<AppState>) -> Json<Vec<IndexEntry>> {
    Json(state.store.list().await)
}

/// `GET /api/conversations/:id`
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ConversationDocument>> {
    Ok(Json(state.store.get(&id).await?))
}

/// `POST /api/conversations`
pub async fn save_conversation(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<ConversationDocument>> {
    let input: ConversationInput = parse_body(&body)?;
    Ok(Json(state.store.save(input).await?))
}

/// `DELETE /api/conversations/:id`
pub async fn delete_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.store.delete(&id).await?;
    Ok(Json(json!({ "ok": true })))
}

/// Forward an inference request, buffered or streamed per its `stream` flag
async fn forward(state: &AppState, path: &str, payload: Value) -> ApiResult<Response> {
    if !wants_stream(&payload) {
        let data = state.upstream.post_json(path, &payload).await?;
        return Ok(Json(data).into_response());
    }

    let lines = state.upstream.post_stream(path, &payload).await?;
    let body = Body::from_stream(relay(path, lines));
    Ok(([(header::CONTENT_TYPE, NDJSON_CONTENT_TYPE)], body).into_response())
}

/// Decode a JSON request body regardless of its `Content-Type`
///
/// Browsers posting a plain string body send `text/plain`, so the header is
/// not checked.
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, GatewayError> {
    serde_json::from_slice(body).map_err(|e| GatewayError::InvalidBody(e.to_string()))
}

/// Streaming is on unless the body's `stream` value is falsy
///
/// Falsy means `false`, `null`, zero, an empty string, an empty array or an
/// empty object. A missing flag streams.
pub fn wants_stream(payload: &Value) -> bool {
    match payload.get("stream") {
        None => true,
        Some(Value::Null) => false,
        Some(Value::Bool(stream)) => *stream,
        Some(Value::Number(n)) => n.as_f64().map_or(true, |n| n != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(fields)) => !fields.is_empty(),
    }
}
