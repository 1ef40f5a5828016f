//! HTTP surface of the gateway
//!
//! Binds the `/api` routes to the upstream client and the conversation
//! store, and mounts the static web client.

use std::path::Path;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::storage::ConversationStore;
use crate::upstream::UpstreamClient;

pub mod error;
pub mod handlers;

pub use error::ApiError;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Client for the inference daemon
    pub upstream: Arc<UpstreamClient>,
    /// Conversation persistence
    pub store: Arc<ConversationStore>,
}

impl AppState {
    /// Create new application state.
    pub fn new(upstream: UpstreamClient, store: ConversationStore) -> Self {
        Self {
            upstream: Arc::new(upstream),
            store: Arc::new(store),
        }
    }
}

/// Routes under `/api`
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/models", get(handlers::list_models))
        .route("/api/running", get(handlers::list_running))
        .route("/api/pull", post(handlers::pull))
        .route("/api/chat", post(handlers::chat))
        .route("/api/generate", post(handlers::generate))
        .route(
            "/api/conversations",
            get(handlers::list_conversations).post(handlers::save_conversation),
        )
        .route(
            "/api/conversations/:id",
            get(handlers::get_conversation).delete(handlers::delete_conversation),
        )
}

/// Full application router: API routes, static client, request tracing
pub fn router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .merge(api_routes())
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
