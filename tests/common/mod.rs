use std::fs;
use std::path::PathBuf;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use chatgate::config::UpstreamConfig;
use chatgate::gateway::{self, AppState};
use chatgate::storage::ConversationStore;
use chatgate::upstream::UpstreamClient;

#[allow(dead_code)]
pub async fn create_temp_store() -> (ConversationStore, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let store = ConversationStore::open(tmp.path().join("data"))
        .await
        .expect("failed to open conversation store");
    (store, tmp)
}

#[allow(dead_code)]
pub fn upstream_client(base_url: &str) -> UpstreamClient {
    let config = UpstreamConfig {
        base_url: base_url.to_string(),
        ..Default::default()
    };
    UpstreamClient::new(&config).expect("failed to create upstream client")
}

/// Router wired to `base_url` with a fresh data dir and a one-page static dir
#[allow(dead_code)]
pub async fn test_app(base_url: &str) -> (Router, TempDir) {
    let (store, tmp) = create_temp_store().await;
    let static_dir = tmp.path().join("static");
    fs::create_dir_all(&static_dir).expect("failed to create static dir");
    fs::write(static_dir.join("index.html"), "<html>chatgate</html>")
        .expect("failed to write index.html");
    fs::write(static_dir.join("app.js"), "console.log('chatgate');")
        .expect("failed to write app.js");

    let state = AppState::new(upstream_client(base_url), store);
    (gateway::router(state, &static_dir), tmp)
}

#[allow(dead_code)]
pub fn data_dir(tmp: &TempDir) -> PathBuf {
    tmp.path().join("data")
}

#[allow(dead_code)]
pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone()
        .oneshot(request)
        .await
        .expect("router is infallible")
}

#[allow(dead_code)]
pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("valid request")
}

#[allow(dead_code)]
pub fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .expect("valid request")
}

#[allow(dead_code)]
pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

#[allow(dead_code)]
pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body")
        .to_vec()
}

#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).expect("body is not JSON")
}
