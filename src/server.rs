//! Server bootstrap
//!
//! Prepares the data directory, builds the router and serves it until
//! Ctrl-C.

use axum::Router;
use tokio::net::TcpListener;

use crate::config::Config;
use crate::error::{GatewayError, Result};
use crate::gateway::{self, AppState};
use crate::storage::ConversationStore;
use crate::upstream::UpstreamClient;

/// Build the application router from configuration
///
/// Creates the storage layout (data directory, conversations directory and
/// an empty index) if it does not exist yet.
pub async fn build_app(config: &Config) -> Result<Router> {
    let store = ConversationStore::open(&config.storage.data_dir).await?;
    let upstream = UpstreamClient::new(&config.upstream)?;

    tracing::info!(
        "Forwarding to {} and storing conversations in {}",
        upstream.api_base(),
        config.storage.data_dir.display()
    );

    if !config.server.static_dir.join("index.html").is_file() {
        tracing::warn!(
            "No index.html in {}; the web client will not be served",
            config.server.static_dir.display()
        );
    }

    let state = AppState::new(upstream, store);
    Ok(gateway::router(state, &config.server.static_dir))
}

/// Bind the listener and serve until shutdown
pub async fn run(config: Config) -> Result<()> {
    let app = build_app(&config).await?;

    let addr = format!("{}:{}", config.server.bind, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| GatewayError::Config(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}
