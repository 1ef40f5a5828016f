//! Chatgate - local gateway between a chat client and an Ollama daemon
//!
//! This library provides the pieces of the gateway server: the upstream
//! client, the streaming relay, conversation persistence and the HTTP
//! surface that ties them together.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `upstream`: HTTP client for the inference daemon and NDJSON line splitting
//! - `relay`: Re-framing of upstream lines into the client response stream
//! - `storage`: File-backed conversation index and documents
//! - `gateway`: Axum router, handlers and error responses
//! - `server`: Bootstrap and graceful shutdown
//! - `config`: Configuration management and validation
//! - `logging`: Tracing subscriber setup
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use chatgate::{server, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Default::default())?;
//!     config.validate()?;
//!     server::run(config).await
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod relay;
pub mod server;
pub mod storage;
pub mod upstream;

// Re-export commonly used types
pub use config::Config;
pub use error::{GatewayError, Result};
pub use gateway::{router, AppState};
pub use storage::{ConversationDocument, ConversationInput, ConversationStore, IndexEntry};
pub use upstream::UpstreamClient;
