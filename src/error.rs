//! Error types for Chatgate
//!
//! This module defines the error taxonomy shared by the upstream client,
//! the conversation store and the HTTP gateway, using `thiserror` for
//! ergonomic error handling.

use thiserror::Error;

/// Main error type for Chatgate operations
///
/// Variants that carry an HTTP meaning (`Upstream`, `NotFound`,
/// `InvalidId`, `InvalidBody`, `UpstreamUnavailable`) are translated into
/// responses by the gateway; everything else surfaces as an internal error.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The inference daemon answered with a status >= 400
    #[error("Upstream returned status {status}: {body}")]
    Upstream {
        /// Status code reported by the daemon
        status: u16,
        /// Raw response body, passed through untranslated
        body: String,
    },

    /// The inference daemon could not be reached or timed out
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Requested conversation has no stored document
    #[error("conversation not found")]
    NotFound,

    /// Conversation id cannot be used as a storage key
    #[error("Invalid conversation id: {0}")]
    InvalidId(String),

    /// Request body is not valid JSON for the endpoint
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// Conversation storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Chatgate operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation. Callers that
/// need the typed variant use `downcast_ref::<GatewayError>()`.
pub type Result<T> = anyhow::Result<T>;
