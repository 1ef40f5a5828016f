//! HTTP client for the Ollama inference daemon
//!
//! Three call shapes are supported against `<base_url>/api`:
//!
//! - [`UpstreamClient::get_json`] -- buffered GET with the configured GET timeout
//! - [`UpstreamClient::post_json`] -- buffered POST with the configured POST timeout
//! - [`UpstreamClient::post_stream`] -- POST whose body is consumed as a lazy
//!   stream of NDJSON lines, without a client-side timeout
//!
//! Any upstream status >= 400 becomes [`GatewayError::Upstream`] carrying the
//! daemon's status code and raw body. Calls are never retried.
//!
//! Streamed lines are decoded as UTF-8 with invalid sequences replaced by
//! U+FFFD, so a stray byte never ends a healthy stream.

use std::io;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, FramedRead};
use tokio_util::io::StreamReader;

use crate::config::UpstreamConfig;
use crate::error::{GatewayError, Result};

/// Upper bound for one NDJSON line coming from the daemon.
const MAX_LINE_BYTES: usize = 8 * 1024 * 1024;

/// Lazy, single-pass sequence of lines read from a streamed upstream body.
///
/// Dropping the stream drops the underlying response and closes the
/// upstream connection.
pub type LineStream = Pin<Box<dyn Stream<Item = io::Result<String>> + Send>>;

/// Client for the inference daemon's HTTP API
///
/// # Examples
///
/// ```
/// use chatgate::config::UpstreamConfig;
/// use chatgate::upstream::UpstreamClient;
///
/// let client = UpstreamClient::new(&UpstreamConfig::default()).unwrap();
/// assert_eq!(client.api_base(), "http://localhost:11434/api");
/// ```
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    api_base: String,
    get_timeout: Duration,
    post_timeout: Duration,
}

impl UpstreamClient {
    /// Create a new client from the upstream configuration
    ///
    /// No network I/O is performed at construction time. Timeouts are
    /// applied per request so that streamed calls can run unbounded.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("chatgate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GatewayError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let api_base = format!("{}/api", config.base_url.trim_end_matches('/'));

        tracing::info!("Initialized upstream client: api_base={}", api_base);

        Ok(Self {
            client,
            api_base,
            get_timeout: config.get_timeout(),
            post_timeout: config.post_timeout(),
        })
    }

    /// Base URL every relative path is appended to
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    /// Issue a buffered GET and decode the JSON response
    ///
    /// # Errors
    ///
    /// - `GatewayError::Upstream` when the daemon answers with status >= 400
    /// - `GatewayError::UpstreamUnavailable` when the daemon cannot be reached
    pub async fn get_json(&self, path: &str) -> Result<Value> {
        let url = self.url(path);
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .timeout(self.get_timeout)
            .send()
            .await
            .map_err(|e| unavailable(&url, e))?;

        decode_json(check_status(&url, response).await?).await
    }

    /// Issue a buffered POST with a JSON payload and decode the JSON response
    ///
    /// The payload is forwarded untouched.
    ///
    /// # Errors
    ///
    /// Same contract as [`UpstreamClient::get_json`].
    pub async fn post_json(&self, path: &str, payload: &Value) -> Result<Value> {
        let url = self.url(path);
        tracing::debug!("POST {} (buffered)", url);

        let response = self
            .client
            .post(&url)
            .timeout(self.post_timeout)
            .json(payload)
            .send()
            .await
            .map_err(|e| unavailable(&url, e))?;

        decode_json(check_status(&url, response).await?).await
    }

    /// Issue a POST whose response is consumed line by line
    ///
    /// On an error status the whole error body is read before
    /// `GatewayError::Upstream` is raised, so a failing call never yields a
    /// stream.
    ///
    /// # Errors
    ///
    /// Same contract as [`UpstreamClient::get_json`]; failures after the
    /// stream was returned surface as `Err` items of the stream.
    pub async fn post_stream(&self, path: &str, payload: &Value) -> Result<LineStream> {
        let url = self.url(path);
        tracing::debug!("POST {} (streaming)", url);

        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| unavailable(&url, e))?;

        let response = check_status(&url, response).await?;
        Ok(ndjson_lines(response.bytes_stream()))
    }
}

/// Split a byte stream into lines, independent of chunk boundaries
///
/// Line terminators (`\n` or `\r\n`) are stripped and invalid UTF-8 is
/// replaced. A trailing line without a terminator is emitted when the
/// stream ends.
pub fn ndjson_lines<S, E>(bytes: S) -> LineStream
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let reader = StreamReader::new(bytes.map(|chunk| chunk.map_err(io::Error::other)));
    let codec =
        AnyDelimiterCodec::new_with_max_length(b"\n".to_vec(), Vec::new(), MAX_LINE_BYTES);
    let lines = FramedRead::new(reader, codec).map(|line| match line {
        Ok(raw) => Ok(decode_line(&raw)),
        Err(AnyDelimiterCodecError::Io(e)) => Err(e),
        Err(AnyDelimiterCodecError::MaxChunkLengthExceeded) => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("upstream line exceeds {} bytes", MAX_LINE_BYTES),
        )),
    });
    Box::pin(lines)
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

fn is_error_status(status: StatusCode) -> bool {
    status.as_u16() >= 400
}

async fn check_status(url: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if !is_error_status(status) {
        return Ok(response);
    }

    let body = match response.text().await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("Failed to read upstream error body from {}: {}", url, e);
            String::new()
        }
    };
    tracing::warn!("Upstream {} returned {}: {}", url, status, body);

    Err(GatewayError::Upstream {
        status: status.as_u16(),
        body,
    }
    .into())
}

async fn decode_json(response: Response) -> Result<Value> {
    Ok(response.json::<Value>().await.map_err(GatewayError::Http)?)
}

fn unavailable(url: &str, e: reqwest::Error) -> anyhow::Error {
    tracing::warn!("Failed to reach upstream {}: {}", url, e);
    GatewayError::UpstreamUnavailable(format!("{}: {}", url, e)).into()
}
