//! NDJSON relay between an upstream line stream and the HTTP response body
//!
//! Each non-empty upstream line is re-terminated with a single `\n` and
//! forwarded as its own chunk, in arrival order, with no batching. Empty
//! lines are dropped.
//!
//! If the upstream body fails after streaming started, one final NDJSON
//! object `{"error": "...", "done": true}` is emitted and the stream ends,
//! so callers can tell an interrupted generation from a completed one.
//!
//! The relay owns the upstream stream. When the HTTP server drops the
//! response body (client went away) the upstream response is dropped with
//! it and its connection closed.

use std::io;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde_json::json;

/// Wrap a line stream into framed NDJSON chunks
///
/// `label` names the upstream call in log messages (e.g. `/chat`).
///
/// # Examples
///
/// ```
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() {
/// let lines = futures::stream::iter(vec![
///     Ok::<_, std::io::Error>("{\"a\":1}".to_string()),
///     Ok(String::new()),
/// ]);
/// let chunks: Vec<_> = chatgate::relay::relay("/chat", lines).collect().await;
/// assert_eq!(chunks.len(), 1);
/// # }
/// ```
pub fn relay<S>(label: &str, lines: S) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static
where
    S: Stream<Item = io::Result<String>> + Send + 'static,
{
    let state = RelayState {
        lines: Box::pin(lines),
        guard: RelayGuard::new(label),
        finished: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        if state.finished {
            return None;
        }

        loop {
            match state.lines.next().await {
                Some(Ok(line)) => {
                    if line.is_empty() {
                        continue;
                    }
                    state.guard.chunks += 1;
                    return Some((Ok(frame(line)), state));
                }
                Some(Err(e)) => {
                    tracing::warn!(
                        "Upstream stream {} interrupted after {} chunks: {}",
                        state.guard.label,
                        state.guard.chunks,
                        e
                    );
                    state.finished = true;
                    state.guard.completed = true;
                    return Some((Ok(interruption_chunk(&e)), state));
                }
                None => {
                    state.guard.completed = true;
                    tracing::debug!(
                        "Upstream stream {} finished after {} chunks",
                        state.guard.label,
                        state.guard.chunks
                    );
                    return None;
                }
            }
        }
    })
}

struct RelayState<S> {
    lines: std::pin::Pin<Box<S>>,
    guard: RelayGuard,
    finished: bool,
}

/// Logs when a relay is torn down before the upstream stream ended
struct RelayGuard {
    label: String,
    chunks: usize,
    completed: bool,
}

impl RelayGuard {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            chunks: 0,
            completed: false,
        }
    }
}

impl Drop for RelayGuard {
    fn drop(&mut self) {
        if !self.completed {
            tracing::info!(
                "Client disconnected from {} after {} chunks; closing upstream stream",
                self.label,
                self.chunks
            );
        }
    }
}

fn frame(mut line: String) -> Bytes {
    line.push('\n');
    Bytes::from(line)
}

fn interruption_chunk(error: &io::Error) -> Bytes {
    let body = json!({
        "error": format!("upstream stream interrupted: {}", error),
        "done": true,
    });
    frame(body.to_string())
}
