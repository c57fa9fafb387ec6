//! SSE framing helpers
//!
//! Turns a byte stream of Server-Sent Events into completion chunks, one JSON
//! object per `data:` payload. Only framing lives here; the byte stream comes
//! from whatever transport the caller uses.

use futures_util::{Stream, StreamExt};
use serde_json::Value;

use super::json_repair::parse_json_with_repair;
use super::types::ChunkStream;
use crate::defaults;
use crate::error::StreamError;

/// Convert an SSE byte stream into a stream of JSON chunks.
///
/// - Ignores empty payloads and the `[DONE]` marker.
/// - A payload that is not JSON ends the stream with `ParseError`.
/// - A transport or framing error ends the stream with `StreamError`.
pub fn chunks_from_sse<S, B, E>(byte_stream: S) -> ChunkStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    use eventsource_stream::Eventsource;

    let out = async_stream::stream! {
        let mut events = Box::pin(byte_stream.eventsource());

        while let Some(item) = events.next().await {
            let event = match item {
                Ok(ev) => ev,
                Err(e) => {
                    yield Err(StreamError::StreamError(format!("SSE stream error: {e}")));
                    return;
                }
            };

            let data = event.data.trim();
            if data.is_empty() || data == defaults::sse::DONE_MARKER {
                continue;
            }

            match parse_json_with_repair::<Value>(data) {
                Ok(chunk) => yield Ok(chunk),
                Err(e) => {
                    yield Err(StreamError::ParseError(format!("Failed to parse SSE JSON: {e}")));
                    return;
                }
            }
        }
    };

    Box::pin(out)
}
