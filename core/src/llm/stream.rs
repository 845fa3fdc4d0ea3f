//! SSE decoding for streamed Chat Completions.
//!
//! Turns a raw `reqwest::Response` byte stream into a [`ChunkStream`].
//! Handles UTF-8 sequences split across network reads, `\r\n` line endings,
//! and the `[DONE]` terminator. A transport error, a provider error event,
//! or a body that ends before `[DONE]` yields one `Err` and ends the stream.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use tracing::{debug, warn};

use crate::{GatewayError, Result};

use super::types::{ChunkStream, RateLimit, ResponseChunk};
use super::wire::{error_message, stream_chunk_to_chunk, StreamChunk};

/// Abort the stream if a single event grows past this
const MAX_BUF: usize = 16 * 1024 * 1024;

#[derive(Default)]
struct SseState {
    buffer: String,
    utf8_buf: Vec<u8>,
    done: bool,
}

/// What one `data:` payload amounts to
enum Payload {
    Chunk(ResponseChunk),
    Failed(GatewayError),
    Done,
    Ignored,
}

/// Convert a streaming HTTP response into a chunk stream
pub(crate) fn into_chunk_stream(response: reqwest::Response, rate_limit: RateLimit) -> ChunkStream {
    decode_sse(response.bytes_stream(), rate_limit)
}

/// Decode an SSE byte stream. Generic over the byte source for testing.
pub(crate) fn decode_sse<S, E>(bytes: S, rate_limit: RateLimit) -> ChunkStream
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    // `None` marks the end of the body
    let reads = bytes.map(Some).chain(stream::once(futures::future::ready(None)));
    let stream = reads
        .scan(SseState::default(), move |state, read| {
            let out = if state.done {
                None
            } else {
                Some(match read {
                    Some(Ok(b)) => feed(state, &b, &rate_limit),
                    Some(Err(e)) => {
                        state.done = true;
                        warn!(target: "llm_client", error = %e, "Stream read error");
                        vec![Err(GatewayError::Provider(format!(
                            "Stream read error: {e}"
                        )))]
                    }
                    None => finish(state, &rate_limit),
                })
            };
            futures::future::ready(out)
        })
        .flat_map(stream::iter);

    Box::pin(stream)
}

fn feed(state: &mut SseState, bytes: &[u8], rate_limit: &RateLimit) -> Vec<Result<ResponseChunk>> {
    state.utf8_buf.extend_from_slice(bytes);
    if state.utf8_buf.len() > MAX_BUF || state.buffer.len() > MAX_BUF {
        state.done = true;
        return vec![Err(GatewayError::Provider(
            "SSE stream buffer exceeded 16 MiB".into(),
        ))];
    }

    match std::str::from_utf8(&state.utf8_buf) {
        Ok(text) => {
            state.buffer.push_str(text);
            state.utf8_buf.clear();
        }
        Err(e) => {
            let valid_up_to = e.valid_up_to();
            // Keep an incomplete trailing sequence for the next read
            let consumed = match e.error_len() {
                None => valid_up_to,
                Some(bad) => valid_up_to + bad,
            };
            state
                .buffer
                .push_str(&String::from_utf8_lossy(&state.utf8_buf[..consumed]));
            state.utf8_buf.drain(..consumed);
        }
    }

    if state.buffer.contains('\r') {
        state.buffer = state.buffer.replace("\r\n", "\n");
    }

    let mut out = Vec::new();
    while let Some(pos) = state.buffer.find("\n\n") {
        let event: String = state.buffer.drain(..pos + 2).collect();
        if !apply(state, &event, rate_limit, &mut out) {
            break;
        }
    }
    out
}

/// Body exhausted: decode an unterminated last event, then fail unless
/// `[DONE]` was seen
fn finish(state: &mut SseState, rate_limit: &RateLimit) -> Vec<Result<ResponseChunk>> {
    if !state.utf8_buf.is_empty() {
        let tail = String::from_utf8_lossy(&state.utf8_buf).into_owned();
        state.buffer.push_str(&tail);
        state.utf8_buf.clear();
    }
    let rest = std::mem::take(&mut state.buffer).replace("\r\n", "\n");

    let mut out = Vec::new();
    if !apply(state, &rest, rate_limit, &mut out) {
        return out;
    }
    state.done = true;
    warn!(target: "llm_client", "Stream ended before [DONE]");
    out.push(Err(GatewayError::Provider(
        "stream ended before [DONE]".into(),
    )));
    out
}

/// Decode one event into `out`. Returns false once the stream is over.
fn apply(
    state: &mut SseState,
    event: &str,
    rate_limit: &RateLimit,
    out: &mut Vec<Result<ResponseChunk>>,
) -> bool {
    let Some(data) = event_data(event) else {
        return true;
    };
    match parse_payload(&data, rate_limit) {
        Payload::Chunk(chunk) => {
            out.push(Ok(chunk));
            true
        }
        Payload::Ignored => true,
        Payload::Done => {
            debug!(target: "llm_client", "Stream finished");
            state.done = true;
            state.buffer.clear();
            false
        }
        Payload::Failed(e) => {
            warn!(target: "llm_client", error = %e, "Provider aborted the stream");
            state.done = true;
            state.buffer.clear();
            out.push(Err(e));
            false
        }
    }
}

fn parse_payload(data: &str, rate_limit: &RateLimit) -> Payload {
    if data == "[DONE]" {
        return Payload::Done;
    }
    match serde_json::from_str::<StreamChunk>(data) {
        Ok(StreamChunk {
            error: Some(error), ..
        }) => Payload::Failed(GatewayError::Provider(format!(
            "Stream error: {}",
            error_message(&error)
        ))),
        Ok(sc) => Payload::Chunk(stream_chunk_to_chunk(sc, Some(rate_limit))),
        Err(e) => {
            debug!(target: "llm_client", error = %e, "Skipping unparseable stream payload");
            Payload::Ignored
        }
    }
}

/// Join the `data:` lines of one SSE event
fn event_data(event: &str) -> Option<String> {
    let mut data: Option<String> = None;
    for line in event.lines() {
        if let Some(rest) = line.strip_prefix("data:") {
            let rest = rest.strip_prefix(' ').unwrap_or(rest);
            match data.as_mut() {
                Some(d) => {
                    d.push('\n');
                    d.push_str(rest);
                }
                None => data = Some(rest.to_string()),
            }
        }
    }
    data
}
