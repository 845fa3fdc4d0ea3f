//! Chat Completions wire types and their conversion into [`ResponseChunk`]s.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::types::{ChunkMetadata, Generation, RateLimit, ResponseChunk, ToolCallRequest, Usage};

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletion {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Choice {
    pub message: WireMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireToolCall {
    #[serde(default)]
    pub id: Option<String>,
    pub function: WireFunction,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireFunction {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Value>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct WireUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// One `data:` payload of a streamed completion
#[derive(Debug, Deserialize)]
pub(crate) struct StreamChunk {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
    #[serde(default)]
    pub usage: Option<WireUsage>,
    /// Set when the provider aborts the stream with an error event
    #[serde(default)]
    pub error: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StreamChoice {
    #[serde(default)]
    pub delta: Delta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Delta {
    #[serde(default)]
    pub content: Option<String>,
}

impl From<WireUsage> for Usage {
    fn from(u: WireUsage) -> Self {
        Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }
    }
}

fn metadata(
    model: Option<String>,
    usage: Option<WireUsage>,
    rate_limit: Option<&RateLimit>,
) -> Option<ChunkMetadata> {
    let rate_limit = rate_limit.filter(|r| !r.is_empty()).cloned();
    if model.is_none() && usage.is_none() && rate_limit.is_none() {
        return None;
    }
    Some(ChunkMetadata {
        model,
        usage: usage.map(Usage::from),
        rate_limit,
    })
}

/// Convert a complete completion body. Only the first choice is considered.
pub(crate) fn completion_to_chunk(
    completion: ChatCompletion,
    rate_limit: Option<&RateLimit>,
) -> ResponseChunk {
    let meta = metadata(completion.model, completion.usage, rate_limit);
    let Some(choice) = completion.choices.into_iter().next() else {
        return ResponseChunk {
            metadata: meta,
            ..Default::default()
        };
    };
    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .filter_map(normalize_tool_call)
        .collect();
    ResponseChunk {
        result: Some(Generation {
            output_text: choice.message.content,
            finish_reason: choice.finish_reason,
        }),
        metadata: meta,
        tool_calls,
    }
}

/// Convert one streamed payload. A payload without choices (the trailing
/// usage report) becomes a metadata-only chunk.
pub(crate) fn stream_chunk_to_chunk(
    chunk: StreamChunk,
    rate_limit: Option<&RateLimit>,
) -> ResponseChunk {
    let meta = metadata(chunk.model, chunk.usage, rate_limit);
    let result = chunk.choices.into_iter().next().map(|c| Generation {
        output_text: c.delta.content,
        finish_reason: c.finish_reason,
    });
    ResponseChunk {
        result,
        metadata: meta,
        tool_calls: Vec::new(),
    }
}

fn normalize_tool_call(tc: WireToolCall) -> Option<ToolCallRequest> {
    if tc.function.name.is_empty() {
        return None;
    }
    Some(ToolCallRequest {
        id: tc.id,
        name: tc.function.name,
        arguments: parse_arguments(tc.function.arguments),
    })
}

/// Arguments arrive as a JSON-encoded string (or, from some backends, an
/// object). Anything unparseable becomes an empty mapping; argument
/// validation is the tool's concern.
fn parse_arguments(raw: Option<Value>) -> Map<String, Value> {
    match raw {
        Some(Value::String(s)) => match serde_json::from_str::<Value>(&s) {
            Ok(Value::Object(m)) => m,
            _ => Map::new(),
        },
        Some(Value::Object(m)) => m,
        _ => Map::new(),
    }
}

/// Human-readable message of an `error` payload: `{"message": ..}` objects
/// yield the message, anything else its JSON text
pub(crate) fn error_message(error: &Value) -> String {
    match error {
        Value::String(s) => s.clone(),
        Value::Object(m) => m
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
        other => other.to_string(),
    }
}

/// Read `x-ratelimit-*` headers
pub(crate) fn rate_limit_from_headers(headers: &reqwest::header::HeaderMap) -> RateLimit {
    let num = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
    };
    RateLimit {
        requests_limit: num("x-ratelimit-limit-requests"),
        requests_remaining: num("x-ratelimit-remaining-requests"),
        tokens_limit: num("x-ratelimit-limit-tokens"),
        tokens_remaining: num("x-ratelimit-remaining-tokens"),
    }
}
