//! LLM module: provider capability, HTTP client, and chunk source
//!
//! This module provides:
//! - `ChatProvider`, the calling contract every backend implements
//! - `LlmClientConfig`, `LlmClient` for talking to OpenAI-compatible backends
//! - the SSE decoder that turns a streamed body into a `ChunkStream`
//! - `ToolDispatcher` for resolving model tool calls against local functions
//! - `MockProvider`, a scripted provider for tests

mod adapter;
mod client;
pub mod mock;
mod provider;
mod stream;
mod tool_dispatcher;
mod types;
mod wire;

pub use adapter::{chat_messages_to_payload, tool_specs_to_payload};
pub use client::{LlmClient, LlmClientConfig};
pub use mock::MockProvider;
pub use provider::ChatProvider;
pub use tool_dispatcher::{DispatcherOptions, FinalAnswer, ToolDispatcher};
pub use types::{
    ChatMessage, ChunkMetadata, ChunkStream, CompletionResponse, Generation, RateLimit,
    ResponseChunk, ToolCallRequest, Usage,
};
