//! Scripted [`ChatProvider`] for exercising pipelines without a backend.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream;

use crate::tools::ToolSpec;
use crate::{GatewayError, Result};

use super::provider::ChatProvider;
use super::types::{ChatMessage, ChunkStream, CompletionResponse, ResponseChunk};

/// Which provider entry point was used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Call,
    CallWithTools,
    Stream,
}

/// A recorded provider invocation
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub kind: CallKind,
    pub messages: Vec<ChatMessage>,
    pub tool_names: Vec<String>,
}

/// Provider that replays queued responses in order.
///
/// `call` and `call_with_tools` pop from the completion queue; `stream` pops
/// a chunk sequence. An exhausted queue is a provider failure.
#[derive(Default)]
pub struct MockProvider {
    completions: Mutex<VecDeque<Result<CompletionResponse>>>,
    streams: Mutex<VecDeque<Vec<Result<ResponseChunk>>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_completion(self, response: CompletionResponse) -> Self {
        self.push_completion(Ok(response));
        self
    }

    pub fn with_failure(self, error: GatewayError) -> Self {
        self.push_completion(Err(error));
        self
    }

    pub fn with_stream(self, chunks: Vec<Result<ResponseChunk>>) -> Self {
        if let Ok(mut q) = self.streams.lock() {
            q.push_back(chunks);
        }
        self
    }

    fn push_completion(&self, response: Result<CompletionResponse>) {
        if let Ok(mut q) = self.completions.lock() {
            q.push_back(response);
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, kind: CallKind, messages: &[ChatMessage], tools: &[ToolSpec]) {
        if let Ok(mut c) = self.calls.lock() {
            c.push(RecordedCall {
                kind,
                messages: messages.to_vec(),
                tool_names: tools.iter().map(|t| t.name.clone()).collect(),
            });
        }
    }

    fn next_completion(&self) -> Result<CompletionResponse> {
        self.completions
            .lock()
            .ok()
            .and_then(|mut q| q.pop_front())
            .unwrap_or_else(|| Err(GatewayError::Provider("no scripted response left".into())))
    }
}

#[async_trait]
impl ChatProvider for MockProvider {
    async fn call(&self, messages: &[ChatMessage]) -> Result<CompletionResponse> {
        self.record(CallKind::Call, messages, &[]);
        self.next_completion()
    }

    async fn call_with_tools(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<CompletionResponse> {
        self.record(CallKind::CallWithTools, messages, tools);
        self.next_completion()
    }

    async fn stream(&self, messages: &[ChatMessage]) -> Result<ChunkStream> {
        self.record(CallKind::Stream, messages, &[]);
        let chunks = self
            .streams
            .lock()
            .ok()
            .and_then(|mut q| q.pop_front())
            .ok_or_else(|| GatewayError::Provider("no scripted stream left".into()))?;
        Ok(Box::pin(stream::iter(chunks)))
    }
}
