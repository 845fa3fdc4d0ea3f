use async_trait::async_trait;

use crate::tools::ToolSpec;
use crate::Result;

use super::types::{ChatMessage, ChunkStream, CompletionResponse};

/// Calling contract for a hosted chat-completion backend.
///
/// Implementations own transport, auth and timeouts. Every failure they
/// surface is a [`crate::GatewayError::Provider`]; nothing is retried here.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// One round trip returning the complete response
    async fn call(&self, messages: &[ChatMessage]) -> Result<CompletionResponse>;

    /// One round trip with the given functions exposed to the model
    async fn call_with_tools(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<CompletionResponse>;

    /// Start a streamed round trip. Chunks arrive in emission order;
    /// dropping the returned stream releases the underlying call.
    async fn stream(&self, messages: &[ChatMessage]) -> Result<ChunkStream>;
}
