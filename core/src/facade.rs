use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::GatewayConfig;
use crate::llm::{ChatProvider, ChunkStream, DispatcherOptions, ToolDispatcher};
use crate::observe::{ResponseObserver, TracingObserver};
use crate::prompt::Prompt;
use crate::response::{extract_text, Aggregator, ResponseModels, StructuredDecoder, TextStream};
use crate::tools::ToolRegistry;
use crate::Result;

/// Output shape requested by the caller, chosen once per request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputShape {
    /// One non-streamed call, text extracted once
    Text,
    /// Live sequence of non-empty text fragments
    Stream,
    /// Streamed call folded into one string
    StreamAggregated,
    /// Raw chunks, metadata included
    Chunks,
    /// Non-streamed call with the tool set attached
    Tools,
    /// Non-streamed call decoded into [`ResponseModels`]
    Structured,
}

pub enum ShapedResponse {
    Text(String),
    Stream(TextStream),
    Chunks(ChunkStream),
    Structured(ResponseModels),
}

impl fmt::Debug for ShapedResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapedResponse::Text(s) => f.debug_tuple("Text").field(s).finish(),
            ShapedResponse::Stream(_) => f.write_str("Stream(..)"),
            ShapedResponse::Chunks(_) => f.write_str("Chunks(..)"),
            ShapedResponse::Structured(m) => f.debug_tuple("Structured").field(m).finish(),
        }
    }
}

/// Single entry point per output shape.
///
/// Builds the request prompt, picks the pipeline for the shape, and makes
/// exactly one outbound call (plus tool-resolution rounds for `Tools`).
#[derive(Clone)]
pub struct ResponseFacade {
    provider: Arc<dyn ChatProvider>,
    dispatcher: ToolDispatcher,
    aggregator: Aggregator,
    decoder: StructuredDecoder,
    system_prompt: String,
}

impl ResponseFacade {
    pub fn new(provider: Arc<dyn ChatProvider>, registry: ToolRegistry, cfg: &GatewayConfig) -> Self {
        Self {
            provider,
            dispatcher: ToolDispatcher::new(
                registry,
                DispatcherOptions {
                    max_rounds: cfg.max_tool_rounds,
                },
            ),
            aggregator: Aggregator::with_observer(Arc::new(TracingObserver)),
            decoder: StructuredDecoder::new(cfg.structured_instruction.clone()),
            system_prompt: cfg.system_prompt.clone(),
        }
    }

    /// Replace the chunk observer
    pub fn with_observer(mut self, observer: Arc<dyn ResponseObserver>) -> Self {
        self.aggregator = Aggregator::with_observer(observer);
        self
    }

    pub fn prompt(&self, user_text: &str) -> Prompt {
        Prompt::new(self.system_prompt.clone(), user_text)
    }

    #[tracing::instrument(name = "facade.respond", skip(self, user_text))]
    pub async fn respond(&self, shape: OutputShape, user_text: &str) -> Result<ShapedResponse> {
        debug!(target: "facade", ?shape, input = %user_text, "Dispatching request");

        let shaped = match shape {
            OutputShape::Text => ShapedResponse::Text(self.generate(user_text).await?),
            OutputShape::Tools => ShapedResponse::Text(self.generate_with_tools(user_text).await?),
            OutputShape::Stream => ShapedResponse::Stream(self.generate_stream(user_text).await?),
            OutputShape::StreamAggregated => {
                ShapedResponse::Text(self.generate_stream_aggregated(user_text).await?)
            }
            OutputShape::Chunks => ShapedResponse::Chunks(self.stream_chunks(user_text).await?),
            OutputShape::Structured => {
                ShapedResponse::Structured(self.generate_structured(user_text).await?)
            }
        };
        Ok(shaped)
    }

    /// Single answer from one non-streamed call
    pub async fn generate(&self, user_text: &str) -> Result<String> {
        let response = self
            .provider
            .call(&self.prompt(user_text).to_chat_messages())
            .await?;
        Ok(extract_text(&response).to_string())
    }

    /// Streamed call folded into one string
    pub async fn generate_stream_aggregated(&self, user_text: &str) -> Result<String> {
        let chunks = self.stream_chunks(user_text).await?;
        self.aggregator.fold(chunks).await
    }

    /// Live non-empty text fragments
    pub async fn generate_stream(&self, user_text: &str) -> Result<TextStream> {
        let chunks = self.stream_chunks(user_text).await?;
        Ok(self.aggregator.pass_through(chunks))
    }

    /// Raw provider chunks, metadata included
    pub async fn stream_chunks(&self, user_text: &str) -> Result<ChunkStream> {
        self.provider
            .stream(&self.prompt(user_text).to_chat_messages())
            .await
    }

    /// Answer after resolving every tool call the model makes
    pub async fn generate_with_tools(&self, user_text: &str) -> Result<String> {
        let answer = self
            .dispatcher
            .run(self.provider.as_ref(), &self.prompt(user_text))
            .await?;
        info!(target: "facade", tools = answer.tool_calls.len(), rounds = answer.rounds, "Tool calls resolved");
        Ok(extract_text(&answer.response).to_string())
    }

    pub async fn generate_structured(&self, user_text: &str) -> Result<ResponseModels> {
        self.decoder
            .decode::<ResponseModels>(self.provider.as_ref(), user_text)
            .await
    }
}
