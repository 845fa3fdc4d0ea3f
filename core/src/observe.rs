// Observability hook for response chunks
//
// Observers see every chunk before text extraction. They cannot alter what
// the pipeline returns.

use tracing::debug;

use crate::llm::ResponseChunk;

pub trait ResponseObserver: Send + Sync {
    /// Called once per chunk, in arrival order
    fn on_chunk(&self, _chunk: &ResponseChunk) {}

    /// Called when a chunk contributed no text
    fn on_empty_chunk(&self, _chunk: &ResponseChunk) {}
}

/// Logs chunk metadata (usage, rate-limit counters) at debug level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ResponseObserver for TracingObserver {
    fn on_chunk(&self, chunk: &ResponseChunk) {
        let Some(meta) = &chunk.metadata else {
            return;
        };
        if let Some(usage) = meta.usage {
            debug!(
                target: "aggregator",
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "Usage reported"
            );
        }
        if let Some(rl) = &meta.rate_limit {
            debug!(
                target: "aggregator",
                requests_remaining = ?rl.requests_remaining,
                tokens_remaining = ?rl.tokens_remaining,
                "Rate limit reported"
            );
        }
    }

    fn on_empty_chunk(&self, _chunk: &ResponseChunk) {
        debug!(target: "aggregator", "No text in chunk");
    }
}
