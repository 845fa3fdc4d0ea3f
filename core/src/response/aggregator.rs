use std::pin::Pin;
use std::sync::Arc;

use futures::future;
use futures::stream::{Stream, StreamExt};
use tracing::debug;

use crate::llm::{ChunkStream, ResponseChunk};
use crate::observe::ResponseObserver;
use crate::Result;

use super::extractor::extract_text;

/// Live sequence of non-empty text fragments
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Turns a chunk source into text, either folded into one string or
/// forwarded fragment by fragment.
///
/// Both modes go through the same per-chunk step, so concatenating the
/// pass-through output always equals the folded result for the same input.
#[derive(Clone, Default)]
pub struct Aggregator {
    observer: Option<Arc<dyn ResponseObserver>>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_observer(observer: Arc<dyn ResponseObserver>) -> Self {
        Self {
            observer: Some(observer),
        }
    }

    /// Consume the whole source and return the concatenated text.
    /// The first error fails the fold.
    pub async fn fold(&self, mut chunks: ChunkStream) -> Result<String> {
        let mut acc = String::new();
        let mut count = 0usize;
        while let Some(item) = chunks.next().await {
            let chunk = item?;
            count += 1;
            if let Some(text) = contribution(self.observer.as_deref(), &chunk) {
                acc.push_str(&text);
            }
        }
        debug!(target: "aggregator", chunks = count, chars = acc.len(), "Stream folded");
        Ok(acc)
    }

    /// Forward every non-empty delta as it arrives. The output ends right
    /// after the first error; dropping it drops the source.
    pub fn pass_through(&self, chunks: ChunkStream) -> TextStream {
        let observer = self.observer.clone();
        let stream = chunks
            .scan(false, move |failed, item| {
                if *failed {
                    return future::ready(None);
                }
                let out = match item {
                    Ok(chunk) => Ok(contribution(observer.as_deref(), &chunk)),
                    Err(e) => {
                        *failed = true;
                        Err(e)
                    }
                };
                future::ready(Some(out))
            })
            .filter_map(|item| {
                future::ready(match item {
                    Ok(Some(text)) => Some(Ok(text)),
                    Ok(None) => None,
                    Err(e) => Some(Err(e)),
                })
            });
        Box::pin(stream)
    }
}

/// The per-chunk step shared by both modes
fn contribution(observer: Option<&dyn ResponseObserver>, chunk: &ResponseChunk) -> Option<String> {
    if let Some(o) = observer {
        o.on_chunk(chunk);
    }
    let text = extract_text(chunk);
    if text.is_empty() {
        if let Some(o) = observer {
            o.on_empty_chunk(chunk);
        }
        return None;
    }
    Some(text.to_string())
}
