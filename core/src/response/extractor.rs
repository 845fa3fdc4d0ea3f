use crate::llm::ResponseChunk;

/// Text delta of one chunk, or `""` when the chunk has no result or the
/// result has no output text. Absence of text is not an error.
pub fn extract_text(chunk: &ResponseChunk) -> &str {
    chunk
        .result
        .as_ref()
        .and_then(|g| g.output_text.as_deref())
        .unwrap_or("")
}
