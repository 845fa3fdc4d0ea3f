//! Response shaping: text extraction, aggregation, structured decoding

mod aggregator;
mod extractor;
mod structured;

pub use aggregator::{Aggregator, TextStream};
pub use extractor::extract_text;
pub use structured::{decode_document, format_instructions, ResponseModels, StructuredDecoder};
