// Parley Core Library
// Shapes LLM responses: aggregated text, live streams, tool-resolved answers, structured entities

pub mod config;
pub mod facade;
pub mod llm;
pub mod observe;
pub mod prompt;
pub mod response;
pub mod tools;

// Export core types
pub use config::{GatewayConfig, ServerConfig};
pub use facade::{OutputShape, ResponseFacade, ShapedResponse};
pub use llm::{ChatProvider, LlmClient, LlmClientConfig};
pub use prompt::Prompt;
pub use response::{Aggregator, ResponseModels, StructuredDecoder};
pub use tools::{ToolError, ToolRegistry};

// Error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Unresolvable tool: {0}")]
    UnresolvableTool(String),

    #[error("Tool '{tool}' failed: {source}")]
    ToolExecution {
        tool: String,
        #[source]
        source: ToolError,
    },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Tool loop did not settle within {0} rounds")]
    ToolRoundsExceeded(usize),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
pub type Result<T> = std::result::Result<T, GatewayError>;
