use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The function rejected its input (e.g. division by zero)
    #[error("{0}")]
    Domain(String),
}

pub type ToolResult<T> = Result<T, ToolError>;
