//! Error types for Quill.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuillError {
    #[error("Configuration unavailable: {0}")]
    ConfigUnavailable(String),

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Unparseable structured output: {0}")]
    UnparseableOutput(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, QuillError>;
