//! Error types for the course assistant.

use thiserror::Error;

/// Library-level error type for retrieval and answering.
#[derive(Error, Debug)]
pub enum QaError {
    #[error("Failed to load corpus snapshot: {0}")]
    CorpusLoad(String),

    #[error("Corpus is empty; no fragments to rank")]
    EmptyCorpus,

    #[error("Malformed fragment at row {row}: {reason}")]
    MalformedFragment { row: usize, reason: String },

    #[error("Query vector has {actual} dimensions, corpus has {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding provider error: {0}")]
    EmbeddingProvider(String),

    #[error("Completion provider error: {0}")]
    CompletionProvider(String),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl QaError {
    /// Whether the caller supplied something unusable (as opposed to an internal failure).
    pub fn is_client_error(&self) -> bool {
        matches!(self, QaError::InvalidInput(_))
    }
}

/// Result type alias for course assistant operations.
pub type Result<T> = std::result::Result<T, QaError>;
