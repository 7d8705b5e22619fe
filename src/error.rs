//! Error types for Campus Helper.

use thiserror::Error;

/// Library-level error type for Campus Helper operations.
#[derive(Error, Debug)]
pub enum HelperError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Document extraction failed: {0}")]
    Document(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Persisted index was built with {found}, but {expected} is configured")]
    EmbeddingMismatch { expected: String, found: String },

    #[error("Vector store not available.")]
    IndexUnavailable,

    #[error("{0}")]
    Rag(String),

    #[error("Event store error: {0}")]
    EventStore(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Watcher error: {0}")]
    Watcher(#[from] notify::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Telegram error: {0}")]
    Bot(String),
}

/// Result type alias for Campus Helper operations.
pub type Result<T> = std::result::Result<T, HelperError>;
