use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Embedding request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Embedding service error: {0}")]
    Embedding(String),

    #[error("Embedding dimension mismatch: query has {query}, document {id} has {document}")]
    Dimension {
        id: String,
        query: usize,
        document: usize,
    },

    #[error("Index not available: {0}")]
    Unavailable(String),

    #[error("Index configuration error: {0}")]
    Config(String),

    /// An error from a load shared with other waiters on the same key.
    #[error(transparent)]
    Shared(#[from] Arc<IndexError>),
}
