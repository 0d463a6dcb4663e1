use dealhound_index::IndexError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Model artifact error: {0}")]
    ModelArtifact(String),

    #[error("Scoring oracle error: {0}")]
    Oracle(String),

    #[error("Remote specialist error: {0}")]
    Remote(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    #[error("Deal source error: {0}")]
    Source(String),

    #[error("Notification error: {0}")]
    Notify(String),
}
