//! Error types for the `docqa-arxiv` crate.

use std::time::Duration;

use docqa_rag::QaError;
use thiserror::Error;

/// Errors raised while searching arXiv.
#[derive(Debug, Error)]
pub enum ArxivError {
    /// The HTTP request failed or the API answered with an error status.
    #[error("arXiv request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API did not answer within the client timeout.
    #[error("arXiv request timed out after {}s", .0.as_secs_f32())]
    Timeout(Duration),

    /// The response was not a well-formed Atom feed.
    #[error("malformed arXiv feed: {0}")]
    Feed(String),
}

/// Result type for arXiv operations.
pub type Result<T> = std::result::Result<T, ArxivError>;

impl From<ArxivError> for QaError {
    fn from(err: ArxivError) -> Self {
        match err {
            ArxivError::Timeout(timeout) => {
                QaError::ServiceTimeout { service: "arXiv".to_string(), timeout }
            }
            other => QaError::service("arXiv", other.to_string()),
        }
    }
}
