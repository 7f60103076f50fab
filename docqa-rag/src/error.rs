//! Error types for the `docqa-rag` crate.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while building the index or answering questions.
#[derive(Debug, Error)]
pub enum QaError {
    /// Text could not be extracted from a source document.
    ///
    /// Non-fatal during ingestion: the document is logged and skipped.
    #[error("Extraction failed for {}: {message}", path.display())]
    Extraction {
        /// Path of the document that failed.
        path: PathBuf,
        /// A description of the failure.
        message: String,
    },

    /// A query arrived before the vector index was ever built.
    #[error("Index unavailable: no documents have been ingested")]
    IndexUnavailable,

    /// An external service did not answer within the configured timeout.
    #[error("{service} timed out after {}s", timeout.as_secs_f32())]
    ServiceTimeout {
        /// The service that timed out.
        service: String,
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// An external service was unreachable, rate-limited or returned an error.
    #[error("{service} error: {message}")]
    Service {
        /// The service that produced the error.
        service: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector index.
    #[error("Vector index error: {0}")]
    VectorIndex(String),

    /// An error occurred during document chunking.
    #[error("Chunking error: {0}")]
    Chunking(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An I/O error while reading the document source.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl QaError {
    /// Shorthand for a [`QaError::Service`] error.
    pub fn service(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Service { service: service.into(), message: message.into() }
    }

    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Service { .. } | Self::ServiceTimeout { .. })
    }
}

/// A convenience result type for QA operations.
pub type Result<T> = std::result::Result<T, QaError>;
