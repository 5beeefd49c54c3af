//! Error taxonomy for the acquisition and indexing pipeline

use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Browser endpoint or search engine unreachable
    #[error("Connection error: {0}")]
    Connection(String),

    /// Page load exceeded its budget
    #[error("Page load timed out after {timeout:?}: {url}")]
    Timeout { url: String, timeout: Duration },

    /// A DOM or content read failed
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Best-effort cleanup failed; never propagated
    #[error("Cleanup error: {0}")]
    Cleanup(String),

    /// The search engine rejected or could not perform an operation
    #[error("Indexing error: {0}")]
    Indexing(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Message stored in the `error` field of an error-marked document
    pub fn document_message(&self) -> String {
        match self {
            PipelineError::Timeout { .. } => crate::PAGE_LOAD_TIMEOUT_MESSAGE.to_string(),
            PipelineError::Connection(msg) => format!("Browser connection failed: {}", msg),
            PipelineError::Extraction(msg) => format!("Content extraction failed: {}", msg),
            other => other.to_string(),
        }
    }

    /// Short label used for metrics and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Connection(_) => "connection",
            PipelineError::Timeout { .. } => "timeout",
            PipelineError::Extraction(_) => "extraction",
            PipelineError::Cleanup(_) => "cleanup",
            PipelineError::Indexing(_) => "indexing",
            PipelineError::InvalidRequest(_) => "invalid_request",
            PipelineError::Internal(_) => "internal",
        }
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        PipelineError::Indexing(err.to_string())
    }
}
