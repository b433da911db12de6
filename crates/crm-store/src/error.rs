//! Store error types.

use crm_core::PipelineError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Fixture error: {0}")]
    Fixture(#[from] serde_json::Error),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("{kind} already exists: {id}")]
    Duplicate { kind: &'static str, id: String },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub(crate) fn not_found(kind: &'static str, id: &str) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub(crate) fn duplicate(kind: &'static str, id: &str) -> Self {
        Self::Duplicate {
            kind,
            id: id.to_string(),
        }
    }
}

impl From<StoreError> for PipelineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { kind: "client", id } => PipelineError::ClientNotFound(id),
            StoreError::NotFound { kind: "request", id } => PipelineError::RequestNotFound(id),
            StoreError::NotFound { kind: "quote", id } => PipelineError::QuoteNotFound(id),
            StoreError::Fixture(e) => PipelineError::Json(e),
            other => PipelineError::store(other.to_string()),
        }
    }
}
