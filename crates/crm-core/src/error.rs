//! Centralized error types for the pipeline engine.

use thiserror::Error;

/// Main error type for pipeline operations.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Client not found: {0}")]
    ClientNotFound(String),

    #[error("Request not found: {0}")]
    RequestNotFound(String),

    #[error("Quote not found: {0}")]
    QuoteNotFound(String),

    #[error("Stage not found: {0}")]
    StageNotFound(String),

    #[error("Stage already registered: {0}")]
    DuplicateStage(String),

    #[error("{kind} '{id}' references missing client '{client_id}'")]
    OrphanedRecord {
        kind: &'static str,
        id: String,
        client_id: String,
    },

    #[error("Invalid amount: {0} (must be a positive finite number)")]
    InvalidAmount(f64),

    #[error("Unknown {kind} status: '{value}'")]
    UnknownStatus { kind: &'static str, value: String },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    /// Create a store error.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub(crate) fn unknown_status(kind: &'static str, value: &str) -> Self {
        Self::UnknownStatus {
            kind,
            value: value.to_string(),
        }
    }
}
