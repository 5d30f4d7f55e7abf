// SPDX-License-Identifier: MIT

//! Typed error handling for cohort-rs

use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;

/// Top-level error type for cohort-rs
#[derive(Debug, Error)]
pub enum EngineError {
    /// Single-subject inference was requested for an unknown identity
    #[error("Subject '{0}' not found")]
    SubjectNotFound(Uuid),

    /// Store read or write failed; the run aborts at this point
    #[error(transparent)]
    Store(StoreError),

    /// Configuration errors (bad dataset, unresolved references)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error wrapper
    #[error("{0}")]
    Other(String),
}

impl EngineError {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create from a generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// True when the error should surface as a not-found response
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SubjectNotFound(_))
    }
}

// A missing subject stays NotFound whether it surfaces from the store or
// from the orchestrator; every other store failure is fatal for the run.
impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SubjectNotFound(id) => Self::SubjectNotFound(id),
            other => Self::Store(other),
        }
    }
}
