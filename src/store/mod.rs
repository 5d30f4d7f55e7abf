// SPDX-License-Identifier: MIT

//! Store contracts the engine reads and writes through
//!
//! The engine has no opinion on how records are stored; anything satisfying
//! these two traits can back an inference run. The crate ships an in-memory
//! implementation plus a YAML dataset loader to seed it.

mod dataset;
mod memory;

pub use dataset::{load_dataset, parse_dataset};
pub use memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::model::{Behavior, Feature, State, Subject};

/// Store-level failures
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested subject does not exist
    #[error("Subject '{0}' not found")]
    SubjectNotFound(Uuid),

    /// The store cannot be reached or a read/write failed
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Read-only provider of feature, state and behavior definitions
#[async_trait]
pub trait DefinitionStore: Send + Sync {
    async fn list_features(&self) -> Result<Vec<Feature>, StoreError>;

    /// List state definitions, optionally restricted to one domain
    async fn list_states(&self, domain: Option<&str>) -> Result<Vec<State>, StoreError>;

    /// List behavior definitions, optionally restricted to one domain
    async fn list_behaviors(&self, domain: Option<&str>) -> Result<Vec<Behavior>, StoreError>;
}

/// Read/write provider of subject records and their derived fields
#[async_trait]
pub trait SubjectStore: Send + Sync {
    async fn get_subject(&self, id: Uuid) -> Result<Subject, StoreError>;

    async fn list_subjects(
        &self,
        skip: Option<usize>,
        limit: Option<usize>,
    ) -> Result<Vec<Subject>, StoreError>;

    /// Overwrite the subject's matched-state set (full replace, not merge)
    async fn write_matched_states(&self, id: Uuid, states: Vec<Uuid>) -> Result<(), StoreError>;

    /// Overwrite the subject's matched-behavior set (full replace, not merge)
    async fn write_matched_behaviors(
        &self,
        id: Uuid,
        behaviors: Vec<Uuid>,
    ) -> Result<(), StoreError>;
}
