// SPDX-License-Identifier: MIT

//! In-memory reference implementation of the store contracts

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::model::{Behavior, Feature, State, Subject};

use super::{DefinitionStore, StoreError, SubjectStore};

/// Clone-shared in-memory store; listing order is insertion order
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    features: Arc<RwLock<Vec<Feature>>>,
    states: Arc<RwLock<Vec<State>>>,
    behaviors: Arc<RwLock<Vec<Behavior>>>,
    subjects: Arc<RwLock<Vec<Subject>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_feature(&self, feature: Feature) {
        self.features.write().await.push(feature);
    }

    pub async fn insert_state(&self, state: State) {
        self.states.write().await.push(state);
    }

    pub async fn insert_behavior(&self, behavior: Behavior) {
        self.behaviors.write().await.push(behavior);
    }

    pub async fn insert_subject(&self, subject: Subject) {
        self.subjects.write().await.push(subject);
    }
}

#[async_trait]
impl DefinitionStore for MemoryStore {
    async fn list_features(&self) -> Result<Vec<Feature>, StoreError> {
        Ok(self.features.read().await.clone())
    }

    async fn list_states(&self, domain: Option<&str>) -> Result<Vec<State>, StoreError> {
        let states = self.states.read().await;
        Ok(states
            .iter()
            .filter(|s| domain.is_none_or(|d| s.domain == d))
            .cloned()
            .collect())
    }

    async fn list_behaviors(&self, domain: Option<&str>) -> Result<Vec<Behavior>, StoreError> {
        let behaviors = self.behaviors.read().await;
        Ok(behaviors
            .iter()
            .filter(|b| domain.is_none_or(|d| b.domain == d))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SubjectStore for MemoryStore {
    async fn get_subject(&self, id: Uuid) -> Result<Subject, StoreError> {
        let subjects = self.subjects.read().await;
        subjects
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or(StoreError::SubjectNotFound(id))
    }

    async fn list_subjects(
        &self,
        skip: Option<usize>,
        limit: Option<usize>,
    ) -> Result<Vec<Subject>, StoreError> {
        let subjects = self.subjects.read().await;
        Ok(subjects
            .iter()
            .skip(skip.unwrap_or(0))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn write_matched_states(&self, id: Uuid, states: Vec<Uuid>) -> Result<(), StoreError> {
        let mut subjects = self.subjects.write().await;
        let subject = subjects
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(StoreError::SubjectNotFound(id))?;
        subject.states = states;
        Ok(())
    }

    async fn write_matched_behaviors(
        &self,
        id: Uuid,
        behaviors: Vec<Uuid>,
    ) -> Result<(), StoreError> {
        let mut subjects = self.subjects.write().await;
        let subject = subjects
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(StoreError::SubjectNotFound(id))?;
        subject.behaviors = behaviors;
        Ok(())
    }
}
