// SPDX-License-Identifier: MIT

//! Inference orchestration
//!
//! Sequences a run: load the stage's catalog once, load the selected
//! subjects, resolve per subject, write the derived set back (full replace),
//! report. The two stages are independently triggerable; behavior inference
//! reads whatever matched-state set is currently persisted on the subject.

use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::EngineError;
use crate::model::{EntityRef, Subject};
use crate::store::{DefinitionStore, SubjectStore};

use super::resolver;

/// Which subjects a run covers
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SubjectSelector {
    All,
    One(Uuid),
}

/// Per-subject result of an inference run
#[derive(Debug, Clone, Serialize)]
pub struct SubjectInference {
    pub id: Uuid,
    pub alias: String,
    pub age: i32,
    pub gender: String,
    /// Resolved states or behaviors, depending on the stage
    pub matched: Vec<EntityRef>,
}

impl SubjectInference {
    /// Report body with the stage-appropriate key for the matched set,
    /// e.g. `"states"` or `"behaviors"`
    pub fn to_body(&self, key: &str) -> Value {
        json!({
            "id": self.id,
            "age": self.age,
            "alias": self.alias,
            "gender": self.gender,
            key: self.matched,
        })
    }
}

/// Runs inference stages against the configured stores
pub struct InferenceEngine {
    definitions: Arc<dyn DefinitionStore>,
    subjects: Arc<dyn SubjectStore>,
}

impl InferenceEngine {
    pub fn new(definitions: Arc<dyn DefinitionStore>, subjects: Arc<dyn SubjectStore>) -> Self {
        Self {
            definitions,
            subjects,
        }
    }

    /// Stage 1: resolve and persist matched states
    pub async fn run_state_inference(
        &self,
        selector: SubjectSelector,
        domain: Option<&str>,
    ) -> Result<Vec<SubjectInference>, EngineError> {
        let catalog = self.definitions.list_states(domain).await?;
        let subjects = self.load_subjects(selector).await?;
        log::info!(
            "State inference over {} subject(s), {} state(s)",
            subjects.len(),
            catalog.len()
        );

        let mut report = Vec::with_capacity(subjects.len());
        for subject in subjects {
            let matched = resolver::resolve_states(&subject, &catalog);
            let ids = matched.iter().map(|r| r.id).collect();
            self.subjects.write_matched_states(subject.id, ids).await?;
            report.push(report_entry(subject, matched));
        }

        Ok(report)
    }

    /// Stage 2: resolve and persist matched behaviors
    ///
    /// Works from the persisted matched-state set, not necessarily one
    /// computed in the same call chain.
    pub async fn run_behavior_inference(
        &self,
        selector: SubjectSelector,
        domain: Option<&str>,
    ) -> Result<Vec<SubjectInference>, EngineError> {
        let catalog = self.definitions.list_behaviors(domain).await?;
        let subjects = self.load_subjects(selector).await?;
        log::info!(
            "Behavior inference over {} subject(s), {} behavior(s)",
            subjects.len(),
            catalog.len()
        );

        let mut report = Vec::with_capacity(subjects.len());
        for subject in subjects {
            let matched = resolver::resolve_behaviors(&subject, &catalog);
            let ids = matched.iter().map(|r| r.id).collect();
            self.subjects
                .write_matched_behaviors(subject.id, ids)
                .await?;
            report.push(report_entry(subject, matched));
        }

        Ok(report)
    }

    async fn load_subjects(&self, selector: SubjectSelector) -> Result<Vec<Subject>, EngineError> {
        match selector {
            SubjectSelector::One(id) => Ok(vec![self.subjects.get_subject(id).await?]),
            SubjectSelector::All => Ok(self.subjects.list_subjects(None, None).await?),
        }
    }
}

fn report_entry(subject: Subject, matched: Vec<EntityRef>) -> SubjectInference {
    SubjectInference {
        id: subject.id,
        alias: subject.alias,
        age: subject.age,
        gender: subject.gender,
        matched,
    }
}
