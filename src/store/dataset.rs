// SPDX-License-Identifier: MIT

//! YAML dataset loading
//!
//! A dataset file declares features, states, behaviors and subjects with
//! name-based cross-references; loading resolves every reference to a
//! freshly minted id and seeds a `MemoryStore`. Unknown references are a
//! configuration error.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use uuid::Uuid;

use crate::error::EngineError;
use crate::model::{
    Behavior, BehaviorRequirement, Condition, Feature, FeatureValue, ScalarValue, State, Subject,
};

use super::MemoryStore;

/// Top-level dataset file
#[derive(Debug, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub features: Vec<FeatureDef>,
    #[serde(default)]
    pub states: Vec<StateDef>,
    #[serde(default)]
    pub behaviors: Vec<BehaviorDef>,
    #[serde(default)]
    pub subjects: Vec<SubjectDef>,
}

#[derive(Debug, Deserialize)]
pub struct FeatureDef {
    pub name: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub unit: String,
}

#[derive(Debug, Deserialize)]
pub struct StateDef {
    pub name: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub conditions: Vec<ConditionDef>,
}

#[derive(Debug, Deserialize)]
pub struct ConditionDef {
    /// Feature name, resolved at load time
    pub feature: String,
    pub operator: String,
    pub base: ScalarValue,
}

#[derive(Debug, Deserialize)]
pub struct BehaviorDef {
    pub name: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub states: Vec<RequirementDef>,
}

#[derive(Debug, Deserialize)]
pub struct RequirementDef {
    /// State name, resolved at load time
    pub state: String,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct SubjectDef {
    pub alias: String,
    pub age: i32,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub features: Vec<ValueDef>,
}

#[derive(Debug, Deserialize)]
pub struct ValueDef {
    /// Feature name, resolved at load time
    pub feature: String,
    pub value: ScalarValue,
}

/// Load a dataset file into a fresh in-memory store
pub async fn load_dataset<P: AsRef<Path>>(path: P) -> Result<MemoryStore, EngineError> {
    let content = fs::read_to_string(path)?;
    parse_dataset(&content).await
}

/// Parse a dataset from a YAML string and resolve its name references
pub async fn parse_dataset(content: &str) -> Result<MemoryStore, EngineError> {
    let dataset: Dataset = serde_yaml::from_str(content)?;
    let store = MemoryStore::new();

    let mut feature_ids: HashMap<String, Uuid> = HashMap::new();
    for def in dataset.features {
        let id = Uuid::new_v4();
        feature_ids.insert(def.name.clone(), id);
        store
            .insert_feature(Feature {
                id,
                name: def.name,
                domain: def.domain,
                unit: def.unit,
            })
            .await;
    }

    let mut state_ids: HashMap<String, Uuid> = HashMap::new();
    for def in dataset.states {
        let id = Uuid::new_v4();
        let mut conditions = Vec::with_capacity(def.conditions.len());
        for c in def.conditions {
            let feature = resolve(&feature_ids, &c.feature, "feature", &def.name)?;
            conditions.push(Condition {
                feature,
                operator: c.operator,
                base: c.base,
            });
        }
        state_ids.insert(def.name.clone(), id);
        store
            .insert_state(State {
                id,
                name: def.name,
                domain: def.domain,
                conditions,
            })
            .await;
    }

    for def in dataset.behaviors {
        let mut requirements = Vec::with_capacity(def.states.len());
        for r in def.states {
            let state = resolve(&state_ids, &r.state, "state", &def.name)?;
            requirements.push(BehaviorRequirement {
                state,
                required: r.required,
            });
        }
        store
            .insert_behavior(Behavior {
                id: Uuid::new_v4(),
                name: def.name,
                domain: def.domain,
                requirements,
            })
            .await;
    }

    for def in dataset.subjects {
        let mut features = Vec::with_capacity(def.features.len());
        for v in def.features {
            let feature = resolve(&feature_ids, &v.feature, "feature", &def.alias)?;
            features.push(FeatureValue {
                feature,
                value: v.value,
            });
        }
        store
            .insert_subject(Subject {
                id: Uuid::new_v4(),
                alias: def.alias,
                age: def.age,
                gender: def.gender,
                features,
                states: vec![],
                behaviors: vec![],
            })
            .await;
    }

    Ok(store)
}

fn resolve(
    ids: &HashMap<String, Uuid>,
    name: &str,
    kind: &str,
    referrer: &str,
) -> Result<Uuid, EngineError> {
    ids.get(name).copied().ok_or_else(|| {
        EngineError::config(format!("Unknown {} '{}' referenced by '{}'", kind, name, referrer))
    })
}
