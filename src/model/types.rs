// SPDX-License-Identifier: MIT

//! Domain records for subjects and the rule catalog
//!
//! Definitions (features, states, behaviors) are shared read-only inputs to
//! every inference run; a subject's `states` and `behaviors` fields are
//! derived caches, overwritten wholesale by each run.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value::ScalarValue;

/// A named measurable attribute, e.g. height in cm
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Feature {
    pub id: Uuid,
    pub name: String,
    pub domain: String,
    pub unit: String,
}

/// One measured value a subject holds for a feature
///
/// A subject may hold several values for the same feature; only exact
/// `(feature, value)` duplicates are collapsed during resolution.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FeatureValue {
    pub feature: Uuid,
    pub value: ScalarValue,
}

/// A single comparator test over one feature
///
/// `operator` is kept as free text; an operator outside the supported set
/// makes the condition evaluate false rather than failing to parse.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Condition {
    pub feature: Uuid,
    pub operator: String,
    pub base: ScalarValue,
}

/// A conjunctive rule: a subject matches iff every condition is satisfied
/// by some value it holds for the referenced feature
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct State {
    pub id: Uuid,
    pub name: String,
    pub domain: String,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// Reference to a state inside a behavior rule
///
/// The `required` flag is recorded in the model but default matching treats
/// every referenced state as mandatory regardless of its value.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BehaviorRequirement {
    pub state: Uuid,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

/// A second-order rule over a set of required states
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Behavior {
    pub id: Uuid,
    pub name: String,
    pub domain: String,
    #[serde(default)]
    pub requirements: Vec<BehaviorRequirement>,
}

/// The entity being classified
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Subject {
    pub id: Uuid,
    pub alias: String,
    pub age: i32,
    pub gender: String,
    #[serde(default)]
    pub features: Vec<FeatureValue>,
    /// Derived: states matched by the last state inference run
    #[serde(default)]
    pub states: Vec<Uuid>,
    /// Derived: behaviors matched by the last behavior inference run
    #[serde(default)]
    pub behaviors: Vec<Uuid>,
}

/// Display projection of a matched state or behavior
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EntityRef {
    pub id: Uuid,
    pub name: String,
    pub domain: String,
}

impl From<&State> for EntityRef {
    fn from(state: &State) -> Self {
        Self {
            id: state.id,
            name: state.name.clone(),
            domain: state.domain.clone(),
        }
    }
}

impl From<&Behavior> for EntityRef {
    fn from(behavior: &Behavior) -> Self {
        Self {
            id: behavior.id,
            name: behavior.name.clone(),
            domain: behavior.domain.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requirement_defaults_to_required() {
        let json = format!("{{\"state\": \"{}\"}}", Uuid::new_v4());
        let req: BehaviorRequirement = serde_json::from_str(&json).unwrap();
        assert!(req.required);
    }

    #[test]
    fn test_subject_derived_fields_default_empty() {
        let json = format!(
            "{{\"id\": \"{}\", \"alias\": \"ada\", \"age\": 14, \"gender\": \"f\"}}",
            Uuid::new_v4()
        );
        let subject: Subject = serde_json::from_str(&json).unwrap();
        assert!(subject.features.is_empty());
        assert!(subject.states.is_empty());
        assert!(subject.behaviors.is_empty());
    }

    #[test]
    fn test_entity_ref_from_state() {
        let state = State {
            id: Uuid::new_v4(),
            name: "tall".to_string(),
            domain: "body".to_string(),
            conditions: vec![],
        };
        let r = EntityRef::from(&state);
        assert_eq!(r.id, state.id);
        assert_eq!(r.name, "tall");
        assert_eq!(r.domain, "body");
    }
}
