// SPDX-License-Identifier: MIT

//! State and behavior resolution for one subject
//!
//! Both resolvers are pure: they read the subject and a definition catalog
//! and return display references of everything the subject matches, in
//! catalog order.

use crate::model::{Behavior, EntityRef, FeatureValue, State, Subject};

use super::condition;

/// Collapse exact `(feature, value)` duplicates before evaluation
///
/// Duplicates evaluate identically, so this only trims redundant work;
/// duplicate-but-different values for one feature are all kept.
pub fn dedup_feature_values(values: &[FeatureValue]) -> Vec<FeatureValue> {
    let mut unique: Vec<FeatureValue> = Vec::with_capacity(values.len());
    for value in values {
        if !unique.contains(value) {
            unique.push(value.clone());
        }
    }
    unique
}

/// Every state of the catalog the subject's feature values satisfy
pub fn resolve_states(subject: &Subject, catalog: &[State]) -> Vec<EntityRef> {
    let values = dedup_feature_values(&subject.features);
    catalog
        .iter()
        .filter(|state| condition::state_matches(&values, state))
        .map(EntityRef::from)
        .collect()
}

/// Every behavior whose referenced states are all present in the subject's
/// persisted matched-state set
///
/// The `required` flag on a requirement is ignored: every referenced state
/// is treated as mandatory. Extra matched states never disqualify a match,
/// and an empty requirement set matches unconditionally.
pub fn resolve_behaviors(subject: &Subject, catalog: &[Behavior]) -> Vec<EntityRef> {
    catalog
        .iter()
        .filter(|behavior| {
            behavior
                .requirements
                .iter()
                .all(|req| subject.states.contains(&req.state))
        })
        .map(EntityRef::from)
        .collect()
}

/// Flag-aware variant: only requirements with `required: true` enter the
/// subset test. Not used by default matching; provided as an explicitly
/// named alternative interpretation of the requirement flag.
pub fn resolve_behaviors_required_only(subject: &Subject, catalog: &[Behavior]) -> Vec<EntityRef> {
    catalog
        .iter()
        .filter(|behavior| {
            behavior
                .requirements
                .iter()
                .filter(|req| req.required)
                .all(|req| subject.states.contains(&req.state))
        })
        .map(EntityRef::from)
        .collect()
}
