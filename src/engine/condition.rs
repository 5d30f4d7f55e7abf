// SPDX-License-Identifier: MIT

//! Condition set evaluation
//!
//! A state is a conjunction: every condition must be satisfied by some value
//! the subject holds for that condition's feature. Each condition is
//! evaluated strictly against values of its own referenced feature.

use crate::model::{Condition, FeatureValue, State};

use super::comparator;

/// Does this set of feature values satisfy every condition of the state?
///
/// An empty condition set is vacuously true.
pub fn state_matches(feature_values: &[FeatureValue], state: &State) -> bool {
    state
        .conditions
        .iter()
        .all(|condition| condition_satisfied(feature_values, condition))
}

/// A condition is satisfied if any value held for its feature passes the
/// comparator; a feature with no values leaves it unsatisfied.
fn condition_satisfied(feature_values: &[FeatureValue], condition: &Condition) -> bool {
    feature_values
        .iter()
        .filter(|fv| fv.feature == condition.feature)
        .any(|fv| comparator::evaluate(&condition.operator, &condition.base, &fv.value))
}
