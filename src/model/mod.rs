// SPDX-License-Identifier: MIT

//! Data model: dynamically typed values, rule definitions and subjects

mod types;
mod value;

pub use types::{
    Behavior, BehaviorRequirement, Condition, EntityRef, Feature, FeatureValue, State, Subject,
};
pub use value::ScalarValue;
