// SPDX-License-Identifier: MIT

//! The two-stage inference engine
//!
//! Stage 1 matches a subject's feature values against state rules; stage 2
//! matches its persisted state set against behavior rules. Both derived sets
//! are written back wholesale on each run.

pub mod comparator;
pub mod condition;
pub mod resolver;

mod orchestrator;

pub use orchestrator::{InferenceEngine, SubjectInference, SubjectSelector};
