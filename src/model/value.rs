// SPDX-License-Identifier: MIT

//! Dynamically typed feature values

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A measured or base value: numeric or text
///
/// Values are untagged on the wire, so `190` and `"190"` deserialize to
/// different variants and never compare equal.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Number(f64),
    Text(String),
}

impl ScalarValue {
    /// Order two values of the same variant
    ///
    /// Returns `None` for cross-variant pairs and for NaN operands;
    /// callers treat that as an indeterminate comparison.
    pub fn compare(&self, other: &ScalarValue) -> Option<Ordering> {
        match (self, other) {
            (ScalarValue::Number(a), ScalarValue::Number(b)) => a.partial_cmp(b),
            (ScalarValue::Text(a), ScalarValue::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl From<f64> for ScalarValue {
    fn from(n: f64) -> Self {
        ScalarValue::Number(n)
    }
}

impl From<i64> for ScalarValue {
    fn from(n: i64) -> Self {
        ScalarValue::Number(n as f64)
    }
}

impl From<&str> for ScalarValue {
    fn from(s: &str) -> Self {
        ScalarValue::Text(s.to_string())
    }
}

impl std::fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarValue::Number(n) => write!(f, "{}", n),
            ScalarValue::Text(s) => write!(f, "{}", s),
        }
    }
}
