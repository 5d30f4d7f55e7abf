// SPDX-License-Identifier: MIT

//! Single-condition comparator

use std::cmp::Ordering;

use crate::model::ScalarValue;

/// Supported comparison operators
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompareOp {
    /// gte
    Gte,
    /// lte
    Lte,
    /// lt
    Lt,
    /// gt
    Gt,
    /// eq
    Eq,
}

impl CompareOp {
    /// Parse an operator token; anything outside the fixed set is `None`
    pub fn parse(token: &str) -> Option<CompareOp> {
        match token {
            "gte" => Some(CompareOp::Gte),
            "lte" => Some(CompareOp::Lte),
            "lt" => Some(CompareOp::Lt),
            "gt" => Some(CompareOp::Gt),
            "eq" => Some(CompareOp::Eq),
            _ => None,
        }
    }
}

impl std::fmt::Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompareOp::Gte => write!(f, "gte"),
            CompareOp::Lte => write!(f, "lte"),
            CompareOp::Lt => write!(f, "lt"),
            CompareOp::Gt => write!(f, "gt"),
            CompareOp::Eq => write!(f, "eq"),
        }
    }
}

/// Evaluate one (operator, base, observed) triple to a boolean
///
/// Unknown operators and indeterminate comparisons (cross-variant pairs,
/// NaN) evaluate to `false` rather than raising, so one malformed condition
/// or value never aborts evaluation of an otherwise valid subject.
pub fn evaluate(operator: &str, base: &ScalarValue, observed: &ScalarValue) -> bool {
    let Some(op) = CompareOp::parse(operator) else {
        return false;
    };
    let Some(ordering) = observed.compare(base) else {
        return false;
    };

    match op {
        CompareOp::Gte => ordering != Ordering::Less,
        CompareOp::Lte => ordering != Ordering::Greater,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Eq => ordering == Ordering::Equal,
    }
}
