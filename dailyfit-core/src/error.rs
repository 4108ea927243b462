//! Input validation errors.

use thiserror::Error;

use crate::models::{GoalKind, GoalRange};

/// One goal value outside its allowed range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeViolation {
    pub kind: GoalKind,
    pub value: u32,
    pub range: GoalRange,
}

impl std::fmt::Display for RangeViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} must be between {} and {} {} (got {})",
            self.kind,
            self.range.min,
            self.range.max,
            self.kind.unit(),
            self.value
        )
    }
}

/// Malformed user input or backend data. Nothing is changed when returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid amount '{0}': enter a whole number of zero or more")]
    InvalidAmount(String),

    #[error("Goals response has a missing or non-numeric '{0}' field")]
    MalformedGoal(&'static str),

    #[error("{}", join_violations(.0))]
    OutOfRange(Vec<RangeViolation>),
}

fn join_violations(violations: &[RangeViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parses user-entered text as a non-negative whole amount.
pub fn parse_amount(input: &str) -> Result<u32, ValidationError> {
    input
        .trim()
        .parse::<u32>()
        .map_err(|_| ValidationError::InvalidAmount(input.to_string()))
}
