//! Error types for the Cairn planner.

use thiserror::Error;

/// Failure while registering types, predicates, actions or goals.
///
/// Every registration call reports its own error; a failed call leaves the
/// schema exactly as it was before the call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// A type with this name is already declared.
    #[error("Domain already contains {name} type")]
    DuplicateType { name: String },

    /// A predicate with this name is already declared.
    #[error("Domain already contains {name} predicate")]
    DuplicatePredicate { name: String },

    /// An action with this name is already declared.
    #[error("Domain already contains {name} action")]
    DuplicateAction { name: String },

    /// A referenced type was never declared.
    #[error("Domain doesn't contain {name} type")]
    UnknownType { name: String },

    /// A referenced predicate was never declared.
    #[error("Domain doesn't contain {name} predicate")]
    UnknownPredicate { name: String },

    /// A condition names an argument the action does not declare.
    #[error("Argument {argument} not found in {action} action")]
    UnknownArgument { argument: String, action: String },

    /// A goal condition names a value absent from the goal's value list.
    #[error("Argument {name} not found in goal values")]
    UnknownGoalValue { name: String },

    /// More arguments than a grounded reference has slots for.
    #[error("{name} declares {count} arguments, at most {max} are supported")]
    TooManyArguments { name: String, count: usize, max: usize },

    /// A condition passes the wrong number of arguments to its predicate.
    #[error("Predicate {predicate} expects {expected} arguments, got {found}")]
    ArityMismatch {
        predicate: String,
        expected: usize,
        found: usize,
    },

    /// A condition argument has a different type than the predicate expects.
    #[error("Predicate {predicate} expects {expected} at position {position}, got {found}")]
    TypeMismatch {
        predicate: String,
        position: usize,
        expected: String,
        found: String,
    },

    /// The schema or goal ran out of single-byte identifiers.
    #[error("Too many {kind}: at most {max} are supported")]
    CapacityExceeded { kind: &'static str, max: usize },

    /// Action costs must be finite and non-negative.
    #[error("Action {action} has invalid cost {cost}")]
    InvalidCost { action: String, cost: f64 },
}

/// Failure of a single `plan()` invocation.
///
/// A goal that already holds is not an error: it yields a plan with no
/// actions. `Unreachable` is reserved for an exhausted search.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    /// The open set emptied without any regression state meeting the real state.
    #[error("No plan reaches the goal after exploring {explored} states")]
    Unreachable { explored: usize },

    /// The configured expansion budget was spent.
    #[error("Exceeded maximum states explored: {limit}")]
    StateLimitExceeded { limit: usize },

    /// The configured wall-clock budget was spent.
    #[error("Exceeded maximum planning time: {limit_ms}ms")]
    TimeLimitExceeded { limit_ms: u64 },
}

impl PlanError {
    /// Returns true if the search stopped because of a configured budget
    /// rather than because the goal cannot be reached.
    pub fn is_budget(&self) -> bool {
        matches!(
            self,
            PlanError::StateLimitExceeded { .. } | PlanError::TimeLimitExceeded { .. }
        )
    }
}

/// The per-plan value table has no free index left.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Value table is full: at most {capacity} values are supported")]
pub struct ValueTableFull {
    pub capacity: usize,
}

/// Planner configuration could not be parsed.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The document is not valid configuration JSON.
    #[error("Invalid planner configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience Result type for schema registration.
pub type SchemaResult<T> = std::result::Result<T, SchemaError>;

/// Convenience Result type for planning.
pub type Result<T> = std::result::Result<T, PlanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_errors() {
        assert!(PlanError::StateLimitExceeded { limit: 10 }.is_budget());
        assert!(PlanError::TimeLimitExceeded { limit_ms: 5 }.is_budget());
        assert!(!PlanError::Unreachable { explored: 3 }.is_budget());
    }

    #[test]
    fn test_schema_error_messages() {
        let err = SchemaError::UnknownArgument {
            argument: "where".to_string(),
            action: "place".to_string(),
        };
        assert_eq!(err.to_string(), "Argument where not found in place action");

        let err = SchemaError::DuplicateType {
            name: "object".to_string(),
        };
        assert_eq!(err.to_string(), "Domain already contains object type");
    }
}
