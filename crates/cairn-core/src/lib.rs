//! # Cairn Core
//!
//! Core primitives and types for the Cairn planner.
//!
//! This crate provides the fundamental building blocks:
//! - [`PredicateBind`] / [`ActionBind`] - fixed-capacity grounded references
//! - [`ValueTable`] - the per-plan table of typed constants
//! - [`Condition`] - a required predicate truth over local arguments
//! - [`Plan`] - ordered grounded actions plus their value table
//! - [`SchemaError`] / [`PlanError`] - error types

pub mod error;
pub mod plan;
pub mod types;

// Re-exports for convenience
pub use error::{ConfigError, PlanError, Result, SchemaError, SchemaResult, ValueTableFull};
pub use plan::Plan;
pub use types::*;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{PlanError, Result, SchemaError, SchemaResult};
    pub use crate::plan::Plan;
    pub use crate::types::{
        ActionBind, ActionId, Condition, PredicateBind, PredicateId, Slots, TypeId, Value,
        ValueId, ValueTable,
    };
}
