//! # Cairn Planner
//!
//! Goal-regression planning engine for the Cairn planner.
//!
//! A [`Domain`] declares types, predicates with native evaluators and
//! parametrized actions. [`RegressionPlanner`] searches backwards from a
//! [`Goal`] for the cheapest sequence of grounded actions that makes it hold.

pub mod binder;
pub mod domain;
pub mod planner;
pub mod regression;
pub mod replay;

#[cfg(test)]
mod fixtures;

pub use binder::{Binder, Binding};
pub use domain::{
    Action, ActionDesc, ArgDesc, ConditionDesc, Domain, Evaluator, Goal, Predicate, Type,
    ValueDesc,
};
pub use planner::{HeuristicMode, OpenUpdatePolicy, Planner, PlannerConfig};
pub use regression::RegressionPlanner;
pub use replay::Simulation;
