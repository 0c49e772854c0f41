//! # Cairn State
//!
//! Sparse truth assignment over grounded predicates, used both for the real
//! current world and for the regression states of the search.

pub mod state;

pub use state::State;
