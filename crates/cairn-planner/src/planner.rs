//! Planner trait and configuration.

use cairn_core::{ConfigError, Plan, Result};
use serde::{Deserialize, Serialize};

use crate::domain::Goal;

/// How the heuristic estimate of a regression state is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeuristicMode {
    /// `node - real`: count the requirements of the node's regression state
    /// that the real current state does not satisfy. At the root this is the
    /// number of goal conditions that do not hold yet.
    #[default]
    StateDifference,
    /// Always zero, which orders the search by accumulated cost alone.
    Zero,
}

/// What happens when a successor equals a state still in the open set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenUpdatePolicy {
    /// Overwrite cost, heuristic, action and parent unconditionally.
    #[default]
    Always,
    /// Overwrite only when the new path is strictly cheaper.
    OnlyIfCheaper,
}

impl OpenUpdatePolicy {
    /// Whether a path of cost `candidate_g` replaces one of cost `current_g`.
    pub fn accepts(self, current_g: f64, candidate_g: f64) -> bool {
        match self {
            OpenUpdatePolicy::Always => true,
            OpenUpdatePolicy::OnlyIfCheaper => candidate_g < current_g,
        }
    }
}

/// Configuration for the planner.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Heuristic used to rank regression states.
    pub heuristic: HeuristicMode,

    /// Handling of rediscovered open states.
    pub open_update: OpenUpdatePolicy,

    /// Maximum number of states to expand. Unbounded when `None`.
    pub max_states_explored: Option<usize>,

    /// Maximum planning time in milliseconds. Unbounded when `None`.
    pub max_planning_time_ms: Option<u64>,
}

impl PlannerConfig {
    /// Parse a configuration document; missing fields take their defaults.
    pub fn from_json(json: &str) -> std::result::Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Trait for planning engines.
pub trait Planner {
    /// Compute a minimum-cost plan that makes `goal` hold.
    fn plan(&mut self, goal: &Goal) -> Result<Plan>;

    /// Replay `plan` from the current state and check that it reaches `goal`.
    fn validate_plan(&self, plan: &Plan, goal: &Goal) -> bool;

    /// Get the planner configuration.
    fn config(&self) -> &PlannerConfig;

    /// Update the planner configuration.
    fn set_config(&mut self, config: PlannerConfig);
}
