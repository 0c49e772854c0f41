//! Forward replay of a plan from the current state.

use std::any::Any;

use cairn_core::{ActionBind, Plan, PredicateBind, ValueTable};
use cairn_state::State;
use tracing::debug;

use crate::domain::{Domain, Goal};

/// Executes grounded actions against a lazily evaluated world.
///
/// Facts no action has touched yet are read from the predicate evaluators
/// the first time they are needed and remembered from then on.
pub struct Simulation<'a> {
    domain: &'a Domain,
    values: &'a ValueTable,
    context: Option<&'a dyn Any>,
    state: State,
}

impl<'a> Simulation<'a> {
    pub fn new(domain: &'a Domain, values: &'a ValueTable, context: Option<&'a dyn Any>) -> Self {
        Self {
            domain,
            values,
            context,
            state: State::new(),
        }
    }

    /// Current truth of `bind`.
    pub fn holds(&mut self, bind: &PredicateBind) -> bool {
        if let Some(value) = self.state.lookup(bind) {
            return value;
        }
        let value = self.domain.evaluate(self.context, self.values, bind);
        self.state.set(*bind, value);
        value
    }

    /// Apply one action if its preconditions hold. Returns whether it applied.
    pub fn apply(&mut self, bind: &ActionBind) -> bool {
        let domain = self.domain;
        let Some(action) = domain.action(bind.action) else {
            debug!("Unknown action {} in plan replay", bind.action);
            return false;
        };

        for precondition in &action.preconditions {
            let fact = precondition.bind_through(&bind.slots);
            if self.holds(&fact) != precondition.state {
                debug!(
                    "Precondition of {} does not hold",
                    domain.describe(bind, self.values)
                );
                return false;
            }
        }

        action.apply_effects(bind, &mut self.state);
        true
    }

    /// Whether every goal condition holds now.
    pub fn satisfies(&mut self, goal: &Goal) -> bool {
        goal.conditions
            .iter()
            .all(|condition| self.holds(&condition.bind_values()) == condition.state)
    }

    /// Apply every action of `plan` in order and check the goal at the end.
    pub fn run(&mut self, plan: &Plan, goal: &Goal) -> bool {
        plan.actions.iter().all(|bind| self.apply(bind)) && self.satisfies(goal)
    }

    /// Facts established or read so far.
    pub fn state(&self) -> &State {
        &self.state
    }
}
