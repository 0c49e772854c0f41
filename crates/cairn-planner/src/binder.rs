//! Mapping effect matches onto action slots.
//!
//! For every combination of effect matches the search stages a [`Binding`]:
//! a scratch copy of the regression state, the shared value table and an
//! empty [`ActionBind`]. The default binder copies slots from the matches; an
//! action may install its own. The search commits the staged state only when
//! the binder reports success and rolls the value table back otherwise.

use cairn_core::{ActionBind, PredicateBind, ValueTable};
use cairn_state::State;

use crate::domain::Action;

/// Custom binder: fill `binding.bind` and `binding.state`, return whether the
/// action applies to this combination.
pub type Binder = Box<dyn Fn(&mut Binding<'_>) -> bool + Send + Sync>;

/// Scratch space handed to a binder for one effect-match combination.
pub struct Binding<'a> {
    /// The action being regressed.
    pub action: &'a Action,

    /// The chosen match for each effect, in effect order. An effect whose
    /// predicate has no entry in the state gets a reference with every slot
    /// unbound, which is absent from `state`.
    pub matches: &'a [PredicateBind],

    /// Values of the current plan. Binders may append.
    pub values: &'a mut ValueTable,

    /// Output binding, pre-filled with the action id and unbound slots.
    pub bind: ActionBind,

    /// Successor regression state, a copy of the expanded node's state.
    pub state: &'a mut State,
}

impl Binding<'_> {
    /// Default binding step.
    ///
    /// Each effect's arguments take their slot values from its match, and the
    /// match is required to hold the negated effect truth beforehand. The
    /// preconditions are then recorded at their declared truth.
    ///
    /// Wildcard matches are never recorded in the regression state, so they
    /// neither bind nor require anything. Fails when two matches disagree on
    /// the value of a shared argument.
    pub fn regress(&mut self) -> bool {
        for (effect, matched) in self.action.effects.iter().zip(self.matches) {
            if !self.state.contains(matched) {
                continue;
            }
            for (position, &local) in effect.slots.iter().enumerate() {
                let Some(value) = matched.slot(position) else {
                    continue;
                };
                match self.bind.slot(local) {
                    Some(bound) if bound != value => return false,
                    _ => self.bind.slots.set(local, Some(value)),
                }
            }
            self.state.set(*matched, !effect.state);
        }
        self.apply_preconditions();
        true
    }

    /// Record the action's preconditions, grounded through `self.bind`.
    pub fn apply_preconditions(&mut self) {
        self.action.apply_preconditions(&self.bind, self.state);
    }
}
