//! Sparse truth assignment over grounded predicates.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::ops::Sub;

use cairn_core::{PredicateBind, PredicateId};

/// Truth values keyed by grounded predicate reference.
///
/// Alongside the truth map the state keeps, per predicate id, the references
/// recorded for it in first-insertion order. Equality and hashing look at the
/// truth map only, so two states that recorded the same facts in a different
/// order are the same state.
#[derive(Debug, Clone, Default)]
pub struct State {
    /// Truth value of every recorded reference.
    truths: BTreeMap<PredicateBind, bool>,

    /// References recorded per predicate, in insertion order.
    index: BTreeMap<PredicateId, Vec<PredicateBind>>,
}

impl State {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` for `bind`, indexing it on first insertion.
    pub fn set(&mut self, bind: PredicateBind, value: bool) {
        match self.truths.entry(bind) {
            Entry::Occupied(mut entry) => {
                entry.insert(value);
            }
            Entry::Vacant(entry) => {
                entry.insert(value);
                self.index.entry(bind.predicate).or_default().push(bind);
            }
        }
    }

    /// Stored value for `bind`; absent references read as false.
    pub fn get(&self, bind: &PredicateBind) -> bool {
        self.truths.get(bind).copied().unwrap_or(false)
    }

    /// Stored value for `bind`, `None` when it was never recorded.
    pub fn lookup(&self, bind: &PredicateBind) -> Option<bool> {
        self.truths.get(bind).copied()
    }

    /// Whether `bind` has been recorded.
    pub fn contains(&self, bind: &PredicateBind) -> bool {
        self.truths.contains_key(bind)
    }

    /// Every reference recorded for `predicate`, in insertion order.
    pub fn range(&self, predicate: PredicateId) -> &[PredicateBind] {
        self.index
            .get(&predicate)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether every entry of `self` is present in `other` with the same value.
    ///
    /// `self` holds the requirements and `other` the candidate state; entries
    /// only `other` carries do not matter.
    pub fn meets(&self, other: &State) -> bool {
        self.truths
            .iter()
            .all(|(bind, value)| other.truths.get(bind) == Some(value))
    }

    /// Number of entries of `self` whose value in `other` differs or is missing.
    pub fn difference(&self, other: &State) -> f64 {
        self.truths
            .iter()
            .filter(|(bind, value)| other.truths.get(*bind) != Some(*value))
            .count() as f64
    }

    /// Recorded entries in reference order.
    pub fn iter(&self) -> impl Iterator<Item = (&PredicateBind, bool)> {
        self.truths.iter().map(|(bind, value)| (bind, *value))
    }

    /// Number of recorded references.
    pub fn len(&self) -> usize {
        self.truths.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.truths.is_empty()
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.truths == other.truths
    }
}

impl Eq for State {}

impl Hash for State {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.truths.hash(state);
    }
}

impl Sub for &State {
    type Output = f64;

    fn sub(self, other: &State) -> f64 {
        self.difference(other)
    }
}
