//! Identifiers and fixed-capacity grounded references.
//!
//! Everything the search copies per node is kept small: identifiers are single
//! bytes and a grounded reference is one id byte plus [`MAX_SLOTS`] slot bytes,
//! so equality and hashing never touch the heap.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValueTableFull;

/// Number of argument slots in a grounded reference.
pub const MAX_SLOTS: usize = 7;

/// Slot marker for "no value bound".
pub const UNBOUND: u8 = u8::MAX;

/// Number of distinct ids of each kind. The last byte value is the unbound marker.
pub const MAX_IDS: usize = UNBOUND as usize;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u8);

        impl $name {
            /// Wrap a raw byte id.
            pub const fn new(raw: u8) -> Self {
                Self(raw)
            }

            /// Convert a dense table index, if it fits below the unbound marker.
            pub fn from_index(index: usize) -> Option<Self> {
                (index < MAX_IDS).then(|| Self(index as u8))
            }

            /// Position in the owning table.
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            /// Raw byte.
            pub const fn raw(self) -> u8 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type! {
    /// Dense id of a declared type.
    TypeId
}

id_type! {
    /// Dense id of a declared predicate.
    PredicateId
}

id_type! {
    /// Dense id of a declared action.
    ActionId
}

id_type! {
    /// Index into a [`ValueTable`].
    ValueId
}

/// Argument slots of a grounded reference, each a value index or unbound.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slots([u8; MAX_SLOTS]);

impl Slots {
    /// All slots unbound.
    pub const UNBOUND: Slots = Slots([UNBOUND; MAX_SLOTS]);

    /// Bind the leading slots to `values`; the rest stay unbound.
    pub fn from_values(values: &[ValueId]) -> Self {
        let mut slots = Self::UNBOUND;
        for (position, value) in values.iter().enumerate() {
            slots.set(position, Some(*value));
        }
        slots
    }

    /// Value bound at `position`, `None` when unbound or out of range.
    pub fn get(&self, position: usize) -> Option<ValueId> {
        match self.0.get(position) {
            Some(&raw) if raw != UNBOUND => Some(ValueId(raw)),
            _ => None,
        }
    }

    /// Bind or clear `position`. Positions past [`MAX_SLOTS`] are ignored.
    pub fn set(&mut self, position: usize, value: Option<ValueId>) {
        if let Some(slot) = self.0.get_mut(position) {
            *slot = value.map_or(UNBOUND, ValueId::raw);
        }
    }

    /// Whether the first `arity` slots all carry a value.
    pub fn is_bound(&self, arity: usize) -> bool {
        (0..arity).all(|position| self.get(position).is_some())
    }

    /// Raw slot bytes.
    pub fn raw(&self) -> &[u8; MAX_SLOTS] {
        &self.0
    }
}

impl Default for Slots {
    fn default() -> Self {
        Self::UNBOUND
    }
}

impl fmt::Debug for Slots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for raw in self.0 {
            if raw == UNBOUND {
                list.entry(&format_args!("_"));
            } else {
                list.entry(&raw);
            }
        }
        list.finish()
    }
}

/// A predicate grounded against a value table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PredicateBind {
    pub predicate: PredicateId,
    pub slots: Slots,
}

impl PredicateBind {
    /// Reference with every slot unbound.
    pub fn new(predicate: PredicateId) -> Self {
        Self {
            predicate,
            slots: Slots::UNBOUND,
        }
    }

    /// Reference with its leading slots bound to `values`.
    pub fn with_values(predicate: PredicateId, values: &[ValueId]) -> Self {
        Self {
            predicate,
            slots: Slots::from_values(values),
        }
    }

    /// Value bound at `position`.
    pub fn slot(&self, position: usize) -> Option<ValueId> {
        self.slots.get(position)
    }
}

/// An action grounded against a value table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionBind {
    pub action: ActionId,
    pub slots: Slots,
}

impl ActionBind {
    /// Binding with every argument unbound.
    pub fn new(action: ActionId) -> Self {
        Self {
            action,
            slots: Slots::UNBOUND,
        }
    }

    /// Binding with its leading arguments bound to `values`.
    pub fn with_values(action: ActionId, values: &[ValueId]) -> Self {
        Self {
            action,
            slots: Slots::from_values(values),
        }
    }

    /// Value bound to argument `position`.
    pub fn slot(&self, position: usize) -> Option<ValueId> {
        self.slots.get(position)
    }
}

/// A concrete typed constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Value {
    pub type_id: TypeId,
    pub label: String,
}

impl Value {
    /// Create a value of the given type.
    pub fn new(type_id: TypeId, label: impl Into<String>) -> Self {
        Self {
            type_id,
            label: label.into(),
        }
    }
}

/// Append-only table of the values one plan refers to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueTable {
    values: Vec<Value>,
}

impl ValueTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value and return its index.
    pub fn push(&mut self, value: Value) -> Result<ValueId, ValueTableFull> {
        let id = ValueId::from_index(self.values.len()).ok_or(ValueTableFull { capacity: MAX_IDS })?;
        self.values.push(value);
        Ok(id)
    }

    /// Value at `id`.
    pub fn get(&self, id: ValueId) -> Option<&Value> {
        self.values.get(id.index())
    }

    /// Label of the value at `id`.
    pub fn label(&self, id: ValueId) -> Option<&str> {
        self.get(id).map(|value| value.label.as_str())
    }

    /// First value with the given type and label.
    pub fn find(&self, type_id: TypeId, label: &str) -> Option<ValueId> {
        self.values
            .iter()
            .position(|value| value.type_id == type_id && value.label == label)
            .and_then(ValueId::from_index)
    }

    /// Drop every value appended after the first `len`.
    pub fn truncate(&mut self, len: usize) {
        self.values.truncate(len);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }
}

/// A required truth of a predicate over local argument positions.
///
/// Inside an action the positions index the action's arguments; inside a goal
/// they index the goal's value list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub predicate: PredicateId,
    pub slots: Vec<usize>,
    pub state: bool,
}

impl Condition {
    /// Ground through an action binding: condition argument `i` takes the
    /// value bound to action argument `slots[i]`.
    pub fn bind_through(&self, locals: &Slots) -> PredicateBind {
        let mut bind = PredicateBind::new(self.predicate);
        for (position, &local) in self.slots.iter().enumerate() {
            bind.slots.set(position, locals.get(local));
        }
        bind
    }

    /// Ground directly: condition argument `i` is value `slots[i]`.
    pub fn bind_values(&self) -> PredicateBind {
        let mut bind = PredicateBind::new(self.predicate);
        for (position, &local) in self.slots.iter().enumerate() {
            bind.slots.set(position, ValueId::from_index(local));
        }
        bind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object() -> TypeId {
        TypeId::new(0)
    }

    #[test]
    fn test_bind_equality_covers_all_slots() {
        let p = PredicateId::new(3);
        let a = PredicateBind::with_values(p, &[ValueId::new(0), ValueId::new(1)]);
        let b = PredicateBind::with_values(p, &[ValueId::new(0), ValueId::new(1)]);
        let c = PredicateBind::with_values(p, &[ValueId::new(0)]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(c, PredicateBind::new(p));
    }

    #[test]
    fn test_slots_unbound_marker() {
        let mut slots = Slots::UNBOUND;
        assert_eq!(slots.get(0), None);
        slots.set(2, Some(ValueId::new(9)));
        assert_eq!(slots.get(2), Some(ValueId::new(9)));
        assert!(!slots.is_bound(3));
        slots.set(0, Some(ValueId::new(1)));
        slots.set(1, Some(ValueId::new(1)));
        assert!(slots.is_bound(3));
        slots.set(MAX_SLOTS, Some(ValueId::new(4)));
        assert_eq!(slots.get(MAX_SLOTS), None);
    }

    #[test]
    fn test_value_table_capacity() {
        let mut table = ValueTable::new();
        for i in 0..MAX_IDS {
            assert!(table.push(Value::new(object(), format!("v{i}"))).is_ok());
        }
        let err = table.push(Value::new(object(), "overflow")).unwrap_err();
        assert_eq!(err.capacity, MAX_IDS);
        assert_eq!(table.len(), MAX_IDS);
    }

    #[test]
    fn test_value_table_find_and_truncate() {
        let mut table = ValueTable::new();
        let wood = table.push(Value::new(object(), "wood")).unwrap();
        table.push(Value::new(object(), "pile")).unwrap();
        assert_eq!(table.find(object(), "wood"), Some(wood));
        assert_eq!(table.label(wood), Some("wood"));

        table.truncate(1);
        assert_eq!(table.len(), 1);
        assert_eq!(table.find(object(), "pile"), None);
    }

    #[test]
    fn test_condition_binding() {
        let condition = Condition {
            predicate: PredicateId::new(1),
            slots: vec![1, 0],
            state: true,
        };
        let locals = Slots::from_values(&[ValueId::new(5), ValueId::new(6)]);
        let bind = condition.bind_through(&locals);
        assert_eq!(bind.slot(0), Some(ValueId::new(6)));
        assert_eq!(bind.slot(1), Some(ValueId::new(5)));
        assert_eq!(bind.slot(2), None);

        let direct = condition.bind_values();
        assert_eq!(direct.slot(0), Some(ValueId::new(1)));
        assert_eq!(direct.slot(1), Some(ValueId::new(0)));
    }
}
