//! Plan output of a search.

use serde::{Deserialize, Serialize};

use crate::types::{ActionBind, ValueTable};

/// An ordered sequence of grounded actions together with the value table
/// their slots index into.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Values referenced by the action slots, including any a binder
    /// appended during the search.
    pub values: ValueTable,

    /// Actions in execution order, from the current state to the goal.
    pub actions: Vec<ActionBind>,

    /// Sum of the action costs.
    pub cost: f64,

    /// Number of search nodes expanded to find this plan.
    pub explored: usize,
}

impl Plan {
    /// A plan with no actions, for a goal that already holds.
    pub fn satisfied(values: ValueTable) -> Self {
        Self {
            values,
            ..Self::default()
        }
    }

    /// Number of actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the plan contains no actions.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Serialize the plan as JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ActionId, TypeId, Value, ValueId};

    #[test]
    fn test_satisfied_plan_keeps_values() {
        let mut values = ValueTable::new();
        values.push(Value::new(TypeId::new(0), "pile")).unwrap();

        let plan = Plan::satisfied(values.clone());
        assert!(plan.is_empty());
        assert_eq!(plan.values, values);
        assert_eq!(plan.cost, 0.0);
    }

    #[test]
    fn test_plan_json() {
        let mut values = ValueTable::new();
        let wood = values.push(Value::new(TypeId::new(0), "wood")).unwrap();
        let plan = Plan {
            values,
            actions: vec![ActionBind::with_values(ActionId::new(1), &[wood])],
            cost: 1.0,
            explored: 2,
        };

        let json = plan.to_json().unwrap();
        let back: Plan = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back.actions[0].slot(0), Some(ValueId::new(0)));
        assert_eq!(back.values.label(wood), Some("wood"));
    }
}
