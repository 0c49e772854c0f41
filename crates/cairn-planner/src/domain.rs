//! Domain schema: types, predicates, actions and goals.
//!
//! The schema is built once and read-only while planning. Registration is
//! checked up front: a call that fails returns the reason and leaves the
//! schema exactly as it was.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use cairn_core::{
    ActionBind, ActionId, Condition, PredicateBind, PredicateId, SchemaError, SchemaResult,
    TypeId, Value, ValueId, ValueTable, MAX_IDS, MAX_SLOTS,
};
use cairn_state::State;
use tracing::debug;

use crate::binder::{Binder, Binding};

/// Predicate evaluator: `(context, values, reference) -> truth`.
///
/// The context is whatever the caller handed to
/// [`crate::RegressionPlanner::plan_in`], or `None`.
pub type Evaluator =
    Box<dyn Fn(Option<&dyn Any>, &ValueTable, &PredicateBind) -> bool + Send + Sync>;

/// A declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type {
    pub name: String,
}

/// A named boolean relation over typed arguments.
pub struct Predicate {
    pub name: String,
    pub types: Vec<TypeId>,
    evaluator: Evaluator,
}

impl Predicate {
    pub fn arity(&self) -> usize {
        self.types.len()
    }

    /// Run the evaluator.
    pub fn evaluate(
        &self,
        context: Option<&dyn Any>,
        values: &ValueTable,
        bind: &PredicateBind,
    ) -> bool {
        (self.evaluator)(context, values, bind)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("name", &self.name)
            .field("types", &self.types)
            .finish_non_exhaustive()
    }
}

/// A parametrized action template.
pub struct Action {
    pub name: String,
    pub cost: f64,
    /// Type of each argument slot.
    pub args: Vec<TypeId>,
    pub preconditions: Vec<Condition>,
    pub effects: Vec<Condition>,
    binder: Option<Binder>,
}

impl Action {
    pub fn arity(&self) -> usize {
        self.args.len()
    }

    /// Custom binder replacing the default slot copying, if any.
    pub fn binder(&self) -> Option<&Binder> {
        self.binder.as_ref()
    }

    /// Record every precondition, grounded through `bind`, at its declared truth.
    pub fn apply_preconditions(&self, bind: &ActionBind, state: &mut State) {
        for precondition in &self.preconditions {
            state.set(precondition.bind_through(&bind.slots), precondition.state);
        }
    }

    /// Record every effect, grounded through `bind`, at its declared truth.
    pub fn apply_effects(&self, bind: &ActionBind, state: &mut State) {
        for effect in &self.effects {
            state.set(effect.bind_through(&bind.slots), effect.state);
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("cost", &self.cost)
            .field("args", &self.args)
            .field("preconditions", &self.preconditions)
            .field("effects", &self.effects)
            .field("binder", &self.binder.is_some())
            .finish()
    }
}

/// Concrete values plus the conditions that must hold over them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Goal {
    pub values: ValueTable,
    pub conditions: Vec<Condition>,
}

/// A named, typed action argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgDesc {
    pub name: String,
    pub type_name: String,
}

impl ArgDesc {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// A condition over argument (or goal value) names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionDesc {
    pub name: String,
    pub args: Vec<String>,
    pub state: bool,
}

impl ConditionDesc {
    pub fn new<I, S>(name: impl Into<String>, args: I, state: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
            state,
        }
    }
}

/// A named goal value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueDesc {
    pub name: String,
    pub type_name: String,
    pub value: String,
}

impl ValueDesc {
    pub fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            value: value.into(),
        }
    }
}

/// Builder describing an action to register.
pub struct ActionDesc {
    name: String,
    cost: f64,
    args: Vec<ArgDesc>,
    preconditions: Vec<ConditionDesc>,
    effects: Vec<ConditionDesc>,
    binder: Option<Binder>,
}

impl ActionDesc {
    /// Start describing an action with the given cost.
    pub fn new(name: impl Into<String>, cost: f64) -> Self {
        Self {
            name: name.into(),
            cost,
            args: Vec::new(),
            preconditions: Vec::new(),
            effects: Vec::new(),
            binder: None,
        }
    }

    /// Declare the next argument.
    pub fn argument(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.args.push(ArgDesc::new(name, type_name));
        self
    }

    /// Add a precondition over argument names.
    pub fn precondition<I, S>(mut self, predicate: impl Into<String>, args: I, state: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preconditions
            .push(ConditionDesc::new(predicate, args, state));
        self
    }

    /// Add an effect over argument names.
    pub fn effect<I, S>(mut self, predicate: impl Into<String>, args: I, state: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.effects.push(ConditionDesc::new(predicate, args, state));
        self
    }

    /// Replace the default binding step with `binder`.
    pub fn binder<F>(mut self, binder: F) -> Self
    where
        F: Fn(&mut Binding<'_>) -> bool + Send + Sync + 'static,
    {
        self.binder = Some(Box::new(binder));
        self
    }
}

/// Registry of types, predicates and actions.
#[derive(Debug, Default)]
pub struct Domain {
    types: Vec<Type>,
    type_map: HashMap<String, TypeId>,
    predicates: Vec<Predicate>,
    predicate_map: HashMap<String, PredicateId>,
    actions: Vec<Action>,
    action_map: HashMap<String, ActionId>,
}

impl Domain {
    /// Create an empty domain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a type.
    pub fn add_type(&mut self, name: &str) -> SchemaResult<TypeId> {
        if self.type_map.contains_key(name) {
            return Err(SchemaError::DuplicateType {
                name: name.to_string(),
            });
        }
        let id = TypeId::from_index(self.types.len()).ok_or(SchemaError::CapacityExceeded {
            kind: "types",
            max: MAX_IDS,
        })?;

        self.type_map.insert(name.to_string(), id);
        self.types.push(Type {
            name: name.to_string(),
        });
        debug!("Registered type {} as {}", name, id);
        Ok(id)
    }

    /// Declare a predicate over the named argument types.
    pub fn add_predicate<F>(&mut self, name: &str, types: &[&str], evaluator: F) -> SchemaResult<PredicateId>
    where
        F: Fn(Option<&dyn Any>, &ValueTable, &PredicateBind) -> bool + Send + Sync + 'static,
    {
        if self.predicate_map.contains_key(name) {
            return Err(SchemaError::DuplicatePredicate {
                name: name.to_string(),
            });
        }
        if types.len() > MAX_SLOTS {
            return Err(SchemaError::TooManyArguments {
                name: name.to_string(),
                count: types.len(),
                max: MAX_SLOTS,
            });
        }
        let id = PredicateId::from_index(self.predicates.len()).ok_or(
            SchemaError::CapacityExceeded {
                kind: "predicates",
                max: MAX_IDS,
            },
        )?;
        let types = types
            .iter()
            .map(|type_name| self.resolve_type(type_name))
            .collect::<SchemaResult<Vec<_>>>()?;

        self.predicate_map.insert(name.to_string(), id);
        self.predicates.push(Predicate {
            name: name.to_string(),
            types,
            evaluator: Box::new(evaluator),
        });
        debug!("Registered predicate {} as {}", name, id);
        Ok(id)
    }

    /// Declare an action.
    pub fn add_action(&mut self, desc: ActionDesc) -> SchemaResult<ActionId> {
        let name = desc.name;
        if self.action_map.contains_key(&name) {
            return Err(SchemaError::DuplicateAction { name });
        }
        if desc.args.len() > MAX_SLOTS {
            return Err(SchemaError::TooManyArguments {
                name,
                count: desc.args.len(),
                max: MAX_SLOTS,
            });
        }
        if !desc.cost.is_finite() || desc.cost < 0.0 {
            return Err(SchemaError::InvalidCost {
                action: name,
                cost: desc.cost,
            });
        }
        let id = ActionId::from_index(self.actions.len()).ok_or(SchemaError::CapacityExceeded {
            kind: "actions",
            max: MAX_IDS,
        })?;

        let mut locals: HashMap<&str, usize> = HashMap::new();
        let mut args = Vec::with_capacity(desc.args.len());
        for arg in &desc.args {
            locals.insert(arg.name.as_str(), args.len());
            args.push(self.resolve_type(&arg.type_name)?);
        }

        let lookup = |argument: &str| {
            locals
                .get(argument)
                .map(|&slot| (slot, args[slot]))
                .ok_or_else(|| SchemaError::UnknownArgument {
                    argument: argument.to_string(),
                    action: name.clone(),
                })
        };
        let preconditions = desc
            .preconditions
            .iter()
            .map(|condition| self.resolve_condition(condition, &lookup))
            .collect::<SchemaResult<Vec<_>>>()?;
        let effects = desc
            .effects
            .iter()
            .map(|condition| self.resolve_condition(condition, &lookup))
            .collect::<SchemaResult<Vec<_>>>()?;

        self.action_map.insert(name.clone(), id);
        debug!("Registered action {} as {}", name, id);
        self.actions.push(Action {
            name,
            cost: desc.cost,
            args,
            preconditions,
            effects,
            binder: desc.binder,
        });
        Ok(id)
    }

    /// Build a goal from named values and conditions over those names.
    pub fn goal(&self, values: &[ValueDesc], conditions: &[ConditionDesc]) -> SchemaResult<Goal> {
        if values.len() > MAX_IDS {
            return Err(SchemaError::CapacityExceeded {
                kind: "values",
                max: MAX_IDS,
            });
        }

        let mut names: HashMap<&str, ValueId> = HashMap::new();
        let mut table = ValueTable::new();
        for desc in values {
            let type_id = self.resolve_type(&desc.type_name)?;
            let id = table
                .push(Value::new(type_id, desc.value.as_str()))
                .map_err(|full| SchemaError::CapacityExceeded {
                    kind: "values",
                    max: full.capacity,
                })?;
            names.insert(desc.name.as_str(), id);
        }

        let lookup = |name: &str| {
            names
                .get(name)
                .and_then(|&id| table.get(id).map(|value| (id.index(), value.type_id)))
                .ok_or_else(|| SchemaError::UnknownGoalValue {
                    name: name.to_string(),
                })
        };
        let conditions = conditions
            .iter()
            .map(|condition| self.resolve_condition(condition, &lookup))
            .collect::<SchemaResult<Vec<_>>>()?;

        Ok(Goal {
            values: table,
            conditions,
        })
    }

    /// Truth of `bind` according to its predicate's evaluator.
    ///
    /// References with an unbound argument, or to a predicate this domain
    /// does not know, are false without consulting any evaluator.
    pub fn evaluate(
        &self,
        context: Option<&dyn Any>,
        values: &ValueTable,
        bind: &PredicateBind,
    ) -> bool {
        match self.predicate(bind.predicate) {
            Some(predicate) if bind.slots.is_bound(predicate.arity()) => {
                predicate.evaluate(context, values, bind)
            }
            _ => false,
        }
    }

    /// Render a grounded action as `name(label, ...)`.
    pub fn describe(&self, bind: &ActionBind, values: &ValueTable) -> String {
        let Some(action) = self.action(bind.action) else {
            return format!("<action {}>", bind.action);
        };
        let args: Vec<&str> = (0..action.arity())
            .map(|slot| {
                bind.slot(slot)
                    .and_then(|value| values.label(value))
                    .unwrap_or("_")
            })
            .collect();
        format!("{}({})", action.name, args.join(", "))
    }

    pub fn types(&self) -> &[Type] {
        &self.types
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Actions paired with their ids, in registration order.
    pub fn actions_with_ids(&self) -> impl Iterator<Item = (ActionId, &Action)> {
        self.actions
            .iter()
            .enumerate()
            .filter_map(|(index, action)| ActionId::from_index(index).map(|id| (id, action)))
    }

    pub fn predicate(&self, id: PredicateId) -> Option<&Predicate> {
        self.predicates.get(id.index())
    }

    pub fn action(&self, id: ActionId) -> Option<&Action> {
        self.actions.get(id.index())
    }

    pub fn type_id(&self, name: &str) -> Option<TypeId> {
        self.type_map.get(name).copied()
    }

    pub fn predicate_id(&self, name: &str) -> Option<PredicateId> {
        self.predicate_map.get(name).copied()
    }

    pub fn action_id(&self, name: &str) -> Option<ActionId> {
        self.action_map.get(name).copied()
    }

    fn resolve_type(&self, name: &str) -> SchemaResult<TypeId> {
        self.type_id(name).ok_or_else(|| SchemaError::UnknownType {
            name: name.to_string(),
        })
    }

    fn type_name(&self, id: TypeId) -> String {
        self.types
            .get(id.index())
            .map_or_else(|| id.to_string(), |ty| ty.name.clone())
    }

    /// Resolve a condition whose argument names `lookup` maps to a local
    /// position and its type.
    fn resolve_condition<L>(&self, desc: &ConditionDesc, lookup: &L) -> SchemaResult<Condition>
    where
        L: Fn(&str) -> SchemaResult<(usize, TypeId)>,
    {
        let predicate_id =
            self.predicate_id(&desc.name)
                .ok_or_else(|| SchemaError::UnknownPredicate {
                    name: desc.name.clone(),
                })?;
        let predicate = &self.predicates[predicate_id.index()];
        if desc.args.len() != predicate.arity() {
            return Err(SchemaError::ArityMismatch {
                predicate: desc.name.clone(),
                expected: predicate.arity(),
                found: desc.args.len(),
            });
        }

        let mut slots = Vec::with_capacity(desc.args.len());
        for (position, (argument, &expected)) in desc.args.iter().zip(&predicate.types).enumerate() {
            let (slot, found) = lookup(argument)?;
            if found != expected {
                return Err(SchemaError::TypeMismatch {
                    predicate: desc.name.clone(),
                    position,
                    expected: self.type_name(expected),
                    found: self.type_name(found),
                });
            }
            slots.push(slot);
        }

        Ok(Condition {
            predicate: predicate_id,
            slots,
            state: desc.state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn never(_: Option<&dyn Any>, _: &ValueTable, _: &PredicateBind) -> bool {
        false
    }

    fn base_domain() -> Domain {
        let mut domain = Domain::new();
        domain.add_type("object").unwrap();
        domain.add_predicate("exists", &["object"], never).unwrap();
        domain.add_predicate("has", &["object"], never).unwrap();
        domain
    }

    #[test]
    fn test_duplicate_type_rejected() {
        let mut domain = Domain::new();
        assert_eq!(domain.add_type("object"), Ok(TypeId::new(0)));
        assert_eq!(
            domain.add_type("object"),
            Err(SchemaError::DuplicateType {
                name: "object".to_string()
            })
        );
        assert_eq!(domain.types().len(), 1);
    }

    #[test]
    fn test_duplicate_predicate_rejected() {
        let mut domain = base_domain();
        let err = domain.add_predicate("exists", &["object"], never).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicatePredicate { .. }));
        assert_eq!(domain.predicates().len(), 2);
    }

    #[test]
    fn test_predicate_with_unknown_type_rejected() {
        let mut domain = base_domain();
        let err = domain.add_predicate("near", &["place"], never).unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownType {
                name: "place".to_string()
            }
        );
        assert!(domain.predicate_id("near").is_none());
    }

    #[test]
    fn test_duplicate_action_rejected() {
        let mut domain = base_domain();
        let pickup = || {
            ActionDesc::new("pickup", 1.0)
                .argument("what", "object")
                .precondition("exists", ["what"], true)
                .effect("has", ["what"], true)
        };
        assert_eq!(domain.add_action(pickup()), Ok(ActionId::new(0)));
        let err = domain.add_action(pickup()).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateAction { .. }));
        assert_eq!(domain.actions().len(), 1);
    }

    #[test]
    fn test_action_with_undeclared_predicate_rejected() {
        let mut domain = base_domain();
        let err = domain
            .add_action(
                ActionDesc::new("place", 1.0)
                    .argument("what", "object")
                    .precondition("carried", ["what"], true)
                    .effect("exists", ["what"], true),
            )
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownPredicate {
                name: "carried".to_string()
            }
        );
        assert!(domain.actions().is_empty());
        assert!(domain.action_id("place").is_none());
    }

    #[test]
    fn test_action_with_unknown_argument_rejected() {
        let mut domain = base_domain();
        let err = domain
            .add_action(
                ActionDesc::new("pickup", 1.0)
                    .argument("what", "object")
                    .effect("has", ["where"], true),
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "Argument where not found in pickup action");
        assert!(domain.actions().is_empty());
    }

    #[test]
    fn test_action_arity_and_type_checks() {
        let mut domain = base_domain();
        domain.add_type("place").unwrap();

        let err = domain
            .add_action(
                ActionDesc::new("pickup", 1.0)
                    .argument("what", "object")
                    .argument("other", "object")
                    .effect("has", ["what", "other"], true),
            )
            .unwrap_err();
        assert!(matches!(err, SchemaError::ArityMismatch { expected: 1, found: 2, .. }));

        let err = domain
            .add_action(
                ActionDesc::new("pickup", 1.0)
                    .argument("where", "place")
                    .effect("has", ["where"], true),
            )
            .unwrap_err();
        assert!(matches!(err, SchemaError::TypeMismatch { position: 0, .. }));
        assert!(domain.actions().is_empty());
    }

    #[test]
    fn test_invalid_cost_rejected() {
        let mut domain = base_domain();
        for cost in [-1.0, f64::NAN, f64::INFINITY] {
            let err = domain.add_action(ActionDesc::new("noop", cost)).unwrap_err();
            assert!(matches!(err, SchemaError::InvalidCost { .. }));
        }
        assert_eq!(domain.add_action(ActionDesc::new("noop", 0.0)), Ok(ActionId::new(0)));
    }

    #[test]
    fn test_arity_cap_boundary() {
        let mut domain = base_domain();
        let seven = ["object"; 7];
        let eight = ["object"; 8];

        assert!(domain.add_predicate("near7", &seven, never).is_ok());
        let err = domain.add_predicate("near8", &eight, never).unwrap_err();
        assert_eq!(
            err,
            SchemaError::TooManyArguments {
                name: "near8".to_string(),
                count: 8,
                max: MAX_SLOTS
            }
        );

        let with_args = |name: &str, count: usize| {
            (0..count).fold(ActionDesc::new(name, 1.0), |desc, i| {
                desc.argument(format!("a{i}"), "object")
            })
        };
        assert!(domain.add_action(with_args("wide7", 7)).is_ok());
        let err = domain.add_action(with_args("wide8", 8)).unwrap_err();
        assert!(matches!(err, SchemaError::TooManyArguments { count: 8, .. }));
        assert_eq!(domain.actions().len(), 1);
    }

    #[test]
    fn test_goal_construction() {
        let domain = base_domain();
        let goal = domain
            .goal(
                &[
                    ValueDesc::new("what", "object", "wood"),
                    ValueDesc::new("where", "object", "pile"),
                ],
                &[ConditionDesc::new("has", ["where"], true)],
            )
            .unwrap();
        assert_eq!(goal.values.len(), 2);
        assert_eq!(goal.conditions[0].slots, vec![1]);
        assert_eq!(goal.conditions[0].bind_values().slot(0), Some(ValueId::new(1)));
    }

    #[test]
    fn test_goal_errors() {
        let domain = base_domain();
        let err = domain
            .goal(&[ValueDesc::new("what", "thing", "wood")], &[])
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownType { .. }));

        let err = domain
            .goal(
                &[ValueDesc::new("what", "object", "wood")],
                &[ConditionDesc::new("inside", ["what"], true)],
            )
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownPredicate { .. }));

        let err = domain
            .goal(
                &[ValueDesc::new("what", "object", "wood")],
                &[ConditionDesc::new("has", ["where"], true)],
            )
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownGoalValue {
                name: "where".to_string()
            }
        );
    }

    #[test]
    fn test_evaluate_skips_unbound_references() {
        let mut domain = Domain::new();
        domain.add_type("object").unwrap();
        let always = domain
            .add_predicate("always", &["object"], |_, _, _| true)
            .unwrap();
        let values = ValueTable::new();

        assert!(!domain.evaluate(None, &values, &PredicateBind::new(always)));
        assert!(domain.evaluate(
            None,
            &values,
            &PredicateBind::with_values(always, &[ValueId::new(0)])
        ));
        assert!(!domain.evaluate(None, &values, &PredicateBind::new(PredicateId::new(9))));
    }

    #[test]
    fn test_describe() {
        let mut domain = base_domain();
        let place = domain
            .add_action(
                ActionDesc::new("place", 1.0)
                    .argument("what", "object")
                    .argument("where", "object"),
            )
            .unwrap();
        let mut values = ValueTable::new();
        let wood = values.push(Value::new(TypeId::new(0), "wood")).unwrap();

        let bind = ActionBind::with_values(place, &[wood]);
        assert_eq!(domain.describe(&bind, &values), "place(wood, _)");
    }
}
