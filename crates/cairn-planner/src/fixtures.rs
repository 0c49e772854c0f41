//! Crafting domain shared by the planner tests.

use std::any::Any;

use cairn_core::{PredicateBind, Value, ValueTable};

use crate::binder::Binding;
use crate::domain::{ActionDesc, ConditionDesc, Domain, Goal, ValueDesc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Crafting {
    WithGather,
    WithoutGather,
}

fn exists(_: Option<&dyn Any>, values: &ValueTable, bind: &PredicateBind) -> bool {
    matches!(
        bind.slot(0).and_then(|id| values.label(id)),
        Some("tree" | "pile")
    )
}

fn never(_: Option<&dyn Any>, _: &ValueTable, _: &PredicateBind) -> bool {
    false
}

/// Gathering produces a resource from the source it grows on. The source is
/// appended to the value table since the goal never names it, even when an
/// equal value is already there, so every accepted gather grows the table by
/// exactly one. The demo domain in `cairn-bench` reuses existing values
/// instead.
fn gather(binding: &mut Binding<'_>) -> bool {
    let Some(&produced) = binding.matches.first() else {
        return false;
    };
    let Some(resource) = produced.slot(0) else {
        return false;
    };
    let Some(value) = binding.values.get(resource) else {
        return false;
    };
    let type_id = value.type_id;
    let source = match value.label.as_str() {
        "wood" => "tree",
        "stone" => "quarry",
        _ => return false,
    };
    let Ok(source) = binding.values.push(Value::new(type_id, source)) else {
        return false;
    };

    binding.bind.slots.set(0, Some(source));
    binding.bind.slots.set(1, Some(resource));
    binding.state.set(produced, false);
    binding.apply_preconditions();
    true
}

pub(crate) fn crafting_domain(variant: Crafting) -> Domain {
    let mut domain = Domain::new();
    domain.add_type("object").unwrap();

    domain.add_predicate("exists", &["object"], exists).unwrap();
    domain.add_predicate("near", &["object"], never).unwrap();
    domain.add_predicate("has", &["object"], never).unwrap();
    domain
        .add_predicate("inside", &["object", "object"], never)
        .unwrap();

    domain
        .add_action(
            ActionDesc::new("pickup", 1.0)
                .argument("what", "object")
                .precondition("exists", ["what"], true)
                .effect("has", ["what"], true),
        )
        .unwrap();

    if variant == Crafting::WithGather {
        domain
            .add_action(
                ActionDesc::new("gather", 1.0)
                    .argument("source", "object")
                    .argument("resource", "object")
                    .precondition("exists", ["source"], true)
                    .effect("exists", ["resource"], true)
                    .binder(gather),
            )
            .unwrap();
    }

    domain
        .add_action(
            ActionDesc::new("place", 1.0)
                .argument("what", "object")
                .argument("where", "object")
                .precondition("has", ["what"], true)
                .precondition("exists", ["where"], true)
                .effect("inside", ["what", "where"], true),
        )
        .unwrap();

    domain
}

/// `inside(wood, pile)` where the pile exists and the wood does not.
pub(crate) fn wood_goal(domain: &Domain) -> Goal {
    domain
        .goal(
            &[
                ValueDesc::new("what", "object", "wood"),
                ValueDesc::new("where", "object", "pile"),
            ],
            &[ConditionDesc::new("inside", ["what", "where"], true)],
        )
        .unwrap()
}
