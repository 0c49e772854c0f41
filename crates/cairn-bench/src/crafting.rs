//! Crafting demonstration domain.
//!
//! Objects exist when the world says so (trees and piles do), can be picked
//! up once they exist and placed inside something that exists. Gathering
//! turns a source into the resource that grows on it.

use std::any::Any;

use cairn_core::{PredicateBind, SchemaResult, Value, ValueTable};
use cairn_planner::{ActionDesc, Binding, ConditionDesc, Domain, Goal, ValueDesc};

/// Resource and the source it is gathered from.
const SOURCES: &[(&str, &str)] = &[("wood", "tree"), ("stone", "quarry")];

/// Labels that exist before anything is gathered.
const WORLD: &[&str] = &["tree", "pile"];

fn exists(_: Option<&dyn Any>, values: &ValueTable, bind: &PredicateBind) -> bool {
    bind.slot(0)
        .and_then(|id| values.label(id))
        .is_some_and(|label| WORLD.contains(&label))
}

fn never(_: Option<&dyn Any>, _: &ValueTable, _: &PredicateBind) -> bool {
    false
}

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
    let Some(&(_, source)) = SOURCES.iter().find(|(name, _)| *name == value.label) else {
        return false;
    };

    // Reuse a source the plan already names before minting a new one.
    let source = match binding.values.find(type_id, source) {
        Some(id) => id,
        None => match binding.values.push(Value::new(type_id, source)) {
            Ok(id) => id,
            Err(_) => return false,
        },
    };

    binding.bind.slots.set(0, Some(source));
    binding.bind.slots.set(1, Some(resource));
    binding.state.set(produced, false);
    binding.apply_preconditions();
    true
}

pub fn domain() -> SchemaResult<Domain> {
    let mut domain = Domain::new();
    domain.add_type("object")?;

    domain.add_predicate("exists", &["object"], exists)?;
    domain.add_predicate("near", &["object"], never)?;
    domain.add_predicate("has", &["object"], never)?;
    domain.add_predicate("inside", &["object", "object"], never)?;

    domain.add_action(
        ActionDesc::new("pickup", 1.0)
            .argument("what", "object")
            .precondition("exists", ["what"], true)
            .effect("has", ["what"], true),
    )?;

    domain.add_action(
        ActionDesc::new("gather", 1.0)
            .argument("source", "object")
            .argument("resource", "object")
            .precondition("exists", ["source"], true)
            .effect("exists", ["resource"], true)
            .binder(gather),
    )?;

    domain.add_action(
        ActionDesc::new("place", 1.0)
            .argument("what", "object")
            .argument("where", "object")
            .precondition("has", ["what"], true)
            .precondition("exists", ["where"], true)
            .effect("inside", ["what", "where"], true),
    )?;

    Ok(domain)
}

/// Put wood on the pile.
pub fn goal(domain: &Domain) -> SchemaResult<Goal> {
    domain.goal(
        &[
            ValueDesc::new("what", "object", "wood"),
            ValueDesc::new("where", "object", "pile"),
        ],
        &[ConditionDesc::new("inside", ["what", "where"], true)],
    )
}
