//! Combines per-type strategies into the strategy for a whole canonical
//! schema: `enum`/`const` short-circuits, weighted choice across types,
//! `anyOf`/`oneOf` branches, depth-bounded recursion through definition
//! markers and residual filters for what is left.

use std::sync::Arc;

use nonempty::NonEmpty;
use proptest::prelude::*;
use proptest::strategy::Union;
use serde_json::{json, Value as JsonValue};

use crate::canonical::keywords::{JsonType, TypeSet};
use crate::canonical::{is_falsey, is_truthy, marker_name, DEFINITIONS_PREFIX};
use crate::compiler::{Compiler, ValueStrategy};
use crate::error::{ReferenceErrorKind, SchemaError};
use crate::filter::Check;
use crate::JsonObject;

/// Relative draw weight of each type in a multi-type schema. Cheap scalar
/// types get less weight so they do not crowd out structured values.
fn type_weight(ty: JsonType) -> u32 {
    match ty {
        JsonType::Null | JsonType::Boolean => 1,
        JsonType::Integer | JsonType::Number => 2,
        JsonType::String | JsonType::Array | JsonType::Object => 3,
    }
}

pub(crate) fn weighted_union(branches: Vec<(u32, ValueStrategy)>) -> Option<ValueStrategy> {
    let branches = NonEmpty::from_vec(branches)?;
    if branches.tail.is_empty() {
        return Some(branches.head.1);
    }
    Some(Union::new_weighted(branches.into_iter().collect()).boxed())
}

impl Compiler {
    /// The strategy for a canonical schema, or `None` when nothing can be generated.
    pub(crate) fn assemble(
        &self,
        schema: &JsonValue,
        depth: usize,
    ) -> Result<Option<ValueStrategy>, SchemaError> {
        if is_falsey(schema) {
            return Ok(None);
        }
        if is_truthy(schema) {
            return Ok(Some(self.anything()));
        }
        let JsonValue::Object(map) = schema else {
            return Err(SchemaError::invalid(format!(
                "schema must be an object or boolean, got {schema}"
            )));
        };
        if let Some(name) = marker_name(map) {
            return self.assemble_reference(name, depth);
        }
        if let Some(expanded) = self.expand_recursive_members(map, depth)? {
            return self.assemble(&expanded, depth + 1);
        }

        let mut structural = map.clone();
        let negated = structural.remove("not");
        let all_of = take_list(&mut structural, "allOf");
        let any_of = take_list(&mut structural, "anyOf");
        let one_of = take_list(&mut structural, "oneOf");

        let mut checks: Vec<(&str, Check)> = Vec::new();
        let base = match (any_of, one_of) {
            (Some(branches), one_of) => {
                if let Some(exclusive) = one_of {
                    checks.push(("oneOf", self.validator_check(&json!({ "oneOf": exclusive }))?));
                }
                self.branch_union(&structural, &branches, depth)?
            }
            (None, Some(branches)) => {
                checks.push((
                    "oneOf exclusivity",
                    self.validator_check(&json!({ "oneOf": branches }))?,
                ));
                self.branch_union(&structural, &branches, depth)?
            }
            (None, None) => self.structural_strategy(&structural, depth)?,
        };
        let Some(base) = base else {
            return Ok(None);
        };

        for member in all_of.unwrap_or_default() {
            checks.push(("allOf", self.validator_check(&member)?));
        }
        if let Some(negated) = negated {
            let validator = self.validators().get(&negated)?;
            checks.push(("not", Arc::new(move |value: &JsonValue| !validator.is_valid(value))));
        }
        if checks.is_empty() {
            return Ok(Some(base));
        }
        let label = checks
            .iter()
            .map(|(label, _)| *label)
            .collect::<Vec<_>>()
            .join(", ");
        let checks: Vec<Check> = checks.into_iter().map(|(_, check)| check).collect();
        let check: Check = Arc::new(move |value: &JsonValue| checks.iter().all(|check| check(value)));
        Ok(Some(self.filtered(label, base, check)))
    }

    /// Expands a definition marker, one level deeper than the caller.
    fn assemble_reference(
        &self,
        name: &str,
        depth: usize,
    ) -> Result<Option<ValueStrategy>, SchemaError> {
        if depth >= self.config.max_recursion_depth {
            if self.open_cuts {
                return Ok(Some(self.anything()));
            }
            let mut cut = self.recursion_cut.borrow_mut();
            if cut.is_none() {
                log::debug!("recursion through '{name}' cut off at depth {depth}");
                *cut = Some(format!("{DEFINITIONS_PREFIX}{name}"));
            }
            return Ok(None);
        }
        let key = (name.to_string(), depth);
        let cached = self.references.borrow().get(&key).cloned();
        if let Some(found) = cached {
            return Ok(found);
        }
        let Some(target) = self.definitions.get(name).cloned() else {
            return Err(SchemaError::unresolvable(
                format!("{DEFINITIONS_PREFIX}{name}"),
                ReferenceErrorKind::MissingTarget,
            ));
        };
        let strategy = self.assemble(&target, depth + 1)?;
        self.references.borrow_mut().insert(key, strategy.clone());
        Ok(strategy)
    }

    /// Merges recursive `allOf` members into the schema so their structure
    /// drives generation instead of a filter.
    fn expand_recursive_members(
        &self,
        schema: &JsonObject,
        depth: usize,
    ) -> Result<Option<JsonValue>, SchemaError> {
        let Some(JsonValue::Array(members)) = schema.get("allOf") else {
            return Ok(None);
        };
        if depth >= self.config.max_recursion_depth {
            return Ok(None);
        }
        let (markers, rest): (Vec<&JsonValue>, Vec<&JsonValue>) = members.iter().partition(|member| {
            member
                .as_object()
                .is_some_and(|member| marker_name(member).is_some())
        });
        if markers.is_empty() {
            return Ok(None);
        }
        let mut remainder = schema.clone();
        if rest.is_empty() {
            remainder.remove("allOf");
        } else {
            remainder.insert(
                "allOf".to_string(),
                JsonValue::Array(rest.into_iter().cloned().collect()),
            );
        }
        let mut parts = vec![JsonValue::Object(remainder)];
        for marker in markers {
            let Some(name) = marker.as_object().and_then(marker_name) else {
                continue;
            };
            let Some(target) = self.definitions.get(name) else {
                return Err(SchemaError::unresolvable(
                    format!("{DEFINITIONS_PREFIX}{name}"),
                    ReferenceErrorKind::MissingTarget,
                ));
            };
            parts.push(target.clone());
        }
        self.canonicalizer.merged(&parts)
    }

    /// `enum`/`const` values, or a weighted choice over the admitted types.
    fn structural_strategy(
        &self,
        schema: &JsonObject,
        depth: usize,
    ) -> Result<Option<ValueStrategy>, SchemaError> {
        if let Some(value) = schema.get("const") {
            return Ok(Some(Just(value.clone()).boxed()));
        }
        if let Some(values) = schema.get("enum") {
            return Ok(match values {
                JsonValue::Array(values) if !values.is_empty() => {
                    Some(proptest::sample::select(values.clone()).boxed())
                }
                _ => None,
            });
        }
        let types = TypeSet::from_schema(schema)?;
        let mut branches = Vec::with_capacity(types.len());
        for ty in types.iter() {
            if let Some(strategy) = self.compile_type(ty, schema, depth)? {
                branches.push((type_weight(ty), strategy));
            }
        }
        Ok(weighted_union(branches))
    }

    /// One strategy per branch, each intersected with the shared keywords.
    fn branch_union(
        &self,
        shared: &JsonObject,
        branches: &[JsonValue],
        depth: usize,
    ) -> Result<Option<ValueStrategy>, SchemaError> {
        let shared_schema = JsonValue::Object(shared.clone());
        let mut strategies = Vec::with_capacity(branches.len());
        for branch in branches {
            let strategy = match self
                .canonicalizer
                .merged(&[shared_schema.clone(), branch.clone()])?
            {
                Some(both) => self.assemble(&both, depth)?,
                None => match self.assemble(branch, depth)? {
                    Some(values) if shared.is_empty() => Some(values),
                    Some(values) => Some(self.filtered(
                        "branch with shared keywords",
                        values,
                        self.validator_check(&shared_schema)?,
                    )),
                    None => None,
                },
            };
            if let Some(strategy) = strategy {
                strategies.push((1, strategy));
            }
        }
        Ok(weighted_union(strategies))
    }
}

fn take_list(schema: &mut JsonObject, key: &str) -> Option<Vec<JsonValue>> {
    match schema.remove(key) {
        Some(JsonValue::Array(items)) => Some(items),
        _ => None,
    }
}

#[cfg(test)]
#[path = "../tests/internal/assembler_unit_tests.rs"]
mod tests;
