use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use jsonschema::Validator;
use proptest::prelude::*;
use serde_json::{json, Value as JsonValue};

use super::{Compiler, ValueStrategy};
use crate::canonical::{is_falsey, is_truthy, property_schemas};
use crate::error::SchemaError;
use crate::filter::Check;
use crate::pattern::{self, CompiledPattern};
use crate::JsonObject;

type Entry = (String, bool, JsonValue);
type ExtraStrategy = BoxedStrategy<Option<(String, JsonValue)>>;

/// Decides whether a generated key and value may be added beyond the named
/// properties.
struct ExtraKeys {
    named: BTreeSet<String>,
    patterns: Vec<(Arc<CompiledPattern>, Arc<Validator>)>,
    additional: Option<Arc<Validator>>,
    names: Option<Arc<Validator>>,
}

impl ExtraKeys {
    fn accepts(&self, key: &str, value: &JsonValue) -> bool {
        if self.named.contains(key) {
            return false;
        }
        if let Some(names) = &self.names {
            if !names.is_valid(&JsonValue::from(key)) {
                return false;
            }
        }
        let mut matched = false;
        for (pattern, validator) in &self.patterns {
            if pattern.is_match(key) {
                matched = true;
                if !validator.is_valid(value) {
                    return false;
                }
            }
        }
        matched
            || self
                .additional
                .as_ref()
                .is_some_and(|additional| additional.is_valid(value))
    }
}

impl Compiler {
    pub(super) fn object_strategy(
        &self,
        schema: &JsonObject,
        depth: usize,
    ) -> Result<Option<ValueStrategy>, SchemaError> {
        let min = schema
            .get("minProperties")
            .and_then(JsonValue::as_u64)
            .unwrap_or(0) as usize;
        let declared_max = schema
            .get("maxProperties")
            .and_then(JsonValue::as_u64)
            .map(|max| max as usize);
        if declared_max == Some(0) {
            return Ok((min == 0).then(|| Just(JsonValue::Object(JsonObject::new())).boxed()));
        }

        let required: BTreeSet<String> = string_list(schema.get("required"));
        let mut list_dependencies: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut schema_dependencies = JsonObject::new();
        if let Some(JsonValue::Object(dependencies)) = schema.get("dependencies") {
            for (name, dependency) in dependencies {
                match dependency {
                    JsonValue::Array(_) => {
                        list_dependencies
                            .insert(name.clone(), string_list(Some(dependency)).into_iter().collect());
                    }
                    other => {
                        schema_dependencies.insert(name.clone(), other.clone());
                    }
                }
            }
        }

        let names = match schema.get("propertyNames") {
            Some(names) if !is_truthy(names) => Some(self.validators().get(names)?),
            _ => None,
        };
        let name_allowed = |name: &str| {
            names
                .as_ref()
                .map_or(true, |names| names.is_valid(&JsonValue::from(name)))
        };

        let mut named: BTreeSet<String> = schema
            .get("properties")
            .and_then(JsonValue::as_object)
            .map(|properties| properties.keys().cloned().collect())
            .unwrap_or_default();
        named.extend(required.iter().cloned());
        for (name, targets) in &list_dependencies {
            named.insert(name.clone());
            named.extend(targets.iter().cloned());
        }

        let mut entries: Vec<(String, bool, ValueStrategy)> = Vec::with_capacity(named.len());
        for name in &named {
            let value = if name_allowed(name) {
                self.property_value_strategy(schema, name, depth)?
            } else {
                None
            };
            let is_required = required.contains(name);
            match value {
                Some(strategy) => entries.push((name.clone(), is_required, strategy)),
                None if is_required => return Ok(None),
                None => {}
            }
        }
        let required_count = required.len();
        if declared_max.is_some_and(|max| required_count > max) {
            return Ok(None);
        }
        let max_total = declared_max.unwrap_or(usize::MAX).min(
            required_count
                .max(min)
                .saturating_add(self.config.max_collection_size),
        );

        let extras = self.extra_entries(schema, &named, names.clone(), depth)?;
        if extras.is_none() && min > entries.len() {
            return Ok(None);
        }

        let mut strategy: BoxedStrategy<Vec<Entry>> = Just(Vec::new()).boxed();
        for (name, is_required, value_strategy) in entries {
            let include = if is_required {
                Just(true).boxed()
            } else {
                any::<bool>().boxed()
            };
            strategy = strategy
                .prop_flat_map(move |entries| {
                    let name = name.clone();
                    (include.clone(), value_strategy.clone()).prop_map(move |(include, value)| {
                        let mut next = entries.clone();
                        next.push((name.clone(), include, value));
                        next
                    })
                })
                .boxed();
        }

        let extra_room = max_total.saturating_sub(required_count);
        let extras: BoxedStrategy<Vec<Option<(String, JsonValue)>>> = match extras {
            Some(extras) if extra_room > 0 => {
                let wanted = min.saturating_sub(named.len()).min(extra_room);
                proptest::collection::vec(extras, wanted..=extra_room).boxed()
            }
            _ => Just(Vec::new()).boxed(),
        };

        let objects = (strategy, extras)
            .prop_map(move |(entries, extras)| {
                JsonValue::Object(build_object(
                    entries,
                    extras,
                    &required,
                    &list_dependencies,
                    max_total,
                ))
            })
            .boxed();

        let mut checks: Vec<Check> = Vec::new();
        if min > required_count {
            checks.push(Arc::new(move |value: &JsonValue| {
                value.as_object().is_some_and(|map| map.len() >= min)
            }));
        }
        if !schema_dependencies.is_empty() {
            checks.push(self.validator_check(&json!({ "dependencies": schema_dependencies }))?);
        }
        if checks.is_empty() {
            return Ok(Some(objects));
        }
        let check: Check = Arc::new(move |value: &JsonValue| checks.iter().all(|check| check(value)));
        Ok(Some(self.filtered("object size and dependencies", objects, check)))
    }

    /// Values for `name`, satisfying every subschema that applies to it.
    fn property_value_strategy(
        &self,
        schema: &JsonObject,
        name: &str,
        depth: usize,
    ) -> Result<Option<ValueStrategy>, SchemaError> {
        let schemas = property_schemas(schema, name);
        if let Some(both) = self.canonicalizer.merged(&schemas)? {
            return self.assemble(&both, depth);
        }
        let (first, rest) = match schemas.split_first() {
            Some(split) => split,
            None => return self.assemble(&JsonValue::Bool(true), depth),
        };
        let Some(values) = self.assemble(first, depth)? else {
            return Ok(None);
        };
        let check = self.validator_check(&json!({ "allOf": rest }))?;
        Ok(Some(self.filtered(
            format!("property '{name}'"),
            values,
            check,
        )))
    }

    /// Keys beyond the named properties, drawn from `patternProperties` and
    /// from `additionalProperties`. `None` when no extra key can ever appear.
    fn extra_entries(
        &self,
        schema: &JsonObject,
        named: &BTreeSet<String>,
        names: Option<Arc<Validator>>,
        depth: usize,
    ) -> Result<Option<ExtraStrategy>, SchemaError> {
        let additional_schema = schema
            .get("additionalProperties")
            .cloned()
            .unwrap_or(JsonValue::Bool(true));
        let patterns = schema
            .get("patternProperties")
            .and_then(JsonValue::as_object)
            .cloned()
            .unwrap_or_default();

        let mut validators = Vec::with_capacity(patterns.len());
        for (source, pattern_schema) in &patterns {
            validators.push((
                pattern::compiled(source),
                self.validators().get(pattern_schema)?,
            ));
        }
        let additional = if is_falsey(&additional_schema) {
            None
        } else {
            Some(self.validators().get(&additional_schema)?)
        };
        let keys = Arc::new(ExtraKeys {
            named: named.clone(),
            patterns: validators,
            additional,
            names,
        });

        let mut sources: Vec<ExtraStrategy> = Vec::new();
        for (source, pattern_schema) in &patterns {
            let Some(key_strategy) = pattern::compiled(source).strategy() else {
                log::debug!("patternProperties key {source:?} cannot be generated from");
                continue;
            };
            let Some(values) = self.assemble(pattern_schema, depth)? else {
                continue;
            };
            sources.push(checked_pairs(key_strategy, values, keys.clone()));
        }
        if !is_falsey(&additional_schema) {
            if let Some(values) = self.assemble(&additional_schema, depth)? {
                let key_strategy = self.key_strategy(schema.get("propertyNames"), depth)?;
                sources.push(checked_pairs(key_strategy, values, keys));
            }
        }
        if sources.is_empty() {
            return Ok(None);
        }
        Ok(Some(proptest::strategy::Union::new(sources).boxed()))
    }

    /// Candidate keys for `additionalProperties`.
    fn key_strategy(
        &self,
        property_names: Option<&JsonValue>,
        depth: usize,
    ) -> Result<BoxedStrategy<String>, SchemaError> {
        let identifiers = || "[a-z_][a-zA-Z0-9_]{0,7}".boxed();
        let Some(property_names) = property_names.filter(|names| !is_truthy(names)) else {
            return Ok(identifiers());
        };
        let strings = self
            .canonicalizer
            .merged(&[property_names.clone(), json!({"type": "string"})])?;
        let Some(strings) = strings else {
            return Ok(identifiers());
        };
        Ok(match self.assemble(&strings, depth)? {
            Some(names) => names
                .prop_filter_map("property names are strings", |name| {
                    name.as_str().map(str::to_string)
                })
                .boxed(),
            None => identifiers(),
        })
    }
}

fn checked_pairs(
    keys: BoxedStrategy<String>,
    values: ValueStrategy,
    check: Arc<ExtraKeys>,
) -> ExtraStrategy {
    (keys, values)
        .prop_map(move |(key, value)| check.accepts(&key, &value).then_some((key, value)))
        .boxed()
}

/// Includes every required property, then the chosen optional ones with
/// their list dependencies, then the extra keys, without letting optional
/// keys push the object past `max_total`.
fn build_object(
    entries: Vec<Entry>,
    extras: Vec<Option<(String, JsonValue)>>,
    required: &BTreeSet<String>,
    list_dependencies: &BTreeMap<String, Vec<String>>,
    max_total: usize,
) -> JsonObject {
    let values: BTreeMap<&str, &JsonValue> = entries
        .iter()
        .map(|(name, _, value)| (name.as_str(), value))
        .collect();
    let mut object = JsonObject::new();
    for name in required {
        let closure = dependency_closure(name, list_dependencies, &values)
            .unwrap_or_else(|| BTreeSet::from([name.as_str()]));
        insert_all(&mut object, closure, &values);
    }
    let optional = entries
        .iter()
        .filter(|(name, include, _)| *include && !required.contains(name));
    for (name, _, _) in optional {
        let Some(closure) = dependency_closure(name, list_dependencies, &values) else {
            continue;
        };
        let missing = closure
            .iter()
            .filter(|name| !object.contains_key(**name))
            .count();
        if object.len() + missing > max_total {
            continue;
        }
        insert_all(&mut object, closure, &values);
    }
    for (key, value) in extras.into_iter().flatten() {
        if object.len() >= max_total {
            break;
        }
        object.entry(key).or_insert(value);
    }
    object
}

fn insert_all(object: &mut JsonObject, names: BTreeSet<&str>, values: &BTreeMap<&str, &JsonValue>) {
    for name in names {
        if let Some(value) = values.get(name) {
            object
                .entry(name.to_string())
                .or_insert_with(|| (*value).clone());
        }
    }
}

/// `name` and every property it transitively depends on, or `None` when
/// one of them has no value to include.
fn dependency_closure<'a>(
    name: &'a str,
    list_dependencies: &'a BTreeMap<String, Vec<String>>,
    values: &BTreeMap<&str, &JsonValue>,
) -> Option<BTreeSet<&'a str>> {
    let mut closure = BTreeSet::new();
    let mut pending = vec![name];
    while let Some(next) = pending.pop() {
        if !values.contains_key(next) {
            return None;
        }
        if closure.insert(next) {
            if let Some(targets) = list_dependencies.get(next) {
                pending.extend(targets.iter().map(String::as_str));
            }
        }
    }
    Some(closure)
}

fn string_list(value: Option<&JsonValue>) -> BTreeSet<String> {
    match value {
        Some(JsonValue::Array(items)) => items
            .iter()
            .filter_map(JsonValue::as_str)
            .map(str::to_string)
            .collect(),
        _ => BTreeSet::new(),
    }
}
