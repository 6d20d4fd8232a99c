use std::collections::BTreeSet;

use serde_json::{json, Value as JsonValue};

use super::json::json_equal;
use super::keywords::TypeSet;
use super::{falsey, is_falsey, is_truthy, marker_name, property_schemas, truthy, Canonicalizer};
use crate::compiler::numeric::is_integral;
use crate::error::SchemaError;
use crate::JsonObject;

const LOWER_BOUNDS: &[&str] = &[
    "minLength",
    "minItems",
    "minProperties",
    "minimum",
    "exclusiveMinimum",
];
const UPPER_BOUNDS: &[&str] = &[
    "maxLength",
    "maxItems",
    "maxProperties",
    "maximum",
    "exclusiveMaximum",
];

/// How many distinct values a canonical schema admits, when that is finite and obvious.
pub(crate) fn upper_bound_instances(schema: &JsonValue) -> Option<usize> {
    if is_falsey(schema) {
        return Some(0);
    }
    let map = schema.as_object()?;
    if map.contains_key("const") {
        return Some(1);
    }
    match map.get("enum") {
        Some(JsonValue::Array(values)) => Some(values.len()),
        _ => None,
    }
}

impl Canonicalizer {
    /// Intersects schemas into one schema accepting exactly the values all of
    /// them accept.
    ///
    /// Returns `Ok(None)` when the intersection cannot be expressed without
    /// combinators; the caller then keeps the schemas as a residual.
    pub(crate) fn merged(&self, schemas: &[JsonValue]) -> Result<Option<JsonValue>, SchemaError> {
        let mut canonical = schemas
            .iter()
            .map(|schema| self.canonicalize(schema))
            .collect::<Result<Vec<_>, _>>()?;
        if canonical.iter().any(is_falsey) {
            return Ok(Some(falsey()));
        }
        canonical.sort_by_key(|schema| upper_bound_instances(schema).unwrap_or(usize::MAX));
        let mut schemas = canonical.into_iter();
        let Some(mut out) = schemas.next() else {
            return Ok(Some(truthy()));
        };
        for next in schemas {
            match self.merge_pair(out, next)? {
                Some(merged) if is_falsey(&merged) => return Ok(Some(merged)),
                Some(merged) => out = merged,
                None => return Ok(None),
            }
        }
        Ok(Some(out))
    }

    fn merge_pair(&self, out: JsonValue, next: JsonValue) -> Result<Option<JsonValue>, SchemaError> {
        if is_truthy(&next) {
            return Ok(Some(out));
        }
        if is_truthy(&out) {
            return Ok(Some(next));
        }
        let (JsonValue::Object(mut out), JsonValue::Object(mut next)) = (out, next) else {
            return Ok(None);
        };
        if marker_name(&out).is_some() || marker_name(&next).is_some() {
            return Ok(None);
        }
        if !(out.contains_key("const") || out.contains_key("enum"))
            && (next.contains_key("const") || next.contains_key("enum"))
        {
            std::mem::swap(&mut out, &mut next);
        }
        if let Some(value) = out.get("const") {
            let valid = self.validators.is_valid(&JsonValue::Object(next), value)?;
            return Ok(Some(if valid { JsonValue::Object(out) } else { falsey() }));
        }
        if let Some(JsonValue::Array(values)) = out.get("enum") {
            let validator = self.validators.get(&JsonValue::Object(next))?;
            let kept: Vec<JsonValue> = values
                .iter()
                .filter(|value| validator.is_valid(value))
                .cloned()
                .collect();
            return self.canonicalize(&json!({ "enum": kept })).map(Some);
        }

        if out.contains_key("type") || next.contains_key("type") {
            let types = TypeSet::from_schema(&out)?.intersect(TypeSet::from_schema(&next)?);
            if types.is_empty() {
                return Ok(Some(falsey()));
            }
            next.remove("type");
            match types.to_value() {
                Some(value) => {
                    out.insert("type".to_string(), value);
                }
                None => {
                    out.remove("type");
                }
            }
        }

        let object_keywords = ["properties", "patternProperties", "additionalProperties"];
        if object_keywords
            .iter()
            .any(|key| out.contains_key(*key) || next.contains_key(*key))
            && !self.merge_object_keywords(&mut out, &mut next)?
        {
            return Ok(None);
        }

        if let Some(JsonValue::Array(names)) = next.remove("required") {
            let mut required: BTreeSet<String> = match out.get("required") {
                Some(JsonValue::Array(existing)) => existing
                    .iter()
                    .filter_map(JsonValue::as_str)
                    .map(str::to_string)
                    .collect(),
                _ => BTreeSet::new(),
            };
            required.extend(names.iter().filter_map(JsonValue::as_str).map(str::to_string));
            out.insert(
                "required".to_string(),
                JsonValue::Array(required.into_iter().map(JsonValue::from).collect()),
            );
        }

        if let Some(JsonValue::Object(dependencies)) = next.remove("dependencies") {
            let mut merged = match out.remove("dependencies") {
                Some(JsonValue::Object(existing)) => existing,
                _ => JsonObject::new(),
            };
            for (name, dependency) in dependencies {
                let combined = match merged.remove(&name) {
                    None => dependency,
                    Some(JsonValue::Array(left)) if dependency.is_array() => {
                        let mut names: BTreeSet<String> = left
                            .iter()
                            .filter_map(JsonValue::as_str)
                            .map(str::to_string)
                            .collect();
                        if let JsonValue::Array(right) = &dependency {
                            names.extend(right.iter().filter_map(JsonValue::as_str).map(str::to_string));
                        }
                        JsonValue::Array(names.into_iter().map(JsonValue::from).collect())
                    }
                    Some(existing) => {
                        let Some(both) = self.merged(&[
                            dependency_as_schema(existing),
                            dependency_as_schema(dependency),
                        ])?
                        else {
                            return Ok(None);
                        };
                        both
                    }
                };
                merged.insert(name, combined);
            }
            out.insert("dependencies".to_string(), JsonValue::Object(merged));
        }

        if let (Some(left), Some(right)) = (out.get("contains"), next.get("contains")) {
            if !json_equal(left, right) {
                if let Some(both) = self.merged(&[left.clone(), right.clone()])? {
                    if json_equal(&both, left) || json_equal(&both, right) {
                        out.insert("contains".to_string(), both);
                        next.remove("contains");
                    }
                }
            }
        }

        if let (Some(left), Some(right)) = (out.get("not"), next.get("not")) {
            if !json_equal(left, right) {
                let either = self.canonicalize(&json!({"anyOf": [left, right]}))?;
                out.insert("not".to_string(), either);
                next.remove("not");
            }
        }

        if let (Some(left @ JsonValue::Object(_)), Some(right @ JsonValue::Object(_))) =
            (out.get("items"), next.get("items"))
        {
            let Some(both) = self.merged(&[left.clone(), right.clone()])? else {
                return Ok(None);
            };
            out.insert("items".to_string(), both);
            next.remove("items");
        }

        for (key, value) in next {
            let combined = match out.get(&key) {
                None => value,
                Some(existing) if json_equal(existing, &value) => continue,
                Some(existing) if LOWER_BOUNDS.contains(&key.as_str()) => {
                    pick_number(existing, &value, |left, right| left >= right)
                }
                Some(existing) if UPPER_BOUNDS.contains(&key.as_str()) => {
                    pick_number(existing, &value, |left, right| left <= right)
                }
                Some(_) if key == "uniqueItems" => JsonValue::Bool(true),
                Some(existing) if key == "multipleOf" => match merge_multiple_of(existing, &value) {
                    Some(step) => step,
                    None => return Ok(None),
                },
                Some(_) => return Ok(None),
            };
            out.insert(key, combined);
        }
        self.canonicalize(&JsonValue::Object(out)).map(Some)
    }

    /// Merges the three object keywords so every property name keeps exactly
    /// the constraints both sides put on it.
    fn merge_object_keywords(
        &self,
        out: &mut JsonObject,
        next: &mut JsonObject,
    ) -> Result<bool, SchemaError> {
        let out_view = ObjectKeywords::take(out);
        let next_view = ObjectKeywords::take(next);

        let names: BTreeSet<&String> = out_view
            .properties
            .keys()
            .chain(next_view.properties.keys())
            .collect();
        let mut properties = JsonObject::new();
        for name in names {
            let mut schemas = property_schemas(&out_view.as_schema(), name);
            schemas.extend(property_schemas(&next_view.as_schema(), name));
            let Some(both) = self.merged(&schemas)? else {
                return Ok(false);
            };
            properties.insert(name.clone(), both);
        }

        let sources: BTreeSet<&String> = out_view
            .patterns
            .keys()
            .chain(next_view.patterns.keys())
            .collect();
        let mut patterns = JsonObject::new();
        for source in sources {
            let left = out_view.patterns.get(source).unwrap_or(&out_view.additional);
            let right = next_view.patterns.get(source).unwrap_or(&next_view.additional);
            let Some(both) = self.merged(&[left.clone(), right.clone()])? else {
                return Ok(false);
            };
            patterns.insert(source.clone(), both);
        }

        let Some(additional) =
            self.merged(&[out_view.additional.clone(), next_view.additional.clone()])?
        else {
            return Ok(false);
        };

        if !properties.is_empty() {
            out.insert("properties".to_string(), JsonValue::Object(properties));
        }
        if !patterns.is_empty() {
            out.insert("patternProperties".to_string(), JsonValue::Object(patterns));
        }
        if !is_truthy(&additional) {
            out.insert("additionalProperties".to_string(), additional);
        }
        Ok(true)
    }
}

struct ObjectKeywords {
    properties: JsonObject,
    patterns: JsonObject,
    additional: JsonValue,
}

impl ObjectKeywords {
    fn take(schema: &mut JsonObject) -> Self {
        let take_map = |schema: &mut JsonObject, key: &str| match schema.remove(key) {
            Some(JsonValue::Object(map)) => map,
            _ => JsonObject::new(),
        };
        Self {
            properties: take_map(schema, "properties"),
            patterns: take_map(schema, "patternProperties"),
            additional: schema
                .remove("additionalProperties")
                .unwrap_or_else(truthy),
        }
    }

    fn as_schema(&self) -> JsonObject {
        let mut schema = JsonObject::new();
        schema.insert(
            "properties".to_string(),
            JsonValue::Object(self.properties.clone()),
        );
        schema.insert(
            "patternProperties".to_string(),
            JsonValue::Object(self.patterns.clone()),
        );
        schema.insert("additionalProperties".to_string(), self.additional.clone());
        schema
    }
}

fn dependency_as_schema(dependency: JsonValue) -> JsonValue {
    match dependency {
        JsonValue::Array(names) => json!({ "required": names }),
        schema => schema,
    }
}

fn pick_number(left: &JsonValue, right: &JsonValue, keep_left: impl Fn(f64, f64) -> bool) -> JsonValue {
    match (left.as_f64(), right.as_f64()) {
        (Some(l), Some(r)) if keep_left(l, r) => left.clone(),
        (Some(_), Some(_)) => right.clone(),
        (None, _) => right.clone(),
        (_, None) => left.clone(),
    }
}

fn merge_multiple_of(left: &JsonValue, right: &JsonValue) -> Option<JsonValue> {
    if let (Some(l), Some(r)) = (left.as_u64(), right.as_u64()) {
        if l == 0 || r == 0 {
            return None;
        }
        let lcm = (l / gcd(l, r)).checked_mul(r)?;
        return Some(JsonValue::from(lcm));
    }
    let (l, r) = (left.as_f64()?, right.as_f64()?);
    if is_integral(l / r) {
        Some(left.clone())
    } else if is_integral(r / l) {
        Some(right.clone())
    } else {
        None
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

#[cfg(test)]
#[path = "../../tests/internal/merge_unit_tests.rs"]
mod tests;
