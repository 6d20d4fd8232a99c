//! Rewrites schemas into a canonical Draft 7 form.
//!
//! The canonical form is a fixpoint: canonicalizing it again returns it
//! unchanged. Unsatisfiable schemas become [`falsey`], schemas that accept
//! everything become [`truthy`], and as many combinators as possible are
//! merged away into plain per-type keywords so the compiler can construct
//! values directly instead of filtering.

pub mod cache;
pub mod json;
pub mod keywords;
mod merge;

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value as JsonValue};

use crate::compiler::numeric::{has_multiple_in, is_integral, NumericBounds};
use crate::error::SchemaError;
use crate::pattern;
use crate::validation::ValidatorCache;
use crate::JsonObject;
use cache::SharedCache;
use json::{canonical_encoding, json_number, normalize_numbers, sorted, sorted_unique};
use keywords::{
    is_constraint_keyword, JsonType, TypeSet, SCHEMA_KEYWORDS, SCHEMA_LIST_KEYWORDS,
    SCHEMA_MAP_KEYWORDS,
};

pub(crate) use merge::upper_bound_instances;

/// The schema every value satisfies.
pub fn truthy() -> JsonValue {
    JsonValue::Object(JsonObject::new())
}

/// The schema no value satisfies.
pub fn falsey() -> JsonValue {
    json!({"not": {}})
}

pub fn is_truthy(schema: &JsonValue) -> bool {
    match schema {
        JsonValue::Bool(flag) => *flag,
        JsonValue::Object(map) => map.is_empty(),
        _ => false,
    }
}

pub fn is_falsey(schema: &JsonValue) -> bool {
    match schema {
        JsonValue::Bool(flag) => !*flag,
        JsonValue::Object(map) => map.len() == 1 && map.get("not").is_some_and(is_truthy),
        _ => false,
    }
}

pub(crate) const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// The definition name of a recursion marker, `{"$ref": "#/definitions/<name>"}`.
pub(crate) fn marker_name(schema: &JsonObject) -> Option<&str> {
    if schema.len() != 1 {
        return None;
    }
    schema
        .get("$ref")
        .and_then(JsonValue::as_str)
        .and_then(|reference| reference.strip_prefix(DEFINITIONS_PREFIX))
}

/// A canonical schema and the definitions its recursion markers refer to.
#[derive(Clone, Debug, PartialEq)]
pub struct CanonicalSchema {
    pub root: JsonValue,
    pub definitions: JsonObject,
}

impl CanonicalSchema {
    /// A self-contained Draft 7 document.
    pub fn to_document(&self) -> JsonValue {
        if self.definitions.is_empty() {
            return self.root.clone();
        }
        let mut document = match &self.root {
            JsonValue::Object(map) => map.clone(),
            _ => JsonObject::new(),
        };
        document.insert(
            "definitions".to_string(),
            JsonValue::Object(self.definitions.clone()),
        );
        JsonValue::Object(document)
    }

    pub fn is_unsatisfiable(&self) -> bool {
        is_falsey(&self.root)
    }
}

pub(crate) struct Canonicalizer {
    validators: Arc<ValidatorCache>,
    memo: Mutex<HashMap<String, JsonValue>>,
    shared: bool,
}

impl Canonicalizer {
    pub(crate) fn new(validators: Arc<ValidatorCache>) -> Self {
        let shared = validators.definitions().is_empty();
        Self {
            validators,
            memo: Mutex::new(HashMap::new()),
            shared,
        }
    }

    pub(crate) fn validators(&self) -> &Arc<ValidatorCache> {
        &self.validators
    }

    pub(crate) fn canonicalize(&self, schema: &JsonValue) -> Result<JsonValue, SchemaError> {
        let normalized = match schema {
            JsonValue::Bool(true) => return Ok(truthy()),
            JsonValue::Bool(false) => return Ok(falsey()),
            JsonValue::Object(_) => normalize_numbers(schema),
            other => {
                return Err(SchemaError::invalid(format!(
                    "schema must be an object or boolean, got {other}"
                )))
            }
        };
        let key = canonical_encoding(&normalized);
        if let Some(hit) = self.lookup(&key) {
            return Ok(hit);
        }
        let JsonValue::Object(map) = normalized else {
            return Ok(truthy());
        };
        let result = self.canonicalize_object(map)?;
        self.store(key, result.clone());
        Ok(result)
    }

    fn lookup(&self, key: &str) -> Option<JsonValue> {
        if self.shared {
            if let Some(hit) = SharedCache::get(key) {
                log::trace!("canonical cache hit");
                return Some(hit);
            }
        }
        let memo = self.memo.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        memo.get(key).cloned()
    }

    fn store(&self, key: String, value: JsonValue) {
        if self.shared {
            SharedCache::insert(key, value);
        } else {
            let mut memo = self.memo.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            memo.insert(key, value);
        }
    }

    fn canonicalize_object(&self, mut schema: JsonObject) -> Result<JsonValue, SchemaError> {
        schema.retain(|key, _| is_constraint_keyword(key));
        if marker_name(&schema).is_some() {
            return Ok(JsonValue::Object(schema));
        }
        if let Some(reference) = schema.remove("$ref") {
            let is_marker = reference
                .as_str()
                .is_some_and(|reference| reference.starts_with(DEFINITIONS_PREFIX));
            if !is_marker {
                return Err(SchemaError::invalid(format!(
                    "unresolved reference {reference}"
                )));
            }
            append_all_of(&mut schema, json!({ "$ref": reference }));
        }
        self.canonicalize_subschemas(&mut schema)?;

        if let Some(condition) = schema.remove("if") {
            return self.rewrite_conditional(schema, condition);
        }
        schema.remove("then");
        schema.remove("else");

        if let Some(value) = schema.get("const").cloned() {
            let valid = self
                .validators
                .is_valid(&JsonValue::Object(schema), &value)?;
            return Ok(if valid {
                json!({ "const": value })
            } else {
                falsey()
            });
        }
        if let Some(values) = schema.get("enum") {
            let JsonValue::Array(values) = values else {
                return Err(SchemaError::invalid(format!(
                    "enum must be an array, got {values}"
                )));
            };
            let values = values.clone();
            let validator = self.validators.get(&JsonValue::Object(schema))?;
            let kept = sorted_unique(
                values
                    .into_iter()
                    .filter(|value| validator.is_valid(value))
                    .collect(),
            );
            return Ok(match kept.len() {
                0 => falsey(),
                1 => json!({ "const": kept[0] }),
                _ => json!({ "enum": kept }),
            });
        }

        let mut types = TypeSet::from_schema(&schema)?;
        if self.narrow_not(&mut schema, &mut types)? {
            return Ok(falsey());
        }
        if let Some(single) = self.narrow_numbers(&mut schema, &mut types) {
            return Ok(single);
        }
        narrow_strings(&schema, &mut types);
        self.narrow_arrays(&mut schema, &mut types)?;
        self.narrow_objects(&mut schema, &mut types)?;
        drop_absent_type_keywords(&mut schema, types);

        if types.is_empty() {
            return Ok(falsey());
        }
        match types.to_value() {
            Some(value) => {
                schema.insert("type".to_string(), value);
            }
            None => {
                schema.remove("type");
            }
        }
        let scalars = TypeSet::of(&[JsonType::Null, JsonType::Boolean]);
        if types.intersect(scalars) == types {
            let mut values = Vec::new();
            if types.contains(JsonType::Null) {
                values.push(JsonValue::Null);
            }
            if types.contains(JsonType::Boolean) {
                values.extend([JsonValue::Bool(false), JsonValue::Bool(true)]);
            }
            let mut collapsed: JsonObject = schema
                .into_iter()
                .filter(|(key, _)| SCHEMA_LIST_KEYWORDS.contains(&key.as_str()) || key == "not")
                .collect();
            collapsed.insert("enum".to_string(), JsonValue::Array(values));
            return self.canonicalize_object(collapsed);
        }

        if let Some(all_of) = schema.remove("allOf") {
            if let Some(done) = self.combine_all_of(&mut schema, all_of)? {
                return Ok(done);
            }
        }
        if let Some(any_of) = schema.remove("anyOf") {
            if let Some(done) = self.combine_any_of(&mut schema, types, any_of)? {
                return Ok(done);
            }
        }
        if let Some(one_of) = schema.remove("oneOf") {
            if let Some(done) = self.combine_one_of(&mut schema, one_of)? {
                return Ok(done);
            }
        }

        schema.retain(|key, value| !is_no_op(key, value));
        Ok(JsonValue::Object(schema))
    }

    fn canonicalize_subschemas(&self, schema: &mut JsonObject) -> Result<(), SchemaError> {
        for key in SCHEMA_KEYWORDS {
            let Some(value) = schema.get_mut(*key) else {
                continue;
            };
            let canonical = match &*value {
                JsonValue::Array(items) if *key == "items" => JsonValue::Array(
                    items
                        .iter()
                        .map(|item| self.canonicalize(item))
                        .collect::<Result<_, _>>()?,
                ),
                other => self.canonicalize(other)?,
            };
            *value = canonical;
        }
        for key in SCHEMA_LIST_KEYWORDS {
            match schema.get_mut(*key) {
                Some(JsonValue::Array(items)) => {
                    for item in items.iter_mut() {
                        *item = self.canonicalize(item)?;
                    }
                }
                Some(other) => {
                    return Err(SchemaError::invalid(format!(
                        "{key} must be an array, got {other}"
                    )))
                }
                None => {}
            }
        }
        for key in SCHEMA_MAP_KEYWORDS {
            match schema.get_mut(*key) {
                Some(JsonValue::Object(entries)) => {
                    for value in entries.values_mut() {
                        if *key == "dependencies" && value.is_array() {
                            continue;
                        }
                        *value = self.canonicalize(value)?;
                    }
                }
                Some(other) => {
                    return Err(SchemaError::invalid(format!(
                        "{key} must be an object, got {other}"
                    )))
                }
                None => {}
            }
        }
        Ok(())
    }

    /// `if`/`then`/`else` as `anyOf[allOf[if, then], allOf[not if, else]]`.
    fn rewrite_conditional(
        &self,
        mut schema: JsonObject,
        condition: JsonValue,
    ) -> Result<JsonValue, SchemaError> {
        let then_branch = schema.remove("then").unwrap_or_else(truthy);
        let else_branch = schema.remove("else").unwrap_or_else(truthy);
        let branch = if then_branch == else_branch || is_truthy(&condition) {
            then_branch
        } else if is_falsey(&condition) {
            else_branch
        } else {
            json!({"anyOf": [
                {"allOf": [condition, then_branch]},
                {"allOf": [{"not": condition}, else_branch]},
            ]})
        };
        append_all_of(&mut schema, branch);
        self.canonicalize(&JsonValue::Object(schema))
    }

    /// Applies a `not` whose operand only constrains types in closed form.
    ///
    /// Returns true when the schema contradicts itself.
    fn narrow_not(&self, schema: &mut JsonObject, types: &mut TypeSet) -> Result<bool, SchemaError> {
        let Some(mut negated) = schema.remove("not") else {
            return Ok(false);
        };
        if is_truthy(&negated) || negated == JsonValue::Object(schema.clone()) {
            return Ok(true);
        }
        if let JsonValue::Object(inner) = &negated {
            let type_only = inner.keys().all(|key| {
                key == "type"
                    || JsonType::ALL
                        .iter()
                        .any(|ty| ty.keywords().contains(&key.as_str()))
            });
            if type_only {
                let mut negated_types = TypeSet::from_schema(inner)?;
                for ty in types.intersect(negated_types).iter() {
                    if ty == JsonType::Integer && types.contains(JsonType::Number) {
                        continue;
                    }
                    let constrained = ty.keywords().iter().any(|key| inner.contains_key(*key));
                    if !constrained {
                        types.remove(ty);
                        if !matches!(ty, JsonType::Integer | JsonType::Number) {
                            negated_types.remove(ty);
                        }
                    }
                }
                let mut rewritten = inner.clone();
                match negated_types.to_value() {
                    Some(value) => {
                        rewritten.insert("type".to_string(), value);
                    }
                    None => {
                        rewritten.remove("type");
                    }
                }
                negated = self.canonicalize(&JsonValue::Object(rewritten))?;
            }
        }
        if !is_falsey(&negated) {
            schema.insert("not".to_string(), negated);
        }
        Ok(false)
    }

    /// Tightens numeric bounds. Returns a `const` when exactly one number remains.
    fn narrow_numbers(&self, schema: &mut JsonObject, types: &mut TypeSet) -> Option<JsonValue> {
        if types.contains(JsonType::Number) {
            let bounds = NumericBounds::from_schema(schema);
            match bounds.multiple_of {
                Some(step) if is_integral(step) => {
                    types.remove(JsonType::Number);
                    types.insert(JsonType::Integer);
                }
                step => {
                    if let (Some(lo), Some(hi)) = (bounds.lower(), bounds.upper()) {
                        let no_multiples = step.is_some_and(|step| !has_multiple_in(lo, hi, step));
                        if lo > hi || no_multiples {
                            types.remove(JsonType::Number);
                        } else if *types == TypeSet::of(&[JsonType::Number]) && lo == hi {
                            return Some(json!({ "const": json_number(lo) }));
                        }
                    }
                }
            }
        }
        if types.contains(JsonType::Integer) {
            let bounds = NumericBounds::from_schema(schema);
            let Some((mut lo, mut hi)) = bounds.integer_range() else {
                // Every admissible integer is past the end of i64, so the
                // bounds stay as written.
                if let (Some(lo), Some(hi)) = bounds.integer_float_range() {
                    if lo > hi {
                        types.remove(JsonType::Integer);
                    }
                }
                return None;
            };
            if let Some(step) = bounds.integer_step().filter(|step| *step > 1) {
                lo = lo.and_then(|lo| lo.checked_add((step - lo.rem_euclid(step)) % step));
                hi = hi.and_then(|hi| hi.checked_sub(hi.rem_euclid(step)));
            }
            if let (Some(lo), Some(hi)) = (lo, hi) {
                if lo > hi {
                    types.remove(JsonType::Integer);
                }
            }
            if types.contains(JsonType::Integer) {
                if let Some(lo) = lo {
                    schema.remove("exclusiveMinimum");
                    schema.insert("minimum".to_string(), JsonValue::from(lo));
                }
                if let Some(hi) = hi {
                    schema.remove("exclusiveMaximum");
                    schema.insert("maximum".to_string(), JsonValue::from(hi));
                }
            }
        }
        None
    }

    fn narrow_arrays(&self, schema: &mut JsonObject, types: &mut TypeSet) -> Result<(), SchemaError> {
        if !types.contains(JsonType::Array) {
            return Ok(());
        }
        let mut min_items = schema.get("minItems").and_then(JsonValue::as_u64).unwrap_or(0);
        let mut max_items = schema.get("maxItems").and_then(JsonValue::as_u64);

        if let Some(contains) = schema.get("contains").cloned() {
            min_items = min_items.max(1);
            if is_falsey(&contains) {
                types.remove(JsonType::Array);
                return Ok(());
            }
            if is_truthy(&contains) {
                schema.remove("contains");
            } else if let Some(items) = schema.get("items").filter(|items| items.is_object()).cloned() {
                match self.merged(&[contains, items.clone()])? {
                    Some(both) if is_falsey(&both) => {
                        types.remove(JsonType::Array);
                        return Ok(());
                    }
                    Some(both) if both == items => {
                        schema.remove("contains");
                    }
                    Some(both) => {
                        schema.insert("contains".to_string(), both);
                    }
                    None => {}
                }
            }
        }

        if let Some(JsonValue::Array(items)) = schema.get("items").cloned() {
            let mut items = items;
            let mut additional = schema.remove("additionalItems").unwrap_or_else(truthy);
            if let Some(cut) = items.iter().position(is_falsey) {
                items.truncate(cut);
                additional = falsey();
            }
            if is_falsey(&additional) {
                let len = items.len() as u64;
                max_items = Some(max_items.map_or(len, |max| max.min(len)));
            }
            if items.is_empty() {
                schema.remove("items");
                if !is_truthy(&additional) {
                    schema.insert("items".to_string(), additional);
                }
            } else {
                schema.insert("items".to_string(), JsonValue::Array(items));
                if !is_truthy(&additional) {
                    schema.insert("additionalItems".to_string(), additional);
                }
            }
        } else {
            schema.remove("additionalItems");
        }
        if schema.get("items").is_some_and(is_falsey) {
            max_items = Some(0);
        }
        if schema.get("uniqueItems") == Some(&JsonValue::Bool(true)) {
            if let Some(bound) = schema
                .get("items")
                .filter(|items| items.is_object())
                .and_then(upper_bound_instances)
            {
                let bound = bound as u64;
                max_items = Some(max_items.map_or(bound, |max| max.min(bound)));
            }
        }

        if max_items.is_some_and(|max| max < min_items) {
            types.remove(JsonType::Array);
            return Ok(());
        }
        if max_items == Some(0) {
            for key in ["items", "additionalItems", "contains", "uniqueItems"] {
                schema.remove(key);
            }
        }
        schema.insert("minItems".to_string(), JsonValue::from(min_items));
        if let Some(max) = max_items {
            schema.insert("maxItems".to_string(), JsonValue::from(max));
        }
        Ok(())
    }

    fn narrow_objects(&self, schema: &mut JsonObject, types: &mut TypeSet) -> Result<(), SchemaError> {
        if !types.contains(JsonType::Object) {
            return Ok(());
        }
        let mut required: BTreeSet<String> = match schema.get("required") {
            Some(JsonValue::Array(names)) => names
                .iter()
                .map(|name| {
                    name.as_str().map(str::to_string).ok_or_else(|| {
                        SchemaError::invalid(format!("required entries must be strings, got {name}"))
                    })
                })
                .collect::<Result<_, _>>()?,
            Some(other) => {
                return Err(SchemaError::invalid(format!(
                    "required must be an array, got {other}"
                )))
            }
            None => BTreeSet::new(),
        };

        if let Some(JsonValue::Object(mut dependencies)) = schema.remove("dependencies") {
            loop {
                let before = required.len();
                for name in required.clone() {
                    if let Some(JsonValue::Array(names)) = dependencies.get(&name) {
                        required.extend(names.iter().filter_map(JsonValue::as_str).map(str::to_string));
                    }
                }
                if required.len() == before {
                    break;
                }
            }
            for name in &required {
                if let Some(dependency) = dependencies.remove(name) {
                    if !dependency.is_array() {
                        append_all_of(schema, dependency);
                    }
                }
            }
            dependencies.retain(|_, value| !value.as_array().is_some_and(Vec::is_empty) && !is_truthy(value));
            if !dependencies.is_empty() {
                schema.insert("dependencies".to_string(), JsonValue::Object(dependencies));
            }
        }

        for name in &required {
            if property_schemas(schema, name).iter().any(is_falsey) {
                types.remove(JsonType::Object);
                return Ok(());
            }
        }

        let mut min_properties = schema
            .get("minProperties")
            .and_then(JsonValue::as_u64)
            .unwrap_or(0)
            .max(required.len() as u64);
        let mut max_properties = schema.get("maxProperties").and_then(JsonValue::as_u64);

        if let Some(names) = schema.get("propertyNames").cloned() {
            if is_falsey(&names) {
                max_properties = Some(0);
            } else {
                let validator = self.validators.get(&names)?;
                if required
                    .iter()
                    .any(|name| !validator.is_valid(&JsonValue::from(name.as_str())))
                {
                    types.remove(JsonType::Object);
                    return Ok(());
                }
            }
        }

        let closed = schema.get("additionalProperties").is_some_and(is_falsey)
            && !schema.contains_key("patternProperties");
        if closed {
            let allowed = schema
                .get("properties")
                .and_then(JsonValue::as_object)
                .map_or(0, |properties| {
                    properties.values().filter(|value| !is_falsey(value)).count()
                }) as u64;
            max_properties = Some(max_properties.map_or(allowed, |max| max.min(allowed)));
        }

        if max_properties.is_some_and(|max| max < min_properties) {
            types.remove(JsonType::Object);
            return Ok(());
        }
        if max_properties == Some(0) {
            for key in [
                "properties",
                "patternProperties",
                "additionalProperties",
                "propertyNames",
                "dependencies",
            ] {
                schema.remove(key);
            }
            min_properties = 0;
        }
        schema.insert("minProperties".to_string(), JsonValue::from(min_properties));
        if let Some(max) = max_properties {
            schema.insert("maxProperties".to_string(), JsonValue::from(max));
        }
        if required.is_empty() {
            schema.remove("required");
        } else {
            schema.insert(
                "required".to_string(),
                JsonValue::Array(required.into_iter().map(JsonValue::from).collect()),
            );
        }
        Ok(())
    }

    /// Merges `allOf` members into the schema, keeping unmergeable ones as a residual.
    fn combine_all_of(
        &self,
        schema: &mut JsonObject,
        all_of: JsonValue,
    ) -> Result<Option<JsonValue>, SchemaError> {
        let JsonValue::Array(members) = all_of else {
            return Ok(None);
        };
        if members.iter().any(is_falsey) {
            return Ok(Some(falsey()));
        }
        let members: Vec<JsonValue> = sorted_unique(members)
            .into_iter()
            .filter(|member| !is_truthy(member))
            .collect();
        if members.is_empty() {
            return Ok(None);
        }
        let mut current = JsonValue::Object(schema.clone());
        let mut residual = Vec::new();
        for member in members {
            match self.merged(&[current.clone(), member.clone()])? {
                Some(merged) if is_falsey(&merged) => return Ok(Some(falsey())),
                Some(merged) => current = merged,
                None => residual.push(member),
            }
        }
        if residual.is_empty() {
            return Ok(Some(current));
        }
        let JsonValue::Object(mut out) = current else {
            return Ok(Some(current));
        };
        if let Some(JsonValue::Array(existing)) = out.remove("allOf") {
            residual.extend(existing);
        }
        out.insert("allOf".to_string(), JsonValue::Array(sorted_unique(residual)));
        Ok(Some(JsonValue::Object(out)))
    }

    fn combine_any_of(
        &self,
        schema: &mut JsonObject,
        types: TypeSet,
        any_of: JsonValue,
    ) -> Result<Option<JsonValue>, SchemaError> {
        let JsonValue::Array(members) = any_of else {
            return Ok(None);
        };
        let mut flat = Vec::with_capacity(members.len());
        for member in members {
            match member {
                JsonValue::Object(map) if map.len() == 1 && map.contains_key("anyOf") => {
                    if let Some(JsonValue::Array(nested)) = map.get("anyOf") {
                        flat.extend(nested.iter().cloned());
                    }
                }
                other => flat.push(other),
            }
        }
        let branches: Vec<JsonValue> = sorted_unique(flat)
            .into_iter()
            .filter(|branch| !is_falsey(branch))
            .collect();
        if branches.iter().any(is_truthy) {
            return Ok(None);
        }
        if branches.is_empty() {
            return Ok(Some(falsey()));
        }
        let type_only = branches.iter().all(|branch| {
            branch
                .as_object()
                .is_some_and(|map| map.len() == 1 && map.contains_key("type"))
        });
        if type_only {
            let mut union = TypeSet::EMPTY;
            for branch in &branches {
                if let JsonValue::Object(map) = branch {
                    union = union.union(TypeSet::from_schema(map)?);
                }
            }
            let narrowed = types.intersect(union);
            let mut rewritten = schema.clone();
            rewritten.insert(
                "type".to_string(),
                narrowed
                    .to_value()
                    .unwrap_or_else(|| JsonValue::Array(Vec::new())),
            );
            if narrowed.is_all() {
                rewritten.remove("type");
            }
            return self.canonicalize_object(rewritten).map(Some);
        }
        if branches.len() == 1 {
            let only = JsonValue::Object(schema.clone());
            if let Some(merged) = self.merged(&[only, branches[0].clone()])? {
                return Ok(Some(merged));
            }
        }
        schema.insert("anyOf".to_string(), JsonValue::Array(branches));
        Ok(None)
    }

    fn combine_one_of(
        &self,
        schema: &mut JsonObject,
        one_of: JsonValue,
    ) -> Result<Option<JsonValue>, SchemaError> {
        let JsonValue::Array(members) = one_of else {
            return Ok(None);
        };
        let branches: Vec<JsonValue> = sorted(members)
            .into_iter()
            .filter(|branch| !is_falsey(branch))
            .collect();
        if branches.is_empty() || branches.iter().filter(|branch| is_truthy(branch)).count() > 1 {
            return Ok(Some(falsey()));
        }
        if branches.len() == 1 {
            let only = JsonValue::Object(schema.clone());
            if let Some(merged) = self.merged(&[only, branches[0].clone()])? {
                return Ok(Some(merged));
            }
        }
        schema.insert("oneOf".to_string(), JsonValue::Array(branches));
        Ok(None)
    }
}

fn narrow_strings(schema: &JsonObject, types: &mut TypeSet) {
    if !types.contains(JsonType::String) {
        return;
    }
    let min = schema.get("minLength").and_then(JsonValue::as_u64).unwrap_or(0);
    let max = schema.get("maxLength").and_then(JsonValue::as_u64);
    if max.is_some_and(|max| max < min) {
        types.remove(JsonType::String);
    }
}

fn drop_absent_type_keywords(schema: &mut JsonObject, types: TypeSet) {
    for ty in [JsonType::String, JsonType::Array, JsonType::Object] {
        if !types.contains(ty) {
            for key in ty.keywords() {
                schema.remove(*key);
            }
        }
    }
    if !types.allows(JsonType::Integer) {
        for key in JsonType::Number.keywords() {
            schema.remove(*key);
        }
    }
}

fn is_no_op(key: &str, value: &JsonValue) -> bool {
    match key {
        "minItems" | "minLength" | "minProperties" => value.as_u64() == Some(0),
        "uniqueItems" => value == &JsonValue::Bool(false),
        "items" | "additionalItems" | "additionalProperties" | "propertyNames" => {
            is_truthy(value) || value.as_array().is_some_and(Vec::is_empty)
        }
        "properties" | "patternProperties" | "dependencies" => {
            value.as_object().is_some_and(JsonObject::is_empty)
        }
        "required" | "allOf" | "anyOf" => value.as_array().is_some_and(Vec::is_empty),
        _ => false,
    }
}

pub(crate) fn append_all_of(schema: &mut JsonObject, member: JsonValue) {
    match schema.get_mut("allOf") {
        Some(JsonValue::Array(members)) => members.push(member),
        _ => {
            schema.insert("allOf".to_string(), JsonValue::Array(vec![member]));
        }
    }
}

/// Every subschema that constrains the value stored under `name`.
pub(crate) fn property_schemas(schema: &JsonObject, name: &str) -> Vec<JsonValue> {
    let mut found = Vec::new();
    if let Some(property) = schema
        .get("properties")
        .and_then(|properties| properties.get(name))
    {
        found.push(property.clone());
    }
    let mut matched_pattern = false;
    if let Some(JsonValue::Object(patterns)) = schema.get("patternProperties") {
        for (source, pattern_schema) in patterns {
            if pattern::compiled(source).is_match(name) {
                found.push(pattern_schema.clone());
                matched_pattern = true;
            }
        }
    }
    if found.is_empty() && !matched_pattern {
        found.push(
            schema
                .get("additionalProperties")
                .cloned()
                .unwrap_or_else(truthy),
        );
    }
    found
}

#[cfg(test)]
#[path = "../../tests/internal/canonical_unit_tests.rs"]
mod tests;
