use std::sync::Arc;

use proptest::prelude::*;
use proptest::sample::Index;
use serde_json::Value as JsonValue;

use super::{Compiler, ValueStrategy};
use crate::canonical::json::{all_unique, dedup_preserving_order};
use crate::canonical::{is_truthy, truthy};
use crate::error::SchemaError;
use crate::filter::Check;
use crate::JsonObject;

impl Compiler {
    pub(super) fn array_strategy(
        &self,
        schema: &JsonObject,
        depth: usize,
    ) -> Result<Option<ValueStrategy>, SchemaError> {
        let min = schema
            .get("minItems")
            .and_then(JsonValue::as_u64)
            .unwrap_or(0) as usize;
        let cap = min.saturating_add(self.config.max_collection_size);
        let max = schema
            .get("maxItems")
            .and_then(JsonValue::as_u64)
            .map_or(cap, |max| (max as usize).min(cap));
        if max < min {
            return Ok(None);
        }
        let unique = schema.get("uniqueItems") == Some(&JsonValue::Bool(true));

        if let Some(JsonValue::Array(prefix)) = schema.get("items") {
            return self.tuple_strategy(schema, prefix, min, max, unique, depth);
        }
        let items = schema.get("items").cloned().unwrap_or_else(truthy);
        let Some(item) = self.assemble(&items, depth)? else {
            let empty_allowed = min == 0 && !schema.contains_key("contains");
            return Ok(empty_allowed.then(|| Just(JsonValue::Array(Vec::new())).boxed()));
        };

        let arrays = match schema.get("contains") {
            None => proptest::collection::vec(item, min..=max)
                .prop_map(JsonValue::Array)
                .boxed(),
            Some(contains) => {
                let Some(witness) = self.contains_witness(contains, &items, depth)? else {
                    return Ok(None);
                };
                if max == 0 {
                    return Ok(None);
                }
                let rest = min.saturating_sub(1)..=max - 1;
                (proptest::collection::vec(item, rest), witness, any::<Index>())
                    .prop_map(|(mut values, witness, at)| {
                        let at = at.index(values.len() + 1);
                        values.insert(at, witness);
                        JsonValue::Array(values)
                    })
                    .boxed()
            }
        };
        if !unique {
            return Ok(Some(arrays));
        }
        let deduplicated = arrays
            .prop_map(|value| match value {
                JsonValue::Array(values) => JsonValue::Array(dedup_preserving_order(values)),
                other => other,
            })
            .boxed();
        if min <= 1 {
            return Ok(Some(deduplicated));
        }
        let check: Check = Arc::new(move |value: &JsonValue| {
            value.as_array().is_some_and(|values| values.len() >= min)
        });
        Ok(Some(self.filtered("uniqueItems", deduplicated, check)))
    }

    /// Positional items followed by `additionalItems`.
    fn tuple_strategy(
        &self,
        schema: &JsonObject,
        prefix: &[JsonValue],
        min: usize,
        max: usize,
        unique: bool,
        depth: usize,
    ) -> Result<Option<ValueStrategy>, SchemaError> {
        let mut heads = Vec::with_capacity(prefix.len());
        for item in prefix {
            match self.assemble(item, depth)? {
                Some(strategy) => heads.push(strategy),
                None => break,
            }
        }
        let tail = if heads.len() < prefix.len() {
            None
        } else {
            let additional = schema.get("additionalItems").cloned().unwrap_or_else(truthy);
            self.assemble(&additional, depth)?
        };
        let max = if tail.is_some() { max } else { max.min(heads.len()) };
        if max < min {
            return Ok(None);
        }

        let arrays = (min..=max)
            .prop_flat_map(move |len| {
                let head: Vec<ValueStrategy> = heads.iter().take(len).cloned().collect();
                let extra = len - head.len();
                match &tail {
                    Some(tail) if extra > 0 => (head, proptest::collection::vec(tail.clone(), extra))
                        .prop_map(|(mut values, rest)| {
                            values.extend(rest);
                            JsonValue::Array(values)
                        })
                        .boxed(),
                    _ => head.prop_map(JsonValue::Array).boxed(),
                }
            })
            .boxed();

        let mut checks: Vec<Check> = Vec::new();
        if unique {
            checks.push(Arc::new(|value: &JsonValue| {
                value.as_array().is_some_and(|values| all_unique(values))
            }));
        }
        if let Some(contains) = schema.get("contains") {
            checks.push(self.validator_check(&serde_json::json!({ "contains": contains }))?);
        }
        if checks.is_empty() {
            return Ok(Some(arrays));
        }
        let check: Check = Arc::new(move |value: &JsonValue| checks.iter().all(|check| check(value)));
        Ok(Some(self.filtered("tuple items", arrays, check)))
    }

    /// Elements that satisfy `contains` and the item schema at once.
    fn contains_witness(
        &self,
        contains: &JsonValue,
        items: &JsonValue,
        depth: usize,
    ) -> Result<Option<ValueStrategy>, SchemaError> {
        if is_truthy(items) {
            return self.assemble(contains, depth);
        }
        if let Some(both) = self
            .canonicalizer
            .merged(&[contains.clone(), items.clone()])?
        {
            return self.assemble(&both, depth);
        }
        let Some(witness) = self.assemble(contains, depth)? else {
            return Ok(None);
        };
        let check = self.validator_check(items)?;
        Ok(Some(self.filtered("contains within items", witness, check)))
    }
}
