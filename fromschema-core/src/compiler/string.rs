use std::sync::Arc;

use proptest::prelude::*;
use serde_json::Value as JsonValue;

use super::{Compiler, ValueStrategy};
use crate::error::SchemaError;
use crate::filter::Check;
use crate::pattern;
use crate::JsonObject;

impl Compiler {
    pub(super) fn string_strategy(
        &self,
        schema: &JsonObject,
    ) -> Result<Option<ValueStrategy>, SchemaError> {
        let min = schema
            .get("minLength")
            .and_then(JsonValue::as_u64)
            .unwrap_or(0) as usize;
        let max = schema
            .get("maxLength")
            .and_then(JsonValue::as_u64)
            .map(|max| max as usize);
        if max.is_some_and(|max| max < min) {
            return Ok(None);
        }
        let upper = min
            .saturating_add(self.config.max_string_length)
            .min(max.unwrap_or(usize::MAX));
        let length_ok = move |text: &str| {
            let len = text.chars().count();
            len >= min && max.map_or(true, |max| len <= max)
        };

        let pattern = match schema.get("pattern") {
            Some(JsonValue::String(source)) => {
                let compiled = pattern::compiled(source);
                if let Some(reason) = compiled.invalid_reason() {
                    return Err(SchemaError::invalid(format!(
                        "pattern {source:?} is not a valid regular expression: {reason}"
                    )));
                }
                Some((source.clone(), compiled))
            }
            Some(other) => {
                return Err(SchemaError::invalid(format!(
                    "pattern must be a string, got {other}"
                )))
            }
            None => None,
        };

        let format = match schema.get("format") {
            Some(JsonValue::String(name)) => self
                .formats
                .strategy_for(name)
                .map(|strategy| (name.clone(), strategy)),
            _ => None,
        };
        if let Some((name, strategy)) = format {
            if pattern.is_none() && min == 0 && max.is_none() {
                return Ok(Some(strategy));
            }
            let pattern = pattern.map(|(_, compiled)| compiled);
            let check: Check = Arc::new(move |value: &JsonValue| {
                value.as_str().is_some_and(|text| {
                    length_ok(text) && pattern.as_ref().map_or(true, |p| p.is_match(text))
                })
            });
            return Ok(Some(self.filtered(format!("format '{name}'"), strategy, check)));
        }

        if let Some((source, compiled)) = pattern {
            let candidates = match compiled.strategy() {
                Some(core) => {
                    let before = padding(!source.starts_with('^'));
                    let after = padding(!source.ends_with('$'));
                    (before, core, after)
                        .prop_map(|(before, core, after)| {
                            JsonValue::String(format!("{before}{core}{after}"))
                        })
                        .boxed()
                }
                None => {
                    log::debug!("pattern {source:?} is matched by filtering arbitrary text");
                    text(min, upper).prop_map(JsonValue::String).boxed()
                }
            };
            let check: Check = Arc::new(move |value: &JsonValue| {
                value
                    .as_str()
                    .is_some_and(|text| length_ok(text) && compiled.is_match(text))
            });
            return Ok(Some(self.filtered(format!("pattern {source:?}"), candidates, check)));
        }

        Ok(Some(text(min, upper).prop_map(JsonValue::String).boxed()))
    }
}

/// Strings of `min..=max` characters, mostly printable ASCII.
fn text(min: usize, max: usize) -> BoxedStrategy<String> {
    let chars = prop_oneof![
        6 => proptest::char::range(' ', '~'),
        1 => any::<char>(),
    ];
    proptest::collection::vec(chars, min..=max)
        .prop_map(|chars| chars.into_iter().collect())
        .boxed()
}

/// Text around an unanchored pattern match, usually empty.
fn padding(open: bool) -> BoxedStrategy<String> {
    if open {
        prop_oneof![3 => Just(String::new()), 1 => text(1, 4)].boxed()
    } else {
        Just(String::new()).boxed()
    }
}
