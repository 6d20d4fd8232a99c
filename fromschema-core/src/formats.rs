//! Generators for the `format` keyword on strings.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use chrono::NaiveDate;
use proptest::prelude::*;
use proptest::strategy::{NewTree, ValueTree};
use proptest::test_runner::{Reason, TestRunner};
use serde_json::Value as JsonValue;

use crate::compiler::ValueStrategy;
use crate::error::SchemaError;

const RFC3339_FORMATS: &[&str] = &[
    "date-fullyear",
    "date-month",
    "date-mday",
    "time-hour",
    "time-minute",
    "time-second",
    "time-secfrac",
    "time-numoffset",
    "time-offset",
    "partial-time",
    "full-date",
    "full-time",
    "date",
    "time",
    "date-time",
];

const OTHER_FORMATS: &[&str] = &[
    "email",
    "idn-email",
    "hostname",
    "idn-hostname",
    "ipv4",
    "ipv6",
    "uri",
    "uri-reference",
    "iri",
    "iri-reference",
    "uri-template",
    "json-pointer",
    "relative-json-pointer",
    "uuid",
    "duration",
    "regex",
];

/// Format names with a built-in generator. None of them can be overridden.
pub fn builtin_format_names() -> impl Iterator<Item = &'static str> {
    RFC3339_FORMATS.iter().chain(OTHER_FORMATS).copied()
}

/// Maps format names to generators: built-ins plus caller overrides.
#[derive(Clone, Default)]
pub struct FormatRegistry {
    custom: BTreeMap<String, ValueStrategy>,
    reserved: BTreeSet<String>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a generator for `name`.
    ///
    /// Nothing is checked here. Reserved names, empty names and generators
    /// that yield non-strings are reported when the schema is first used.
    pub fn with_format(
        mut self,
        name: impl Into<String>,
        strategy: impl Strategy<Value = JsonValue> + 'static,
    ) -> Self {
        self.custom.insert(name.into(), strategy.boxed());
        self
    }

    pub fn with_string_format(
        self,
        name: impl Into<String>,
        strategy: impl Strategy<Value = String> + 'static,
    ) -> Self {
        self.with_format(name, strategy.prop_map(JsonValue::String))
    }

    /// Marks a name as owned by the validator, so it cannot be overridden either.
    pub fn with_reserved_format(mut self, name: impl Into<String>) -> Self {
        self.reserved.insert(name.into());
        self
    }

    pub fn is_builtin(name: &str) -> bool {
        builtin_format_names().any(|builtin| builtin == name)
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        Self::is_builtin(name) || self.reserved.contains(name)
    }

    /// True when `name` has a generator, built in or custom.
    pub fn is_known(&self, name: &str) -> bool {
        Self::is_builtin(name) || self.custom.contains_key(name)
    }

    pub(crate) fn validate(&self) -> Result<(), SchemaError> {
        for name in self.custom.keys() {
            if name.is_empty() {
                return Err(SchemaError::InvalidFormat(
                    "format names must not be empty".to_string(),
                ));
            }
            if self.is_reserved(name) {
                return Err(SchemaError::InvalidFormat(format!(
                    "cannot redefine the standard format '{name}'"
                )));
            }
        }
        Ok(())
    }

    /// The generator for `name`, or `None` when the format is unknown and
    /// places no constraint on generated strings.
    pub(crate) fn strategy_for(&self, name: &str) -> Option<ValueStrategy> {
        if let Some(custom) = self.custom.get(name) {
            return Some(
                StringsOnly {
                    name: name.to_string(),
                    source: custom.clone(),
                }
                .boxed(),
            );
        }
        builtin_format(name).map(|strategy| strategy.prop_map(JsonValue::String).boxed())
    }
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatRegistry")
            .field("custom", &self.custom.keys().collect::<Vec<_>>())
            .field("reserved", &self.reserved)
            .finish()
    }
}

/// Fails the draw when a custom format generator yields something other than a string.
#[derive(Debug)]
struct StringsOnly {
    name: String,
    source: ValueStrategy,
}

impl Strategy for StringsOnly {
    type Tree = Box<dyn ValueTree<Value = JsonValue>>;
    type Value = JsonValue;

    fn new_tree(&self, runner: &mut TestRunner) -> NewTree<Self> {
        let tree = self.source.new_tree(runner)?;
        let value = tree.current();
        if !value.is_string() {
            return Err(Reason::from(
                SchemaError::InvalidFormat(format!(
                    "generator for format '{}' produced the non-string value {value}",
                    self.name
                ))
                .to_string(),
            ));
        }
        Ok(tree)
    }
}

/// Strings valid for a built-in format.
pub fn builtin_format(name: &str) -> Option<BoxedStrategy<String>> {
    if let Some(strategy) = rfc3339(name) {
        return Some(strategy);
    }
    let strategy = match name {
        "email" | "idn-email" => regex_strings(r"[a-z0-9]{1,10}(\.[a-z0-9]{1,8}){0,2}@[a-z][a-z0-9]{0,9}\.[a-z]{2,6}")?,
        "hostname" | "idn-hostname" => regex_strings(r"[a-z]([a-z0-9-]{0,10}[a-z0-9])?(\.[a-z]([a-z0-9-]{0,10}[a-z0-9])?){0,3}")?,
        "ipv4" => any::<[u8; 4]>()
            .prop_map(|octets| Ipv4Addr::from(octets).to_string())
            .boxed(),
        "ipv6" => any::<[u16; 8]>()
            .prop_map(|segments| Ipv6Addr::from(segments).to_string())
            .boxed(),
        "uri" | "iri" => regex_strings(r"(https?|ftp)://[a-z][a-z0-9]{0,9}\.[a-z]{2,6}(/[a-z0-9]{1,8}){0,3}")?,
        "uri-reference" | "iri-reference" => prop_oneof![
            regex_strings(r"(https?|ftp)://[a-z][a-z0-9]{0,9}\.[a-z]{2,6}(/[a-z0-9]{1,8}){0,3}")?,
            regex_strings(r"(/[a-z0-9]{1,8}){1,3}(\?[a-z]{1,5}=[a-z0-9]{1,5})?")?,
        ]
        .boxed(),
        "uri-template" => regex_strings(r"https?://[a-z]{1,10}\.com(/[a-z]{1,8}|/\{[a-z]{1,8}\}){0,3}")?,
        "json-pointer" => regex_strings(r"(/([a-z0-9]|~[01]){0,6}){0,4}")?,
        "relative-json-pointer" => {
            regex_strings(r"(0|[1-9][0-9]{0,2})(#|(/([a-z0-9]|~[01]){0,6}){0,4})")?
        }
        "uuid" => any::<[u8; 16]>()
            .prop_map(|bytes| uuid::Builder::from_random_bytes(bytes).into_uuid().to_string())
            .boxed(),
        "duration" => regex_strings(
            r"P([1-9][0-9]{0,2}Y([1-9][0-9]{0,2}M)?|[1-9][0-9]{0,2}D|[1-9][0-9]{0,2}W|T[1-9][0-9]{0,2}[HMS])",
        )?,
        "regex" => proptest::sample::select(vec![
            "^[a-z]+$",
            "[0-9]{2,4}",
            "a|b",
            "(foo)?bar",
            ".*",
        ])
        .prop_map(str::to_string)
        .boxed(),
        _ => return None,
    };
    Some(strategy)
}

/// Strings valid for one production of RFC 3339 section 5.6.
pub fn rfc3339(name: &str) -> Option<BoxedStrategy<String>> {
    let strategy = match name {
        "date-fullyear" => (0u32..=9999).prop_map(|year| format!("{year:04}")).boxed(),
        "date-month" => (1u32..=12).prop_map(|month| format!("{month:02}")).boxed(),
        "date-mday" => (1u32..=28).prop_map(|day| format!("{day:02}")).boxed(),
        "time-hour" => (0u32..=23).prop_map(|hour| format!("{hour:02}")).boxed(),
        "time-minute" => (0u32..=59).prop_map(|minute| format!("{minute:02}")).boxed(),
        "time-second" => (0u32..=59).prop_map(|second| format!("{second:02}")).boxed(),
        "time-secfrac" => regex_strings(r"\.[0-9]{1,6}")?,
        "time-numoffset" => (any::<bool>(), 0u32..=23, 0u32..=59)
            .prop_map(|(east, hour, minute)| {
                format!("{}{hour:02}:{minute:02}", if east { '+' } else { '-' })
            })
            .boxed(),
        "time-offset" => prop_oneof![1 => Just("Z".to_string()), 3 => rfc3339("time-numoffset")?].boxed(),
        "partial-time" => (
            0u32..=23,
            0u32..=59,
            0u32..=59,
            proptest::option::of(rfc3339("time-secfrac")?),
        )
            .prop_map(|(hour, minute, second, fraction)| {
                format!(
                    "{hour:02}:{minute:02}:{second:02}{}",
                    fraction.unwrap_or_default()
                )
            })
            .boxed(),
        "full-date" | "date" => (1i32..=9999, 1u32..=365)
            .prop_filter_map("day of year out of range", |(year, day)| {
                NaiveDate::from_yo_opt(year, day).map(|date| date.format("%Y-%m-%d").to_string())
            })
            .boxed(),
        "full-time" | "time" => (rfc3339("partial-time")?, rfc3339("time-offset")?)
            .prop_map(|(time, offset)| format!("{time}{offset}"))
            .boxed(),
        "date-time" => (rfc3339("full-date")?, rfc3339("full-time")?)
            .prop_map(|(date, time)| format!("{date}T{time}"))
            .boxed(),
        _ => return None,
    };
    Some(strategy)
}

fn regex_strings(pattern: &str) -> Option<BoxedStrategy<String>> {
    match proptest::string::string_regex(pattern) {
        Ok(strategy) => Some(strategy.boxed()),
        Err(error) => {
            log::warn!("built-in format pattern {pattern:?} failed to compile: {error}");
            None
        }
    }
}

#[cfg(test)]
#[path = "../tests/internal/formats_unit_tests.rs"]
mod tests;
