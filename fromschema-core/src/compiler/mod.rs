//! Per-type constraint compilation: canonical schemas restricted to one JSON
//! type become proptest strategies for that type alone.
//!
//! Every entry point returns `Ok(None)` when the schema admits no value of
//! the requested type. Combining the per-type strategies, recursion and
//! residual filtering live in [`crate::assembler`].

mod array;
pub(crate) mod numeric;
mod object;
mod string;

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use proptest::prelude::*;
use serde_json::Value as JsonValue;

use crate::canonical::keywords::JsonType;
use crate::canonical::Canonicalizer;
use crate::config::GenerationConfig;
use crate::error::SchemaError;
use crate::filter::{Check, FilterStats, ResidualFilter};
use crate::formats::FormatRegistry;
use crate::validation::ValidatorCache;
use crate::JsonObject;
use numeric::{integer_strategy, number_strategy, NumericBounds};

pub(crate) type ValueStrategy = BoxedStrategy<JsonValue>;

pub(crate) struct Compiler {
    pub(crate) config: GenerationConfig,
    pub(crate) definitions: Arc<JsonObject>,
    pub(crate) canonicalizer: Arc<Canonicalizer>,
    formats: FormatRegistry,
    anything: ValueStrategy,
    filters: RefCell<Vec<Arc<FilterStats>>>,
    pub(crate) references: RefCell<HashMap<(String, usize), Option<ValueStrategy>>>,
    pub(crate) recursion_cut: RefCell<Option<String>>,
    /// When set, a cut recursion admits any value instead of none.
    pub(crate) open_cuts: bool,
}

impl Compiler {
    pub(crate) fn new(
        config: GenerationConfig,
        definitions: Arc<JsonObject>,
        canonicalizer: Arc<Canonicalizer>,
        formats: FormatRegistry,
    ) -> Self {
        let anything = any_json(config.max_collection_size);
        Self {
            config,
            definitions,
            canonicalizer,
            formats,
            anything,
            filters: RefCell::new(Vec::new()),
            references: RefCell::new(HashMap::new()),
            recursion_cut: RefCell::new(None),
            open_cuts: false,
        }
    }

    pub(crate) fn with_open_cuts(mut self) -> Self {
        self.open_cuts = true;
        self
    }

    pub(crate) fn validators(&self) -> &Arc<ValidatorCache> {
        self.canonicalizer.validators()
    }

    /// The first recursion marker whose expansion hit the depth limit.
    pub(crate) fn recursion_cut(&self) -> Option<String> {
        self.recursion_cut.borrow().clone()
    }

    pub(crate) fn filter_stats(&self) -> Vec<Arc<FilterStats>> {
        self.filters.borrow().clone()
    }

    /// Any JSON value at all.
    pub(crate) fn anything(&self) -> ValueStrategy {
        self.anything.clone()
    }

    /// Wraps `source` in a residual filter whose rejections are counted.
    pub(crate) fn filtered(
        &self,
        label: impl Into<String>,
        source: ValueStrategy,
        check: Check,
    ) -> ValueStrategy {
        let stats = Arc::new(FilterStats::new(label));
        self.filters.borrow_mut().push(stats.clone());
        ResidualFilter::new(source, check, self.config.max_filter_attempts, stats).boxed()
    }

    /// A check that accepts the values valid under `schema`.
    pub(crate) fn validator_check(&self, schema: &JsonValue) -> Result<Check, SchemaError> {
        let validator = self.validators().get(schema)?;
        Ok(Arc::new(move |value: &JsonValue| validator.is_valid(value)))
    }

    /// The strategy for the part of `schema` that has type `ty`.
    pub(crate) fn compile_type(
        &self,
        ty: JsonType,
        schema: &JsonObject,
        depth: usize,
    ) -> Result<Option<ValueStrategy>, SchemaError> {
        let strategy = match ty {
            JsonType::Null => Some(Just(JsonValue::Null).boxed()),
            JsonType::Boolean => Some(any::<bool>().prop_map(JsonValue::Bool).boxed()),
            JsonType::Integer => integer_strategy(&NumericBounds::from_schema(schema)),
            JsonType::Number => {
                let bounds = NumericBounds::from_schema(schema);
                match (integer_strategy(&bounds), number_strategy(&bounds)) {
                    (Some(integers), Some(floats)) => Some(
                        prop_oneof![1 => integers, 2 => floats].boxed(),
                    ),
                    (integers, floats) => floats.or(integers),
                }
            }
            JsonType::String => self.string_strategy(schema)?,
            JsonType::Array => self.array_strategy(schema, depth)?,
            JsonType::Object => self.object_strategy(schema, depth)?,
        };
        Ok(strategy)
    }
}

fn any_json(max_collection_size: usize) -> ValueStrategy {
    let leaf = prop_oneof![
        Just(JsonValue::Null),
        any::<bool>().prop_map(JsonValue::Bool),
        (-1000i64..=1000).prop_map(JsonValue::from),
        (-1000.0..1000.0f64).prop_map(JsonValue::from),
        "[a-z]{0,8}".prop_map(JsonValue::String),
    ];
    let width = max_collection_size.max(1);
    leaf.prop_recursive(3, 24, width as u32, move |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..=width).prop_map(JsonValue::Array),
            proptest::collection::btree_map("[a-z]{1,6}", inner, 0..=width)
                .prop_map(|entries| JsonValue::Object(entries.into_iter().collect())),
        ]
    })
    .boxed()
}

#[cfg(test)]
#[path = "../../tests/internal/compiler_unit_tests.rs"]
mod tests;
