//! Property-based test data generation from JSON Schema documents.
//!
//! [`from_schema`] turns a schema into a proptest [`Strategy`] whose values
//! all validate against the schema:
//!
//! 1. `$ref`s are inlined, with recursive ones left as definition markers.
//! 2. The schema is rewritten into a canonical Draft 7 form where
//!    combinators are merged away wherever possible.
//! 3. Each admitted type is compiled into a strategy of its own, and the
//!    per-type strategies are combined. Constraints that cannot be built into
//!    a strategy's structure are enforced by bounded rejection sampling.

use std::cell::OnceCell;
use std::fmt;
use std::sync::Arc;

use proptest::strategy::{NewTree, Strategy, ValueTree};
use proptest::test_runner::{Config as ProptestConfig, Reason, RngAlgorithm, TestRng, TestRunner};
use serde_json::Value as JsonValue;

mod assembler;
pub mod canonical;
mod compiler;
mod config;
pub mod dialect;
mod error;
mod filter;
mod formats;
mod pattern;
mod pointer;
mod resolver;
mod validation;

pub use canonical::CanonicalSchema;
pub use config::{default_config_toml, FromSchemaOptions, GenerationConfig};
pub use dialect::Dialect;
pub use error::{DrawFailure, ReferenceErrorKind, SchemaError};
pub use filter::FilterReport;
pub use formats::{builtin_format, builtin_format_names, rfc3339, FormatRegistry};

/// A JSON object, as `serde_json` represents it.
pub type JsonObject = serde_json::Map<String, JsonValue>;

use canonical::json::canonical_encoding;
use canonical::Canonicalizer;
use compiler::{Compiler, ValueStrategy};
use error::UNSATISFIABLE_PREFIX;
use filter::FilterStats;
use validation::ValidatorCache;

/// A strategy for values that validate against `schema`.
///
/// Nothing is checked until the first draw, so a bad schema only fails the
/// tests that use it. Use [`try_from_schema`] to surface errors up front.
pub fn from_schema(schema: &JsonValue) -> SchemaStrategy {
    from_schema_with(schema, FromSchemaOptions::default())
}

/// Like [`from_schema`], with custom formats, limits and external documents.
pub fn from_schema_with(schema: &JsonValue, options: FromSchemaOptions) -> SchemaStrategy {
    SchemaStrategy {
        schema: schema.clone(),
        options,
        built: OnceCell::new(),
    }
}

/// Builds the strategy immediately, returning any schema error.
pub fn try_from_schema(
    schema: &JsonValue,
    options: FromSchemaOptions,
) -> Result<SchemaStrategy, SchemaError> {
    let strategy = from_schema_with(schema, options);
    strategy.built()?;
    Ok(strategy)
}

/// Rewrites `schema` into its canonical Draft 7 form.
///
/// Recursive definitions are attached under `definitions`, so the result is
/// a self-contained document. Canonicalizing the result again returns it
/// unchanged.
pub fn canonicalize(schema: &JsonValue) -> Result<JsonValue, SchemaError> {
    let options = FromSchemaOptions::default();
    Ok(prepare(schema, &options)?.canonical.to_document())
}

/// The generator returned by [`from_schema`].
pub struct SchemaStrategy {
    schema: JsonValue,
    options: FromSchemaOptions,
    built: OnceCell<Result<Built, SchemaError>>,
}

struct Built {
    strategy: Option<ValueStrategy>,
    canonical: CanonicalSchema,
    filters: Vec<Arc<FilterStats>>,
}

impl SchemaStrategy {
    fn built(&self) -> Result<&Built, SchemaError> {
        self.built
            .get_or_init(|| build(&self.schema, &self.options))
            .as_ref()
            .map_err(Clone::clone)
    }

    /// The canonical form the strategy was compiled from.
    pub fn canonical(&self) -> Result<&CanonicalSchema, SchemaError> {
        Ok(&self.built()?.canonical)
    }

    /// Returns true when no value can be generated at all.
    pub fn is_empty(&self) -> Result<bool, SchemaError> {
        Ok(self.built()?.strategy.is_none())
    }

    /// Attempt and rejection counts of every residual filter so far.
    pub fn filter_stats(&self) -> Vec<FilterReport> {
        match self.built() {
            Ok(built) => built.filters.iter().map(|stats| stats.report()).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Draws one value with a runner seeded from `seed`.
    pub fn example_with_seed(&self, seed: u64) -> Result<JsonValue, Reason> {
        let mut runner = seeded_test_runner(seed);
        Ok(self.new_tree(&mut runner)?.current())
    }
}

impl fmt::Debug for SchemaStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaStrategy")
            .field("schema", &self.schema)
            .field("options", &self.options)
            .field("built", &self.built.get().map(|built| built.is_ok()))
            .finish()
    }
}

impl Strategy for SchemaStrategy {
    type Tree = Box<dyn ValueTree<Value = JsonValue>>;
    type Value = JsonValue;

    fn new_tree(&self, runner: &mut TestRunner) -> NewTree<Self> {
        let built = self
            .built()
            .map_err(|error| Reason::from(error.to_string()))?;
        match &built.strategy {
            Some(strategy) => strategy.new_tree(runner),
            None => Err(Reason::from(format!(
                "{UNSATISFIABLE_PREFIX}: no value satisfies {}",
                canonical_encoding(&built.canonical.to_document())
            ))),
        }
    }
}

/// The canonical schema plus what compiling it needs.
struct Prepared {
    canonical: CanonicalSchema,
    canonicalizer: Arc<Canonicalizer>,
}

fn prepare(schema: &JsonValue, options: &FromSchemaOptions) -> Result<Prepared, SchemaError> {
    options.config.validate()?;
    let dialect = dialect::detect(schema)?;
    if options.config.validate_schema {
        dialect::check_schema(schema, dialect)?;
    }
    let resolved = resolver::resolve(schema, dialect, &options.documents)?;
    let root = dialect::to_draft7_vocabulary(&resolved.root, dialect)?;
    let mut definitions = JsonObject::new();
    for (name, definition) in &resolved.definitions {
        definitions.insert(
            name.clone(),
            dialect::to_draft7_vocabulary(definition, dialect)?,
        );
    }

    let validators = Arc::new(ValidatorCache::new(Arc::new(definitions.clone())));
    let canonicalizer = Arc::new(Canonicalizer::new(validators));
    let root = canonicalizer.canonicalize(&root)?;
    let mut canonical_definitions = JsonObject::new();
    for (name, definition) in &definitions {
        canonical_definitions.insert(name.clone(), canonicalizer.canonicalize(definition)?);
    }
    Ok(Prepared {
        canonical: CanonicalSchema {
            root,
            definitions: canonical_definitions,
        },
        canonicalizer,
    })
}

fn build(schema: &JsonValue, options: &FromSchemaOptions) -> Result<Built, SchemaError> {
    options.formats.validate()?;
    let Prepared {
        canonical,
        canonicalizer,
    } = prepare(schema, options)?;
    let definitions = Arc::new(canonical.definitions.clone());
    let compiler = Compiler::new(
        options.config.clone(),
        definitions.clone(),
        canonicalizer.clone(),
        options.formats.clone(),
    );
    let strategy = compiler.assemble(&canonical.root, 0)?;
    if strategy.is_none() && !canonical.is_unsatisfiable() {
        if let Some(reference) = compiler.recursion_cut() {
            // Blame the cut only if the schema has values once it is lifted.
            let open = Compiler::new(
                options.config.clone(),
                definitions,
                canonicalizer,
                options.formats.clone(),
            )
            .with_open_cuts();
            if open.assemble(&canonical.root, 0)?.is_some() {
                return Err(SchemaError::unresolvable(
                    reference,
                    ReferenceErrorKind::Recursive,
                ));
            }
        }
    }
    Ok(Built {
        strategy,
        canonical,
        filters: compiler.filter_stats(),
    })
}

/// A ChaCha runner whose 32-byte key is `seed`, little-endian, repeated.
fn seeded_test_runner(seed: u64) -> TestRunner {
    let key: Vec<u8> = seed.to_le_bytes().into_iter().cycle().take(32).collect();
    let rng = TestRng::from_seed(RngAlgorithm::ChaCha, &key);
    TestRunner::new_with_rng(
        ProptestConfig {
            rng_algorithm: RngAlgorithm::ChaCha,
            ..ProptestConfig::default()
        },
        rng,
    )
}
