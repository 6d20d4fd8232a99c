use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::SchemaError;
use crate::formats::FormatRegistry;

const DEFAULT_FROMSCHEMA_TOML: &str = include_str!("default_fromschema.toml");

/// The default generation config, as TOML.
pub fn default_config_toml() -> &'static str {
    DEFAULT_FROMSCHEMA_TOML
}

/// Limits that keep generation finite and fast.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationConfig {
    /// How many times a recursive definition may be expanded along one path.
    pub max_recursion_depth: usize,
    /// Elements drawn beyond `minItems`/`minProperties`, at most.
    pub max_collection_size: usize,
    /// Characters drawn beyond `minLength`, at most.
    pub max_string_length: usize,
    /// Consecutive rejections a residual filter tolerates before giving up.
    pub max_filter_attempts: u32,
    /// Check the input document against its draft's metaschema.
    pub validate_schema: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_recursion_depth: 5,
            max_collection_size: 8,
            max_string_length: 32,
            max_filter_attempts: 100,
            validate_schema: true,
        }
    }
}

impl GenerationConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, SchemaError> {
        let config: Self = toml::from_str(contents)
            .map_err(|error| SchemaError::InvalidConfig(error.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(contents: &str) -> Result<Self, SchemaError> {
        let config: Self = serde_json::from_str(contents)
            .map_err(|error| SchemaError::InvalidConfig(error.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn validate(&self) -> Result<(), SchemaError> {
        if self.max_filter_attempts == 0 {
            return Err(SchemaError::InvalidConfig(
                "max_filter_attempts must be at least 1".to_string(),
            ));
        }
        if self.max_recursion_depth == 0 {
            return Err(SchemaError::InvalidConfig(
                "max_recursion_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Everything besides the schema that shapes a generator.
#[derive(Clone, Debug, Default)]
pub struct FromSchemaOptions {
    pub config: GenerationConfig,
    pub formats: FormatRegistry,
    /// Documents that `$ref`s may point into, keyed by their URI.
    pub documents: BTreeMap<String, JsonValue>,
}

impl FromSchemaOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_formats(mut self, formats: FormatRegistry) -> Self {
        self.formats = formats;
        self
    }

    /// Registers a document for `$ref`s to resolve against, without fetching it.
    pub fn with_document(mut self, uri: impl Into<String>, document: JsonValue) -> Self {
        let uri = uri.into();
        let uri = uri.trim_end_matches('#').to_string();
        self.documents.insert(uri, document);
        self
    }
}

#[cfg(test)]
#[path = "../tests/internal/config_unit_tests.rs"]
mod tests;
