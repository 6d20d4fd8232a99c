use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use jsonschema::{Draft, Validator};
use serde_json::{json, Value as JsonValue};

use crate::canonical::json::canonical_encoding;
use crate::error::SchemaError;
use crate::JsonObject;

/// Compiles and caches Draft 7 validators for schema fragments.
///
/// Fragments may contain `{"$ref": "#/definitions/<name>"}` markers; the
/// shared definitions are attached to every compiled validator.
pub(crate) struct ValidatorCache {
    definitions: Arc<JsonObject>,
    validators: Mutex<HashMap<String, Arc<Validator>>>,
}

impl ValidatorCache {
    pub(crate) fn new(definitions: Arc<JsonObject>) -> Self {
        Self {
            definitions,
            validators: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn definitions(&self) -> &JsonObject {
        &self.definitions
    }

    pub(crate) fn get(&self, schema: &JsonValue) -> Result<Arc<Validator>, SchemaError> {
        let key = canonical_encoding(schema);
        if let Some(found) = self.lock().get(&key) {
            return Ok(found.clone());
        }
        let validator = Arc::new(compile_validator(schema, &self.definitions)?);
        self.lock().insert(key, validator.clone());
        Ok(validator)
    }

    pub(crate) fn is_valid(&self, schema: &JsonValue, instance: &JsonValue) -> Result<bool, SchemaError> {
        Ok(self.get(schema)?.is_valid(instance))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<Validator>>> {
        self.validators
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub(crate) fn compile_validator(
    schema: &JsonValue,
    definitions: &JsonObject,
) -> Result<Validator, SchemaError> {
    let document = if definitions.is_empty() {
        schema.clone()
    } else {
        json!({"allOf": [schema], "definitions": definitions})
    };
    jsonschema::options()
        .with_draft(Draft::Draft7)
        .should_validate_formats(false)
        .build(&document)
        .map_err(|error| SchemaError::invalid(error.to_string()))
}

#[cfg(test)]
#[path = "../tests/internal/validation_unit_tests.rs"]
mod tests;
