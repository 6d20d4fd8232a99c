//! Draft detection and normalization of every supported draft to the Draft 7
//! vocabulary used by canonical schemas.

use serde_json::{json, Value as JsonValue};

use crate::canonical::keywords::{SCHEMA_KEYWORDS, SCHEMA_LIST_KEYWORDS};
use crate::error::SchemaError;
use crate::JsonObject;

pub const DRAFT202012: &str = "https://json-schema.org/draft/2020-12/schema";
pub const DRAFT201909: &str = "https://json-schema.org/draft/2019-09/schema";
pub const DRAFT7_HTTP: &str = "http://json-schema.org/draft-07/schema";
pub const DRAFT7_HTTPS: &str = "https://json-schema.org/draft-07/schema";
pub const DRAFT6_HTTP: &str = "http://json-schema.org/draft-06/schema";
pub const DRAFT6_HTTPS: &str = "https://json-schema.org/draft-06/schema";
pub const DRAFT4_HTTP: &str = "http://json-schema.org/draft-04/schema";
pub const DRAFT4_HTTPS: &str = "https://json-schema.org/draft-04/schema";
pub const DRAFT3_HTTP: &str = "http://json-schema.org/draft-03/schema";
pub const DRAFT3_HTTPS: &str = "https://json-schema.org/draft-03/schema";

const UNSUPPORTED_KEYWORDS: &[&str] = &[
    "unevaluatedProperties",
    "unevaluatedItems",
    "$recursiveRef",
    "$dynamicRef",
];

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Dialect {
    Draft4,
    Draft6,
    Draft7,
    Draft201909,
    Draft202012,
}

impl Dialect {
    /// The metaschema URI, in the spelling the draft itself uses.
    pub fn uri(self) -> &'static str {
        match self {
            Dialect::Draft4 => "http://json-schema.org/draft-04/schema#",
            Dialect::Draft6 => "http://json-schema.org/draft-06/schema#",
            Dialect::Draft7 => "http://json-schema.org/draft-07/schema#",
            Dialect::Draft201909 => DRAFT201909,
            Dialect::Draft202012 => DRAFT202012,
        }
    }

    fn uses_prefix_items(self) -> bool {
        self == Dialect::Draft202012
    }

    /// Before 2019-09, keywords next to `$ref` are ignored.
    pub(crate) fn applies_ref_siblings(self) -> bool {
        matches!(self, Dialect::Draft201909 | Dialect::Draft202012)
    }

    /// The keyword that declares a base URI.
    pub(crate) fn id_keyword(self) -> &'static str {
        if self == Dialect::Draft4 {
            "id"
        } else {
            "$id"
        }
    }
}

pub(crate) fn normalize_schema_id(value: &str) -> &str {
    let trimmed = value.trim();
    trimmed.strip_suffix('#').unwrap_or(trimmed)
}

/// Reads `$schema` from the document root. A missing or unknown URI means Draft 7.
pub fn detect(schema: &JsonValue) -> Result<Dialect, SchemaError> {
    let Some(uri) = schema.get("$schema").and_then(JsonValue::as_str) else {
        return Ok(Dialect::Draft7);
    };
    match normalize_schema_id(uri) {
        DRAFT202012 => Ok(Dialect::Draft202012),
        DRAFT201909 => Ok(Dialect::Draft201909),
        DRAFT7_HTTP | DRAFT7_HTTPS => Ok(Dialect::Draft7),
        DRAFT6_HTTP | DRAFT6_HTTPS => Ok(Dialect::Draft6),
        DRAFT4_HTTP | DRAFT4_HTTPS => Ok(Dialect::Draft4),
        DRAFT3_HTTP | DRAFT3_HTTPS => Err(SchemaError::UnsupportedDraft(
            "draft-03 schemas are not supported".to_string(),
        )),
        other => {
            log::warn!("unknown $schema '{other}', treating the document as draft-07");
            Ok(Dialect::Draft7)
        }
    }
}

/// Validates the document against the metaschema of its draft.
///
/// Without an explicit `$schema`, a document that is valid under draft-04
/// (boolean exclusive bounds) is accepted as well.
pub fn check_schema(schema: &JsonValue, dialect: Dialect) -> Result<(), SchemaError> {
    let JsonValue::Object(map) = schema else {
        return match schema {
            JsonValue::Bool(_) => Ok(()),
            other => Err(SchemaError::invalid(format!(
                "schema must be an object or boolean, got {other}"
            ))),
        };
    };
    let explicit = map.get("$schema").and_then(JsonValue::as_str).is_some();
    let first = meta_validate(map, dialect);
    match first {
        Ok(()) => Ok(()),
        Err(error) if explicit => Err(error),
        Err(error) => meta_validate(map, Dialect::Draft4).map_err(|_| error),
    }
}

fn meta_validate(map: &JsonObject, dialect: Dialect) -> Result<(), SchemaError> {
    let mut document = map.clone();
    document.insert("$schema".to_string(), JsonValue::from(dialect.uri()));
    let document = JsonValue::Object(document);
    jsonschema::meta::validate(&document)
        .map_err(|error| SchemaError::invalid(error.to_string()))
}

/// Rewrites a schema, recursively, into Draft 7 vocabulary.
pub(crate) fn to_draft7_vocabulary(
    schema: &JsonValue,
    dialect: Dialect,
) -> Result<JsonValue, SchemaError> {
    let JsonValue::Object(map) = schema else {
        return Ok(schema.clone());
    };
    if let Some(keyword) = UNSUPPORTED_KEYWORDS
        .iter()
        .find(|keyword| map.contains_key(**keyword))
    {
        return Err(SchemaError::invalid(format!(
            "the '{keyword}' keyword is not supported"
        )));
    }
    let mut out = JsonObject::new();
    for (key, value) in map {
        let value = if SCHEMA_KEYWORDS.contains(&key.as_str())
            || SCHEMA_LIST_KEYWORDS.contains(&key.as_str())
            || key == "prefixItems"
        {
            match value {
                JsonValue::Array(items) => JsonValue::Array(
                    items
                        .iter()
                        .map(|item| to_draft7_vocabulary(item, dialect))
                        .collect::<Result<_, _>>()?,
                ),
                other => to_draft7_vocabulary(other, dialect)?,
            }
        } else if is_schema_map(key) {
            match value {
                JsonValue::Object(entries) => JsonValue::Object(
                    entries
                        .iter()
                        .map(|(name, item)| Ok((name.clone(), to_draft7_vocabulary(item, dialect)?)))
                        .collect::<Result<_, SchemaError>>()?,
                ),
                other => other.clone(),
            }
        } else {
            value.clone()
        };
        out.insert(key.clone(), value);
    }
    normalize_exclusive_bounds(&mut out);
    normalize_items(&mut out, dialect);
    normalize_dependencies(&mut out);
    Ok(JsonValue::Object(out))
}

fn is_schema_map(key: &str) -> bool {
    matches!(
        key,
        "properties"
            | "patternProperties"
            | "dependencies"
            | "dependentSchemas"
            | "definitions"
            | "$defs"
    )
}

/// Draft 4 spells exclusive bounds as booleans next to `minimum`/`maximum`.
fn normalize_exclusive_bounds(schema: &mut JsonObject) {
    for (exclusive, inclusive) in [
        ("exclusiveMinimum", "minimum"),
        ("exclusiveMaximum", "maximum"),
    ] {
        match schema.get(exclusive) {
            Some(JsonValue::Bool(true)) => {
                schema.remove(exclusive);
                if let Some(bound) = schema.remove(inclusive) {
                    schema.insert(exclusive.to_string(), bound);
                }
            }
            Some(JsonValue::Bool(false)) => {
                schema.remove(exclusive);
            }
            _ => {}
        }
    }
}

fn normalize_items(schema: &mut JsonObject, dialect: Dialect) {
    if let Some(prefix) = schema.remove("prefixItems") {
        match schema.remove("items") {
            Some(rest) => {
                schema.insert("additionalItems".to_string(), rest);
            }
            None => {
                schema.remove("additionalItems");
            }
        }
        schema.insert("items".to_string(), prefix);
    } else if dialect.uses_prefix_items() {
        schema.remove("additionalItems");
    }
}

fn normalize_dependencies(schema: &mut JsonObject) {
    let required = schema.remove("dependentRequired");
    let schemas = schema.remove("dependentSchemas");
    if required.is_none() && schemas.is_none() {
        return;
    }
    let mut dependencies = match schema.remove("dependencies") {
        Some(JsonValue::Object(existing)) => existing,
        _ => JsonObject::new(),
    };
    for source in [required, schemas].into_iter().flatten() {
        if let JsonValue::Object(entries) = source {
            for (name, value) in entries {
                let merged = match dependencies.get(&name) {
                    Some(existing) if existing != &value => json!({
                        "allOf": [dependency_schema(existing), dependency_schema(&value)]
                    }),
                    _ => value,
                };
                dependencies.insert(name, merged);
            }
        }
    }
    schema.insert("dependencies".to_string(), JsonValue::Object(dependencies));
}

/// A name-list dependency expressed as an equivalent schema.
fn dependency_schema(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Array(names) => {
            let mut schema = JsonObject::new();
            schema.insert("required".to_string(), JsonValue::Array(names.clone()));
            JsonValue::Object(schema)
        }
        other => other.clone(),
    }
}

#[cfg(test)]
#[path = "../tests/internal/dialect_unit_tests.rs"]
mod tests;
