use serde_json::Value as JsonValue;

use crate::error::SchemaError;
use crate::JsonObject;

/// The seven JSON Schema instance types, in canonical order.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum JsonType {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

impl JsonType {
    pub const ALL: [JsonType; 7] = [
        JsonType::Null,
        JsonType::Boolean,
        JsonType::Integer,
        JsonType::Number,
        JsonType::String,
        JsonType::Array,
        JsonType::Object,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            JsonType::Null => "null",
            JsonType::Boolean => "boolean",
            JsonType::Integer => "integer",
            JsonType::Number => "number",
            JsonType::String => "string",
            JsonType::Array => "array",
            JsonType::Object => "object",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        JsonType::ALL.into_iter().find(|ty| ty.as_str() == name)
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }

    /// Keywords that only constrain instances of this type.
    pub(crate) fn keywords(self) -> &'static [&'static str] {
        match self {
            JsonType::Null | JsonType::Boolean => &[],
            JsonType::Integer | JsonType::Number => NUMERIC_KEYWORDS,
            JsonType::String => STRING_KEYWORDS,
            JsonType::Array => ARRAY_KEYWORDS,
            JsonType::Object => OBJECT_KEYWORDS,
        }
    }
}

pub(crate) const NUMERIC_KEYWORDS: &[&str] = &[
    "multipleOf",
    "maximum",
    "exclusiveMaximum",
    "minimum",
    "exclusiveMinimum",
];
pub(crate) const STRING_KEYWORDS: &[&str] = &["maxLength", "minLength", "pattern", "format"];
pub(crate) const ARRAY_KEYWORDS: &[&str] = &[
    "items",
    "additionalItems",
    "maxItems",
    "minItems",
    "uniqueItems",
    "contains",
];
pub(crate) const OBJECT_KEYWORDS: &[&str] = &[
    "maxProperties",
    "minProperties",
    "required",
    "properties",
    "patternProperties",
    "additionalProperties",
    "dependencies",
    "propertyNames",
];

/// Keywords whose value is a single subschema (or, for `items`, a list of them).
pub(crate) const SCHEMA_KEYWORDS: &[&str] = &[
    "items",
    "additionalItems",
    "contains",
    "additionalProperties",
    "propertyNames",
    "if",
    "then",
    "else",
    "not",
];
/// Keywords whose value is a list of subschemas.
pub(crate) const SCHEMA_LIST_KEYWORDS: &[&str] = &["allOf", "anyOf", "oneOf"];
/// Keywords whose value maps names to subschemas.
pub(crate) const SCHEMA_MAP_KEYWORDS: &[&str] = &["properties", "patternProperties", "dependencies"];

/// Keywords that carry no constraint on instances.
const ANNOTATION_KEYWORDS: &[&str] = &[
    "$schema",
    "$id",
    "id",
    "$anchor",
    "$comment",
    "$defs",
    "definitions",
    "$vocabulary",
    "$recursiveAnchor",
    "$dynamicAnchor",
    "title",
    "description",
    "default",
    "examples",
    "readOnly",
    "writeOnly",
    "deprecated",
    "contentMediaType",
    "contentEncoding",
    "contentSchema",
];

/// Keywords accepted in canonical form. Everything else is dropped.
pub(crate) fn is_constraint_keyword(keyword: &str) -> bool {
    keyword == "type"
        || keyword == "enum"
        || keyword == "const"
        || keyword == "$ref"
        || SCHEMA_KEYWORDS.contains(&keyword)
        || SCHEMA_LIST_KEYWORDS.contains(&keyword)
        || JsonType::ALL
            .iter()
            .any(|ty| ty.keywords().contains(&keyword))
}

pub(crate) fn is_annotation_keyword(keyword: &str) -> bool {
    ANNOTATION_KEYWORDS.contains(&keyword)
}

/// The set of types a schema admits.
///
/// `number` subsumes `integer`, so the set never holds both.
#[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
pub struct TypeSet(u8);

impl TypeSet {
    pub const EMPTY: TypeSet = TypeSet(0);

    pub fn all() -> Self {
        TypeSet::EMPTY.with(JsonType::ALL.iter().copied())
    }

    pub fn of(types: &[JsonType]) -> Self {
        TypeSet::EMPTY.with(types.iter().copied())
    }

    fn with(mut self, types: impl IntoIterator<Item = JsonType>) -> Self {
        for ty in types {
            self.0 |= ty.bit();
        }
        self.normalized()
    }

    fn normalized(self) -> Self {
        if self.0 & JsonType::Number.bit() != 0 {
            TypeSet(self.0 & !JsonType::Integer.bit())
        } else {
            self
        }
    }

    /// Reads the `type` keyword. A missing keyword admits every type.
    pub fn from_schema(schema: &JsonObject) -> Result<Self, SchemaError> {
        let Some(value) = schema.get("type") else {
            return Ok(TypeSet::all());
        };
        let names: Vec<&JsonValue> = match value {
            JsonValue::Array(items) => items.iter().collect(),
            other => vec![other],
        };
        let mut types = TypeSet::EMPTY;
        for name in names {
            let name = name
                .as_str()
                .ok_or_else(|| SchemaError::invalid(format!("type must be a string, got {name}")))?;
            let ty = JsonType::parse(name)
                .ok_or_else(|| SchemaError::invalid(format!("unknown type name '{name}'")))?;
            types.0 |= ty.bit();
        }
        Ok(types.normalized())
    }

    pub fn contains(self, ty: JsonType) -> bool {
        self.0 & ty.bit() != 0
    }

    /// True when instances of `ty` may satisfy the set.
    pub fn allows(self, ty: JsonType) -> bool {
        self.contains(ty) || (ty == JsonType::Integer && self.contains(JsonType::Number))
    }

    pub fn insert(&mut self, ty: JsonType) {
        self.0 |= ty.bit();
        *self = self.normalized();
    }

    pub fn remove(&mut self, ty: JsonType) {
        self.0 &= !ty.bit();
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn is_all(self) -> bool {
        self == TypeSet::all()
    }

    pub fn iter(self) -> impl Iterator<Item = JsonType> {
        JsonType::ALL.into_iter().filter(move |ty| self.contains(*ty))
    }

    pub fn len(self) -> usize {
        self.iter().count()
    }

    pub fn union(self, other: TypeSet) -> TypeSet {
        TypeSet(self.0 | other.0).normalized()
    }

    /// Intersection that keeps `integer` when one side says `number`.
    pub fn intersect(self, other: TypeSet) -> TypeSet {
        let mut out = TypeSet(self.0 & other.0);
        if self.contains(JsonType::Number) && other.contains(JsonType::Integer)
            || self.contains(JsonType::Integer) && other.contains(JsonType::Number)
        {
            out.0 |= JsonType::Integer.bit();
        }
        out.normalized()
    }

    /// The `type` keyword value, or `None` when every type is admitted.
    pub fn to_value(self) -> Option<JsonValue> {
        if self.is_all() {
            return None;
        }
        let names: Vec<JsonValue> = self.iter().map(|ty| JsonValue::from(ty.as_str())).collect();
        if names.len() == 1 {
            names.into_iter().next()
        } else {
            Some(JsonValue::Array(names))
        }
    }
}

impl std::fmt::Debug for TypeSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter().map(JsonType::as_str)).finish()
    }
}

#[cfg(test)]
#[path = "../../tests/internal/keywords_unit_tests.rs"]
mod tests;
