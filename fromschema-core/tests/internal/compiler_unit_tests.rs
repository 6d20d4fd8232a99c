use super::*;
use crate::canonical::json::all_unique;
use fromschema_test_support::sample_many;
use serde_json::json;

fn compiler() -> Compiler {
    let validators = Arc::new(ValidatorCache::new(Arc::new(JsonObject::new())));
    Compiler::new(
        GenerationConfig::default(),
        Arc::new(JsonObject::new()),
        Arc::new(Canonicalizer::new(validators)),
        FormatRegistry::new(),
    )
}

fn compiled(ty: JsonType, schema: JsonValue) -> Option<ValueStrategy> {
    compiler()
        .compile_type(ty, schema.as_object().expect("schema object"), 0)
        .expect("compiles")
}

fn values(ty: JsonType, schema: JsonValue, count: usize) -> Vec<JsonValue> {
    let strategy = compiled(ty, schema.clone()).unwrap_or_else(|| panic!("{schema} is empty"));
    sample_many(strategy, count)
}

#[test]
fn impossible_multiplier_compiles_to_nothing() {
    let schema = json!({"type": "integer", "minimum": -1, "maximum": -1, "multipleOf": 0.000_976_562_500_000_000_2});
    assert!(compiled(JsonType::Integer, schema.clone()).is_none());
    assert!(compiled(JsonType::Number, schema).is_none());
}

#[test]
fn numbers_stay_inside_bounds() {
    for value in values(JsonType::Number, json!({"minimum": -2.5, "exclusiveMaximum": 4}), 100) {
        let value = value.as_f64().expect("number");
        assert!((-2.5..4.0).contains(&value), "{value}");
    }
}

#[test]
fn string_lengths_count_characters() {
    for value in values(JsonType::String, json!({"minLength": 2, "maxLength": 5}), 100) {
        let len = value.as_str().expect("string").chars().count();
        assert!((2..=5).contains(&len), "{value}");
    }
}

#[test]
fn strings_match_their_pattern() {
    let schema = json!({"pattern": "^[a-c]{1,5}$", "maxLength": 3});
    for value in values(JsonType::String, schema, 100) {
        let text = value.as_str().expect("string");
        assert!(!text.is_empty() && text.len() <= 3, "{text}");
        assert!(text.chars().all(|ch| ('a'..='c').contains(&ch)), "{text}");
    }
}

#[test]
fn invalid_pattern_is_a_schema_error() {
    let schema = json!({"pattern": "(unclosed"});
    let error = compiler()
        .compile_type(JsonType::String, schema.as_object().expect("object"), 0)
        .err()
        .expect("invalid pattern");
    assert!(matches!(error, SchemaError::InvalidSchema(_)));
}

#[test]
fn formats_combine_with_length_limits() {
    for value in values(JsonType::String, json!({"format": "ipv4", "minLength": 12}), 50) {
        let text = value.as_str().expect("string");
        assert!(text.len() >= 12);
        text.parse::<std::net::Ipv4Addr>().expect("ipv4");
    }
}

#[test]
fn unknown_format_only_constrains_length() {
    for value in values(JsonType::String, json!({"format": "no-such-format", "maxLength": 4}), 50) {
        assert!(value.as_str().expect("string").chars().count() <= 4);
    }
}

#[test]
fn unique_arrays_have_distinct_numbers() {
    let schema = json!({
        "items": {"type": "integer", "minimum": 0, "maximum": 3},
        "minItems": 2,
        "uniqueItems": true
    });
    for value in values(JsonType::Array, schema, 100) {
        let items = value.as_array().expect("array");
        assert!((2..=4).contains(&items.len()), "{value}");
        assert!(all_unique(items), "{value}");
    }
}

#[test]
fn contains_always_has_a_witness() {
    let schema = json!({"items": {"type": "integer"}, "contains": {"const": 7}, "maxItems": 3});
    for value in values(JsonType::Array, schema, 100) {
        let items = value.as_array().expect("array");
        assert!(items.len() <= 3);
        assert!(items.contains(&json!(7)), "{value}");
    }
}

#[test]
fn tuples_follow_positions() {
    let schema = json!({
        "items": [{"type": "string"}, {"type": "integer"}],
        "additionalItems": {"not": {}}
    });
    for value in values(JsonType::Array, schema, 100) {
        let items = value.as_array().expect("array");
        assert!(items.len() <= 2);
        if let Some(first) = items.first() {
            assert!(first.is_string());
        }
        if let Some(second) = items.get(1) {
            assert!(second.is_i64() || second.is_u64());
        }
    }
}

#[test]
fn empty_item_schema_allows_only_empty_arrays() {
    let schema = json!({"items": {"not": {}}});
    for value in values(JsonType::Array, schema, 10) {
        assert_eq!(value, json!([]));
    }
    assert!(compiled(JsonType::Array, json!({"items": {"not": {}}, "minItems": 1})).is_none());
}

#[test]
fn single_optional_property_is_sometimes_present() {
    let schema = json!({"properties": {"key": {"type": "string"}}, "additionalProperties": {"not": {}}});
    let objects = values(JsonType::Object, schema, 100);
    assert!(objects.iter().any(|object| object.get("key").is_some_and(JsonValue::is_string)));
    for object in &objects {
        let map = object.as_object().expect("object");
        assert!(map.keys().all(|key| key == "key"), "{object}");
    }
}

#[test]
fn required_properties_are_always_present() {
    let schema = json!({
        "properties": {"id": {"type": "integer"}, "name": {"type": "string"}},
        "required": ["id"],
        "maxProperties": 3
    });
    for object in values(JsonType::Object, schema, 100) {
        let map = object.as_object().expect("object");
        assert!(map.get("id").is_some_and(JsonValue::is_number), "{object}");
        assert!(map.len() <= 3);
    }
}

#[test]
fn required_properties_survive_a_tight_max_properties() {
    let schema = json!({
        "properties": {"a": {"type": "integer"}},
        "required": ["b", "c"],
        "maxProperties": 2
    });
    for object in values(JsonType::Object, schema, 100) {
        let map = object.as_object().expect("object");
        assert!(map.contains_key("b") && map.contains_key("c"), "{object}");
        assert_eq!(map.len(), 2, "{object}");
    }
    let schema = json!({"required": ["a", "b", "c"], "maxProperties": 2});
    assert!(compiled(JsonType::Object, schema).is_none());
}

#[test]
fn huge_size_minimums_compile() {
    let huge = json!(u64::MAX);
    assert!(compiled(JsonType::Array, json!({"minItems": huge})).is_some());
    assert!(compiled(JsonType::String, json!({"minLength": huge})).is_some());
    assert!(compiled(JsonType::Object, json!({"minProperties": huge})).is_some());
    assert!(compiled(JsonType::Array, json!({"minItems": huge, "maxItems": 1})).is_none());
}

#[test]
fn list_dependencies_pull_in_their_targets() {
    let schema = json!({
        "properties": {"card": {"type": "string"}, "billing": {"type": "string"}},
        "dependencies": {"card": ["billing"]},
        "additionalProperties": {"not": {}}
    });
    let objects = values(JsonType::Object, schema, 100);
    assert!(objects.iter().any(|object| object.get("card").is_some()));
    for object in objects {
        if object.get("card").is_some() {
            assert!(object.get("billing").is_some(), "{object}");
        }
    }
}

#[test]
fn max_properties_zero_is_the_empty_object() {
    for object in values(JsonType::Object, json!({"maxProperties": 0}), 10) {
        assert_eq!(object, json!({}));
    }
}

#[test]
fn required_name_rejected_by_property_names_is_unsatisfiable() {
    let schema = json!({"required": ["long-name"], "propertyNames": {"maxLength": 3}});
    assert!(compiled(JsonType::Object, schema).is_none());
}

#[test]
fn additional_keys_respect_property_names() {
    let schema = json!({"propertyNames": {"pattern": "^x"}, "minProperties": 1});
    for object in values(JsonType::Object, schema, 50) {
        let map = object.as_object().expect("object");
        assert!(!map.is_empty());
        assert!(map.keys().all(|key| key.starts_with('x')), "{object}");
    }
}

#[test]
fn residual_filters_are_recorded() {
    let compiler = compiler();
    let schema = json!({"pattern": "@", "format": "email"});
    let strategy = compiler
        .compile_type(JsonType::String, schema.as_object().expect("object"), 0)
        .expect("compiles")
        .expect("non-empty");
    let _ = sample_many(strategy, 5);
    let stats = compiler.filter_stats();
    assert_eq!(stats.len(), 1);
    let report = stats[0].report();
    assert_eq!(report.attempts, 5);
    assert_eq!(report.rejections, 0);
}
