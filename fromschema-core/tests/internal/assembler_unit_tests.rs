use super::*;
use crate::canonical::Canonicalizer;
use crate::config::GenerationConfig;
use crate::formats::FormatRegistry;
use crate::validation::{compile_validator, ValidatorCache};
use fromschema_test_support::sample_many;

fn compiler_with(definitions: JsonObject, config: GenerationConfig) -> Compiler {
    let definitions = Arc::new(definitions);
    let validators = Arc::new(ValidatorCache::new(definitions.clone()));
    Compiler::new(
        config,
        definitions,
        Arc::new(Canonicalizer::new(validators)),
        FormatRegistry::new(),
    )
}

fn compiler() -> Compiler {
    compiler_with(JsonObject::new(), GenerationConfig::default())
}

fn draws(compiler: &Compiler, schema: &JsonValue, count: usize) -> Vec<JsonValue> {
    let strategy = compiler
        .assemble(schema, 0)
        .expect("assembles")
        .unwrap_or_else(|| panic!("{schema} is empty"));
    sample_many(strategy, count)
}

fn assert_all_valid(schema: &JsonValue, definitions: &JsonObject, values: &[JsonValue]) {
    let validator = compile_validator(schema, definitions).expect("validator");
    for value in values {
        assert!(validator.is_valid(value), "{value} does not match {schema}");
    }
}

#[test]
fn falsey_is_empty_and_truthy_is_anything() {
    let compiler = compiler();
    assert!(compiler.assemble(&json!({"not": {}}), 0).expect("assembles").is_none());
    assert!(compiler.assemble(&json!(false), 0).expect("assembles").is_none());
    assert_eq!(draws(&compiler, &json!({}), 20).len(), 20);
}

#[test]
fn enum_and_const_draw_their_values() {
    let compiler = compiler();
    for value in draws(&compiler, &json!({"enum": [1, "two", null]}), 50) {
        assert!([json!(1), json!("two"), json!(null)].contains(&value));
    }
    for value in draws(&compiler, &json!({"const": {"a": [1]}}), 5) {
        assert_eq!(value, json!({"a": [1]}));
    }
}

#[test]
fn multiple_types_all_get_drawn() {
    let compiler = compiler();
    let values = draws(&compiler, &json!({"type": ["null", "string", "integer"]}), 200);
    assert!(values.iter().any(JsonValue::is_null));
    assert!(values.iter().any(JsonValue::is_string));
    assert!(values.iter().any(JsonValue::is_i64));
    let nulls = values.iter().filter(|value| value.is_null()).count();
    assert!(nulls < 100, "null drawn {nulls} times out of 200");
}

#[test]
fn weighted_union_of_nothing_is_empty() {
    assert!(weighted_union(Vec::new()).is_none());
    let single = weighted_union(vec![(1, Just(json!(1)).boxed())]).expect("one branch");
    assert_eq!(sample_many(single, 3), vec![json!(1); 3]);
}

#[test]
fn any_of_branches_are_each_valid() {
    let compiler = compiler();
    let schema = json!({
        "anyOf": [
            {"type": "integer", "minimum": 10},
            {"type": "string", "maxLength": 2}
        ]
    });
    let values = draws(&compiler, &schema, 100);
    assert!(values.iter().any(JsonValue::is_string));
    assert!(values.iter().any(JsonValue::is_i64));
    assert_all_valid(&schema, &JsonObject::new(), &values);
}

#[test]
fn one_of_values_match_exactly_one_branch() {
    let compiler = compiler();
    let schema = json!({
        "oneOf": [
            {"type": "integer", "multipleOf": 2},
            {"type": "integer", "multipleOf": 3}
        ]
    });
    let values = draws(&compiler, &schema, 100);
    for value in &values {
        let n = value.as_i64().expect("integer");
        assert!((n % 2 == 0) != (n % 3 == 0), "{n}");
    }
    assert!(compiler
        .filter_stats()
        .iter()
        .any(|stats| stats.report().label.contains("oneOf")));
}

#[test]
fn not_is_a_residual_filter() {
    let compiler = compiler();
    let schema = json!({"type": "integer", "minimum": 0, "maximum": 9, "not": {"multipleOf": 2}});
    for value in draws(&compiler, &schema, 100) {
        assert_eq!(value.as_i64().expect("integer") % 2, 1);
    }
}

#[test]
fn all_of_members_that_resist_merging_are_filters() {
    let compiler = compiler();
    let schema = json!({
        "type": "array",
        "maxItems": 4,
        "items": {"type": "integer", "minimum": 0, "maximum": 3},
        "allOf": [{"contains": {"const": 1}}]
    });
    let values = draws(&compiler, &schema, 50);
    assert_all_valid(&schema, &JsonObject::new(), &values);
}

#[test]
fn recursive_definitions_terminate() {
    let definitions = json!({
        "node": {
            "type": "object",
            "properties": {"value": {"type": "integer"}, "next": {"$ref": "#/definitions/node"}},
            "additionalProperties": {"not": {}}
        }
    });
    let definitions = definitions.as_object().cloned().expect("object");
    let compiler = compiler_with(definitions.clone(), GenerationConfig::default());
    let root = json!({"$ref": "#/definitions/node"});
    let values = draws(&compiler, &root, 100);
    assert_all_valid(&root, &definitions, &values);
    assert!(values.iter().any(|value| value.get("next").is_some()));
}

#[test]
fn unbounded_recursion_records_where_it_was_cut() {
    let definitions = json!({
        "chain": {
            "type": "object",
            "required": ["next"],
            "properties": {"next": {"$ref": "#/definitions/chain"}}
        }
    });
    let definitions = definitions.as_object().cloned().expect("object");
    let compiler = compiler_with(definitions, GenerationConfig::default());
    let strategy = compiler
        .assemble(&json!({"$ref": "#/definitions/chain"}), 0)
        .expect("assembles");
    assert!(strategy.is_none());
    assert_eq!(compiler.recursion_cut(), Some("#/definitions/chain".to_string()));
}

#[test]
fn recursion_depth_is_configurable() {
    let definitions = json!({
        "tree": {
            "type": "array",
            "maxItems": 2,
            "items": {"$ref": "#/definitions/tree"}
        }
    });
    let definitions = definitions.as_object().cloned().expect("object");
    let config = GenerationConfig {
        max_recursion_depth: 2,
        ..GenerationConfig::default()
    };
    let compiler = compiler_with(definitions, config);
    fn depth(value: &JsonValue) -> usize {
        match value {
            JsonValue::Array(items) => 1 + items.iter().map(depth).max().unwrap_or(0),
            _ => 0,
        }
    }
    for value in draws(&compiler, &json!({"$ref": "#/definitions/tree"}), 100) {
        assert!(depth(&value) <= 2, "{value}");
    }
}

#[test]
fn missing_definition_is_an_unresolvable_reference() {
    let compiler = compiler();
    let error = compiler
        .assemble(&json!({"$ref": "#/definitions/ghost"}), 0)
        .err()
        .expect("missing target");
    assert_eq!(error.reference_kind(), Some(ReferenceErrorKind::MissingTarget));
}
