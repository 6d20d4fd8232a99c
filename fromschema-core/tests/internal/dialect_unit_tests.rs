use super::*;
use serde_json::json;

#[test]
fn detect_reads_known_schema_uris() {
    assert_eq!(detect(&json!({})).expect("draft"), Dialect::Draft7);
    assert_eq!(
        detect(&json!({"$schema": "http://json-schema.org/draft-04/schema#"})).expect("draft"),
        Dialect::Draft4
    );
    assert_eq!(
        detect(&json!({"$schema": DRAFT202012})).expect("draft"),
        Dialect::Draft202012
    );
    assert_eq!(
        detect(&json!({"$schema": "http://example.com/custom"})).expect("draft"),
        Dialect::Draft7
    );
}

#[test]
fn detect_rejects_draft3() {
    let error = detect(&json!({"$schema": "http://json-schema.org/draft-03/schema#"}))
        .expect_err("draft-03");
    assert!(matches!(error, SchemaError::UnsupportedDraft(_)));
}

#[test]
fn check_schema_rejects_invalid_keyword_values() {
    let error = check_schema(&json!({"type": "string", "minLength": -1}), Dialect::Draft7)
        .expect_err("invalid");
    assert!(error.is_invalid_argument());
    assert!(check_schema(&json!({"type": "string", "minLength": 1}), Dialect::Draft7).is_ok());
}

#[test]
fn check_schema_accepts_draft4_bounds_without_schema_uri() {
    let schema = json!({"type": "number", "minimum": 0, "exclusiveMinimum": true});
    assert!(check_schema(&schema, Dialect::Draft7).is_ok());
}

#[test]
fn boolean_exclusive_bounds_become_numeric() {
    let schema = json!({
        "minimum": 1, "exclusiveMinimum": true,
        "maximum": 5, "exclusiveMaximum": false
    });
    assert_eq!(
        to_draft7_vocabulary(&schema, Dialect::Draft4).expect("normalized"),
        json!({"exclusiveMinimum": 1, "maximum": 5})
    );
}

#[test]
fn prefix_items_become_tuple_items() {
    let schema = json!({
        "prefixItems": [{"type": "string"}],
        "items": {"type": "integer"},
        "properties": {"nested": {"prefixItems": [true]}}
    });
    assert_eq!(
        to_draft7_vocabulary(&schema, Dialect::Draft202012).expect("normalized"),
        json!({
            "items": [{"type": "string"}],
            "additionalItems": {"type": "integer"},
            "properties": {"nested": {"items": [true]}}
        })
    );
}

#[test]
fn dependent_keywords_become_dependencies() {
    let schema = json!({
        "dependentRequired": {"a": ["b"]},
        "dependentSchemas": {"c": {"required": ["d"]}}
    });
    assert_eq!(
        to_draft7_vocabulary(&schema, Dialect::Draft201909).expect("normalized"),
        json!({"dependencies": {"a": ["b"], "c": {"required": ["d"]}}})
    );
}

#[test]
fn unevaluated_keywords_are_rejected() {
    let schema = json!({"anyOf": [{"unevaluatedProperties": false}]});
    let error = to_draft7_vocabulary(&schema, Dialect::Draft202012).expect_err("unsupported");
    assert!(error.to_string().contains("unevaluatedProperties"));
}

#[test]
fn enum_values_are_left_alone() {
    let schema = json!({"enum": [{"prefixItems": 1, "exclusiveMinimum": true}]});
    assert_eq!(
        to_draft7_vocabulary(&schema, Dialect::Draft202012).expect("normalized"),
        schema
    );
}
