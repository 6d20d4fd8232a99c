use super::*;
use serde_json::json;

fn object(value: JsonValue) -> JsonObject {
    value.as_object().cloned().expect("schema object")
}

#[test]
fn missing_type_admits_everything() {
    let types = TypeSet::from_schema(&object(json!({}))).expect("types");
    assert!(types.is_all());
    assert_eq!(types.to_value(), None);
}

#[test]
fn number_subsumes_integer() {
    let types = TypeSet::from_schema(&object(json!({"type": ["integer", "number"]})))
        .expect("types");
    assert!(types.contains(JsonType::Number));
    assert!(!types.contains(JsonType::Integer));
    assert!(types.allows(JsonType::Integer));
    assert_eq!(types.to_value(), Some(json!("number")));
}

#[test]
fn unknown_type_name_is_rejected() {
    let error = TypeSet::from_schema(&object(json!({"type": "float"}))).expect_err("bad type");
    assert!(error.to_string().contains("unknown type name 'float'"));
}

#[test]
fn intersect_keeps_integer_against_number() {
    let left = TypeSet::of(&[JsonType::Number, JsonType::String]);
    let right = TypeSet::of(&[JsonType::Integer, JsonType::Null]);
    let both = left.intersect(right);
    assert_eq!(both.iter().collect::<Vec<_>>(), vec![JsonType::Integer]);
}

#[test]
fn to_value_lists_types_in_canonical_order() {
    let types = TypeSet::of(&[JsonType::Object, JsonType::Null, JsonType::String]);
    assert_eq!(types.to_value(), Some(json!(["null", "string", "object"])));
    assert_eq!(types.len(), 3);
}

#[test]
fn keyword_tables_classify_keywords() {
    assert!(is_constraint_keyword("minLength"));
    assert!(is_constraint_keyword("dependencies"));
    assert!(!is_constraint_keyword("title"));
    assert!(is_annotation_keyword("title"));
    assert!(!is_constraint_keyword("x-custom"));
}
