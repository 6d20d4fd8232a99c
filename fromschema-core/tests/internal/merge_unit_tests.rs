use std::sync::Arc;

use super::*;
use crate::validation::ValidatorCache;

fn merged(schemas: &[JsonValue]) -> Option<JsonValue> {
    let canonicalizer =
        Canonicalizer::new(Arc::new(ValidatorCache::new(Arc::new(JsonObject::new()))));
    canonicalizer.merged(schemas).expect("merge")
}

#[test]
fn upper_bound_counts_finite_schemas() {
    assert_eq!(upper_bound_instances(&falsey()), Some(0));
    assert_eq!(upper_bound_instances(&json!({"const": 1})), Some(1));
    assert_eq!(upper_bound_instances(&json!({"enum": [1, 2, 3]})), Some(3));
    assert_eq!(upper_bound_instances(&truthy()), None);
}

#[test]
fn empty_merge_is_truthy() {
    assert_eq!(merged(&[]), Some(truthy()));
}

#[test]
fn bounds_take_the_tighter_side() {
    assert_eq!(
        merged(&[json!({"minimum": 1}), json!({"minimum": 3, "maximum": 5})]),
        Some(json!({"minimum": 3, "maximum": 5}))
    );
    assert_eq!(
        merged(&[
            json!({"type": "string", "maxLength": 9}),
            json!({"type": "string", "maxLength": 4})
        ]),
        Some(json!({"type": "string", "maxLength": 4}))
    );
}

#[test]
fn disjoint_types_merge_to_falsey() {
    assert_eq!(
        merged(&[json!({"type": "string"}), json!({"type": "integer"})]),
        Some(falsey())
    );
}

#[test]
fn integer_steps_merge_to_least_common_multiple() {
    assert_eq!(
        merged(&[
            json!({"type": "integer", "multipleOf": 4}),
            json!({"type": "integer", "multipleOf": 6})
        ]),
        Some(json!({"type": "integer", "multipleOf": 12}))
    );
}

#[test]
fn incompatible_fractional_steps_are_not_merged() {
    assert_eq!(
        merged(&[json!({"multipleOf": 0.3}), json!({"multipleOf": 0.7})]),
        None
    );
}

#[test]
fn enums_are_filtered_by_the_other_side() {
    assert_eq!(
        merged(&[
            json!({"enum": [1, "a", 3]}),
            json!({"type": "integer", "minimum": 2})
        ]),
        Some(json!({"const": 3}))
    );
}

#[test]
fn property_schemas_are_merged_by_name() {
    assert_eq!(
        merged(&[
            json!({"properties": {"a": {"type": "integer"}}}),
            json!({"properties": {"a": {"minimum": 1}}})
        ]),
        Some(json!({"properties": {"a": {"type": "integer", "minimum": 1}}}))
    );
}

#[test]
fn required_names_are_united() {
    assert_eq!(
        merged(&[
            json!({"type": "object", "required": ["b"]}),
            json!({"type": "object", "required": ["a"]})
        ]),
        Some(json!({"type": "object", "required": ["a", "b"], "minProperties": 2}))
    );
}

#[test]
fn recursion_markers_are_not_merged() {
    assert_eq!(
        merged(&[json!({"$ref": "#/definitions/node"}), json!({"type": "object"})]),
        None
    );
}

#[test]
fn false_member_short_circuits() {
    assert_eq!(
        merged(&[json!({"type": "string"}), json!(false)]),
        Some(falsey())
    );
}

#[test]
fn multiple_of_helpers() {
    assert_eq!(gcd(12, 18), 6);
    assert_eq!(merge_multiple_of(&json!(0.5), &json!(1.5)), Some(json!(1.5)));
    assert_eq!(merge_multiple_of(&json!(3), &json!(5)), Some(json!(15)));
}
