use super::*;
use fromschema_test_support::sample_many;
use serde_json::json;

fn bounds(schema: JsonValue) -> NumericBounds {
    NumericBounds::from_schema(schema.as_object().expect("schema object"))
}

#[test]
fn next_up_and_down_step_one_ulp() {
    assert!(next_up(1.0) > 1.0);
    assert!(next_down(1.0) < 1.0);
    assert_eq!(next_up(0.0), f64::from_bits(1));
    assert_eq!(next_down(next_up(-2.5)), -2.5);
}

#[test]
fn has_multiple_in_detects_empty_ranges() {
    assert!(has_multiple_in(1.0, 10.0, 3.0));
    assert!(!has_multiple_in(1.0, 2.0, 3.0));
    assert!(!has_multiple_in(-1.0, -1.0, 0.000_976_562_500_000_000_2));
}

#[test]
fn integer_range_handles_exclusive_bounds() {
    let range = bounds(json!({"exclusiveMinimum": 1.5, "maximum": 4.9})).integer_range();
    assert_eq!(range, Some((Some(2), Some(4))));
    let range = bounds(json!({"exclusiveMinimum": 2, "exclusiveMaximum": 5})).integer_range();
    assert_eq!(range, Some((Some(3), Some(4))));
}

#[test]
fn integer_range_past_i64_is_not_clamped() {
    assert_eq!(bounds(json!({"minimum": 1e20})).integer_range(), None);
    assert_eq!(bounds(json!({"maximum": -1e20})).integer_range(), None);
    assert_eq!(
        bounds(json!({"minimum": -1e20, "maximum": 1e20})).integer_range(),
        Some((None, None))
    );
    let (lo, hi) = bounds(json!({"exclusiveMinimum": 1e20, "exclusiveMaximum": 1e20})).integer_float_range();
    assert!(lo.zip(hi).is_some_and(|(lo, hi)| lo > hi));
}

#[test]
fn integers_past_i64_are_drawn_as_floats() {
    let strategy = integer_strategy(&bounds(json!({"minimum": 1e20}))).expect("non-empty");
    for value in sample_many(strategy, 50) {
        let value = value.as_f64().expect("number");
        assert!(value >= 1e20 && value.fract() == 0.0, "{value}");
    }
    let strategy = integer_strategy(&bounds(json!({"maximum": -1e20, "multipleOf": 2})))
        .expect("non-empty");
    for value in sample_many(strategy, 50) {
        let value = value.as_f64().expect("number");
        assert!(value <= -1e20 && value % 2.0 == 0.0, "{value}");
    }
    assert!(integer_strategy(&bounds(json!({"minimum": 1e20, "maximum": 1e19}))).is_none());
}

#[test]
fn multiples_follow_validator_arithmetic() {
    assert!(is_multiple_of(4.0, 2.0));
    assert!(!is_multiple_of(4.5, 2.0));
    assert!(is_multiple_of(0.5, 0.1));
    assert!(!is_multiple_of(82.300_000_000_000_01, 0.1));
    assert!(!is_multiple_of(f64::INFINITY, 0.1));
}

#[test]
fn decimal_steps_only_yield_exact_multiples() {
    let schema = json!({"minimum": 0, "maximum": 100, "multipleOf": 0.1});
    let strategy = number_strategy(&bounds(schema.clone())).expect("non-empty");
    let validator = jsonschema::draft7::new(&schema).expect("validator");
    for value in sample_many(strategy, 300) {
        assert!(validator.is_valid(&value), "{value} is not a multiple of 0.1");
    }
    let schema = json!({"minimum": -10, "maximum": 10, "multipleOf": 0.5});
    let strategy = integer_strategy(&bounds(schema.clone())).expect("non-empty");
    let validator = jsonschema::draft7::new(&json!({"type": "integer", "multipleOf": 0.5})).expect("validator");
    for value in sample_many(strategy, 100) {
        assert!(validator.is_valid(&value), "{value}");
    }
}

#[test]
fn integer_strategy_respects_bounds_and_step() {
    let strategy = integer_strategy(&bounds(json!({"minimum": -7, "maximum": 20, "multipleOf": 3})))
        .expect("non-empty");
    for value in sample_many(strategy, 64) {
        let value = value.as_i64().expect("integer");
        assert!((-7..=20).contains(&value));
        assert_eq!(value % 3, 0);
    }
}

#[test]
fn impossible_fractional_step_is_empty() {
    let schema = json!({"minimum": -1, "maximum": -1, "multipleOf": 0.000_976_562_500_000_000_2});
    assert!(integer_strategy(&bounds(schema.clone())).is_none());
    assert!(number_strategy(&bounds(schema)).is_none());
}

#[test]
fn inverted_bounds_are_empty() {
    assert!(integer_strategy(&bounds(json!({"minimum": 3, "maximum": 2}))).is_none());
    assert!(number_strategy(&bounds(json!({"exclusiveMinimum": 1, "exclusiveMaximum": 1}))).is_none());
}

#[test]
fn number_strategy_respects_exclusive_bounds() {
    let strategy = number_strategy(&bounds(json!({"exclusiveMinimum": 0, "maximum": 1})))
        .expect("non-empty");
    for value in sample_many(strategy, 64) {
        let value = value.as_f64().expect("number");
        assert!(value > 0.0 && value <= 1.0, "{value}");
    }
}

#[test]
fn number_strategy_with_fractional_step() {
    let strategy = number_strategy(&bounds(json!({"minimum": 0, "maximum": 2, "multipleOf": 0.5})))
        .expect("non-empty");
    for value in sample_many(strategy, 32) {
        let value = value.as_f64().expect("number");
        assert!((0.0..=2.0).contains(&value));
        assert_eq!((value / 0.5).fract(), 0.0);
    }
}
