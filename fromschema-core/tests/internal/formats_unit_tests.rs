use super::*;
use fromschema_test_support::{draw_error, sample_many};
use serde_json::json;

fn strings(name: &str, count: usize) -> Vec<String> {
    let strategy = builtin_format(name).unwrap_or_else(|| panic!("no built-in for {name}"));
    sample_many(strategy, count)
}

#[test]
fn date_time_values_parse_as_rfc3339() {
    for value in strings("date-time", 100) {
        chrono::DateTime::parse_from_rfc3339(&value)
            .unwrap_or_else(|error| panic!("{value} is not RFC 3339: {error}"));
    }
}

#[test]
fn full_dates_are_calendar_dates() {
    for value in strings("full-date", 100) {
        NaiveDate::parse_from_str(&value, "%Y-%m-%d")
            .unwrap_or_else(|error| panic!("{value} is not a date: {error}"));
    }
}

#[test]
fn time_offsets_are_zulu_or_numeric() {
    for value in strings("time-offset", 50) {
        assert!(
            value == "Z" || (value.len() == 6 && value[3..4] == *":"),
            "bad offset {value}"
        );
    }
}

#[test]
fn addresses_parse() {
    for value in strings("ipv4", 50) {
        value.parse::<Ipv4Addr>().expect("ipv4");
    }
    for value in strings("ipv6", 50) {
        value.parse::<Ipv6Addr>().expect("ipv6");
    }
    for value in strings("uuid", 50) {
        uuid::Uuid::parse_str(&value).expect("uuid");
    }
}

#[test]
fn regex_format_yields_compilable_patterns() {
    for value in strings("regex", 20) {
        regex::Regex::new(&value).expect("regex");
    }
}

#[test]
fn every_builtin_name_has_a_generator() {
    for name in builtin_format_names() {
        assert!(builtin_format(name).is_some(), "{name}");
        assert!(FormatRegistry::is_builtin(name));
    }
    assert!(builtin_format("not-a-format").is_none());
}

#[test]
fn builtin_names_cannot_be_overridden() {
    let registry = FormatRegistry::new().with_string_format("full-date", Just("x".to_string()));
    let error = registry.validate().expect_err("reserved");
    assert_eq!(
        error,
        SchemaError::InvalidFormat("cannot redefine the standard format 'full-date'".to_string())
    );
    assert!(error.is_invalid_argument());
}

#[test]
fn reserved_names_cannot_be_overridden() {
    let registry = FormatRegistry::new()
        .with_reserved_format("card-number")
        .with_string_format("card-number", Just("4111".to_string()));
    assert!(registry.is_reserved("card-number"));
    assert!(registry.validate().is_err());
}

#[test]
fn empty_format_name_is_rejected() {
    let registry = FormatRegistry::new().with_string_format("", Just("x".to_string()));
    assert!(matches!(registry.validate(), Err(SchemaError::InvalidFormat(_))));
}

#[test]
fn custom_formats_are_known_only_to_their_registry() {
    let registry = FormatRegistry::new().with_string_format("shouting", "[A-Z]{3}");
    assert!(registry.validate().is_ok());
    assert!(registry.is_known("shouting"));
    assert!(!FormatRegistry::new().is_known("shouting"));
    assert!(!FormatRegistry::is_builtin("shouting"));
    let strategy = registry.strategy_for("shouting").expect("custom");
    for value in sample_many(strategy, 20) {
        let text = value.as_str().expect("string");
        assert_eq!(text.len(), 3);
        assert!(text.chars().all(|ch| ch.is_ascii_uppercase()));
    }
    assert!(registry.strategy_for("whispering").is_none());
}

#[test]
fn non_string_custom_generator_fails_at_draw_time() {
    let registry = FormatRegistry::new().with_format("count", Just(json!(3)));
    assert!(registry.validate().is_ok());
    let strategy = registry.strategy_for("count").expect("custom");
    let message = draw_error(strategy);
    assert!(message.starts_with("invalid custom format"), "{message}");
    assert!(message.contains("'count'"));
}
