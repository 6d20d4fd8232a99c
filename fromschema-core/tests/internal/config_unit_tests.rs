use super::*;
use serde_json::json;

#[test]
fn default_toml_matches_default_config() {
    let parsed = GenerationConfig::from_toml_str(default_config_toml()).expect("default config");
    assert_eq!(parsed, GenerationConfig::default());
}

#[test]
fn partial_toml_keeps_other_defaults() {
    let config = GenerationConfig::from_toml_str("max_recursion_depth = 2\nvalidate_schema = false\n")
        .expect("config");
    assert_eq!(config.max_recursion_depth, 2);
    assert!(!config.validate_schema);
    assert_eq!(config.max_filter_attempts, GenerationConfig::default().max_filter_attempts);
}

#[test]
fn unknown_keys_are_rejected() {
    let error = GenerationConfig::from_toml_str("max_depth = 2\n").expect_err("unknown key");
    assert!(matches!(error, SchemaError::InvalidConfig(_)));
    assert!(error.to_string().contains("max_depth"));
}

#[test]
fn zero_filter_budget_is_rejected() {
    let error = GenerationConfig::from_json_str(r#"{"max_filter_attempts": 0}"#)
        .expect_err("zero budget");
    assert_eq!(
        error,
        SchemaError::InvalidConfig("max_filter_attempts must be at least 1".to_string())
    );
}

#[test]
fn json_config_parses() {
    let config = GenerationConfig::from_json_str(r#"{"max_collection_size": 3, "max_string_length": 4}"#)
        .expect("config");
    assert_eq!(config.max_collection_size, 3);
    assert_eq!(config.max_string_length, 4);
}

#[test]
fn options_builders_compose() {
    let options = FromSchemaOptions::new()
        .with_config(GenerationConfig {
            max_recursion_depth: 1,
            ..GenerationConfig::default()
        })
        .with_formats(FormatRegistry::new().with_reserved_format("sku"))
        .with_document("http://example.com/a.json#", json!({"type": "string"}));
    assert_eq!(options.config.max_recursion_depth, 1);
    assert!(options.formats.is_reserved("sku"));
    assert!(options.documents.contains_key("http://example.com/a.json"));
}
