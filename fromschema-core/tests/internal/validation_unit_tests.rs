use super::*;

#[test]
fn validators_attach_shared_definitions() {
    let definitions = json!({"node": {"type": "integer", "minimum": 3}});
    let cache = ValidatorCache::new(Arc::new(
        definitions.as_object().cloned().expect("definitions"),
    ));
    let marker = json!({"$ref": "#/definitions/node"});
    assert!(cache.is_valid(&marker, &json!(4)).expect("validator"));
    assert!(!cache.is_valid(&marker, &json!(2)).expect("validator"));
}

#[test]
fn validators_are_cached_by_canonical_encoding() {
    let cache = ValidatorCache::new(Arc::new(JsonObject::new()));
    let first = cache.get(&json!({"minimum": 1.0, "type": "number"})).expect("validator");
    let second = cache.get(&json!({"type": "number", "minimum": 1})).expect("validator");
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn formats_are_not_asserted() {
    let cache = ValidatorCache::new(Arc::new(JsonObject::new()));
    assert!(cache
        .is_valid(&json!({"format": "email"}), &json!("not an email"))
        .expect("validator"));
}

#[test]
fn invalid_fragments_are_reported() {
    let cache = ValidatorCache::new(Arc::new(JsonObject::new()));
    let error = cache.get(&json!({"minLength": "three"})).err().expect("error");
    assert!(error.is_invalid_argument());
}
