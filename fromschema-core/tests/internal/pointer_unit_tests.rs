use super::*;
use serde_json::json;

#[test]
fn path_from_pointer_decodes_escapes() {
    assert_eq!(
        path_from_pointer("#/definitions/a~1b/0/c~0d"),
        vec![
            PathSegment::Key("definitions".to_string()),
            PathSegment::Key("a/b".to_string()),
            PathSegment::Index(0),
            PathSegment::Key("c~d".to_string()),
        ]
    );
    assert!(path_from_pointer("#").is_empty());
    assert!(path_from_pointer("").is_empty());
}

#[test]
fn path_from_pointer_decodes_percent_escapes() {
    assert_eq!(
        path_from_pointer("#/definitions/a%20b"),
        vec![
            PathSegment::Key("definitions".to_string()),
            PathSegment::Key("a b".to_string()),
        ]
    );
}

#[test]
fn resolve_pointer_value_walks_objects_and_arrays() {
    let root = json!({"items": [{"type": "string"}, {"type": "null"}], "0": {"const": 1}});
    assert_eq!(
        resolve_pointer_value(&root, "#/items/1"),
        Some(&json!({"type": "null"}))
    );
    assert_eq!(resolve_pointer_value(&root, "#/0"), Some(&json!({"const": 1})));
    assert_eq!(resolve_pointer_value(&root, "#"), Some(&root));
    assert_eq!(resolve_pointer_value(&root, "#/items/7"), None);
    assert_eq!(resolve_pointer_value(&root, "#/missing"), None);
}

#[test]
fn child_pointer_encodes_segment() {
    assert_eq!(child_pointer("#/properties", "a/b~c"), "#/properties/a~1b~0c");
    let pointer = child_pointer("#/properties", "100%20");
    assert_eq!(
        path_from_pointer(&pointer),
        vec![
            PathSegment::Key("properties".to_string()),
            PathSegment::Key("100%20".to_string()),
        ]
    );
}
