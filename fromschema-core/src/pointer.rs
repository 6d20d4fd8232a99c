use percent_encoding::percent_decode_str;
use serde_json::Value as JsonValue;

/// One step of a JSON pointer.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub(crate) enum PathSegment {
    Key(String),
    Index(usize),
}

pub(crate) fn path_from_pointer(pointer: &str) -> Vec<PathSegment> {
    let pointer = pointer.strip_prefix('#').unwrap_or(pointer);
    if pointer.is_empty() {
        return Vec::new();
    }

    pointer
        .split('/')
        .skip(1)
        .map(|segment| decode_pointer_segment(&percent_decode(segment)))
        .map(|segment| match segment.parse::<usize>() {
            Ok(index) if !segment.starts_with('+') => PathSegment::Index(index),
            _ => PathSegment::Key(segment),
        })
        .collect()
}

pub(crate) fn decode_pointer_segment(segment: &str) -> String {
    let mut decoded = String::with_capacity(segment.len());
    let mut chars = segment.chars();
    while let Some(ch) = chars.next() {
        if ch == '~' {
            match chars.next() {
                Some('0') => decoded.push('~'),
                Some('1') => decoded.push('/'),
                Some(other) => {
                    decoded.push('~');
                    decoded.push(other);
                }
                None => decoded.push('~'),
            }
        } else {
            decoded.push(ch);
        }
    }
    decoded
}

pub(crate) fn encode_pointer_segment(segment: &str) -> String {
    segment
        .replace('~', "~0")
        .replace('/', "~1")
        .replace('%', "%25")
}

/// Appends one segment to a `#`-rooted pointer.
pub(crate) fn child_pointer(pointer: &str, segment: &str) -> String {
    format!("{pointer}/{}", encode_pointer_segment(segment))
}

/// Decodes `%xx` escapes, as found in URI fragments.
fn percent_decode(segment: &str) -> String {
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}

pub(crate) fn resolve_pointer_value<'a>(root: &'a JsonValue, pointer: &str) -> Option<&'a JsonValue> {
    let mut current = root;
    for segment in path_from_pointer(pointer) {
        current = match (current, segment) {
            (JsonValue::Object(map), PathSegment::Key(key)) => map.get(&key)?,
            (JsonValue::Object(map), PathSegment::Index(index)) => map.get(&index.to_string())?,
            (JsonValue::Array(items), PathSegment::Index(index)) => items.get(index)?,
            _ => return None,
        };
    }
    Some(current)
}

#[cfg(test)]
#[path = "../tests/internal/pointer_unit_tests.rs"]
mod tests;
