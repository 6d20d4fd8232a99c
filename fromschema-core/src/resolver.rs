//! Reference resolution.
//!
//! Every `$ref` is replaced by a copy of its target. A reference back into a
//! target that is still being expanded would never finish, so it becomes a
//! definition marker, `{"$ref": "#/definitions/<name>"}`, and the target is
//! expanded once more as the definition `<name>`. Generation later unrolls
//! markers up to a depth limit.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use serde_json::{json, Value as JsonValue};
use url::Url;

use crate::canonical::keywords::is_annotation_keyword;
use crate::canonical::{marker_name, DEFINITIONS_PREFIX};
use crate::dialect::Dialect;
use crate::error::{ReferenceErrorKind, SchemaError};
use crate::pointer::{child_pointer, path_from_pointer, resolve_pointer_value, PathSegment};
use crate::JsonObject;

/// Keywords whose values are data, never subschemas.
const DATA_KEYWORDS: &[&str] = &["const", "enum", "default", "examples"];
/// Keywords whose values map arbitrary names to subschemas.
const NAMED_SCHEMA_KEYWORDS: &[&str] = &[
    "properties",
    "patternProperties",
    "dependencies",
    "dependentSchemas",
];

/// A root schema with its references inlined.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Resolved {
    pub(crate) root: JsonValue,
    /// Targets of the recursion markers left in `root`, by marker name.
    pub(crate) definitions: JsonObject,
}

/// Inlines every reference in `schema`. `documents` are other documents the
/// caller already holds, keyed by URI; nothing is ever fetched.
pub(crate) fn resolve(
    schema: &JsonValue,
    dialect: Dialect,
    documents: &BTreeMap<String, JsonValue>,
) -> Result<Resolved, SchemaError> {
    let mut resolver = Resolver::new(schema, dialect, documents);
    resolver.run()
}

/// A schema location: a document (the root document is `""`) and a
/// `#`-rooted JSON pointer into it.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
struct Location {
    document: String,
    pointer: String,
}

impl Location {
    fn document_root(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            pointer: "#".to_string(),
        }
    }
}

struct Resolver<'a> {
    dialect: Dialect,
    root: &'a JsonValue,
    documents: &'a BTreeMap<String, JsonValue>,
    /// Caller document keys by their normalized URI.
    document_keys: HashMap<String, String>,
    ids: HashMap<String, Location>,
    anchors: HashMap<String, Location>,
    /// Targets currently being expanded, outermost first.
    stack: Vec<Location>,
    markers: HashMap<Location, String>,
    pending: VecDeque<Location>,
    /// Expansions that emitted no marker and are therefore reusable anywhere.
    closed: HashMap<Location, JsonValue>,
    emitted: usize,
}

impl<'a> Resolver<'a> {
    fn new(
        root: &'a JsonValue,
        dialect: Dialect,
        documents: &'a BTreeMap<String, JsonValue>,
    ) -> Self {
        let mut resolver = Self {
            dialect,
            root,
            documents,
            document_keys: documents
                .keys()
                .map(|uri| (resolve_uri("", uri).0, uri.clone()))
                .collect(),
            ids: HashMap::new(),
            anchors: HashMap::new(),
            stack: Vec::new(),
            markers: HashMap::new(),
            pending: VecDeque::new(),
            closed: HashMap::new(),
            emitted: 0,
        };
        resolver.index(root, "", "#".to_string(), "");
        for (uri, document) in documents {
            resolver.index(document, uri, "#".to_string(), uri);
        }
        resolver
    }

    fn run(&mut self) -> Result<Resolved, SchemaError> {
        let root_location = Location::document_root("");
        self.stack.push(root_location.clone());
        let document = self.root;
        let root = self.expand(document, &root_location, "")?;
        self.stack.clear();

        let mut definitions = JsonObject::new();
        while let Some(target) = self.pending.pop_front() {
            let Some(name) = self.markers.get(&target).cloned() else {
                continue;
            };
            let value = self.value_at(&target).ok_or_else(|| {
                SchemaError::unresolvable(target.pointer.clone(), ReferenceErrorKind::MissingTarget)
            })?;
            let base = self.base_for(&target);
            self.stack = vec![target.clone()];
            let expanded = self.expand(value, &target, &base)?;
            self.stack.clear();
            definitions.insert(name, expanded);
        }
        check_alias_cycles(&definitions)?;
        if !definitions.is_empty() {
            log::debug!(
                "resolved schema with recursive definitions {:?}",
                definitions.keys().collect::<Vec<_>>()
            );
        }
        Ok(Resolved { root, definitions })
    }

    /// Records the base URI identifiers and anchors declared in a document.
    fn index(&mut self, value: &JsonValue, document: &str, pointer: String, base: &str) {
        let JsonValue::Object(map) = value else {
            if let JsonValue::Array(items) = value {
                for (index, item) in items.iter().enumerate() {
                    self.index(item, document, child_pointer(&pointer, &index.to_string()), base);
                }
            }
            return;
        };
        let location = Location {
            document: document.to_string(),
            pointer: pointer.clone(),
        };
        let mut base = base.to_string();
        if let Some(id) = map.get(self.dialect.id_keyword()).and_then(JsonValue::as_str) {
            let (address, fragment) = resolve_uri(&base, id);
            if !id.starts_with('#') && !address.is_empty() {
                base = address;
                self.ids.insert(base.clone(), location.clone());
            }
            if !fragment.is_empty() && !fragment.starts_with('/') {
                self.anchors
                    .insert(format!("{base}#{fragment}"), location.clone());
            }
        }
        if let Some(anchor) = map.get("$anchor").and_then(JsonValue::as_str) {
            self.anchors.insert(format!("{base}#{anchor}"), location);
        }
        for (key, child) in map {
            if DATA_KEYWORDS.contains(&key.as_str()) {
                continue;
            }
            self.index(child, document, child_pointer(&pointer, key), &base);
        }
    }

    fn document(&self, key: &str) -> Option<&'a JsonValue> {
        if key.is_empty() {
            return Some(self.root);
        }
        let documents: &'a BTreeMap<String, JsonValue> = self.documents;
        documents.get(key)
    }

    fn value_at(&self, location: &Location) -> Option<&'a JsonValue> {
        let document = self.document(&location.document)?;
        resolve_pointer_value(document, &location.pointer)
    }

    /// The base URI in effect around `location`, not counting its own `$id`.
    fn base_for(&self, location: &Location) -> String {
        let Some(mut current) = self.document(&location.document) else {
            return location.document.clone();
        };
        let mut base = location.document.clone();
        for segment in path_from_pointer(&location.pointer) {
            base = self.scoped_base(current, &base);
            let next = match (current, segment) {
                (JsonValue::Object(map), PathSegment::Key(key)) => map.get(&key),
                (JsonValue::Object(map), PathSegment::Index(index)) => map.get(&index.to_string()),
                (JsonValue::Array(items), PathSegment::Index(index)) => items.get(index),
                _ => None,
            };
            match next {
                Some(next) => current = next,
                None => break,
            }
        }
        base
    }

    fn scoped_base(&self, value: &JsonValue, base: &str) -> String {
        let id = value
            .as_object()
            .and_then(|map| map.get(self.dialect.id_keyword()))
            .and_then(JsonValue::as_str);
        match id {
            Some(id) if !id.starts_with('#') => {
                let (address, _) = resolve_uri(base, id);
                if address.is_empty() {
                    base.to_string()
                } else {
                    address
                }
            }
            _ => base.to_string(),
        }
    }

    /// Where `reference`, written under `base`, points.
    fn locate(&self, reference: &str, base: &str) -> Result<Location, SchemaError> {
        let (target, fragment) = resolve_uri(base, reference);
        let scope = if target.is_empty() {
            Location::document_root("")
        } else if let Some(key) = self.document_keys.get(&target) {
            Location::document_root(key.clone())
        } else if let Some(found) = self.ids.get(&target) {
            found.clone()
        } else if target.starts_with("http://") || target.starts_with("https://") {
            return Err(SchemaError::unresolvable(
                reference,
                ReferenceErrorKind::RemoteFetch,
            ));
        } else {
            return Err(SchemaError::unresolvable(
                reference,
                ReferenceErrorKind::UnsupportedId,
            ));
        };

        if fragment.is_empty() || fragment.starts_with('/') {
            let location = Location {
                document: scope.document,
                pointer: format!("{}{fragment}", scope.pointer),
            };
            if self.value_at(&location).is_none() {
                return Err(SchemaError::unresolvable(
                    reference,
                    ReferenceErrorKind::MissingTarget,
                ));
            }
            return Ok(location);
        }
        self.anchors
            .get(&format!("{target}#{fragment}"))
            .cloned()
            .ok_or_else(|| SchemaError::unresolvable(reference, ReferenceErrorKind::UnsupportedId))
    }

    fn expand(
        &mut self,
        value: &'a JsonValue,
        location: &Location,
        base: &str,
    ) -> Result<JsonValue, SchemaError> {
        let JsonValue::Object(map) = value else {
            return Ok(value.clone());
        };
        let base = self.scoped_base(value, base);

        if let Some(JsonValue::String(reference)) = map.get("$ref") {
            let target = self.expand_reference(reference, &base)?;
            if !self.dialect.applies_ref_siblings() {
                return Ok(target);
            }
            let is_sibling = |key: &str| key != "$ref" && !is_annotation_keyword(key);
            if !map.keys().any(|key| is_sibling(key)) {
                return Ok(target);
            }
            let siblings = self.expand_keywords(map, location, &base, is_sibling)?;
            return Ok(json!({ "allOf": [target, siblings] }));
        }
        self.expand_keywords(map, location, &base, |key| {
            key != "definitions" && key != "$defs"
        })
    }

    fn expand_keywords(
        &mut self,
        map: &'a JsonObject,
        location: &Location,
        base: &str,
        keep: impl Fn(&str) -> bool,
    ) -> Result<JsonValue, SchemaError> {
        let mut out = JsonObject::new();
        for (key, child) in map {
            if !keep(key) {
                continue;
            }
            let pointer = child_pointer(&location.pointer, key);
            let value = match child {
                _ if DATA_KEYWORDS.contains(&key.as_str()) => child.clone(),
                JsonValue::Object(named) if NAMED_SCHEMA_KEYWORDS.contains(&key.as_str()) => {
                    let mut schemas = JsonObject::new();
                    for (name, schema) in named {
                        let at = Location {
                            document: location.document.clone(),
                            pointer: child_pointer(&pointer, name),
                        };
                        schemas.insert(name.clone(), self.expand(schema, &at, base)?);
                    }
                    JsonValue::Object(schemas)
                }
                JsonValue::Array(items) => {
                    let mut expanded = Vec::with_capacity(items.len());
                    for (index, item) in items.iter().enumerate() {
                        let at = Location {
                            document: location.document.clone(),
                            pointer: child_pointer(&pointer, &index.to_string()),
                        };
                        expanded.push(self.expand(item, &at, base)?);
                    }
                    JsonValue::Array(expanded)
                }
                _ => {
                    let at = Location {
                        document: location.document.clone(),
                        pointer,
                    };
                    self.expand(child, &at, base)?
                }
            };
            out.insert(key.clone(), value);
        }
        Ok(JsonValue::Object(out))
    }

    fn expand_reference(&mut self, reference: &str, base: &str) -> Result<JsonValue, SchemaError> {
        let target = self.locate(reference, base)?;
        if self.stack.contains(&target) {
            return Ok(self.marker_for(&target));
        }
        if let Some(done) = self.closed.get(&target) {
            return Ok(done.clone());
        }
        let value = self.value_at(&target).ok_or_else(|| {
            SchemaError::unresolvable(reference, ReferenceErrorKind::MissingTarget)
        })?;
        let target_base = self.base_for(&target);
        let emitted = self.emitted;
        self.stack.push(target.clone());
        let expanded = self.expand(value, &target, &target_base);
        self.stack.pop();
        let expanded = expanded?;
        if self.markers.contains_key(&target) {
            // Recursive targets are always referenced through their marker.
            return Ok(self.marker_for(&target));
        }
        if self.emitted == emitted {
            self.closed.insert(target, expanded.clone());
        }
        Ok(expanded)
    }

    fn marker_for(&mut self, target: &Location) -> JsonValue {
        self.emitted += 1;
        let name = match self.markers.get(target) {
            Some(name) => name.clone(),
            None => {
                let name = self.fresh_name(target);
                self.markers.insert(target.clone(), name.clone());
                self.pending.push_back(target.clone());
                name
            }
        };
        json!({ "$ref": format!("{DEFINITIONS_PREFIX}{name}") })
    }

    /// The last pointer segment, made safe for use inside a pointer.
    fn fresh_name(&self, target: &Location) -> String {
        let stem = match path_from_pointer(&target.pointer).pop() {
            Some(PathSegment::Key(key)) => key,
            Some(PathSegment::Index(index)) => index.to_string(),
            None => "root".to_string(),
        };
        let stem: String = stem
            .chars()
            .map(|ch| {
                if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
                    ch
                } else {
                    '_'
                }
            })
            .collect();
        let taken: BTreeSet<&str> = self.markers.values().map(String::as_str).collect();
        if !taken.contains(stem.as_str()) {
            return stem;
        }
        let mut suffix = 2;
        loop {
            let candidate = format!("{stem}-{suffix}");
            if !taken.contains(candidate.as_str()) {
                return candidate;
            }
            suffix += 1;
        }
    }
}

/// Definitions that only forward to other definitions, in a loop, describe
/// no value at all.
fn check_alias_cycles(definitions: &JsonObject) -> Result<(), SchemaError> {
    for start in definitions.keys() {
        let mut seen = BTreeSet::new();
        let mut frontier = vec![start.as_str()];
        while let Some(name) = frontier.pop() {
            let Some(targets) = definitions.get(name).and_then(alias_targets) else {
                continue;
            };
            for target in targets {
                if target == start {
                    return Err(SchemaError::unresolvable(
                        format!("{DEFINITIONS_PREFIX}{start}"),
                        ReferenceErrorKind::Recursive,
                    ));
                }
                if seen.insert(target) {
                    frontier.push(target);
                }
            }
        }
    }
    Ok(())
}

/// The definitions a schema consists of, when it is nothing but markers.
fn alias_targets(schema: &JsonValue) -> Option<Vec<&str>> {
    let map = schema.as_object()?;
    if let Some(name) = marker_name(map) {
        return Some(vec![name]);
    }
    if map.len() != 1 {
        return None;
    }
    let JsonValue::Array(members) = map.get("allOf")? else {
        return None;
    };
    members
        .iter()
        .map(|member| member.as_object().and_then(marker_name))
        .collect()
}

/// Resolves `reference` against `base` and splits off its fragment. A
/// relative reference with no absolute base is kept as written.
fn resolve_uri(base: &str, reference: &str) -> (String, String) {
    if let Some(fragment) = reference.strip_prefix('#') {
        return (base.to_string(), fragment.to_string());
    }
    let joined = match Url::parse(base) {
        Ok(base) => base.join(reference),
        Err(_) => Url::parse(reference),
    };
    match joined {
        Ok(mut url) => {
            let fragment = url.fragment().unwrap_or_default().to_string();
            url.set_fragment(None);
            (url.into(), fragment)
        }
        Err(_) => {
            let (address, fragment) = reference.split_once('#').unwrap_or((reference, ""));
            (address.to_string(), fragment.to_string())
        }
    }
}

#[cfg(test)]
#[path = "../tests/internal/resolver_unit_tests.rs"]
mod tests;
