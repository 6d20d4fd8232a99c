use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use serde_json::Value as JsonValue;

const MAX_ENTRIES: usize = 16_384;

static CANONICAL_CACHE: OnceLock<Mutex<HashMap<String, JsonValue>>> = OnceLock::new();

/// Process-wide memo of canonical forms, keyed by canonical encoding.
///
/// Only schemas without definitions are stored here, because their canonical
/// form depends on nothing but their own content.
pub(crate) struct SharedCache;

impl SharedCache {
    pub(crate) fn get(key: &str) -> Option<JsonValue> {
        let cache = CANONICAL_CACHE.get()?;
        let guard = cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.get(key).cloned()
    }

    pub(crate) fn insert(key: String, value: JsonValue) {
        let cache = CANONICAL_CACHE.get_or_init(|| Mutex::new(HashMap::new()));
        let mut guard = cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if guard.len() >= MAX_ENTRIES {
            log::debug!("canonical cache full, skipping insert");
            return;
        }
        guard.entry(key).or_insert(value);
    }
}
