//! Regular expressions from schemas: ECMA-262 escapes translated to the
//! `regex` dialect for matching and for string generation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use jsonschema::{Draft, Validator};
use proptest::prelude::*;
use regex::Regex;
use regex_syntax::hir::Hir;
use regex_syntax::ParserBuilder;
use serde_json::{json, Value as JsonValue};

const ECMA_SPACE: &str = r"\t\n\x0B\x0C\r \u{A0}\u{1680}\u{2000}-\u{200A}\u{2028}\u{2029}\u{202F}\u{205F}\u{3000}\u{FEFF}";

static PATTERNS: OnceLock<Mutex<HashMap<String, Arc<CompiledPattern>>>> = OnceLock::new();

/// Returns the compiled form of a schema pattern, compiling it once per process.
pub(crate) fn compiled(pattern: &str) -> Arc<CompiledPattern> {
    let cache = PATTERNS.get_or_init(|| Mutex::new(HashMap::new()));
    let mut guard = cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    guard
        .entry(pattern.to_string())
        .or_insert_with(|| Arc::new(CompiledPattern::new(pattern)))
        .clone()
}

enum Matcher {
    Regex(Regex),
    /// Patterns the `regex` crate rejects (look-around, backreferences) are
    /// matched by the validator's own engine instead.
    Validator(Validator),
    Invalid(String),
}

pub(crate) struct CompiledPattern {
    matcher: Matcher,
    generation: Result<Hir, String>,
}

impl std::fmt::Debug for CompiledPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledPattern")
            .field("valid", &self.is_valid())
            .field("generable", &self.generation.is_ok())
            .finish()
    }
}

impl CompiledPattern {
    fn new(pattern: &str) -> Self {
        let translated = ecma_to_rust(pattern);
        let matcher = match Regex::new(&translated) {
            Ok(regex) => Matcher::Regex(regex),
            Err(_) => match jsonschema::options()
                .with_draft(Draft::Draft7)
                .build(&json!({"pattern": pattern}))
            {
                Ok(validator) => Matcher::Validator(validator),
                Err(error) => Matcher::Invalid(error.to_string()),
            },
        };
        let generation = compile_generation_pattern(&translated);
        if let Err(reason) = &generation {
            log::warn!("pattern {pattern:?} cannot drive generation: {reason}");
        }
        Self {
            matcher,
            generation,
        }
    }

    pub(crate) fn is_valid(&self) -> bool {
        !matches!(self.matcher, Matcher::Invalid(_))
    }

    pub(crate) fn invalid_reason(&self) -> Option<&str> {
        match &self.matcher {
            Matcher::Invalid(reason) => Some(reason),
            _ => None,
        }
    }

    /// Unanchored search, as JSON Schema defines `pattern`.
    pub(crate) fn is_match(&self, text: &str) -> bool {
        match &self.matcher {
            Matcher::Regex(regex) => regex.is_match(text),
            Matcher::Validator(validator) => validator.is_valid(&JsonValue::from(text)),
            Matcher::Invalid(_) => false,
        }
    }

    /// Strings matching the pattern, when it can be generated from directly.
    pub(crate) fn strategy(&self) -> Option<BoxedStrategy<String>> {
        let hir = self.generation.as_ref().ok()?;
        proptest::string::string_regex_parsed(hir)
            .ok()
            .map(|strategy| strategy.boxed())
    }
}

fn compile_generation_pattern(pattern: &str) -> Result<Hir, String> {
    let hir = ParserBuilder::new()
        .build()
        .parse(generation_source(pattern)?)
        .map_err(|error| format!("pattern must be a valid regex: {error}"))?;
    if let Err(error) = proptest::string::string_regex_parsed(&hir) {
        return Err(format!("pattern must be a valid regex: {error}"));
    }
    Ok(hir)
}

/// The pattern without its outer anchors, which exact generation makes
/// redundant. Assertion escapes outside a class cannot be generated from.
fn generation_source(pattern: &str) -> Result<&str, String> {
    let mut chars = pattern.char_indices();
    let mut in_class = false;
    let mut end_anchor = None;
    while let Some((at, ch)) = chars.next() {
        match ch {
            '\\' => {
                let escaped = chars.next().map(|(_, escaped)| escaped);
                if !in_class && matches!(escaped, Some('b' | 'B' | 'A' | 'Z' | 'z' | 'G')) {
                    return Err(
                        "pattern uses assertion escapes which are unsupported for string generation"
                            .to_string(),
                    );
                }
            }
            '[' => in_class = true,
            ']' => in_class = false,
            '$' if !in_class && at + 1 == pattern.len() => end_anchor = Some(at),
            _ => {}
        }
    }
    let start = usize::from(pattern.starts_with('^'));
    let end = end_anchor.filter(|end| *end >= start).unwrap_or(pattern.len());
    Ok(&pattern[start..end])
}

/// Rewrites ECMA-262 character class escapes with their ASCII meaning.
///
/// `\d`, `\w` and `.` are narrower in ECMA-262 than in the `regex` crate's
/// Unicode mode, and `\s` differs in both directions.
pub(crate) fn ecma_to_rust(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut chars = pattern.chars();
    let mut in_class = false;
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some('b') if in_class => out.push_str(r"\x08"),
                Some('d') if in_class => out.push_str("0-9"),
                Some('d') => out.push_str("[0-9]"),
                Some('D') if !in_class => out.push_str("[^0-9]"),
                Some('w') if in_class => out.push_str("0-9A-Za-z_"),
                Some('w') => out.push_str("[0-9A-Za-z_]"),
                Some('W') if !in_class => out.push_str("[^0-9A-Za-z_]"),
                Some('s') if in_class => out.push_str(ECMA_SPACE),
                Some('s') => {
                    out.push('[');
                    out.push_str(ECMA_SPACE);
                    out.push(']');
                }
                Some('S') if !in_class => {
                    out.push_str("[^");
                    out.push_str(ECMA_SPACE);
                    out.push(']');
                }
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            },
            '[' if in_class => out.push_str(r"\["),
            '[' => {
                in_class = true;
                out.push('[');
            }
            ']' if in_class => {
                in_class = false;
                out.push(']');
            }
            '&' | '~' if in_class => {
                out.push('\\');
                out.push(ch);
            }
            '.' if !in_class => out.push_str(r"[^\n\r\u{2028}\u{2029}]"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
#[path = "../tests/internal/pattern_unit_tests.rs"]
mod tests;
