use super::*;
use proptest::strategy::ValueTree;
use proptest::test_runner::TestRunner;

#[test]
fn ecma_digit_and_word_classes_are_ascii() {
    assert_eq!(ecma_to_rust(r"^\d+$"), "^[0-9]+$");
    assert_eq!(ecma_to_rust(r"[\w-]"), "[0-9A-Za-z_-]");
    let pattern = compiled(r"^\d$");
    assert!(pattern.is_match("7"));
    assert!(!pattern.is_match("\u{0667}"));
}

#[test]
fn ecma_dot_excludes_line_terminators() {
    let pattern = compiled("^.$");
    assert!(pattern.is_match("a"));
    assert!(!pattern.is_match("\r"));
    assert!(!pattern.is_match("\u{2028}"));
}

#[test]
fn matching_is_unanchored_search() {
    let pattern = compiled("b+");
    assert!(pattern.is_match("abbbc"));
    assert!(!pattern.is_match("ac"));
}

#[test]
fn lookahead_patterns_fall_back_to_validator_matching() {
    let pattern = compiled("^(?!foo)[a-z]+$");
    assert!(pattern.is_valid());
    assert!(pattern.is_match("bar"));
    assert!(!pattern.is_match("foobar"));
    assert!(pattern.strategy().is_none());
}

#[test]
fn invalid_patterns_are_reported() {
    let pattern = compiled("(unclosed");
    assert!(!pattern.is_valid());
    assert!(pattern.invalid_reason().is_some());
    assert!(!pattern.is_match("(unclosed"));
}

#[test]
fn generation_drops_outer_anchors() {
    assert_eq!(generation_source("^ab$"), Ok("ab"));
    assert_eq!(generation_source(r"^a\$"), Ok(r"a\$"));
    assert_eq!(generation_source("^$"), Ok(""));
    assert_eq!(generation_source("[$]"), Ok("[$]"));
    assert!(generation_source(r"\bword").is_err());
}

#[test]
fn backspace_escape_inside_a_class_is_not_a_boundary() {
    assert_eq!(ecma_to_rust(r"[\b]"), r"[\x08]");
    let pattern = compiled(r"^[\ba]$");
    assert!(pattern.is_match("\u{8}"));
    assert!(!pattern.is_match("b"));
    let strategy = pattern.strategy().expect("generable");
    let mut runner = TestRunner::deterministic();
    for _ in 0..16 {
        let value = strategy.new_tree(&mut runner).expect("tree").current();
        assert!(value == "\u{8}" || value == "a", "{value:?}");
    }
}

#[test]
fn generated_strings_match_the_pattern() {
    let pattern = compiled(r"^[a-c]{2}\d$");
    let strategy = pattern.strategy().expect("generable");
    let mut runner = TestRunner::deterministic();
    for _ in 0..32 {
        let value = strategy.new_tree(&mut runner).expect("tree").current();
        assert!(pattern.is_match(&value), "{value:?}");
    }
}
