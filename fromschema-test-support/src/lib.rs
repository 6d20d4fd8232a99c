use ctor::ctor;
use proptest::strategy::{Strategy, ValueTree};
use proptest::test_runner::TestRunner;
use serde_json::Value as JsonValue;

#[ctor]
fn init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default())
        .is_test(true)
        .try_init();
}

/// Draws one value from `strategy` with a deterministic runner.
pub fn sample<S>(strategy: S) -> S::Value
where
    S: Strategy,
{
    let mut runner = TestRunner::deterministic();
    strategy
        .new_tree(&mut runner)
        .expect("strategy produces a value")
        .current()
}

/// Draws `count` values from `strategy`, all from one deterministic runner.
pub fn sample_many<S>(strategy: S, count: usize) -> Vec<S::Value>
where
    S: Strategy,
{
    let mut runner = TestRunner::deterministic();
    (0..count)
        .map(|_| {
            strategy
                .new_tree(&mut runner)
                .expect("strategy produces a value")
                .current()
        })
        .collect()
}

/// Draws until `strategy` fails, returning the failure message.
pub fn draw_error<S>(strategy: S) -> String
where
    S: Strategy,
{
    let mut runner = TestRunner::deterministic();
    match strategy.new_tree(&mut runner) {
        Ok(_) => panic!("expected the strategy to fail"),
        Err(reason) => reason.message().to_string(),
    }
}

/// A validator for `schema`, with the draft its `$schema` selects and
/// `format` treated as an annotation.
pub fn validator_for(schema: &JsonValue) -> jsonschema::Validator {
    jsonschema::options()
        .should_validate_formats(false)
        .build(schema)
        .expect("schema compiles")
}

/// Panics with every validation error when `value` does not match `schema`.
pub fn assert_valid(schema: &JsonValue, value: &JsonValue) {
    let validator = validator_for(schema);
    let errors: Vec<String> = validator
        .iter_errors(value)
        .map(|error| error.to_string())
        .collect();
    assert!(
        errors.is_empty(),
        "value {value} does not match schema {schema}: {errors:?}"
    );
}
