use super::*;
use fromschema_test_support::sample_many;
use proptest::prelude::*;
use serde_json::json;

fn evens(budget: u32) -> (ResidualFilter, Arc<FilterStats>) {
    let stats = Arc::new(FilterStats::new("even"));
    let check: Check = Arc::new(|value: &JsonValue| value.as_i64().is_some_and(|n| n % 2 == 0));
    let source = (0i64..1000).prop_map(JsonValue::from).boxed();
    (ResidualFilter::new(source, check, budget, stats.clone()), stats)
}

#[test]
fn residual_filter_only_yields_accepted_values() {
    let (filter, stats) = evens(100);
    for value in sample_many(&filter, 50) {
        assert_eq!(value.as_i64().expect("integer") % 2, 0);
    }
    let report = stats.report();
    assert!(report.attempts >= 50);
    assert_eq!(report.attempts - report.rejections, 50);
}

#[test]
fn residual_filter_gives_up_with_health_reason() {
    let stats = Arc::new(FilterStats::new("never"));
    let check: Check = Arc::new(|_: &JsonValue| false);
    let filter = ResidualFilter::new(Just(json!(1)).boxed(), check, 5, stats.clone());
    let mut runner = TestRunner::deterministic();
    let reason = filter.new_tree(&mut runner).err().expect("filter gives up");
    assert!(reason.message().starts_with(HEALTH_PREFIX));
    assert!(reason.message().contains("'never'"));
    assert_eq!(
        stats.report(),
        FilterReport {
            label: "never".to_string(),
            attempts: 5,
            rejections: 5,
        }
    );
}

#[test]
fn shrinking_stays_inside_the_filter() {
    let (filter, _) = evens(100);
    let mut runner = TestRunner::deterministic();
    let mut tree = filter.new_tree(&mut runner).expect("tree");
    for _ in 0..64 {
        assert_eq!(tree.current().as_i64().expect("integer") % 2, 0);
        if !tree.simplify() {
            break;
        }
    }
    assert_eq!(tree.current().as_i64().expect("integer") % 2, 0);
}

#[test]
fn rejection_rate_is_zero_before_any_attempt() {
    let report = FilterStats::new("idle").report();
    assert_eq!(report.rejection_rate(), 0.0);
    let report = FilterReport {
        label: "busy".to_string(),
        attempts: 4,
        rejections: 3,
    };
    assert_eq!(report.rejection_rate(), 0.75);
}
