//! Declaration and run behavior through the public API

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rutest::{
    check, check_equal, check_text, fail, CaseOutcome, FailureKind, HarnessError, NameMatcher,
    Registry, TestFilter, TestRunner,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn samples() -> Registry {
    let mut registry = Registry::new();

    let specials = registry.declare_group("Specials").unwrap();
    registry
        .declare_case(&specials, "AnotherStuff", || check_text!(true, "fine"))
        .unwrap();

    let second = registry.declare_group("SecondClass").unwrap();
    registry
        .declare_ignored_case(&second, "ShouldBeIgnored", || fail("ignored"))
        .unwrap();
    registry
        .declare_case(&second, "ShouldFail", || check_text!(false, "This is failing"))
        .unwrap();
    registry
        .declare_case(&second, "ShouldPass", || check_text!(true, "This is passing"))
        .unwrap();

    let class = registry.declare_group("ClassName").unwrap();
    registry
        .declare_case(&class, "ShouldPass", || check_equal!(1, 1))
        .unwrap();
    registry
        .declare_case(&class, "Create", || check_text!(false, "Should fail"))
        .unwrap();

    registry
}

// ============================================================================
// Declaration
// ============================================================================

#[test]
fn test_rejected_duplicate_keeps_first_case() {
    let mut registry = samples();
    let before = registry.len();
    let group = registry.declare_group("ClassName").unwrap();

    let err = registry
        .declare_case(&group, "Create", || Ok(()))
        .unwrap_err();
    assert!(matches!(err, HarnessError::DuplicateCase { .. }));
    assert_eq!(registry.len(), before);

    let report = TestRunner::new().run_all(&registry, &TestFilter::exact("ClassName", "Create"));
    assert_eq!(report.failed, 1);
}

#[test]
fn test_case_in_undeclared_group_is_rejected() {
    let mut registry = Registry::new();
    let err = registry.declare_case("Nowhere", "Case", || Ok(())).unwrap_err();
    assert!(matches!(err, HarnessError::UnknownGroup(_)));
    assert!(registry.is_empty());
}

#[test]
fn test_listings_follow_registration_order() {
    let registry = samples();
    assert_eq!(
        registry.list_names(),
        "Specials.AnotherStuff SecondClass.ShouldBeIgnored SecondClass.ShouldFail \
         SecondClass.ShouldPass ClassName.ShouldPass ClassName.Create"
    );
    assert_eq!(registry.list_groups(), "Specials SecondClass ClassName");
}

// ============================================================================
// Running
// ============================================================================

#[test]
fn test_full_run_counts() {
    let report = TestRunner::new().run_all(&samples(), &TestFilter::all());

    assert_eq!(report.total, 6);
    assert_eq!(report.passed, 3);
    assert_eq!(report.failed, 2);
    assert_eq!(report.ignored, 1);
    assert_eq!(report.exit_code(), 1);

    let failed: Vec<String> = report
        .failures
        .iter()
        .map(|f| format!("{}.{}", f.group, f.case))
        .collect();
    assert_eq!(failed, vec!["SecondClass.ShouldFail", "ClassName.Create"]);
}

#[test]
fn test_failure_location_points_at_check() {
    let mut registry = Registry::new();
    let group = registry.declare_group("Where").unwrap();
    let line = line!() + 1;
    registry.declare_case(&group, "Here", || check(false, "located")).unwrap();

    let report = TestRunner::new().run_all(&registry, &TestFilter::all());
    let location = report.failures[0].failure.location.clone().unwrap();
    assert!(location.file.ends_with("harness_tests.rs"));
    assert_eq!(location.line, line);
}

#[test]
fn test_group_filter_limits_run() {
    let filter = TestFilter::all().with_group(NameMatcher::Exact("ClassName".to_string()));
    let report = TestRunner::new().run_all(&samples(), &filter);

    assert_eq!(report.total, 2);
    assert_eq!(report.passed, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.filtered_out, 4);
}

#[test]
fn test_timeout_then_next_case_runs() {
    let mut registry = Registry::new();
    let group = registry.declare_group("Slow").unwrap();
    registry
        .declare_case(&group, "Hangs", || {
            std::thread::sleep(Duration::from_secs(3));
            Ok(())
        })
        .unwrap();
    registry.declare_case(&group, "After", || Ok(())).unwrap();

    let report = TestRunner::new()
        .with_timeout(Some(Duration::from_millis(50)))
        .run_all(&registry, &TestFilter::all());

    assert_eq!(report.runs.len(), 2);
    match &report.runs[0].outcome {
        CaseOutcome::Failed(failure) => assert_eq!(failure.kind, FailureKind::Timeout),
        other => panic!("expected timeout, got {:?}", other),
    }
    assert!(report.runs[1].outcome.is_pass());
}

#[test]
fn test_report_serializes_to_json() {
    let report = TestRunner::new().run_all(&samples(), &TestFilter::all());
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["total"], 6);
    assert_eq!(json["failures"][0]["group"], "SecondClass");
    assert_eq!(json["failures"][0]["kind"], "assertion");
    assert_eq!(json["runs"][1]["outcome"]["status"], "ignored");
}

// ============================================================================
// Counting invariants
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Ignored bodies never run, every other body runs exactly once, and the
    /// report counts add up.
    #[test]
    fn prop_counts_add_up(kinds in prop::collection::vec(0u8..3, 0..12)) {
        let invocations = Arc::new(AtomicUsize::new(0));
        let mut registry = Registry::new();
        let group = registry.declare_group("Generated").unwrap();

        for (i, kind) in kinds.iter().enumerate() {
            let counter = Arc::clone(&invocations);
            let passes = *kind == 0;
            let body = move || {
                counter.fetch_add(1, Ordering::SeqCst);
                check(passes, "generated failure")
            };
            let name = format!("Case{}", i);
            if *kind == 2 {
                registry.declare_ignored_case(&group, &name, body).unwrap();
            } else {
                registry.declare_case(&group, &name, body).unwrap();
            }
        }

        let report = TestRunner::new().run_all(&registry, &TestFilter::all());

        let expected_ignored = kinds.iter().filter(|k| **k == 2).count();
        let expected_failed = kinds.iter().filter(|k| **k == 1).count();

        prop_assert_eq!(report.total, kinds.len());
        prop_assert_eq!(report.ignored, expected_ignored);
        prop_assert_eq!(report.failed, expected_failed);
        prop_assert_eq!(report.passed + report.failed + report.ignored + report.not_run, report.total);
        prop_assert_eq!(invocations.load(Ordering::SeqCst), kinds.len() - expected_ignored);
        prop_assert_eq!(report.exit_code() == 0, expected_failed == 0);
    }

    /// Every case is either selected or filtered out.
    #[test]
    fn prop_filter_partitions_cases(text in "[A-Za-z]{0,3}") {
        let registry = samples();
        let filter = TestFilter::all().with_name(NameMatcher::Contains(text));
        let report = TestRunner::new().run_all(&registry, &filter);

        prop_assert_eq!(report.total + report.filtered_out, registry.len());
    }
}
