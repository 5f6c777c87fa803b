//! Element-wise (`each`) constraint application.

#[allow(dead_code)]
mod helpers;

use helpers::*;
use shapecheck::{Record, Value};

fn record_with_undefined_entry() -> Value {
    Record::new().with("0", Value::Undefined).into()
}

fn record_with_undefined_key() -> Value {
    Record::new().with("undefined", 0).into()
}

// =============================================================================
// isDefined, each
// =============================================================================

#[tokio::test]
async fn test_is_defined_each_checks_non_collections_directly() {
    let errors = run(&declared("TestIsDefinedEach")).await;
    assert_eq!(
        assert_one_error(&errors).constraints.get("isDefined").map(String::as_str),
        Some("each value in value should not be null or undefined")
    );
    assert_valid(&run(&holding("TestIsDefinedEach", 0)).await);
    assert_valid(&run(&holding("TestIsDefinedEach", record_with_undefined_entry())).await);
    assert_valid(&run(&holding("TestIsDefinedEach", record_with_undefined_key())).await);
}

#[tokio::test]
async fn test_is_defined_each_visits_elements_one_level_deep() {
    assert_valid(&run(&holding("TestIsDefinedEach", arr([]))).await);
    assert_eq!(run(&holding("TestIsDefinedEach", arr([Value::Undefined]))).await.len(), 1);
    assert_valid(&run(&holding("TestIsDefinedEach", arr([arr([Value::Undefined])]))).await);
}

#[tokio::test]
async fn test_is_defined_each_skips_holes() {
    assert_valid(&run(&holding("TestIsDefinedEach", Value::sparse_array([None]))).await);
    assert_valid(
        &run(&holding("TestIsDefinedEach", Value::sparse_array([None, Some(0.into())]))).await,
    );
}

#[tokio::test]
async fn test_is_defined_each_over_sets_and_map_values() {
    assert_eq!(run(&holding("TestIsDefinedEach", Value::set([Value::Undefined]))).await.len(), 1);
    assert_valid(
        &run(&holding("TestIsDefinedEach", Value::map([(Value::Undefined, 0.into())]))).await,
    );
    assert_eq!(
        run(&holding("TestIsDefinedEach", Value::map([(0.into(), Value::Undefined)]))).await.len(),
        1
    );
}

// =============================================================================
// equals, each
// =============================================================================

#[tokio::test]
async fn test_equals_each() {
    let errors = run(&declared("TestEqualsEach")).await;
    assert_eq!(
        assert_one_error(&errors).constraints.get("equals").map(String::as_str),
        Some("each value in value must be equal to 0")
    );

    assert_valid(&run(&holding("TestEqualsEach", 0)).await);
    assert_valid(&run(&holding("TestEqualsEach", arr([]))).await);
    assert_valid(&run(&holding("TestEqualsEach", arr([0.into()]))).await);
    assert_valid(&run(&holding("TestEqualsEach", Value::sparse_array([None]))).await);
    assert_valid(&run(&holding("TestEqualsEach", Value::set([0.into()]))).await);
    assert_valid(&run(&holding("TestEqualsEach", Value::map([(Value::Undefined, 0.into())]))).await);

    for value in [
        arr([Value::Undefined]),
        arr([arr([Value::Undefined])]),
        Record::new().into(),
        record_with_undefined_entry(),
        record_with_undefined_key(),
        Value::set([Value::Undefined]),
        Value::map([(0.into(), Value::Undefined)]),
    ] {
        let errors = run(&holding("TestEqualsEach", value.clone())).await;
        assert_eq!(errors.len(), 1, "{:?} should fail: {:?}", value, errors);
    }
}

#[tokio::test]
async fn test_each_reports_one_entry_for_many_failing_elements() {
    let errors = run(&holding("TestEqualsEach", arr([1.into(), 0.into(), 2.into()]))).await;
    let error = assert_one_error(&errors);
    assert_eq!(error.constraints.len(), 1);
    assert!(error.children.is_empty());
}
