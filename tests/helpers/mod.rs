use std::sync::Arc;

use shapecheck::constraint::builtin;
use shapecheck::registry::{ConstraintDeclaration, Registry};
use shapecheck::{Instance, ValidationError, Validator, ValidatorOptions, Value};

// =============================================================================
// Shape fixtures
// =============================================================================

/// Single-field shapes, each probing one declaration on `value`.
pub fn fixtures() -> Arc<Registry> {
    let registry = Registry::builder()
        .shape("TestIsDefined", |s| s.field("value", |f| f.rule(builtin::is_defined())))
        .shape("TestIsOptional", |s| s.field("value", |f| f.optional()))
        .shape("TestEquals", |s| s.field("value", |f| f.rule(builtin::equals(0))))
        .shape("TestNotEquals", |s| s.field("value", |f| f.rule(builtin::not_equals(0))))
        .shape("TestIsEmpty", |s| s.field("value", |f| f.rule(builtin::is_empty())))
        .shape("TestIsNotEmpty", |s| s.field("value", |f| f.rule(builtin::is_not_empty())))
        .shape("TestIsDefinedEach", |s| {
            s.field("value", |f| f.rule(builtin::is_defined().each()))
        })
        .shape("TestEqualsEach", |s| s.field("value", |f| f.rule(builtin::equals(0).each())))
        .shape("Nested", |s| s.field("value", |f| f.rule(builtin::is_boolean())))
        .shape("TestValidateNested", |s| s.field("value", |f| f.nested()))
        .shape("TestValidateNestedEach", |s| s.field("value", |f| f.nested_each()))
        .build();
    Arc::new(registry)
}

/// Registry with one shape `Test` whose `value` field carries `declaration`.
pub fn single(declaration: ConstraintDeclaration) -> Arc<Registry> {
    Arc::new(
        Registry::builder()
            .shape("Test", |s| s.field("value", |f| f.rule(declaration)))
            .build(),
    )
}

// =============================================================================
// Instance builders
// =============================================================================

/// Instance whose `value` field holds `value`.
pub fn holding(shape: &str, value: impl Into<Value>) -> Instance {
    Instance::new(shape).with("value", value)
}

/// Instance whose `value` field was declared but never assigned.
pub fn declared(shape: &str) -> Instance {
    holding(shape, Value::Undefined)
}

/// Instance whose `value` field was removed.
pub fn deleted(shape: &str) -> Instance {
    let mut instance = declared(shape);
    instance.remove("value");
    instance
}

pub fn nested(value: impl Into<Value>) -> Value {
    Instance::new("Nested").with("value", value).into()
}

pub fn arr(values: impl IntoIterator<Item = Value>) -> Value {
    Value::array(values)
}

// =============================================================================
// Runners
// =============================================================================

pub async fn run(instance: &Instance) -> Vec<ValidationError> {
    run_with(fixtures(), instance).await
}

pub async fn run_with(registry: Arc<Registry>, instance: &Instance) -> Vec<ValidationError> {
    Validator::new(registry)
        .validate(instance)
        .await
        .expect("Should not raise an engine error")
}

pub async fn run_with_options(options: ValidatorOptions, instance: &Instance) -> Vec<ValidationError> {
    Validator::new(fixtures())
        .with_options(options)
        .validate(instance)
        .await
        .expect("Should not raise an engine error")
}

pub fn assert_valid(errors: &[ValidationError]) {
    assert!(errors.is_empty(), "Expected no errors, got: {:?}", errors);
}

/// Exactly one top-level error, returned for further inspection.
pub fn assert_one_error(errors: &[ValidationError]) -> &ValidationError {
    assert_eq!(errors.len(), 1, "Expected exactly one error, got: {:?}", errors);
    &errors[0]
}
