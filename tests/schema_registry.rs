//! Shapes registered from a JSON schema document behave like builder ones.

#[allow(dead_code)]
mod helpers;

use std::sync::Arc;

use helpers::*;
use shapecheck::registry::schema;
use shapecheck::{Instance, Value};

const ORDER_SCHEMA: &str = r#"{
  "shapes": [
    { "name": "Order", "fields": [
      { "name": "reference", "constraints": [
        { "name": "isString" },
        { "name": "isLength", "args": [3, 8] } ] },
      { "name": "status", "constraints": [
        { "name": "isIn", "args": [["open", "closed"]] } ] },
      { "name": "tags", "optional": true, "constraints": [
        { "name": "isNotEmpty", "each": true, "message": "$property may not hold blanks" } ] },
      { "name": "lines", "nested": { "each": true } } ] },
    { "name": "Line", "fields": [
      { "name": "quantity", "constraints": [ { "name": "isInt" } ] } ] }
  ]
}"#;

fn order(lines: Value) -> Instance {
    Instance::new("Order")
        .with("reference", "ORD-1")
        .with("status", "open")
        .with("lines", lines)
}

fn line(quantity: impl Into<Value>) -> Value {
    Instance::new("Line").with("quantity", quantity).into()
}

#[tokio::test]
async fn test_valid_order_passes() {
    let registry = Arc::new(schema::parse(ORDER_SCHEMA).expect("Should parse"));
    assert_valid(&run_with(registry, &order(arr([line(1), line(2)]))).await);
}

#[tokio::test]
async fn test_schema_constraints_and_messages_apply() {
    let registry = Arc::new(schema::parse(ORDER_SCHEMA).expect("Should parse"));
    let mut instance = order(arr([line(1)]))
        .with("status", "pending")
        .with("tags", arr(["a".into(), "".into()]));
    instance.set("reference", "ORD-123456789");

    let errors = run_with(registry, &instance).await;
    let properties: Vec<&str> = errors.iter().map(|e| e.property.as_str()).collect();
    assert_eq!(properties, vec!["reference", "status", "tags"]);
    assert_eq!(
        errors[0].constraints.get("isLength").map(String::as_str),
        Some("reference must be shorter than or equal to 8 characters")
    );
    assert_eq!(
        errors[1].constraints.get("isIn").map(String::as_str),
        Some("status must be one of the following values: open, closed")
    );
    assert_eq!(
        errors[2].constraints.get("isNotEmpty").map(String::as_str),
        Some("tags may not hold blanks")
    );
}

#[tokio::test]
async fn test_schema_nested_each_reports_element_paths() {
    let registry = Arc::new(schema::parse(ORDER_SCHEMA).expect("Should parse"));
    let errors = run_with(registry, &order(arr([line(1), line(1.5)]))).await;
    let error = assert_one_error(&errors);

    let mut failing = Vec::new();
    error.walk(&mut |path, node| {
        if node.has_constraint("isInt") {
            failing.push(path.to_string());
        }
    });
    assert_eq!(failing, vec!["lines[1].quantity"]);
}

#[test]
fn test_schema_problems_are_collected() {
    let errors = schema::parse(
        r#"{ "shapes": [ { "name": "Order", "fields": [
            { "name": "status", "constraints": [ { "name": "isIn", "args": ["open"] } ] },
            { "name": "total", "constraints": [ { "name": "isPositive" } ] } ] } ] }"#,
    )
    .expect_err("Should fail");

    let codes: Vec<&str> = errors.iter().map(|e| e.code).collect();
    assert_eq!(codes, vec!["S004", "S003"]);
    assert_eq!(errors[0].field.as_deref(), Some("status"));
}
