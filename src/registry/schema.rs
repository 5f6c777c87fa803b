//! Declarative registration: a JSON document naming built-in constraints
//! per field, turned into a `Registry`.
//!
//! ```json
//! { "shapes": [ { "name": "Nested", "fields": [
//!     { "name": "value", "constraints": [ { "name": "isBoolean" } ] } ] } ] }
//! ```

use std::collections::HashSet;

use serde::Deserialize;

use super::{FieldSpec, NestedSpec, Registry, ShapeSpec};
use crate::constraint::builtin;
use crate::error::SchemaError;
use crate::value::Value;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDocument {
    pub shapes: Vec<ShapeDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShapeDef {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDef {
    pub name: String,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub nested: Option<NestedDef>,
    #[serde(default)]
    pub constraints: Vec<ConstraintDef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NestedDef {
    #[serde(default)]
    pub each: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConstraintDef {
    pub name: String,
    #[serde(default)]
    pub args: Vec<serde_json::Value>,
    #[serde(default)]
    pub each: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Deserialize and resolve a schema document. Returns every problem found,
/// not just the first.
pub fn parse(json: &str) -> Result<Registry, Vec<SchemaError>> {
    let document = serde_json::from_str::<SchemaDocument>(json).map_err(|e| {
        vec![SchemaError::document(
            "S001",
            format!("Failed to parse schema JSON: {}", e),
        )]
    })?;
    resolve(document)
}

pub fn resolve(document: SchemaDocument) -> Result<Registry, Vec<SchemaError>> {
    let mut errors = Vec::new();
    let mut seen_shapes = HashSet::new();
    let mut builder = Registry::builder();

    for shape in document.shapes {
        if !seen_shapes.insert(shape.name.clone()) {
            errors.push(SchemaError::shape(
                "S002",
                format!("Duplicate shape '{}'", shape.name),
                &shape.name,
            ));
            continue;
        }
        builder = builder.add_shape(resolve_shape(shape, &mut errors));
    }

    if errors.is_empty() {
        Ok(builder.build())
    } else {
        Err(errors)
    }
}

fn resolve_shape(shape: ShapeDef, errors: &mut Vec<SchemaError>) -> ShapeSpec {
    let mut spec = ShapeSpec::new(&shape.name);
    let mut seen_fields = HashSet::new();

    for field in shape.fields {
        if !seen_fields.insert(field.name.clone()) {
            errors.push(SchemaError::field(
                "S005",
                format!("Duplicate field '{}'", field.name),
                &shape.name,
                &field.name,
            ));
            continue;
        }

        let mut field_spec = FieldSpec::new(&field.name);
        field_spec.optional = field.optional;
        field_spec.nested = field.nested.map(|n| NestedSpec {
            each: n.each,
            message: n.message,
        });

        for def in field.constraints {
            let args = def.args.into_iter().map(Value::from).collect();
            match builtin::by_name(&def.name, args) {
                Ok(Some(mut declaration)) => {
                    if def.each {
                        declaration = declaration.each();
                    }
                    if let Some(message) = def.message {
                        declaration = declaration.message(message);
                    }
                    field_spec.constraints.push(declaration);
                }
                Ok(None) => errors.push(SchemaError::field(
                    "S003",
                    format!("Unknown constraint '{}'", def.name),
                    &shape.name,
                    &field.name,
                )),
                Err(message) => {
                    errors.push(SchemaError::field("S004", message, &shape.name, &field.name))
                }
            }
        }

        spec.push_field(field_spec);
    }

    spec
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fields_and_markers() {
        let registry = parse(
            r#"{ "shapes": [
                { "name": "Nested", "fields": [
                    { "name": "value", "constraints": [ { "name": "isBoolean" } ] } ] },
                { "name": "Holder", "fields": [
                    { "name": "value", "nested": { "each": true } },
                    { "name": "id", "optional": true,
                      "constraints": [ { "name": "isIn", "args": [[1, 2]], "each": true } ] } ] }
            ] }"#,
        )
        .expect("Should parse");

        let holder = registry.shape("Holder").expect("Holder");
        assert!(holder.field("value").expect("value").nested_each());
        let id = holder.field("id").expect("id");
        assert!(id.optional);
        assert_eq!(id.constraints[0].name(), "isIn");
        assert!(id.constraints[0].is_each());
        assert_eq!(registry.shape("Nested").expect("Nested").fields.len(), 1);
    }

    #[test]
    fn reports_every_problem() {
        let errors = parse(
            r#"{ "shapes": [
                { "name": "A", "fields": [
                    { "name": "x", "constraints": [ { "name": "isPrime" } ] },
                    { "name": "x" },
                    { "name": "y", "constraints": [ { "name": "equals" } ] } ] },
                { "name": "A" }
            ] }"#,
        )
        .expect_err("Should fail");

        let codes: Vec<&str> = errors.iter().map(|e| e.code).collect();
        assert_eq!(codes, vec!["S003", "S005", "S004", "S002"]);
        assert_eq!(errors[0].to_string(), "[S003] Unknown constraint 'isPrime' (at 'A.x')");
    }

    #[test]
    fn malformed_json_is_s001() {
        let errors = parse("{ \"shapes\": 3 }").expect_err("Should fail");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, "S001");
    }
}
