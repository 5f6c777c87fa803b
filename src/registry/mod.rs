//! Constraint registry: which constraints each shape's fields carry.
//!
//! Shapes are declared once through `RegistryBuilder` (or loaded from a
//! declarative document, see `schema`) and are read-only afterwards. A
//! `Registry` can be handed to a `Validator` directly or installed as the
//! process-wide registry used by the free `validate` function.

pub mod schema;

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::constraint::Constraint;
use crate::error::EngineError;
use crate::value::Value;

// =============================================================================
// DECLARATIONS
// =============================================================================

/// One constraint attached to one field. Immutable once registered.
#[derive(Clone)]
pub struct ConstraintDeclaration {
    constraint: Arc<dyn Constraint>,
    args: Vec<Value>,
    each: bool,
    message: Option<String>,
}

impl ConstraintDeclaration {
    pub fn new(constraint: Arc<dyn Constraint>) -> Self {
        ConstraintDeclaration {
            constraint,
            args: Vec::new(),
            each: false,
            message: None,
        }
    }

    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }

    /// Apply the predicate to every element when the value is a collection.
    pub fn each(mut self) -> Self {
        self.each = true;
        self
    }

    /// Override the default message template.
    pub fn message(mut self, template: impl Into<String>) -> Self {
        self.message = Some(template.into());
        self
    }

    pub fn name(&self) -> &str {
        self.constraint.name()
    }

    pub fn constraint(&self) -> &dyn Constraint {
        self.constraint.as_ref()
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn is_each(&self) -> bool {
        self.each
    }

    pub fn message_template(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl std::fmt::Debug for ConstraintDeclaration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstraintDeclaration")
            .field("name", &self.name())
            .field("args", &self.args)
            .field("each", &self.each)
            .field("message", &self.message)
            .finish()
    }
}

/// Nested-validation marker on a field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NestedSpec {
    /// Declared element-wise; only changes the default mismatch message.
    pub each: bool,
    pub message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    /// Absent or nullish values skip every other check on the field.
    pub optional: bool,
    pub nested: Option<NestedSpec>,
    /// Declaration order.
    pub constraints: Vec<ConstraintDeclaration>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>) -> Self {
        FieldSpec {
            name: name.into(),
            optional: false,
            nested: None,
            constraints: Vec::new(),
        }
    }

    pub fn nested_each(&self) -> bool {
        self.nested.as_ref().is_some_and(|n| n.each)
    }

    fn merge(&mut self, other: FieldSpec) {
        self.optional |= other.optional;
        if other.nested.is_some() {
            self.nested = other.nested;
        }
        self.constraints.extend(other.constraints);
    }
}

#[derive(Debug, Clone)]
pub struct ShapeSpec {
    pub name: String,
    /// Declaration order; the error tree follows it.
    pub fields: Vec<FieldSpec>,
}

impl ShapeSpec {
    pub fn new(name: impl Into<String>) -> Self {
        ShapeSpec {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Add a field, merging into an existing field of the same name.
    pub fn push_field(&mut self, field: FieldSpec) {
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => existing.merge(field),
            None => self.fields.push(field),
        }
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct Registry {
    shapes: HashMap<String, Arc<ShapeSpec>>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn shape(&self, name: &str) -> Option<&Arc<ShapeSpec>> {
        self.shapes.get(name)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

/// Collects shape declarations. Declaring a shape or field twice extends the
/// earlier declaration.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    shapes: Vec<ShapeSpec>,
}

impl RegistryBuilder {
    pub fn shape(mut self, name: &str, build: impl FnOnce(ShapeBuilder) -> ShapeBuilder) -> Self {
        let spec = match self.shapes.iter().position(|s| s.name == name) {
            Some(index) => self.shapes.remove(index),
            None => ShapeSpec::new(name),
        };
        self.shapes.push(build(ShapeBuilder { spec }).spec);
        self
    }

    pub fn add_shape(mut self, spec: ShapeSpec) -> Self {
        match self.shapes.iter_mut().find(|s| s.name == spec.name) {
            Some(existing) => spec.fields.into_iter().for_each(|f| existing.push_field(f)),
            None => self.shapes.push(spec),
        }
        self
    }

    pub fn build(self) -> Registry {
        Registry {
            shapes: self
                .shapes
                .into_iter()
                .map(|spec| (spec.name.clone(), Arc::new(spec)))
                .collect(),
        }
    }
}

pub struct ShapeBuilder {
    spec: ShapeSpec,
}

impl ShapeBuilder {
    pub fn field(mut self, name: &str, build: impl FnOnce(FieldBuilder) -> FieldBuilder) -> Self {
        let field = build(FieldBuilder {
            spec: FieldSpec::new(name),
        });
        self.spec.push_field(field.spec);
        self
    }
}

pub struct FieldBuilder {
    spec: FieldSpec,
}

impl FieldBuilder {
    pub fn optional(mut self) -> Self {
        self.spec.optional = true;
        self
    }

    pub fn nested(mut self) -> Self {
        self.spec.nested.get_or_insert_with(NestedSpec::default);
        self
    }

    pub fn nested_each(mut self) -> Self {
        self.spec.nested.get_or_insert_with(NestedSpec::default).each = true;
        self
    }

    pub fn nested_message(mut self, template: impl Into<String>) -> Self {
        self.spec.nested.get_or_insert_with(NestedSpec::default).message = Some(template.into());
        self
    }

    pub fn rule(mut self, declaration: ConstraintDeclaration) -> Self {
        self.spec.constraints.push(declaration);
        self
    }
}

// =============================================================================
// PROCESS-WIDE REGISTRY
// =============================================================================

static GLOBAL: OnceLock<Arc<Registry>> = OnceLock::new();

/// Install the process-wide registry. Must happen before the first
/// validation; it can only be done once.
pub fn install(registry: Registry) -> Result<Arc<Registry>, EngineError> {
    let registry = Arc::new(registry);
    GLOBAL
        .set(registry.clone())
        .map_err(|_| EngineError::RegistryAlreadyInstalled)?;
    tracing::debug!(shapes = registry.len(), "installed process-wide registry");
    Ok(registry)
}

/// The installed registry, or an empty one when nothing was installed.
pub fn global() -> Arc<Registry> {
    GLOBAL.get().cloned().unwrap_or_default()
}
