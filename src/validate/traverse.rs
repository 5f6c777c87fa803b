//! Nested traversal engine.
//!
//! Per field: skip (optional and missing), evaluate every declared
//! constraint, then descend when the field is marked nested. Siblings are
//! evaluated concurrently and joined in declaration/iteration order, so the
//! tree never depends on which future settles first.
//!
//! There is no cycle detection: a shape instance reachable from itself makes
//! the descent recurse without bound.

use futures_util::future::{BoxFuture, FutureExt, join_all, try_join_all};

use super::tree::{NESTED_VALIDATION, ValidationError};
use crate::constraint::{EACH_PREFIX, ValidationArguments, Verdict, render_message};
use crate::error::{BoxError, EngineError};
use crate::options::ValidatorOptions;
use crate::registry::{ConstraintDeclaration, FieldSpec, NestedSpec, Registry, ShapeSpec};
use crate::value::{Instance, Kind, Nullish, Value, classify};

static UNDEFINED: Value = Value::Undefined;

#[derive(Clone, Copy)]
pub(crate) struct Traversal<'a> {
    pub registry: &'a Registry,
    pub options: &'a ValidatorOptions,
}

/// The nested declaration being applied, for message rendering.
#[derive(Clone, Copy)]
struct NestedContext<'a> {
    target: &'a str,
    field: &'a str,
    spec: &'a NestedSpec,
}

enum Descent {
    Nothing,
    /// The value cannot be descended into.
    Mismatch(String),
    Children(Vec<ValidationError>),
}

impl<'a> Traversal<'a> {
    /// Validate every field of `shape` on `instance`, in declaration order.
    pub fn validate_fields(
        self,
        shape: &'a ShapeSpec,
        instance: &'a Instance,
    ) -> BoxFuture<'a, Result<Vec<ValidationError>, EngineError>> {
        async move {
            let nodes = try_join_all(
                shape
                    .fields
                    .iter()
                    .map(|field| self.validate_field(shape, instance, field)),
            )
            .await?;
            Ok(nodes.into_iter().flatten().collect())
        }
        .boxed()
    }

    fn validate_field(
        self,
        shape: &'a ShapeSpec,
        instance: &'a Instance,
        field: &'a FieldSpec,
    ) -> BoxFuture<'a, Result<Option<ValidationError>, EngineError>> {
        async move {
            let slot = instance.get(&field.name);
            if field.optional && classify(slot).is_missing() {
                tracing::trace!(shape = %shape.name, field = %field.name, "optional field missing, skipped");
                return Ok(None);
            }
            let value = slot.unwrap_or(&UNDEFINED);
            let options = self.options;
            let mut node = ValidationError::new(
                &field.name,
                options.include_target.then_some(shape.name.as_str()),
                options.include_value.then(|| value.clone()),
            );

            let (presence, rest): (Vec<_>, Vec<_>) = field
                .constraints
                .iter()
                .partition(|d| d.constraint().is_presence_check());

            self.apply(&presence, value, &shape.name, &field.name, &mut node)
                .await?;
            if options.skips(value) {
                tracing::trace!(shape = %shape.name, field = %field.name, "missing value, remaining checks skipped");
                return Ok(node.into_non_empty());
            }
            self.apply(&rest, value, &shape.name, &field.name, &mut node)
                .await?;

            if let Some(spec) = &field.nested {
                if !(options.stop_at_first_error && !node.constraints.is_empty()) {
                    let ctx = NestedContext {
                        target: &shape.name,
                        field: &field.name,
                        spec,
                    };
                    let descent = self.descend(value, ctx).await?;
                    absorb(&mut node, descent);
                }
            }

            Ok(node.into_non_empty())
        }
        .boxed()
    }

    /// Evaluate declarations against one field value, recording failures on
    /// `node`.
    async fn apply(
        self,
        declarations: &[&'a ConstraintDeclaration],
        value: &'a Value,
        target: &'a str,
        property: &'a str,
        node: &mut ValidationError,
    ) -> Result<(), EngineError> {
        if self.options.stop_at_first_error {
            for &declaration in declarations {
                if !node.constraints.is_empty() {
                    break;
                }
                if let Some((name, message)) =
                    self.evaluate(declaration, value, target, property).await?
                {
                    node.fail(name, message);
                }
            }
            return Ok(());
        }

        let outcomes = try_join_all(
            declarations
                .iter()
                .copied()
                .map(|declaration| self.evaluate(declaration, value, target, property)),
        )
        .await?;
        for (name, message) in outcomes.into_iter().flatten() {
            node.fail(name, message);
        }
        Ok(())
    }

    /// Run one declaration. `Some((name, message))` when it failed.
    async fn evaluate(
        self,
        declaration: &'a ConstraintDeclaration,
        value: &'a Value,
        target: &'a str,
        property: &'a str,
    ) -> Result<Option<(&'a str, String)>, EngineError> {
        let constraint = declaration.constraint();
        let args = ValidationArguments {
            target,
            property,
            value,
            constraints: declaration.args(),
        };
        let raise = |source: BoxError| EngineError::Constraint {
            constraint: declaration.name().to_string(),
            property: property.to_string(),
            source,
        };

        let elements = value.collection_values().filter(|_| declaration.is_each());
        let valid = match elements {
            Some(elements) => {
                let verdicts = elements
                    .into_iter()
                    .map(|element| constraint.validate(element, &args))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(&raise)?;
                let mut valid = true;
                for settled in join_all(verdicts.into_iter().map(settle)).await {
                    valid &= settled.map_err(&raise)?;
                }
                valid
            }
            None => {
                let verdict = constraint.validate(value, &args).map_err(&raise)?;
                settle(verdict).await.map_err(&raise)?
            }
        };
        if valid {
            return Ok(None);
        }

        let message = self.render(declaration.message_template(), &args, || {
            let message = constraint.default_message(&args);
            if declaration.is_each() {
                format!("{}{}", EACH_PREFIX, message)
            } else {
                message
            }
        });
        Ok(Some((declaration.name(), message)))
    }

    fn render(
        self,
        template: Option<&str>,
        args: &ValidationArguments<'_>,
        default: impl FnOnce() -> String,
    ) -> String {
        match template {
            Some(template) => render_message(template, args),
            None if self.options.dismiss_default_messages => String::new(),
            None => render_message(&default(), args),
        }
    }

    // -------------------------------------------------------------------------
    // Nested descent
    // -------------------------------------------------------------------------

    fn descend(
        self,
        value: &'a Value,
        ctx: NestedContext<'a>,
    ) -> BoxFuture<'a, Result<Descent, EngineError>> {
        async move {
            match value.kind() {
                Kind::Absent | Kind::Nullish(Nullish::Undefined) => Ok(Descent::Nothing),
                Kind::OrderedCollection | Kind::UniqueCollection | Kind::KeyValueCollection => {
                    let pending = self
                        .elements(value, ctx)?
                        .into_iter()
                        .map(|(property, element)| self.element(element, property, ctx));
                    let children = try_join_all(pending).await?;
                    Ok(Descent::Children(children.into_iter().flatten().collect()))
                }
                Kind::ShapeInstance | Kind::PlainRecord { has_recognized_shape: true } => {
                    Ok(Descent::Children(self.validate_object(value).await?))
                }
                Kind::Nullish(Nullish::Null)
                | Kind::Scalar
                | Kind::PlainRecord { has_recognized_shape: false } => {
                    Ok(Descent::Mismatch(self.mismatch_message(value, ctx)))
                }
            }
        }
        .boxed()
    }

    /// Elements of a collection with the property each one reports under:
    /// position for arrays and sets, key label for maps.
    fn elements(
        self,
        value: &'a Value,
        ctx: NestedContext<'a>,
    ) -> Result<Vec<(String, &'a Value)>, EngineError> {
        match value {
            Value::Array(array) => Ok(array
                .iter_present()
                .map(|(index, element)| (index.to_string(), element))
                .collect()),
            Value::Set(set) => Ok(set
                .iter()
                .enumerate()
                .map(|(index, element)| (index.to_string(), element))
                .collect()),
            Value::Map(map) => map
                .iter()
                .map(|(key, element)| self.key_label(key, ctx).map(|label| (label, element)))
                .collect(),
            _ => Ok(Vec::new()),
        }
    }

    fn key_label(self, key: &Value, ctx: NestedContext<'a>) -> Result<String, EngineError> {
        if let Some(label) = key.label() {
            return Ok(label);
        }
        if self.options.label_nullish_map_keys {
            return Ok(key.to_js_string());
        }
        let key = if key.is_undefined() { "undefined" } else { "null" };
        tracing::warn!(shape = ctx.target, field = ctx.field, key, "map key has no label");
        Err(EngineError::UnlabelableMapKey {
            property: ctx.field.to_string(),
            key,
        })
    }

    fn element(
        self,
        value: &'a Value,
        property: String,
        ctx: NestedContext<'a>,
    ) -> BoxFuture<'a, Result<Option<ValidationError>, EngineError>> {
        async move {
            let mut node = ValidationError::new(
                property,
                None,
                self.options.include_value.then(|| value.clone()),
            );
            let descent = self.descend(value, ctx).await?;
            absorb(&mut node, descent);
            Ok(node.into_non_empty())
        }
        .boxed()
    }

    /// Validate an object reached by descent against its own shape.
    fn validate_object(self, value: &'a Value) -> BoxFuture<'a, Result<Vec<ValidationError>, EngineError>> {
        async move {
            let (target, instance) = match value {
                Value::Instance(instance) => (instance.shape(), Some(instance)),
                _ => ("Object", None),
            };
            let shape = instance.and_then(|i| self.registry.shape(i.shape()));
            match (instance, shape) {
                (Some(instance), Some(shape)) if !shape.fields.is_empty() => {
                    self.validate_fields(shape, instance).await
                }
                _ if self.options.forbid_unknown_values => {
                    tracing::trace!(shape = target, "no registered shape for nested value");
                    Ok(vec![ValidationError::unknown_value(
                        self.options.include_target.then_some(target),
                    )])
                }
                _ => Ok(Vec::new()),
            }
        }
        .boxed()
    }

    fn mismatch_message(self, value: &Value, ctx: NestedContext<'a>) -> String {
        let args = ValidationArguments {
            target: ctx.target,
            property: ctx.field,
            value,
            constraints: &[],
        };
        self.render(ctx.spec.message.as_deref(), &args, || {
            let prefix = if ctx.spec.each { EACH_PREFIX } else { "" };
            format!("{}nested property $property must be either object or array", prefix)
        })
    }
}

fn absorb(node: &mut ValidationError, descent: Descent) {
    match descent {
        Descent::Nothing => {}
        Descent::Mismatch(message) => node.fail(NESTED_VALIDATION, message),
        Descent::Children(children) => node.children = children,
    }
}

async fn settle(verdict: Verdict) -> Result<bool, BoxError> {
    match verdict {
        Verdict::Ready(valid) => Ok(valid),
        Verdict::Pending(pending) => pending.await,
    }
}
