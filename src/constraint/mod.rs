//! Constraint evaluator: the predicate contract and message rendering.
//!
//! A constraint answers with a `Verdict` that is either settled immediately
//! or a future to await. Raising (returning `Err`) is reserved for evaluator
//! bugs and surfaces as a fatal `EngineError`; an expected rejection is
//! `Verdict::Ready(false)`.

pub mod builtin;

use std::future::Future;
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};

use crate::error::BoxError;
use crate::value::Value;

/// Prefix applied to default messages of element-wise declarations.
pub const EACH_PREFIX: &str = "each value in ";

pub enum Verdict {
    Ready(bool),
    Pending(BoxFuture<'static, Result<bool, BoxError>>),
}

impl From<bool> for Verdict {
    fn from(valid: bool) -> Self {
        Verdict::Ready(valid)
    }
}

impl std::fmt::Debug for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Ready(valid) => f.debug_tuple("Ready").field(valid).finish(),
            Verdict::Pending(_) => f.write_str("Pending"),
        }
    }
}

/// Context a constraint sees. `value` is the whole field value even when the
/// predicate is being applied to one element of it.
#[derive(Debug, Clone, Copy)]
pub struct ValidationArguments<'a> {
    /// Name of the shape that declares the field.
    pub target: &'a str,
    pub property: &'a str,
    pub value: &'a Value,
    pub constraints: &'a [Value],
}

pub trait Constraint: Send + Sync {
    /// Key under which failures are reported.
    fn name(&self) -> &str;

    fn validate(&self, value: &Value, args: &ValidationArguments<'_>) -> Result<Verdict, BoxError>;

    /// Message template used when the declaration carries none.
    fn default_message(&self, _args: &ValidationArguments<'_>) -> String {
        format!("$property failed the {} constraint", self.name())
    }

    /// Presence checks run even when the skip options would otherwise stop a
    /// field's evaluation.
    fn is_presence_check(&self) -> bool {
        false
    }
}

// =============================================================================
// CLOSURE ADAPTERS
// =============================================================================

struct FnConstraint<F> {
    name: String,
    predicate: F,
}

impl<F> Constraint for FnConstraint<F>
where
    F: Fn(&Value, &ValidationArguments<'_>) -> bool + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self, value: &Value, args: &ValidationArguments<'_>) -> Result<Verdict, BoxError> {
        Ok(Verdict::Ready((self.predicate)(value, args)))
    }
}

/// Synchronous constraint from a predicate.
pub fn from_fn<F>(name: impl Into<String>, predicate: F) -> Arc<dyn Constraint>
where
    F: Fn(&Value, &ValidationArguments<'_>) -> bool + Send + Sync + 'static,
{
    Arc::new(FnConstraint {
        name: name.into(),
        predicate,
    })
}

struct AsyncFnConstraint<F> {
    name: String,
    predicate: F,
}

impl<F, Fut> Constraint for AsyncFnConstraint<F>
where
    F: Fn(Value, Vec<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<bool, BoxError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self, value: &Value, args: &ValidationArguments<'_>) -> Result<Verdict, BoxError> {
        let pending = (self.predicate)(value.clone(), args.constraints.to_vec());
        Ok(Verdict::Pending(pending.boxed()))
    }
}

/// Awaitable constraint. The predicate receives the value being checked and
/// the declaration's arguments by value so the future can outlive the call.
pub fn from_async_fn<F, Fut>(name: impl Into<String>, predicate: F) -> Arc<dyn Constraint>
where
    F: Fn(Value, Vec<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<bool, BoxError>> + Send + 'static,
{
    Arc::new(AsyncFnConstraint {
        name: name.into(),
        predicate,
    })
}

// =============================================================================
// MESSAGES
// =============================================================================

/// Substitute `$constraintN`, `$value`, `$property` and `$target`.
///
/// `$value` is only substituted for strings, booleans and numbers.
pub fn render_message(template: &str, args: &ValidationArguments<'_>) -> String {
    let mut message = template.to_string();
    for (index, constraint) in args.constraints.iter().enumerate() {
        let token = format!("$constraint{}", index + 1);
        message = message.replace(&token, &constraint_to_string(constraint));
    }
    if matches!(args.value, Value::String(_) | Value::Bool(_) | Value::Number(_)) {
        message = message.replace("$value", &args.value.to_js_string());
    }
    message
        .replace("$property", args.property)
        .replace("$target", args.target)
}

fn constraint_to_string(constraint: &Value) -> String {
    match constraint {
        Value::Array(array) => array.join(", "),
        other => other.to_js_string(),
    }
}
