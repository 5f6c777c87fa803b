//! Built-in constraint family.
//!
//! Each constructor returns a ready-to-register `ConstraintDeclaration`;
//! chain `.each()` or `.message(..)` on it as needed.

use std::sync::Arc;

use super::{Constraint, ValidationArguments, Verdict};
use crate::error::BoxError;
use crate::registry::ConstraintDeclaration;
use crate::value::Value;

pub const IS_DEFINED: &str = "isDefined";
pub const EQUALS: &str = "equals";
pub const NOT_EQUALS: &str = "notEquals";
pub const IS_EMPTY: &str = "isEmpty";
pub const IS_NOT_EMPTY: &str = "isNotEmpty";
pub const IS_IN: &str = "isIn";
pub const IS_NOT_IN: &str = "isNotIn";
pub const IS_BOOLEAN: &str = "isBoolean";
pub const IS_INT: &str = "isInt";
pub const IS_STRING: &str = "isString";
pub const IS_ARRAY: &str = "isArray";
pub const IS_LENGTH: &str = "isLength";

/// Predicate-only built-ins share one implementation.
struct Builtin {
    name: &'static str,
    message: &'static str,
    presence: bool,
    check: fn(&Value, &[Value]) -> bool,
}

impl Constraint for Builtin {
    fn name(&self) -> &str {
        self.name
    }

    fn validate(&self, value: &Value, args: &ValidationArguments<'_>) -> Result<Verdict, BoxError> {
        Ok(Verdict::Ready((self.check)(value, args.constraints)))
    }

    fn default_message(&self, _args: &ValidationArguments<'_>) -> String {
        self.message.to_string()
    }

    fn is_presence_check(&self) -> bool {
        self.presence
    }
}

fn declare(builtin: Builtin, args: Vec<Value>) -> ConstraintDeclaration {
    ConstraintDeclaration::new(Arc::new(builtin)).with_args(args)
}

/// Rejects the sentinel and `null`, whether assigned or absent.
pub fn is_defined() -> ConstraintDeclaration {
    declare(
        Builtin {
            name: IS_DEFINED,
            message: "$property should not be null or undefined",
            presence: true,
            check: |value, _| !value.is_nullish(),
        },
        Vec::new(),
    )
}

pub fn equals(comparison: impl Into<Value>) -> ConstraintDeclaration {
    declare(
        Builtin {
            name: EQUALS,
            message: "$property must be equal to $constraint1",
            presence: false,
            check: |value, args| args.first().is_some_and(|c| value.strict_equals(c)),
        },
        vec![comparison.into()],
    )
}

pub fn not_equals(comparison: impl Into<Value>) -> ConstraintDeclaration {
    declare(
        Builtin {
            name: NOT_EQUALS,
            message: "$property should not be equal to $constraint1",
            presence: false,
            check: |value, args| !args.first().is_some_and(|c| value.strict_equals(c)),
        },
        vec![comparison.into()],
    )
}

/// Empty means the sentinel, `null`, or `""`. Empty containers are not empty.
pub fn is_empty() -> ConstraintDeclaration {
    declare(
        Builtin {
            name: IS_EMPTY,
            message: "$property must be empty",
            presence: false,
            check: |value, _| is_empty_value(value),
        },
        Vec::new(),
    )
}

pub fn is_not_empty() -> ConstraintDeclaration {
    declare(
        Builtin {
            name: IS_NOT_EMPTY,
            message: "$property should not be empty",
            presence: false,
            check: |value, _| !is_empty_value(value),
        },
        Vec::new(),
    )
}

fn is_empty_value(value: &Value) -> bool {
    value.is_nullish() || value.as_str() == Some("")
}

/// `possible` is an array of candidates; holes in it never match.
pub fn is_in(possible: impl Into<Value>) -> ConstraintDeclaration {
    declare(
        Builtin {
            name: IS_IN,
            message: "$property must be one of the following values: $constraint1",
            presence: false,
            check: |value, args| contains(args.first(), value),
        },
        vec![possible.into()],
    )
}

pub fn is_not_in(possible: impl Into<Value>) -> ConstraintDeclaration {
    declare(
        Builtin {
            name: IS_NOT_IN,
            message: "$property should not be one of the following values: $constraint1",
            presence: false,
            check: |value, args| !contains(args.first(), value),
        },
        vec![possible.into()],
    )
}

fn contains(possible: Option<&Value>, value: &Value) -> bool {
    match possible {
        Some(Value::Array(candidates)) => candidates
            .iter_present()
            .any(|(_, candidate)| candidate.strict_equals(value)),
        _ => false,
    }
}

pub fn is_boolean() -> ConstraintDeclaration {
    declare(
        Builtin {
            name: IS_BOOLEAN,
            message: "$property must be a boolean value",
            presence: false,
            check: |value, _| matches!(value, Value::Bool(_)),
        },
        Vec::new(),
    )
}

pub fn is_int() -> ConstraintDeclaration {
    declare(
        Builtin {
            name: IS_INT,
            message: "$property must be an integer number",
            presence: false,
            check: |value, _| value.as_f64().is_some_and(|n| n.is_finite() && n.fract() == 0.0),
        },
        Vec::new(),
    )
}

pub fn is_string() -> ConstraintDeclaration {
    declare(
        Builtin {
            name: IS_STRING,
            message: "$property must be a string",
            presence: false,
            check: |value, _| matches!(value, Value::String(_)),
        },
        Vec::new(),
    )
}

pub fn is_array() -> ConstraintDeclaration {
    declare(
        Builtin {
            name: IS_ARRAY,
            message: "$property must be an array",
            presence: false,
            check: |value, _| matches!(value, Value::Array(_)),
        },
        Vec::new(),
    )
}

// =============================================================================
// LENGTH
// =============================================================================

/// String length bounds, inclusive. Length counts characters, ignoring
/// variation selectors.
pub fn length(min: Option<usize>, max: Option<usize>) -> ConstraintDeclaration {
    let bound = |b: Option<usize>| b.map_or(Value::Null, |n| Value::Number(n as f64));
    ConstraintDeclaration::new(Arc::new(Length)).with_args(vec![bound(min), bound(max)])
}

struct Length;

impl Length {
    fn bounds(constraints: &[Value]) -> (Option<f64>, Option<f64>) {
        let at = |i: usize| constraints.get(i).and_then(Value::as_f64);
        (at(0), at(1))
    }
}

fn char_length(s: &str) -> usize {
    s.chars()
        .filter(|c| !matches!(c, '\u{FE0E}' | '\u{FE0F}'))
        .count()
}

impl Constraint for Length {
    fn name(&self) -> &str {
        IS_LENGTH
    }

    fn validate(&self, value: &Value, args: &ValidationArguments<'_>) -> Result<Verdict, BoxError> {
        let Some(s) = value.as_str() else {
            return Ok(Verdict::Ready(false));
        };
        let len = char_length(s) as f64;
        let (min, max) = Self::bounds(args.constraints);
        let valid = min.is_none_or(|min| len >= min) && max.is_none_or(|max| len <= max);
        Ok(Verdict::Ready(valid))
    }

    fn default_message(&self, args: &ValidationArguments<'_>) -> String {
        let (min, max) = Self::bounds(args.constraints);
        let len = args.value.as_str().map(char_length);
        if let Some(min) = min {
            if len.is_none_or(|len| (len as f64) < min) {
                return "$property must be longer than or equal to $constraint1 characters".into();
            }
        }
        if let (Some(max), Some(len)) = (max, len) {
            if len as f64 > max {
                return "$property must be shorter than or equal to $constraint2 characters".into();
            }
        }
        "$property must be longer than or equal to $constraint1 and shorter than or equal to $constraint2 characters".into()
    }
}

// =============================================================================
// LOOKUP
// =============================================================================

/// Resolve a built-in by its reported name, checking its arguments.
pub fn by_name(name: &str, args: Vec<Value>) -> Result<Option<ConstraintDeclaration>, String> {
    let declaration = match name {
        IS_DEFINED => no_args(name, args).map(|_| is_defined()),
        IS_EMPTY => no_args(name, args).map(|_| is_empty()),
        IS_NOT_EMPTY => no_args(name, args).map(|_| is_not_empty()),
        IS_BOOLEAN => no_args(name, args).map(|_| is_boolean()),
        IS_INT => no_args(name, args).map(|_| is_int()),
        IS_STRING => no_args(name, args).map(|_| is_string()),
        IS_ARRAY => no_args(name, args).map(|_| is_array()),
        EQUALS => single_arg(name, args).map(equals),
        NOT_EQUALS => single_arg(name, args).map(not_equals),
        IS_IN => array_arg(name, args).map(is_in),
        IS_NOT_IN => array_arg(name, args).map(is_not_in),
        IS_LENGTH => length_args(args),
        _ => return Ok(None),
    }?;
    Ok(Some(declaration))
}

fn no_args(name: &str, args: Vec<Value>) -> Result<(), String> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(format!("'{}' takes no arguments, got {}", name, args.len()))
    }
}

fn single_arg(name: &str, args: Vec<Value>) -> Result<Value, String> {
    let count = args.len();
    let mut args = args.into_iter();
    match (args.next(), count) {
        (Some(arg), 1) => Ok(arg),
        _ => Err(format!("'{}' takes exactly 1 argument, got {}", name, count)),
    }
}

fn array_arg(name: &str, args: Vec<Value>) -> Result<Value, String> {
    let arg = single_arg(name, args)?;
    if matches!(arg, Value::Array(_)) {
        Ok(arg)
    } else {
        Err(format!("'{}' takes an array of candidate values", name))
    }
}

fn length_args(args: Vec<Value>) -> Result<ConstraintDeclaration, String> {
    if args.is_empty() || args.len() > 2 {
        return Err(format!("'{}' takes 1 or 2 arguments, got {}", IS_LENGTH, args.len()));
    }
    let mut bounds = [None, None];
    for (slot, arg) in bounds.iter_mut().zip(&args) {
        *slot = match arg {
            Value::Null => None,
            Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 => Some(*n as usize),
            other => {
                return Err(format!(
                    "'{}' bounds must be non-negative integers or null, got {}",
                    IS_LENGTH,
                    other.to_js_string()
                ));
            }
        };
    }
    Ok(length(bounds[0], bounds[1]))
}
