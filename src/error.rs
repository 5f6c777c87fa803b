//! Error types shared across the crate.
//!
//! Validation failures are never errors: they come back as `ValidationError`
//! trees. What lives here is the fatal channel (`EngineError`) and the
//! problems found while loading a declarative schema (`SchemaError`).

use thiserror::Error;

/// Error raised by a constraint evaluator.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Fatal engine error. A validation run that hits one of these stops and
/// returns it instead of an error tree.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A constraint evaluator raised instead of returning a verdict.
    #[error("constraint '{constraint}' raised while validating property '{property}': {source}")]
    Constraint {
        constraint: String,
        property: String,
        #[source]
        source: BoxError,
    },

    /// A key-value collection reached by nested validation has a key with no
    /// printable label (the no-value sentinel or null).
    #[error("cannot label map key {key} under property '{property}'")]
    UnlabelableMapKey { property: String, key: &'static str },

    #[error("a process-wide registry is already installed")]
    RegistryAlreadyInstalled,
}

/// A problem found while loading a declarative schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    pub code: &'static str,
    pub message: String,
    pub shape: Option<String>,
    pub field: Option<String>,
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.shape, &self.field) {
            (Some(shape), Some(field)) => {
                write!(f, "[{}] {} (at '{}.{}')", self.code, self.message, shape, field)
            }
            (Some(shape), None) => write!(f, "[{}] {} (at '{}')", self.code, self.message, shape),
            _ => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

impl std::error::Error for SchemaError {}

impl SchemaError {
    pub fn document(code: &'static str, message: impl Into<String>) -> Self {
        SchemaError {
            code,
            message: message.into(),
            shape: None,
            field: None,
        }
    }

    pub fn shape(code: &'static str, message: impl Into<String>, shape: &str) -> Self {
        SchemaError {
            code,
            message: message.into(),
            shape: Some(shape.to_string()),
            field: None,
        }
    }

    pub fn field(code: &'static str, message: impl Into<String>, shape: &str, field: &str) -> Self {
        SchemaError {
            code,
            message: message.into(),
            shape: Some(shape.to_string()),
            field: Some(field.to_string()),
        }
    }
}
