//! Public entry point.
//!
//! A `Validator` pairs a registry with options. The free `validate` function
//! uses the process-wide registry and default options.

pub mod traverse;
pub mod tree;

use std::sync::Arc;

use thiserror::Error;

use crate::error::EngineError;
use crate::options::ValidatorOptions;
use crate::registry::{self, Registry};
use crate::value::Instance;
use traverse::Traversal;
pub use tree::ValidationError;

#[derive(Debug, Clone)]
pub struct Validator {
    registry: Arc<Registry>,
    options: ValidatorOptions,
}

/// Why `validate_or_reject` rejected an instance.
#[derive(Debug, Error)]
pub enum Rejection {
    #[error("{} validation error(s)", .0.len())]
    Invalid(Vec<ValidationError>),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl Validator {
    pub fn new(registry: Arc<Registry>) -> Self {
        Validator {
            registry,
            options: ValidatorOptions::default(),
        }
    }

    /// Validator over the process-wide registry.
    pub fn global() -> Self {
        Validator::new(registry::global())
    }

    pub fn with_options(mut self, options: ValidatorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ValidatorOptions {
        &self.options
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Validate `instance` against its registered shape. An instance whose
    /// shape was never registered has nothing to validate.
    ///
    /// Top-level errors come back in field declaration order.
    pub async fn validate(&self, instance: &Instance) -> Result<Vec<ValidationError>, EngineError> {
        let Some(shape) = self.registry.shape(instance.shape()) else {
            tracing::debug!(shape = instance.shape(), "shape not registered, nothing to validate");
            return Ok(Vec::new());
        };

        tracing::debug!(shape = %shape.name, fields = shape.fields.len(), "validation started");
        let traversal = Traversal {
            registry: &self.registry,
            options: &self.options,
        };
        let result = traversal.validate_fields(shape, instance).await;
        match &result {
            Ok(errors) => {
                tracing::debug!(shape = %shape.name, errors = errors.len(), "validation finished")
            }
            Err(e) => tracing::warn!(shape = %shape.name, error = %e, "validation aborted"),
        }
        result
    }

    /// Like `validate`, but any validation failure is an `Err`.
    pub async fn validate_or_reject(&self, instance: &Instance) -> Result<(), Rejection> {
        let errors = self.validate(instance).await?;
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Rejection::Invalid(errors))
        }
    }
}

/// Validate against the process-wide registry with default options.
pub async fn validate(instance: &Instance) -> Result<Vec<ValidationError>, EngineError> {
    Validator::global().validate(instance).await
}
