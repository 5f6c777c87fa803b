//! Recursive validation of dynamic value graphs against registered shapes.
//!
//! Shapes declare per-field constraints once (`registry`); `validate` walks
//! an instance, its nested shapes and collections, and returns an error tree
//! that mirrors the input's nesting.

pub mod constraint;
pub mod error;
pub mod options;
pub mod registry;
pub mod validate;
pub mod value;

pub use constraint::{Constraint, ValidationArguments, Verdict};
pub use error::{EngineError, SchemaError};
pub use options::ValidatorOptions;
pub use registry::{ConstraintDeclaration, FieldSpec, Registry, ShapeSpec};
pub use validate::{Rejection, ValidationError, Validator, validate};
pub use value::{Instance, Kind, Record, Value};
