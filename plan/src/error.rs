//! Plan compilation error types.

use canopy_registry::SchemaError;
use thiserror::Error;

/// Result type for plan compilation.
pub type PlanResult<T> = Result<T, PlanError>;

/// Errors that can occur while compiling a request into a transaction.
/// Both kinds are fatal and abort compilation before any operation runs.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Schema mismatch: {message}")]
    SchemaMismatch { message: String },

    #[error("Required field {field} on model {model} has no value and no default")]
    RequiredDefaultMissing { model: String, field: String },
}

impl PlanError {
    pub fn schema_mismatch(message: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            message: message.into(),
        }
    }

    pub fn required_default_missing(model: impl Into<String>, field: impl Into<String>) -> Self {
        Self::RequiredDefaultMissing {
            model: model.into(),
            field: field.into(),
        }
    }
}

impl From<SchemaError> for PlanError {
    fn from(e: SchemaError) -> Self {
        Self::SchemaMismatch {
            message: e.to_string(),
        }
    }
}
