//! The storage executor interface.

use canopy_core::Document;
use canopy_plan::{FieldSelection, OperationKind};
use thiserror::Error;

/// Error from the external storage layer. Canopy does not interpret it;
/// it is attributed to the failing operation and surfaced verbatim.
/// Retries, if any, belong below this interface.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct StorageError {
    pub message: String,
}

impl StorageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// One primitive storage call against a named collection.
///
/// Implementations must support equality, `$in`, and `$or` selector
/// operators, and must return documents containing at least the
/// projected fields (plus whatever join keys the selector referenced -
/// the engine shapes responses from the projected field list, so
/// returning extra fields is harmless).
pub trait StorageExecutor {
    fn run(
        &mut self,
        collection: &str,
        kind: OperationKind,
        selector: Option<&Document>,
        data: Option<&Document>,
        fields: Option<&FieldSelection>,
    ) -> Result<Vec<Document>, StorageError>;
}
