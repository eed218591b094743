//! Execution error types.

use crate::StorageError;
use canopy_plan::OperationId;
use thiserror::Error;

/// Result type for execution.
pub type ExecResult<T> = Result<T, ExecError>;

/// Errors that can occur while executing a transaction. Both kinds are
/// fatal: remaining operations are not dispatched and no partial result
/// is returned.
#[derive(Debug, Error)]
pub enum ExecError {
    /// A deferred value referenced an operation whose result does not
    /// exist yet. The builder guarantees this never happens; seeing it
    /// means a builder bug, not a storage problem.
    #[error("{operation} references unresolved result of {reference}")]
    UnresolvedDependency {
        operation: OperationId,
        reference: OperationId,
    },

    /// The storage executor failed. Surfaced verbatim, attributed to the
    /// failing operation.
    #[error("storage error in {operation} on collection {collection}: {source}")]
    Storage {
        operation: OperationId,
        collection: String,
        #[source]
        source: StorageError,
    },
}

impl ExecError {
    pub fn unresolved(operation: OperationId, reference: OperationId) -> Self {
        Self::UnresolvedDependency {
            operation,
            reference,
        }
    }

    pub fn storage(operation: OperationId, collection: impl Into<String>, source: StorageError) -> Self {
        Self::Storage {
            operation,
            collection: collection.into(),
            source,
        }
    }
}
