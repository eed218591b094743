//! Deferred values: references to not-yet-computed operation results.
//!
//! A deferred value names a source operation and a chain of transforms
//! over its raw result rows. Transforms are inert data here; the
//! evaluator in `canopy-executor` interprets them once results exist.
//! `Lookup` and `DistinctReplace` carry a child deferred value of their
//! own, so the structure is a tree - never a cycle, because a child
//! always references a different operation.

use serde::Serialize;
use std::fmt;

/// Identifier of an operation within a transaction, assigned in strict
/// visitation order starting at 0 and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct OperationId(pub usize);

impl OperationId {
    /// Index into the transaction's operation list.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Operation-{}", self.0)
    }
}

/// A transform over an operation's raw result rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Transform {
    /// Unique values of a (possibly dotted) field across all rows; list
    /// values are flattened.
    Distinct { field: String },

    /// The value of a field from a single-row result.
    Path { field: String },

    /// Group-join: attach to each parent row, under `field`, the array
    /// of child rows whose `foreign_key` equals the parent's
    /// `local_key`.
    Lookup {
        field: String,
        local_key: String,
        foreign_key: String,
        child: DeferredValue,
    },

    /// Replace each parent row's raw foreign-key value(s) at `local_key`
    /// with the matching child document(s), re-keyed to `field` at the
    /// same position. A scalar key yields one document (or null), a list
    /// key yields an array in key order.
    DistinctReplace {
        field: String,
        local_key: String,
        foreign_key: String,
        child: DeferredValue,
    },
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transform::Distinct { field } => write!(f, "distinct('{}')", field),
            Transform::Path { field } => write!(f, "path('{}')", field),
            Transform::Lookup {
                field,
                local_key,
                foreign_key,
                child,
            } => write!(
                f,
                "lookup('{}', '{}', '{}', {})",
                field, local_key, foreign_key, child
            ),
            Transform::DistinctReplace {
                field,
                local_key,
                foreign_key,
                child,
            } => write!(
                f,
                "distinctReplace('{}', '{}', '{}', {})",
                field, local_key, foreign_key, child
            ),
        }
    }
}

/// A reference to the eventual result of an operation, passed through a
/// chain of transforms. An empty chain is the identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeferredValue {
    /// The operation whose raw result rows feed the chain.
    pub source: OperationId,
    /// Transforms applied in order.
    pub transforms: Vec<Transform>,
}

impl DeferredValue {
    /// The raw result of an operation, untransformed.
    pub fn identity(source: OperationId) -> Self {
        Self {
            source,
            transforms: Vec::new(),
        }
    }

    /// Unique values of `field` across the operation's rows.
    pub fn distinct(source: OperationId, field: impl Into<String>) -> Self {
        Self::identity(source).then(Transform::Distinct {
            field: field.into(),
        })
    }

    /// The value of `field` from a single-row result.
    pub fn path(source: OperationId, field: impl Into<String>) -> Self {
        Self::identity(source).then(Transform::Path {
            field: field.into(),
        })
    }

    /// Append a transform to the chain.
    pub fn then(mut self, transform: Transform) -> Self {
        self.transforms.push(transform);
        self
    }

    /// True if this is the untransformed identity of its source.
    pub fn is_identity(&self) -> bool {
        self.transforms.is_empty()
    }

    /// All operation ids this value depends on: the source plus, for
    /// join transforms, every child's dependencies.
    pub fn dependencies(&self) -> Vec<OperationId> {
        let mut out = vec![self.source];
        for transform in &self.transforms {
            match transform {
                Transform::Lookup { child, .. } | Transform::DistinctReplace { child, .. } => {
                    out.extend(child.dependencies());
                }
                Transform::Distinct { .. } | Transform::Path { .. } => {}
            }
        }
        out
    }
}

impl fmt::Display for DeferredValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)?;
        for transform in &self.transforms {
            write!(f, " -> {}", transform)?;
        }
        Ok(())
    }
}
