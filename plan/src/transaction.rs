//! The transaction: an ordered container of operations.

use crate::{document_dependencies, Operation, OperationId, OperationKind};
use serde::Serialize;

/// Binds a root response field to the operation whose output produces
/// it. With dependency operations emitted before their consumers, a root
/// operation is not necessarily index 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RootBinding {
    /// Response field name (the request's root field name).
    pub field: String,
    /// Operation whose output tree is evaluated for this field.
    pub operation: OperationId,
}

/// An ordered sequence of operations compiled from one request,
/// immutable after build. Owns all operations; identifiers are indices
/// into the list.
///
/// Invariant: every deferred value embedded in an operation's selector
/// or data references a strictly earlier operation. Output-tree deferred
/// values may reference any index - they are evaluated only after the
/// whole transaction has executed.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Transaction {
    operations: Vec<Operation>,
    roots: Vec<RootBinding>,
}

impl Transaction {
    /// Create an empty transaction.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new operation skeleton and return its identifier.
    /// Identifiers are sequential from 0, in emission order.
    pub fn push(
        &mut self,
        collection: impl Into<String>,
        kind: OperationKind,
        many: bool,
    ) -> OperationId {
        let id = OperationId(self.operations.len());
        self.operations.push(Operation::new(id, collection, kind, many));
        id
    }

    /// Get an operation by identifier.
    pub fn operation(&self, id: OperationId) -> Option<&Operation> {
        self.operations.get(id.index())
    }

    /// Get a mutable operation by identifier (used while building).
    pub fn operation_mut(&mut self, id: OperationId) -> Option<&mut Operation> {
        self.operations.get_mut(id.index())
    }

    /// All operations in emission (= execution) order.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Bind a root response field to an operation.
    pub fn bind_root(&mut self, field: impl Into<String>, operation: OperationId) {
        self.roots.push(RootBinding {
            field: field.into(),
            operation,
        });
    }

    /// Root bindings in request order.
    pub fn roots(&self) -> &[RootBinding] {
        &self.roots
    }

    /// Check the backward-reference invariant: every deferred value in
    /// any operation's selector/data points at a strictly earlier
    /// operation. The builder guarantees this; the check exists for
    /// tests and debugging.
    pub fn is_well_ordered(&self) -> bool {
        self.operations.iter().enumerate().all(|(index, op)| {
            let mut deps = Vec::new();
            if let Some(selector) = op.selector() {
                deps.extend(document_dependencies(selector));
            }
            if let Some(data) = op.data() {
                deps.extend(document_dependencies(data));
            }
            deps.into_iter().all(|dep| dep.index() < index)
        })
    }
}

impl std::ops::Index<OperationId> for Transaction {
    type Output = Operation;

    fn index(&self, id: OperationId) -> &Operation {
        &self.operations[id.index()]
    }
}

impl std::ops::IndexMut<OperationId> for Transaction {
    fn index_mut(&mut self, id: OperationId) -> &mut Operation {
        &mut self.operations[id.index()]
    }
}
