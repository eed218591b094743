//! Per-transaction result cache.

use canopy_core::Document;
use canopy_plan::OperationId;
use std::collections::HashMap;

/// Raw result rows per operation identifier. Write-once per identifier:
/// an operation's rows are recorded when it completes and never mutated
/// afterwards; assembly reads them as often as it likes.
#[derive(Debug, Default)]
pub struct ResultCache {
    rows: HashMap<OperationId, Vec<Document>>,
}

impl ResultCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an operation's raw rows. The engine calls this exactly
    /// once per operation, in index order.
    pub fn insert(&mut self, id: OperationId, rows: Vec<Document>) {
        debug_assert!(
            !self.rows.contains_key(&id),
            "result for {} recorded twice",
            id
        );
        self.rows.insert(id, rows);
    }

    /// Raw rows of a completed operation.
    pub fn get(&self, id: OperationId) -> Option<&[Document]> {
        self.rows.get(&id).map(|rows| rows.as_slice())
    }

    /// Whether an operation's result has been recorded.
    pub fn contains(&self, id: OperationId) -> bool {
        self.rows.contains_key(&id)
    }
}
