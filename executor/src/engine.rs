//! The execution engine.
//!
//! Runs a compiled transaction's operations strictly in index order.
//! Selector/data deferred values only ever look backward (the builder
//! guarantees it; the engine enforces it), so by the time an operation
//! dispatches, everything it needs is literal. After the last operation
//! the root output trees are evaluated into the response document.

use crate::{
    Evaluated, Evaluator, ExecError, ExecResult, ResultCache, StorageExecutor,
};
use canopy_core::{Document, Value};
use canopy_plan::{OperationId, Term, TermDocument, Transaction};
use tracing::{debug, trace};

/// Executes one transaction against a storage executor.
pub struct ExecutionEngine<'t> {
    txn: &'t Transaction,
}

impl<'t> ExecutionEngine<'t> {
    /// Create an engine over a compiled transaction.
    pub fn new(txn: &'t Transaction) -> Self {
        Self { txn }
    }

    /// Execute every operation in order and assemble the response.
    ///
    /// A storage failure aborts the remaining operations; whatever
    /// earlier operations wrote stays written - atomicity across
    /// operations is the storage layer's concern, not this engine's.
    pub fn execute(&self, storage: &mut dyn StorageExecutor) -> ExecResult<Value> {
        let mut cache = ResultCache::new();

        for op in self.txn.operations() {
            let id = op.identifier();
            let selector = match op.selector() {
                Some(selector) => Some(self.resolve_document(selector, id, &cache)?),
                None => None,
            };
            let data = match op.data() {
                Some(data) => Some(self.resolve_document(data, id, &cache)?),
                None => None,
            };

            debug!(
                operation = %id,
                collection = op.collection(),
                kind = %op.kind(),
                "dispatching operation"
            );
            let rows = storage
                .run(
                    op.collection(),
                    op.kind(),
                    selector.as_ref(),
                    data.as_ref(),
                    op.fields(),
                )
                .map_err(|e| ExecError::storage(id, op.collection(), e))?;
            cache.insert(id, rows);
        }

        self.assemble(&cache)
    }

    /// Evaluate each root binding's output tree into the response
    /// document, adjusting cardinality: a single-record operation
    /// contributes one document (or null), a collection operation an
    /// array.
    fn assemble(&self, cache: &ResultCache) -> ExecResult<Value> {
        let evaluator = Evaluator::new(self.txn, cache);
        let mut response = Document::new();

        for root in self.txn.roots() {
            let op = self
                .txn
                .operation(root.operation)
                .ok_or_else(|| ExecError::unresolved(root.operation, root.operation))?;

            let value = match evaluator.evaluate(op.output(), op.identifier())? {
                Evaluated::Rows(rows) => {
                    if op.many() {
                        Value::List(rows.into_iter().map(Value::Doc).collect())
                    } else {
                        rows.into_iter().next().map(Value::Doc).unwrap_or(Value::Null)
                    }
                }
                Evaluated::Value(value) => value,
            };
            response.insert(root.field.clone(), value);
        }

        Ok(Value::Doc(response))
    }

    /// Resolve every deferred leaf of a selector/data document into a
    /// literal. A reference at or past the current operation index is a
    /// broken builder invariant and fails the transaction.
    fn resolve_document(
        &self,
        doc: &TermDocument,
        consumer: OperationId,
        cache: &ResultCache,
    ) -> ExecResult<Document> {
        let mut out = Document::new();
        for (key, term) in doc {
            out.insert(key.clone(), self.resolve_term(term, consumer, cache)?);
        }
        Ok(out)
    }

    fn resolve_term(
        &self,
        term: &Term,
        consumer: OperationId,
        cache: &ResultCache,
    ) -> ExecResult<Value> {
        match term {
            Term::Value(value) => Ok(value.clone()),
            Term::Doc(doc) => Ok(Value::Doc(self.resolve_document(doc, consumer, cache)?)),
            Term::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.resolve_term(item, consumer, cache)?);
                }
                Ok(Value::List(out))
            }
            Term::Deferred(dv) => {
                for dep in dv.dependencies() {
                    if dep.index() >= consumer.index() || !cache.contains(dep) {
                        return Err(ExecError::unresolved(consumer, dep));
                    }
                }
                trace!(operation = %consumer, deferred = %dv, "resolving deferred value");
                let evaluator = Evaluator::new(self.txn, cache);
                Ok(match evaluator.evaluate(dv, consumer)? {
                    Evaluated::Value(value) => value,
                    Evaluated::Rows(rows) => {
                        Value::List(rows.into_iter().map(Value::Doc).collect())
                    }
                })
            }
        }
    }
}
