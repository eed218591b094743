//! Deferred-value evaluation.
//!
//! Interprets a transform chain over the finalized result cache. Keys
//! for joins are always read from the raw rows; the documents spliced
//! into the response are the shaped rows (raw rows projected to the
//! operation's field selection, then transformed). Transforms never
//! reorder or drop rows, so raw and shaped rows stay index-aligned.

use crate::{ExecError, ExecResult, ResultCache};
use canopy_core::{get_path, set_path, Document, Value};
use canopy_plan::{DeferredValue, FieldSelection, OperationId, Transaction, Transform};

/// The outcome of evaluating a deferred value: result rows or a scalar
/// projection.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluated {
    Rows(Vec<Document>),
    Value(Value),
}

/// Evaluates deferred values against a transaction's result cache.
pub struct Evaluator<'a> {
    txn: &'a Transaction,
    cache: &'a ResultCache,
}

enum State {
    Rows { raw: Vec<Document>, shaped: Vec<Document> },
    Value(Value),
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator over a transaction and its cache.
    pub fn new(txn: &'a Transaction, cache: &'a ResultCache) -> Self {
        Self { txn, cache }
    }

    /// Evaluate a deferred value. `consumer` attributes failures to the
    /// operation (or root) the value is being resolved for.
    pub fn evaluate(&self, dv: &DeferredValue, consumer: OperationId) -> ExecResult<Evaluated> {
        Ok(match self.eval_state(dv, consumer)? {
            State::Rows { shaped, .. } => Evaluated::Rows(shaped),
            State::Value(value) => Evaluated::Value(value),
        })
    }

    fn eval_state(&self, dv: &DeferredValue, consumer: OperationId) -> ExecResult<State> {
        let raw = self
            .cache
            .get(dv.source)
            .ok_or_else(|| ExecError::unresolved(consumer, dv.source))?
            .to_vec();
        let fields = self.txn.operation(dv.source).and_then(|op| op.fields());
        let shaped = raw.iter().map(|row| project(row, fields)).collect();
        let mut state = State::Rows { raw, shaped };

        for transform in &dv.transforms {
            state = match (state, transform) {
                (State::Rows { raw, .. }, Transform::Distinct { field }) => {
                    State::Value(distinct_of(&raw, field))
                }
                (State::Rows { raw, .. }, Transform::Path { field }) => {
                    State::Value(path_of(&raw, field))
                }
                (
                    State::Rows { raw, mut shaped },
                    Transform::Lookup {
                        field,
                        local_key,
                        foreign_key,
                        child,
                    },
                ) => {
                    let (child_raw, child_shaped) = self.child_rows(child, consumer)?;
                    for (row, shaped_row) in raw.iter().zip(shaped.iter_mut()) {
                        let matches = match get_path(row, local_key) {
                            Some(parent_key) => joined_docs(
                                parent_key,
                                foreign_key,
                                &child_raw,
                                &child_shaped,
                            ),
                            None => Vec::new(),
                        };
                        set_path(shaped_row, field, Value::List(matches));
                    }
                    State::Rows { raw, shaped }
                }
                (
                    State::Rows { raw, mut shaped },
                    Transform::DistinctReplace {
                        field,
                        local_key,
                        foreign_key,
                        child,
                    },
                ) => {
                    let (child_raw, child_shaped) = self.child_rows(child, consumer)?;
                    let find = |key: &Value| -> Option<Value> {
                        child_raw
                            .iter()
                            .position(|row| {
                                get_path(row, foreign_key).map(|k| k == key).unwrap_or(false)
                            })
                            .map(|i| Value::Doc(child_shaped[i].clone()))
                    };
                    for (row, shaped_row) in raw.iter().zip(shaped.iter_mut()) {
                        let replacement = match get_path(row, local_key) {
                            Some(Value::List(keys)) => {
                                Value::List(keys.iter().filter_map(&find).collect())
                            }
                            Some(Value::Null) | None => Value::Null,
                            Some(key) => find(key).unwrap_or(Value::Null),
                        };
                        replace_key(shaped_row, local_key, field, replacement);
                    }
                    State::Rows { raw, shaped }
                }
                // The builder never emits a transform after a scalar
                // projection; seeing one means the chain is malformed.
                (State::Value(_), _) => {
                    return Err(ExecError::unresolved(consumer, dv.source));
                }
            };
        }

        Ok(state)
    }

    /// Evaluate a join child: its raw rows paired with its shaped rows
    /// (projection plus the child's own transform chain).
    fn child_rows(
        &self,
        child: &DeferredValue,
        consumer: OperationId,
    ) -> ExecResult<(Vec<Document>, Vec<Document>)> {
        let raw = self
            .cache
            .get(child.source)
            .ok_or_else(|| ExecError::unresolved(consumer, child.source))?
            .to_vec();
        match self.eval_state(child, consumer)? {
            State::Rows { shaped, .. } => Ok((raw, shaped)),
            State::Value(_) => Err(ExecError::unresolved(consumer, child.source)),
        }
    }
}

/// Project a raw row to a field selection, preserving selection order.
/// Dotted paths rebuild their nested structure; missing fields are
/// omitted. Without a selection the row passes through whole.
pub fn project(row: &Document, fields: Option<&FieldSelection>) -> Document {
    match fields {
        None => row.clone(),
        Some(fields) => {
            let mut out = Document::new();
            for path in fields.iter() {
                if let Some(value) = get_path(row, path) {
                    set_path(&mut out, path, value.clone());
                }
            }
            out
        }
    }
}

/// Unique values of a field across rows, in first-seen order. List
/// values contribute their elements; nulls and missing fields are
/// skipped.
fn distinct_of(rows: &[Document], field: &str) -> Value {
    let mut out: Vec<Value> = Vec::new();
    let mut push = |value: &Value| {
        if !value.is_null() && !out.contains(value) {
            out.push(value.clone());
        }
    };
    for row in rows {
        match get_path(row, field) {
            Some(Value::List(items)) => items.iter().for_each(&mut push),
            Some(value) => push(value),
            None => {}
        }
    }
    Value::List(out)
}

/// The field value of a single-row result; null when the result is
/// empty or the field is absent.
fn path_of(rows: &[Document], field: &str) -> Value {
    rows.first()
        .and_then(|row| get_path(row, field))
        .cloned()
        .unwrap_or(Value::Null)
}

/// Child documents whose foreign key joins the parent key. Either side
/// may be a list (membership semantics); otherwise plain equality.
fn joined_docs(
    parent_key: &Value,
    foreign_key: &str,
    child_raw: &[Document],
    child_shaped: &[Document],
) -> Vec<Value> {
    child_raw
        .iter()
        .zip(child_shaped)
        .filter(|(raw, _)| {
            get_path(raw, foreign_key)
                .map(|child_key| keys_join(parent_key, child_key))
                .unwrap_or(false)
        })
        .map(|(_, shaped)| Value::Doc(shaped.clone()))
        .collect()
}

fn keys_join(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::List(items), _) => items.contains(b),
        (_, Value::List(items)) => items.contains(a),
        _ => a == b,
    }
}

/// Replace the entry at `old_path` with `new_path` holding `value`,
/// keeping the entry's position. The two paths share their prefix by
/// construction (they differ only in the final segment).
fn replace_key(doc: &mut Document, old_path: &str, new_path: &str, value: Value) {
    let (old_prefix, old_last) = split_last(old_path);
    let (_, new_last) = split_last(new_path);

    let target = match descend_mut(doc, old_prefix) {
        Some(target) => target,
        None => {
            set_path(doc, new_path, value);
            return;
        }
    };

    let mut value = Some(value);
    let mut rebuilt = Document::new();
    for (key, entry) in std::mem::take(target) {
        if key == old_last {
            if let Some(value) = value.take() {
                rebuilt.insert(new_last.to_string(), value);
            }
        } else {
            rebuilt.insert(key, entry);
        }
    }
    if let Some(value) = value.take() {
        rebuilt.insert(new_last.to_string(), value);
    }
    *target = rebuilt;
}

fn split_last(path: &str) -> (Option<&str>, &str) {
    match path.rsplit_once('.') {
        Some((prefix, last)) => (Some(prefix), last),
        None => (None, path),
    }
}

fn descend_mut<'a>(doc: &'a mut Document, prefix: Option<&str>) -> Option<&'a mut Document> {
    let mut current = doc;
    if let Some(prefix) = prefix {
        for segment in prefix.split('.') {
            match current.get_mut(segment) {
                Some(Value::Doc(inner)) => current = inner,
                _ => return None,
            }
        }
    }
    Some(current)
}
