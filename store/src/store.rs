//! In-memory document store.

use canopy_core::{get_path, set_path, Document, Value};
use canopy_executor::{StorageError, StorageExecutor};
use canopy_plan::{FieldSelection, OperationKind};
use std::collections::HashMap;
use tracing::debug;

/// An in-memory document store: per-collection vectors of documents
/// with equality/`$in`/`$or` selector matching and projection.
///
/// Created documents get an allocated `_id` when the data payload does
/// not carry one. Projection always retains `_id` and any field the
/// selector referenced, so join keys survive even when not projected;
/// the execution engine shapes responses from the projected field list,
/// so the extra fields never leak into results.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: HashMap<String, Vec<Document>>,
    next_id: u64,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document into a collection, allocating an `_id` if the
    /// document has none. Returns the document's id.
    pub fn seed(&mut self, collection: impl Into<String>, mut doc: Document) -> String {
        if !doc.contains_key("_id") {
            let id = self.allocate_id();
            doc.insert("_id".to_string(), Value::String(id));
        }
        let id = doc
            .get("_id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        self.collections.entry(collection.into()).or_default().push(doc);
        id
    }

    /// All documents of a collection, in insertion order.
    pub fn collection(&self, name: &str) -> &[Document] {
        self.collections
            .get(name)
            .map(|docs| docs.as_slice())
            .unwrap_or_default()
    }

    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        format!("id-{}", self.next_id)
    }

    // ==================== Selector Matching ====================

    fn matches(doc: &Document, selector: &Document) -> bool {
        selector.iter().all(|(key, expected)| {
            if key == "$or" {
                return match expected {
                    Value::List(branches) => branches.iter().any(|branch| match branch {
                        Value::Doc(branch) => Self::matches(doc, branch),
                        _ => false,
                    }),
                    _ => false,
                };
            }
            let actual = get_path(doc, key);
            match expected {
                Value::Doc(operators) if is_operator_doc(operators) => {
                    Self::matches_operators(actual, operators)
                }
                Value::Null => actual.map(Value::is_null).unwrap_or(true),
                expected => match actual {
                    // A stored list matches a scalar by membership.
                    Some(Value::List(items)) if !expected.is_list() => items.contains(expected),
                    Some(actual) => actual == expected,
                    None => false,
                },
            }
        })
    }

    fn matches_operators(actual: Option<&Value>, operators: &Document) -> bool {
        operators.iter().all(|(op, operand)| match op.as_str() {
            "$in" => match (actual, operand) {
                (Some(Value::List(items)), Value::List(candidates)) => {
                    items.iter().any(|item| candidates.contains(item))
                }
                (Some(actual), Value::List(candidates)) => candidates.contains(actual),
                _ => false,
            },
            "$eq" => actual == Some(operand),
            _ => false,
        })
    }

    // ==================== Projection ====================

    fn project(doc: &Document, fields: Option<&FieldSelection>, selector: Option<&Document>) -> Document {
        let fields = match fields {
            Some(fields) => fields,
            None => return doc.clone(),
        };

        let mut out = Document::new();
        for path in fields.iter() {
            if let Some(value) = get_path(doc, path) {
                set_path(&mut out, path, value.clone());
            }
        }
        // Implicit unique key plus selector-referenced join keys.
        if let Some(id) = doc.get("_id") {
            if !out.contains_key("_id") {
                out.insert("_id".to_string(), id.clone());
            }
        }
        if let Some(selector) = selector {
            for key in selector.keys().filter(|key| !key.starts_with('$')) {
                if get_path(&out, key).is_none() {
                    if let Some(value) = get_path(doc, key) {
                        set_path(&mut out, key, value.clone());
                    }
                }
            }
        }
        out
    }
}

fn is_operator_doc(doc: &Document) -> bool {
    doc.keys().any(|key| key.starts_with('$'))
}

impl StorageExecutor for MemoryStore {
    fn run(
        &mut self,
        collection: &str,
        kind: OperationKind,
        selector: Option<&Document>,
        data: Option<&Document>,
        fields: Option<&FieldSelection>,
    ) -> Result<Vec<Document>, StorageError> {
        debug!(collection, kind = %kind, "memory store call");
        match kind {
            OperationKind::Read => {
                let rows = self
                    .collection(collection)
                    .iter()
                    .filter(|doc| selector.map(|s| Self::matches(doc, s)).unwrap_or(true))
                    .map(|doc| Self::project(doc, fields, selector))
                    .collect();
                Ok(rows)
            }
            OperationKind::Create => {
                let mut doc = data.cloned().unwrap_or_default();
                if !doc.contains_key("_id") {
                    let id = self.allocate_id();
                    doc.insert("_id".to_string(), Value::String(id));
                }
                self.collections
                    .entry(collection.to_string())
                    .or_default()
                    .push(doc.clone());
                Ok(vec![Self::project(&doc, fields, selector)])
            }
            OperationKind::Update => {
                let data = data.ok_or_else(|| StorageError::new("update without data"))?;
                let docs = self.collections.entry(collection.to_string()).or_default();
                let mut updated = Vec::new();
                for doc in docs.iter_mut() {
                    if selector.map(|s| Self::matches(doc, s)).unwrap_or(true) {
                        for (key, value) in data {
                            doc.insert(key.clone(), value.clone());
                        }
                        updated.push(Self::project(doc, fields, selector));
                    }
                }
                Ok(updated)
            }
            OperationKind::Delete => {
                let docs = self.collections.entry(collection.to_string()).or_default();
                let mut removed = Vec::new();
                docs.retain(|doc| {
                    let hit = selector.map(|s| Self::matches(doc, s)).unwrap_or(true);
                    if hit {
                        removed.push(Self::project(doc, fields, selector));
                    }
                    !hit
                });
                Ok(removed)
            }
        }
    }
}
