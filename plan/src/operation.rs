//! Storage operations.

use crate::{DeferredValue, OperationId, TermDocument, Transform};
use indexmap::IndexSet;
use serde::Serialize;
use std::fmt;

/// What an operation does against its collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OperationKind {
    Read,
    Create,
    Update,
    Delete,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::Read => "Read",
            OperationKind::Create => "Create",
            OperationKind::Update => "Update",
            OperationKind::Delete => "Delete",
        };
        write!(f, "{}", name)
    }
}

/// Ordered, duplicate-free list of storage field names to project.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FieldSelection {
    fields: IndexSet<String>,
}

impl FieldSelection {
    /// Create an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a storage field name. Adding a name twice keeps the first
    /// position (set semantics keyed by storage name).
    pub fn add(&mut self, name: impl Into<String>) {
        self.fields.insert(name.into());
    }

    /// Check whether a storage field is selected.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains(name)
    }

    /// Iterate selected storage fields in request order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|s| s.as_str())
    }

    /// Selected storage fields as a vector, for assertions.
    pub fn names(&self) -> Vec<&str> {
        self.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// One primitive storage call: kind, target collection, cardinality,
/// selector, data payload, projected fields, and an output deferred
/// value describing how its result feeds the response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Operation {
    identifier: OperationId,
    collection: String,
    kind: OperationKind,
    many: bool,
    selector: Option<TermDocument>,
    data: Option<TermDocument>,
    fields: Option<FieldSelection>,
    output: DeferredValue,
}

impl Operation {
    pub(crate) fn new(
        identifier: OperationId,
        collection: impl Into<String>,
        kind: OperationKind,
        many: bool,
    ) -> Self {
        Self {
            identifier,
            collection: collection.into(),
            kind,
            many,
            selector: None,
            data: None,
            fields: None,
            output: DeferredValue::identity(identifier),
        }
    }

    pub fn identifier(&self) -> OperationId {
        self.identifier
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Storage cardinality: whether the operation addresses many
    /// documents.
    pub fn many(&self) -> bool {
        self.many
    }

    pub fn selector(&self) -> Option<&TermDocument> {
        self.selector.as_ref()
    }

    pub fn data(&self) -> Option<&TermDocument> {
        self.data.as_ref()
    }

    pub fn fields(&self) -> Option<&FieldSelection> {
        self.fields.as_ref()
    }

    /// The deferred value that shapes this operation's contribution to
    /// the response.
    pub fn output(&self) -> &DeferredValue {
        &self.output
    }

    /// Set the selector document.
    pub fn set_selector(&mut self, selector: TermDocument) {
        self.selector = Some(selector);
    }

    /// Set the data payload.
    pub fn set_data(&mut self, data: TermDocument) {
        self.data = Some(data);
    }

    /// Access the projected field list, creating it if absent.
    pub fn fields_mut(&mut self) -> &mut FieldSelection {
        self.fields.get_or_insert_with(FieldSelection::new)
    }

    /// Append a transform to the output chain.
    pub fn wrap_output(&mut self, transform: Transform) {
        self.output.transforms.push(transform);
    }
}
