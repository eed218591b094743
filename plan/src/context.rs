//! Traversal context stack.
//!
//! The builder mirrors request nesting with an explicit stack of frames:
//! pushed on entering a selection or input field, popped on leaving.
//! Each frame records the model under traversal, the operation being
//! filled, the storage-path prefix accumulated by embedded fields, and
//! the unique-key field of the operation's root model (join keys always
//! resolve against the document root). The stack lives for one build
//! and is discarded afterwards.

use crate::OperationId;

/// One traversal frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Model whose fields are being resolved.
    pub model: String,
    /// Operation collecting projections at this nesting level.
    pub operation: OperationId,
    /// Dotted storage-path prefix from enclosing embedded fields.
    pub path: Vec<String>,
    /// Unique-key storage field of the operation's root model.
    pub root_pk: String,
}

impl Frame {
    /// Frame for the root of an operation.
    pub fn root(
        model: impl Into<String>,
        operation: OperationId,
        root_pk: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            operation,
            path: Vec::new(),
            root_pk: root_pk.into(),
        }
    }

    /// Frame for an embedded field: same operation, extended path.
    pub fn embedded(&self, model: impl Into<String>, segment: impl Into<String>) -> Self {
        let mut path = self.path.clone();
        path.push(segment.into());
        Self {
            model: model.into(),
            operation: self.operation,
            path,
            root_pk: self.root_pk.clone(),
        }
    }

    /// Join the frame's path prefix with a storage field name.
    pub fn storage_path(&self, storage_name: &str) -> String {
        if self.path.is_empty() {
            storage_name.to_string()
        } else {
            let mut joined = self.path.join(".");
            joined.push('.');
            joined.push_str(storage_name);
            joined
        }
    }
}

/// Explicit stack of traversal frames.
#[derive(Debug, Default)]
pub struct ContextStack {
    frames: Vec<Frame>,
}

impl ContextStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a frame on entering a nesting level.
    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    /// Pop the current frame on leaving a nesting level.
    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    /// The innermost frame.
    pub fn current(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// Current nesting depth.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}
