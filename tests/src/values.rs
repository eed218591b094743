//! Value assertion helpers for scenario tests.

use canopy_core::{Document, Value};

/// Panicking accessors for drilling into assembled responses.
pub trait ValueExt {
    /// The value as a document, or panic.
    fn expect_doc(&self) -> &Document;

    /// The value as a list, or panic.
    fn expect_list(&self) -> &[Value];

    /// A named field of a document value, or panic.
    fn field(&self, name: &str) -> &Value;
}

impl ValueExt for Value {
    fn expect_doc(&self) -> &Document {
        self.as_doc()
            .unwrap_or_else(|| panic!("expected document, got {}", self.type_name()))
    }

    fn expect_list(&self) -> &[Value] {
        self.as_list()
            .unwrap_or_else(|| panic!("expected list, got {}", self.type_name()))
    }

    fn field(&self, name: &str) -> &Value {
        self.expect_doc()
            .get(name)
            .unwrap_or_else(|| panic!("missing field {} in {}", name, self))
    }
}
