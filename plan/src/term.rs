//! Terms: selector/data documents with deferred leaves.
//!
//! An operation's selector and data are nested key-value documents whose
//! leaves are either literal values or deferred references to earlier
//! operations' results. Every deferred leaf must be resolved to a
//! literal before the operation is dispatched.

use crate::{DeferredValue, OperationId};
use canopy_core::Value;
use indexmap::IndexMap;
use serde::Serialize;

/// An ordered field-name to term mapping.
pub type TermDocument = IndexMap<String, Term>;

/// A leaf or subtree of a selector/data document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Term {
    /// Literal value, ready for dispatch.
    Value(Value),
    /// Reference to an earlier operation's transformed result.
    Deferred(DeferredValue),
    /// Nested document of terms.
    Doc(TermDocument),
    /// List of terms.
    List(Vec<Term>),
}

impl Term {
    /// True if no deferred reference appears anywhere in this term.
    pub fn is_literal(&self) -> bool {
        match self {
            Term::Value(_) => true,
            Term::Deferred(_) => false,
            Term::Doc(doc) => doc.values().all(Term::is_literal),
            Term::List(items) => items.iter().all(Term::is_literal),
        }
    }

    /// Collect the source operations of every deferred reference in this
    /// term, including join children.
    pub fn collect_dependencies(&self, out: &mut Vec<OperationId>) {
        match self {
            Term::Value(_) => {}
            Term::Deferred(dv) => out.extend(dv.dependencies()),
            Term::Doc(doc) => {
                for term in doc.values() {
                    term.collect_dependencies(out);
                }
            }
            Term::List(items) => {
                for term in items {
                    term.collect_dependencies(out);
                }
            }
        }
    }
}

impl From<Value> for Term {
    fn from(value: Value) -> Self {
        Term::Value(value)
    }
}

impl From<DeferredValue> for Term {
    fn from(dv: DeferredValue) -> Self {
        Term::Deferred(dv)
    }
}

/// Operation ids referenced by any deferred leaf of a term document.
pub fn document_dependencies(doc: &TermDocument) -> Vec<OperationId> {
    let mut out = Vec::new();
    for term in doc.values() {
        term.collect_dependencies(&mut out);
    }
    out
}
