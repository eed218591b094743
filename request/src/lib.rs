//! Canopy Request Trees
//!
//! The already-parsed, typed representation of a hierarchical
//! query/mutation request: root fields with selection sets, filter
//! predicates, and nested input objects (literals, embedded objects,
//! nested `create`, `connect`). Parsing and validating the raw request
//! text is a transport concern and happens upstream.

mod ast;

pub use ast::*;
