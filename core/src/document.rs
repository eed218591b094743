//! Ordered document maps.
//!
//! A document is an ordered mapping from field names to values. Order
//! matters: the response contract preserves the order fields were
//! requested in, so documents are backed by `IndexMap` rather than a
//! hash map.

use crate::Value;
use indexmap::IndexMap;

/// An ordered field-name to value mapping.
pub type Document = IndexMap<String, Value>;

/// Look up a value by dotted path, descending through nested documents.
///
/// `get_path(doc, "author.address.city")` returns the value at the end of
/// the chain, or `None` if any segment is missing or not a document.
pub fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = doc.get(first)?;

    for segment in segments {
        match current {
            Value::Doc(inner) => current = inner.get(segment)?,
            _ => return None,
        }
    }
    Some(current)
}

/// Set a value at a dotted path, creating intermediate documents as
/// needed. An intermediate segment holding a non-document value is
/// overwritten.
pub fn set_path(doc: &mut Document, path: &str, value: Value) {
    let mut segments: Vec<&str> = path.split('.').collect();
    let last = match segments.pop() {
        Some(last) => last,
        None => return,
    };

    let mut current = doc;
    for segment in segments {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Doc(Document::new()));
        if !entry.is_doc() {
            *entry = Value::Doc(Document::new());
        }
        match entry {
            Value::Doc(inner) => current = inner,
            _ => return,
        }
    }
    current.insert(last.to_string(), value);
}
