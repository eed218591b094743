//! Canopy Core Types
//!
//! This crate provides the foundational types used throughout the Canopy
//! system:
//! - The `Value` enum (scalars, lists, nested documents)
//! - The ordered `Document` map and dotted-path access
//! - The `doc!` construction macro

mod document;
mod value;

pub use document::*;
pub use value::*;
