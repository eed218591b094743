//! Canopy Schema Registry
//!
//! The registry is the field/type resolver consumed by the plan builder:
//! given a model and a field name it reports the field kind (scalar,
//! embedded, local relation, reverse relation), storage field name,
//! target model, and cardinality. It also maps root operation names
//! (`posts`, `createPost`, ...) to their model, kind, and cardinality.
//!
//! Schema construction happens through [`RegistryBuilder`]; the built
//! [`Registry`] is immutable.

mod builder;
mod registry;
mod types;

pub use builder::*;
pub use registry::*;
pub use types::*;
