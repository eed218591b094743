//! Integration test support for Canopy.
//!
//! Shared schema fixtures, seeded stores, and value assertion helpers
//! used by the scenario tests under `tests/`.

pub mod fixtures;
pub mod values;

/// Common imports for scenario tests.
pub mod prelude {
    pub use crate::fixtures::{blog_registry, seeded_store};
    pub use crate::values::ValueExt;
    pub use canopy_core::{doc, Document, Value};
    pub use canopy_plan::{OperationKind, PlanBuilder, Term};
    pub use canopy_request::{Filter, InputObject, Request, RootField, Selection};
    pub use canopy_session::Session;
    pub use canopy_store::MemoryStore;
}
