//! Canopy Plan Compiler
//!
//! Compiles a hierarchical request tree into a [`Transaction`]: an
//! ordered list of primitive storage [`Operation`]s wired together with
//! [`DeferredValue`]s. The [`PlanBuilder`] is the visitor that walks the
//! request against schema metadata using an explicit context stack;
//! everything it emits is inert data - execution lives in
//! `canopy-executor`.

mod builder;
mod context;
mod deferred;
mod error;
mod operation;
mod term;
mod transaction;

pub use builder::*;
pub use context::*;
pub use deferred::*;
pub use error::*;
pub use operation::*;
pub use term::*;
pub use transaction::*;
