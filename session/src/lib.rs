//! Canopy Session
//!
//! The facade tying the compiler and the execution engine together:
//! a [`Session`] borrows a registry, compiles requests into
//! transactions, and executes them against any storage executor.

mod error;
mod session;

pub use error::*;
pub use session::*;
