//! Session facade.

use crate::SessionResult;
use canopy_core::Value;
use canopy_executor::{ExecutionEngine, StorageExecutor};
use canopy_plan::{PlanBuilder, Transaction};
use canopy_registry::Registry;
use canopy_request::Request;

/// A compilation/execution session over a fixed schema.
pub struct Session<'r> {
    registry: &'r Registry,
}

impl<'r> Session<'r> {
    /// Create a session over a registry.
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Get the registry.
    pub fn registry(&self) -> &Registry {
        self.registry
    }

    /// Compile a request into a transaction without executing it.
    pub fn compile(&self, request: &Request) -> SessionResult<Transaction> {
        Ok(PlanBuilder::new(self.registry).build(request)?)
    }

    /// Compile and execute a request, returning the assembled response.
    pub fn execute(
        &self,
        request: &Request,
        storage: &mut dyn StorageExecutor,
    ) -> SessionResult<Value> {
        let txn = self.compile(request)?;
        Ok(ExecutionEngine::new(&txn).execute(storage)?)
    }
}
