//! Executor trait

use crate::request::{ExecutionRequest, ExecutionResult};
use async_trait::async_trait;

/// Executor capability - implement to add new execution backends.
///
/// `execute` is infallible by construction: backend failures are folded
/// into the returned [`ExecutionResult`] with the `-1` sentinel exit code,
/// so callers never have to distinguish a fault from a failed run.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Run a request to completion
    async fn execute(&self, request: &ExecutionRequest) -> ExecutionResult;

    /// Check if the backend is usable on this host
    fn is_available(&self) -> bool;

    /// Get executor name
    fn name(&self) -> &'static str;
}
