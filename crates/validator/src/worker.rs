//! The worker contract
//!
//! A [`Worker`] is the unit of executable logic stored in a rule element:
//! a leaf check, a condition decorator, a nested validator adapter or a
//! user-supplied closure. Workers report failures through the
//! [`PropertyContext`] and return whether they added none.

use crate::context::{PropertyContext, ValidationContext};
use crate::error::EngineResult;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Executable logic stored in a rule element.
///
/// `Ok(true)` means the worker added no failures. `Err` is reserved for
/// faults and cancellation and is never turned into a failure.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Runs the worker synchronously.
    fn execute(&self, ctx: &PropertyContext<'_>) -> EngineResult<bool>;

    /// Runs the worker asynchronously.
    ///
    /// The default delegates to [`execute`](Self::execute).
    async fn execute_async(
        &self,
        ctx: &PropertyContext<'_>,
        cancellation: &CancellationToken,
    ) -> EngineResult<bool> {
        let _ = cancellation;
        self.execute(ctx)
    }

    /// Whether the worker must take the async path in this context.
    fn should_execute_async(&self, ctx: &ValidationContext) -> bool {
        let _ = ctx;
        false
    }

    /// Synchronous pre-check run by collection elements before the
    /// collection is read. Returning `false` skips the whole collection.
    fn precondition(&self, ctx: &ValidationContext) -> bool {
        let _ = ctx;
        true
    }

    /// Name used in logs and fault reports.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Shared, replaceable handle to a worker.
pub type SharedWorker = Arc<dyn Worker>;
