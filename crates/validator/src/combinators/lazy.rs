//! LAZY worker - built from the container at execution time

use crate::context::{PropertyContext, ValidationContext};
use crate::error::EngineResult;
use crate::worker::{SharedWorker, Worker};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::{Arc, Weak};
use tokio_util::sync::CancellationToken;

/// Builds a worker from the container object.
pub type WorkerFactory = Arc<dyn Fn(&Value) -> SharedWorker + Send + Sync>;

/// Defers worker construction until the container is known.
///
/// Useful when the check depends on sibling values, e.g. a maximum taken
/// from another field. The factory runs once per container object; the
/// precondition, path selection and execution of one run share the worker.
///
/// # Examples
///
/// ```rust,ignore
/// use ruleweave_validator::prelude::*;
///
/// let rule = Rule::for_property("Quantity").must(Lazy::new(|order| {
///     let max = order["Stock"].as_u64().unwrap_or(0);
///     Arc::new(Must::new(move |v| v.as_u64().is_some_and(|q| q <= max)))
/// }));
/// ```
#[derive(Clone)]
pub struct Lazy {
    factory: WorkerFactory,
    built: Arc<Mutex<Option<(Weak<Value>, SharedWorker)>>>,
}

impl Lazy {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(&Value) -> SharedWorker + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
            built: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns the worker built for `container`, calling the factory on a miss.
    ///
    /// The held `Weak` pins the container's allocation, so a matching pointer
    /// always means the same object.
    fn worker_for(&self, container: &Arc<Value>) -> SharedWorker {
        if let Some((seen, worker)) = self.built.lock().as_ref() {
            if seen.as_ptr() == Arc::as_ptr(container) {
                return Arc::clone(worker);
            }
        }

        let worker = (self.factory)(container.as_ref());
        *self.built.lock() = Some((Arc::downgrade(container), Arc::clone(&worker)));
        worker
    }
}

#[async_trait]
impl Worker for Lazy {
    fn execute(&self, ctx: &PropertyContext<'_>) -> EngineResult<bool> {
        self.worker_for(ctx.parent().shared_model()).execute(ctx)
    }

    async fn execute_async(
        &self,
        ctx: &PropertyContext<'_>,
        cancellation: &CancellationToken,
    ) -> EngineResult<bool> {
        let worker = self.worker_for(ctx.parent().shared_model());
        if worker.should_execute_async(ctx.parent()) {
            worker.execute_async(ctx, cancellation).await
        } else {
            worker.execute(ctx)
        }
    }

    fn should_execute_async(&self, ctx: &ValidationContext) -> bool {
        self.worker_for(ctx.shared_model()).should_execute_async(ctx)
    }

    fn precondition(&self, ctx: &ValidationContext) -> bool {
        self.worker_for(ctx.shared_model()).precondition(ctx)
    }

    fn name(&self) -> &str {
        "lazy"
    }
}

impl std::fmt::Debug for Lazy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Lazy(..)")
    }
}
