//! WHEN decorator - conditional execution
//!
//! A [`Condition`] gates a worker on a predicate over the parent context.
//! [`Conditional`] is the decorator a rule installs around each gated
//! element. When the predicate does not hold the inner worker never runs
//! and the element counts as passed.
//!
//! # Examples
//!
//! ```rust,ignore
//! use ruleweave_validator::prelude::*;
//!
//! let rule = Rule::for_property("Zip")
//!     .must(NotEmpty)
//!     .when(Condition::new(|ctx| ctx.model()["Country"] == "US"));
//! ```

use crate::context::{PropertyContext, ValidationContext};
use crate::error::{EngineError, EngineResult};
use crate::worker::{SharedWorker, Worker};
use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

// ============================================================================
// CONDITION
// ============================================================================

/// Synchronous predicate over the parent context.
pub type SyncPredicate = Arc<dyn Fn(&ValidationContext) -> bool + Send + Sync>;

/// Asynchronous predicate over a snapshot of the parent context.
pub type AsyncPredicate =
    Arc<dyn Fn(ValidationContext, CancellationToken) -> BoxFuture<'static, bool> + Send + Sync>;

/// A predicate deciding whether a gated worker runs.
#[derive(Clone)]
pub enum Condition {
    Sync(SyncPredicate),
    Async(AsyncPredicate),
}

impl Condition {
    /// Creates a synchronous condition.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&ValidationContext) -> bool + Send + Sync + 'static,
    {
        Self::Sync(Arc::new(predicate))
    }

    /// Creates an asynchronous condition.
    ///
    /// Workers gated on it always take the async path.
    pub fn new_async<F, Fut>(predicate: F) -> Self
    where
        F: Fn(ValidationContext, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        Self::Async(Arc::new(move |ctx, token| predicate(ctx, token).boxed()))
    }

    /// Inverts the predicate.
    #[must_use]
    pub fn negate(self) -> Self {
        match self {
            Self::Sync(predicate) => Self::Sync(Arc::new(move |ctx| !predicate(ctx))),
            Self::Async(predicate) => Self::Async(Arc::new(move |ctx, token| {
                let holds = predicate(ctx, token);
                async move { !holds.await }.boxed()
            })),
        }
    }

    #[must_use]
    pub fn is_async(&self) -> bool {
        matches!(self, Self::Async(_))
    }

    fn holds(&self, ctx: &ValidationContext) -> bool {
        match self {
            Self::Sync(predicate) => predicate(ctx),
            Self::Async(predicate) => {
                futures::executor::block_on(predicate(ctx.clone(), CancellationToken::new()))
            }
        }
    }

    async fn holds_async(&self, ctx: &ValidationContext, cancellation: &CancellationToken) -> bool {
        match self {
            Self::Sync(predicate) => predicate(ctx),
            Self::Async(predicate) => predicate(ctx.clone(), cancellation.clone()).await,
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("Condition::Sync(..)"),
            Self::Async(_) => f.write_str("Condition::Async(..)"),
        }
    }
}

// ============================================================================
// CONDITIONAL WORKER
// ============================================================================

/// Runs the inner worker only while its condition holds.
pub struct Conditional {
    condition: Condition,
    inner: SharedWorker,
}

impl Conditional {
    pub fn new(condition: Condition, inner: SharedWorker) -> Self {
        Self { condition, inner }
    }

    #[must_use]
    pub fn inner(&self) -> &SharedWorker {
        &self.inner
    }

    #[must_use]
    pub fn condition(&self) -> &Condition {
        &self.condition
    }
}

#[async_trait]
impl Worker for Conditional {
    fn execute(&self, ctx: &PropertyContext<'_>) -> EngineResult<bool> {
        if !self.condition.holds(ctx.parent()) {
            return Ok(true);
        }
        self.inner.execute(ctx)
    }

    async fn execute_async(
        &self,
        ctx: &PropertyContext<'_>,
        cancellation: &CancellationToken,
    ) -> EngineResult<bool> {
        if !self.condition.holds_async(ctx.parent(), cancellation).await {
            return Ok(true);
        }
        if cancellation.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        if self.inner.should_execute_async(ctx.parent()) {
            self.inner.execute_async(ctx, cancellation).await
        } else {
            self.inner.execute(ctx)
        }
    }

    fn should_execute_async(&self, ctx: &ValidationContext) -> bool {
        self.condition.is_async() || self.inner.should_execute_async(ctx)
    }

    fn precondition(&self, ctx: &ValidationContext) -> bool {
        match &self.condition {
            Condition::Sync(predicate) => predicate(ctx) && self.inner.precondition(ctx),
            Condition::Async(_) => self.inner.precondition(ctx),
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

impl fmt::Debug for Conditional {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conditional")
            .field("condition", &self.condition)
            .field("inner", &self.inner.name())
            .finish()
    }
}
