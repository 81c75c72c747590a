//! Caller-supplied checks
//!
//! - [`Must`] / [`MustAsync`] - boolean predicates over the property value,
//!   reported with the element's message
//! - [`Custom`] / [`CustomAsync`] - free-form workers that add any number
//!   of failures themselves

use super::PropertyValidator;
use crate::context::{PropertyContext, SharedData, ValidationContext};
use crate::error::EngineResult;
use crate::failure::ValidationFailure;
use crate::worker::Worker;
use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const PREDICATE_MESSAGE: &str = "The specified condition was not met for '{PropertyName}'.";

// ============================================================================
// MUST
// ============================================================================

/// Passes when the predicate returns `true` for the property value.
#[derive(Clone)]
pub struct Must {
    predicate: Arc<dyn Fn(&Value) -> bool + Send + Sync>,
}

impl Must {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
        }
    }
}

impl PropertyValidator for Must {
    fn code(&self) -> &'static str {
        "predicate"
    }

    fn message_template(&self) -> &str {
        PREDICATE_MESSAGE
    }

    fn is_valid(&self, ctx: &PropertyContext<'_>) -> EngineResult<bool> {
        Ok((self.predicate)(ctx.value()))
    }
}

impl fmt::Debug for Must {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Must(..)")
    }
}

// ============================================================================
// MUST ASYNC
// ============================================================================

type AsyncValuePredicate =
    Arc<dyn Fn(Value, CancellationToken) -> BoxFuture<'static, EngineResult<bool>> + Send + Sync>;

/// Asynchronous predicate over the property value.
///
/// In a synchronous run the future is driven to completion on the calling
/// thread.
#[derive(Clone)]
pub struct MustAsync {
    predicate: AsyncValuePredicate,
}

impl MustAsync {
    pub fn new<F, Fut>(predicate: F) -> Self
    where
        F: Fn(Value, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = EngineResult<bool>> + Send + 'static,
    {
        Self {
            predicate: Arc::new(move |value, token| predicate(value, token).boxed()),
        }
    }
}

#[async_trait]
impl PropertyValidator for MustAsync {
    fn code(&self) -> &'static str {
        "async_predicate"
    }

    fn message_template(&self) -> &str {
        PREDICATE_MESSAGE
    }

    fn is_valid(&self, ctx: &PropertyContext<'_>) -> EngineResult<bool> {
        futures::executor::block_on((self.predicate)(ctx.value().clone(), CancellationToken::new()))
    }

    async fn is_valid_async(
        &self,
        ctx: &PropertyContext<'_>,
        cancellation: &CancellationToken,
    ) -> EngineResult<bool> {
        (self.predicate)(ctx.value().clone(), cancellation.clone()).await
    }

    fn is_async(&self) -> bool {
        true
    }
}

impl fmt::Debug for MustAsync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MustAsync(..)")
    }
}

// ============================================================================
// CUSTOM
// ============================================================================

/// Free-form synchronous worker.
///
/// The closure reports failures through [`PropertyContext::add_failure`].
#[derive(Clone)]
pub struct Custom {
    action: Arc<dyn Fn(&PropertyContext<'_>) -> EngineResult<()> + Send + Sync>,
}

impl Custom {
    pub fn new<F>(action: F) -> Self
    where
        F: Fn(&PropertyContext<'_>) -> EngineResult<()> + Send + Sync + 'static,
    {
        Self {
            action: Arc::new(action),
        }
    }
}

#[async_trait]
impl Worker for Custom {
    fn execute(&self, ctx: &PropertyContext<'_>) -> EngineResult<bool> {
        (self.action)(ctx)?;
        Ok(!ctx.has_failures())
    }

    fn name(&self) -> &str {
        "custom"
    }
}

impl fmt::Debug for Custom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Custom(..)")
    }
}

// ============================================================================
// CUSTOM ASYNC
// ============================================================================

/// Owned snapshot of a property handed to [`CustomAsync`].
#[derive(Debug, Clone)]
pub struct CustomInput {
    pub value: Value,
    pub container: Value,
    pub property_name: String,
    pub shared: SharedData,
}

impl CustomInput {
    /// Starts a failure for this property carrying the attempted value.
    #[must_use]
    pub fn failure(&self, message: impl Into<String>) -> ValidationFailure {
        ValidationFailure::new(self.property_name.clone(), message)
            .with_attempted_value(self.value.clone())
    }
}

type AsyncFailures = BoxFuture<'static, EngineResult<Vec<ValidationFailure>>>;

type AsyncAction = Arc<dyn Fn(CustomInput, CancellationToken) -> AsyncFailures + Send + Sync>;

/// Free-form asynchronous worker returning the failures it found.
#[derive(Clone)]
pub struct CustomAsync {
    action: AsyncAction,
}

impl CustomAsync {
    pub fn new<F, Fut>(action: F) -> Self
    where
        F: Fn(CustomInput, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = EngineResult<Vec<ValidationFailure>>> + Send + 'static,
    {
        Self {
            action: Arc::new(move |input, token| action(input, token).boxed()),
        }
    }

    fn input(ctx: &PropertyContext<'_>) -> CustomInput {
        CustomInput {
            value: ctx.value().clone(),
            container: ctx.container().clone(),
            property_name: ctx.property_name().to_owned(),
            shared: ctx.shared().clone(),
        }
    }

    fn record(ctx: &PropertyContext<'_>, failures: Vec<ValidationFailure>) -> bool {
        let passed = failures.is_empty();
        for failure in failures {
            ctx.add_failure(failure);
        }
        passed
    }
}

#[async_trait]
impl Worker for CustomAsync {
    fn execute(&self, ctx: &PropertyContext<'_>) -> EngineResult<bool> {
        let failures =
            futures::executor::block_on((self.action)(Self::input(ctx), CancellationToken::new()))?;
        Ok(Self::record(ctx, failures))
    }

    async fn execute_async(
        &self,
        ctx: &PropertyContext<'_>,
        cancellation: &CancellationToken,
    ) -> EngineResult<bool> {
        let failures = (self.action)(Self::input(ctx), cancellation.clone()).await?;
        Ok(Self::record(ctx, failures))
    }

    fn should_execute_async(&self, ctx: &ValidationContext) -> bool {
        ctx.is_async()
    }

    fn name(&self) -> &str {
        "custom_async"
    }
}

impl fmt::Debug for CustomAsync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomAsync(..)")
    }
}
