//! Nested validators
//!
//! [`ChildValidator`] runs a whole [`Validator`] against a property value,
//! in a child context whose path continues the parent's. `null` values are
//! skipped; pair with `NotNull` to require the object.

use crate::context::{PropertyContext, ValidationContext};
use crate::error::EngineResult;
use crate::validator::Validator;
use crate::worker::Worker;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Picks the validator for a property from its container.
pub type ValidatorFactory = Arc<dyn Fn(&Value) -> Arc<Validator> + Send + Sync>;

#[derive(Clone)]
enum Source {
    Fixed(Arc<Validator>),
    Factory(ValidatorFactory),
}

/// Validates a nested object with its own validator.
#[derive(Clone)]
pub struct ChildValidator {
    source: Source,
}

impl ChildValidator {
    pub fn new(validator: impl Into<Arc<Validator>>) -> Self {
        Self {
            source: Source::Fixed(validator.into()),
        }
    }

    /// Chooses the validator per container, e.g. by a discriminator field.
    pub fn from_factory<F>(factory: F) -> Self
    where
        F: Fn(&Value) -> Arc<Validator> + Send + Sync + 'static,
    {
        Self {
            source: Source::Factory(Arc::new(factory)),
        }
    }

    fn resolve(&self, container: &Value) -> Arc<Validator> {
        match &self.source {
            Source::Fixed(validator) => Arc::clone(validator),
            Source::Factory(factory) => factory(container),
        }
    }

    fn child_context(ctx: &PropertyContext<'_>) -> ValidationContext {
        let parent = ctx.parent();
        let mut child = parent.clone_for_child(Arc::new(ctx.value().clone()));
        // element contexts already end in the indexed segment
        if !parent.is_collection_element() {
            child
                .path_mut()
                .push_name(ctx.rule().path_segment(ctx.container()));
        }
        child
    }
}

#[async_trait]
impl Worker for ChildValidator {
    fn execute(&self, ctx: &PropertyContext<'_>) -> EngineResult<bool> {
        if ctx.value().is_null() {
            return Ok(true);
        }
        let validator = self.resolve(ctx.container());
        let child = Self::child_context(ctx);
        validator.execute(&child)?;
        Ok(child.failure_count() == 0)
    }

    async fn execute_async(
        &self,
        ctx: &PropertyContext<'_>,
        cancellation: &CancellationToken,
    ) -> EngineResult<bool> {
        if ctx.value().is_null() {
            return Ok(true);
        }
        let validator = self.resolve(ctx.container());
        let child = Self::child_context(ctx);
        validator.execute_async(&child, cancellation).await?;
        Ok(child.failure_count() == 0)
    }

    fn should_execute_async(&self, ctx: &ValidationContext) -> bool {
        ctx.is_async()
    }

    fn name(&self) -> &str {
        match &self.source {
            Source::Fixed(validator) => validator.type_name(),
            Source::Factory(_) => "child_validator",
        }
    }
}

impl fmt::Debug for ChildValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildValidator")
            .field("validator", &self.name())
            .finish()
    }
}
