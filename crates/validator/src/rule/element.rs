//! Rule elements
//!
//! A [`RuleElement`] pairs a worker with the metadata that shapes its
//! failures and with the executor that decides how the worker is applied:
//! once to the property value, or once per element of a collection.

use super::collection::{self, CollectionOptions};
use super::Rule;
use crate::context::{PropertyContext, ValidationContext};
use crate::error::{EngineError, EngineResult};
use crate::failure::Severity;
use crate::worker::SharedWorker;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Builds a message from the property context.
pub type MessageFn = Arc<dyn Fn(&PropertyContext<'_>) -> String + Send + Sync>;

/// Builds the custom payload attached to a failure.
pub type CustomStateFn = Arc<dyn Fn(&PropertyContext<'_>) -> Value + Send + Sync>;

/// Message override for one element.
#[derive(Clone)]
pub enum MessageSource {
    /// Template formatted with the failure's placeholders.
    Static(String),
    /// Computed per failure. Used verbatim as the template.
    Dynamic(MessageFn),
}

impl fmt::Debug for MessageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(text) => f.debug_tuple("Static").field(text).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// Overrides applied to failures produced by one element.
#[derive(Clone, Default)]
pub struct ElementMetadata {
    message: Option<MessageSource>,
    error_code: Option<String>,
    severity: Severity,
    custom_state: Option<CustomStateFn>,
}

impl ElementMetadata {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the leaf's default message template.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_message(mut self, template: impl Into<String>) -> Self {
        self.message = Some(MessageSource::Static(template.into()));
        self
    }

    /// Computes the message template per failure.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_message_fn<F>(mut self, build: F) -> Self
    where
        F: Fn(&PropertyContext<'_>) -> String + Send + Sync + 'static,
    {
        self.message = Some(MessageSource::Dynamic(Arc::new(build)));
        self
    }

    /// Replaces the leaf's default error code.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_error_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Attaches a payload computed per failure.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_custom_state<F>(mut self, provider: F) -> Self
    where
        F: Fn(&PropertyContext<'_>) -> Value + Send + Sync + 'static,
    {
        self.custom_state = Some(Arc::new(provider));
        self
    }

    #[must_use]
    pub fn message(&self) -> Option<&MessageSource> {
        self.message.as_ref()
    }

    #[must_use]
    pub fn error_code(&self) -> Option<&str> {
        self.error_code.as_deref()
    }

    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    #[must_use]
    pub fn custom_state(&self) -> Option<&CustomStateFn> {
        self.custom_state.as_ref()
    }
}

impl fmt::Debug for ElementMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementMetadata")
            .field("message", &self.message)
            .field("error_code", &self.error_code)
            .field("severity", &self.severity)
            .field("custom_state", &self.custom_state.is_some())
            .finish()
    }
}

/// How an element applies its worker.
#[derive(Debug, Clone, Default)]
pub enum ElementExecutor {
    /// Once, against the property value.
    #[default]
    Property,
    /// Once per element of the collection held by the property.
    Collection(Arc<CollectionOptions>),
}

/// A worker, its metadata and its executor.
#[derive(Clone)]
pub struct RuleElement {
    worker: SharedWorker,
    metadata: ElementMetadata,
    executor: ElementExecutor,
}

impl RuleElement {
    pub(crate) fn new(
        worker: SharedWorker,
        metadata: ElementMetadata,
        executor: ElementExecutor,
    ) -> Self {
        Self {
            worker,
            metadata,
            executor,
        }
    }

    #[must_use]
    pub fn worker(&self) -> &SharedWorker {
        &self.worker
    }

    #[must_use]
    pub fn metadata(&self) -> &ElementMetadata {
        &self.metadata
    }

    #[must_use]
    pub fn executor(&self) -> &ElementExecutor {
        &self.executor
    }

    /// Swaps the worker for one derived from it, e.g. a condition wrapper.
    pub fn replace_worker(&mut self, wrap: impl FnOnce(SharedWorker) -> SharedWorker) {
        let current = Arc::clone(&self.worker);
        self.worker = wrap(current);
    }

    /// Whether this element must take the async path.
    #[must_use]
    pub fn should_execute_async(&self, ctx: &ValidationContext) -> bool {
        self.worker.should_execute_async(ctx)
    }

    /// Runs the element synchronously. `Ok(true)` means no failures were added.
    pub(crate) fn validate(
        &self,
        rule: &Rule,
        ctx: &ValidationContext,
        property_name: &str,
    ) -> EngineResult<bool> {
        match &self.executor {
            ElementExecutor::Property => {
                let pctx =
                    PropertyContext::new(ctx, rule, &self.metadata, property_name.to_owned());
                let ok = self.worker.execute(&pctx)?;
                Ok(ok && !pctx.has_failures())
            }
            ElementExecutor::Collection(options) => {
                collection::validate_elements(self, options, rule, ctx, property_name)
            }
        }
    }

    /// Runs the element asynchronously. `Ok(true)` means no failures were added.
    pub(crate) async fn validate_async(
        &self,
        rule: &Rule,
        ctx: &ValidationContext,
        property_name: &str,
        cancellation: &CancellationToken,
    ) -> EngineResult<bool> {
        if cancellation.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        match &self.executor {
            ElementExecutor::Property => {
                let pctx =
                    PropertyContext::new(ctx, rule, &self.metadata, property_name.to_owned());
                let ok = self.worker.execute_async(&pctx, cancellation).await?;
                Ok(ok && !pctx.has_failures())
            }
            ElementExecutor::Collection(options) => {
                collection::validate_elements_async(
                    self,
                    options,
                    rule,
                    ctx,
                    property_name,
                    cancellation,
                )
                .await
            }
        }
    }
}

impl fmt::Debug for RuleElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleElement")
            .field("worker", &self.worker.name())
            .field("metadata", &self.metadata)
            .field("executor", &self.executor)
            .finish()
    }
}
