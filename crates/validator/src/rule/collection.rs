//! Per-element execution for collection rules
//!
//! Values other than a JSON array pass without checks. Each surviving
//! element gets a fresh collection-element context whose path is the parent
//! path, the collection's member name and an index segment.

use super::Rule;
use super::element::RuleElement;
use crate::context::{PropertyContext, ValidationContext};
use crate::error::{EngineError, EngineResult};
use futures::future::join_all;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Element predicate; `false` skips the element.
pub type ElementFilter = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Reports an element's own display index; `None` falls back to the counter.
pub type DisplayIndexFn = Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>;

/// Options that shape how a collection is walked.
#[derive(Clone, Default)]
pub struct CollectionOptions {
    filter: Option<ElementFilter>,
    display_index: Option<DisplayIndexFn>,
}

impl CollectionOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only elements for which `filter` returns `true` are validated.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Lets elements name their own index segment, e.g. by a key field.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_display_index<F>(mut self, display_index: F) -> Self
    where
        F: Fn(&Value) -> Option<String> + Send + Sync + 'static,
    {
        self.display_index = Some(Arc::new(display_index));
        self
    }

    fn accepts(&self, element: &Value) -> bool {
        !element.is_null() && self.filter.as_ref().is_none_or(|filter| filter(element))
    }
}

impl fmt::Debug for CollectionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionOptions")
            .field("filter", &self.filter.is_some())
            .field("display_index", &self.display_index.is_some())
            .finish()
    }
}

/// Builds one child context per surviving element.
fn plan(
    options: &CollectionOptions,
    rule: &Rule,
    ctx: &ValidationContext,
) -> EngineResult<Option<Vec<(ValidationContext, Value)>>> {
    let Value::Array(items) = rule.read_value(ctx.model()) else {
        return Ok(None);
    };

    let segment = rule.path_segment(ctx.model());
    if segment.is_empty() {
        return Err(EngineError::configuration(
            "could not determine the property name of a collection rule; \
             call override_property_name on the rule",
        ));
    }

    let mut planned = Vec::with_capacity(items.len());
    let mut position = 0usize;
    for item in items {
        if !options.accepts(&item) {
            continue;
        }

        let mut child = ctx.clone_for_collection_element();
        child.path_mut().extend_from(ctx.path());
        child.path_mut().push_name(segment.clone());
        match options.display_index.as_ref().and_then(|index_of| index_of(&item)) {
            Some(key) => child.path_mut().push_key(key),
            None => child.path_mut().push_index(position),
        }
        position += 1;

        planned.push((child, item));
    }
    Ok(Some(planned))
}

pub(crate) fn validate_elements(
    element: &RuleElement,
    options: &CollectionOptions,
    rule: &Rule,
    ctx: &ValidationContext,
    _property_name: &str,
) -> EngineResult<bool> {
    let worker = element.worker();
    if !worker.precondition(ctx) {
        return Ok(true);
    }
    let Some(planned) = plan(options, rule, ctx)? else {
        return Ok(true);
    };

    tracing::trace!(
        rule = %rule.path_segment(ctx.model()),
        elements = planned.len(),
        "validating collection elements"
    );

    let mut all_ok = true;
    for (child, item) in &planned {
        let pctx = PropertyContext::with_value(
            child,
            rule,
            element.metadata(),
            child.path().to_string(),
            item.clone(),
        );
        let ok = if worker.should_execute_async(child) {
            futures::executor::block_on(worker.execute_async(&pctx, &CancellationToken::new()))?
        } else {
            worker.execute(&pctx)?
        };
        all_ok &= ok && !pctx.has_failures();
    }
    Ok(all_ok)
}

pub(crate) async fn validate_elements_async(
    element: &RuleElement,
    options: &CollectionOptions,
    rule: &Rule,
    ctx: &ValidationContext,
    _property_name: &str,
    cancellation: &CancellationToken,
) -> EngineResult<bool> {
    let worker = element.worker();
    if !worker.precondition(ctx) {
        return Ok(true);
    }
    let Some(planned) = plan(options, rule, ctx)? else {
        return Ok(true);
    };

    let outcomes = join_all(planned.into_iter().map(|(child, item)| async move {
        if cancellation.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        let pctx = PropertyContext::with_value(
            &child,
            rule,
            element.metadata(),
            child.path().to_string(),
            item,
        );
        let ok = if worker.should_execute_async(&child) {
            worker.execute_async(&pctx, cancellation).await?
        } else {
            worker.execute(&pctx)?
        };
        Ok(ok && !pctx.has_failures())
    }))
    .await;

    let mut all_ok = true;
    let mut cancelled = false;
    for outcome in outcomes {
        match outcome {
            Ok(ok) => all_ok &= ok,
            Err(EngineError::Cancelled) => cancelled = true,
            Err(error) => return Err(error),
        }
    }
    if cancelled {
        return Err(EngineError::Cancelled);
    }
    Ok(all_ok)
}
