//! Property rules
//!
//! A [`Rule`] binds an ordered chain of [`RuleElement`]s to one property of
//! the object under validation. It owns the cascade policy, the dependent
//! rules that run only when the chain passed, and the failure callback.
//!
//! # Execution
//!
//! In synchronous mode elements run in declaration order. An element that
//! needs the async path is driven to completion on the current thread.
//!
//! In asynchronous mode the elements that can complete synchronously run
//! first, in order. The remaining elements then run concurrently under
//! [`CascadeMode::Continue`], or one at a time under
//! [`CascadeMode::StopOnFirstFailure`].
//!
//! # Examples
//!
//! ```rust,ignore
//! use ruleweave_validator::prelude::*;
//!
//! let rule = Rule::for_property("Name")
//!     .cascade(CascadeMode::StopOnFirstFailure)
//!     .must(NotNull)
//!     .must(Length::max(5));
//! ```

mod collection;
mod element;

pub use collection::{CollectionOptions, DisplayIndexFn, ElementFilter};
pub use element::{
    CustomStateFn, ElementExecutor, ElementMetadata, MessageFn, MessageSource, RuleElement,
};

use crate::combinators::{Condition, Conditional};
use crate::config::{CascadeMode, DisplayNameQuery, ValidatorConfig};
use crate::context::{MessageContext, ValidationContext};
use crate::error::{EngineError, EngineResult};
use crate::worker::{SharedWorker, Worker};
use futures::future::{BoxFuture, FutureExt, join_all};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Reads a property from its container.
pub type Accessor = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Maps a property value before any worker sees it.
pub type Transformer = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Invoked with the container once a rule has failed.
pub type FailureCallback = Arc<dyn Fn(&Value) + Send + Sync>;

/// Produces the final message from the formatter and template.
pub type MessageBuilder = Arc<dyn Fn(&MessageContext<'_>) -> String + Send + Sync>;

/// Computes a display name from the container.
pub type DisplayNameFn = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// Which elements a condition applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApplyConditionTo {
    /// Every element present at the time of the call, dependent rules included.
    #[default]
    AllValidators,
    /// Only the most recently added element.
    CurrentValidator,
}

#[derive(Clone)]
enum DisplayName {
    Static(String),
    Computed(DisplayNameFn),
}

/// An ordered chain of workers bound to one property.
#[derive(Clone)]
pub struct Rule {
    member: Option<String>,
    property_name_override: Option<String>,
    display_name: Option<DisplayName>,
    expression: Option<String>,
    accessor: Accessor,
    transformer: Option<Transformer>,
    elements: Vec<RuleElement>,
    dependent_rules: Vec<Rule>,
    cascade: Option<CascadeMode>,
    rule_sets: Vec<String>,
    on_failure: Option<FailureCallback>,
    message_builder: Option<MessageBuilder>,
    element_executor: ElementExecutor,
    container_type: Arc<str>,
    config: Arc<ValidatorConfig>,
}

impl Rule {
    /// Creates a rule for the member `name` of the container object.
    ///
    /// A missing member reads as `null`.
    pub fn for_property(name: impl Into<String>) -> Self {
        let name = name.into();
        let key = name.clone();
        Self::with_accessor(
            Some(name),
            Arc::new(move |container: &Value| container.get(&key).cloned().unwrap_or(Value::Null)),
            ElementExecutor::Property,
        )
    }

    /// Creates a rule with a caller-supplied accessor.
    ///
    /// `name` becomes the member name used for paths and display names.
    pub fn new<F>(name: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Self::with_accessor(Some(name.into()), Arc::new(accessor), ElementExecutor::Property)
    }

    /// Creates a rule over the container itself.
    ///
    /// Failures are reported under the context's own path.
    #[must_use]
    pub fn for_instance() -> Self {
        Self::with_accessor(None, Arc::new(Value::clone), ElementExecutor::Property)
    }

    /// Creates a collection rule for the member `name`.
    ///
    /// Every worker added afterwards runs once per array element.
    pub fn for_each(name: impl Into<String>) -> Self {
        Self::for_each_with(name, CollectionOptions::new())
    }

    /// Creates a collection rule with element filtering or display indices.
    pub fn for_each_with(name: impl Into<String>, options: CollectionOptions) -> Self {
        let mut rule = Self::for_property(name);
        rule.element_executor = ElementExecutor::Collection(Arc::new(options));
        rule
    }

    /// Creates a collection rule with a caller-supplied accessor.
    pub fn for_each_of<F>(name: impl Into<String>, accessor: F, options: CollectionOptions) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Self::with_accessor(
            Some(name.into()),
            Arc::new(accessor),
            ElementExecutor::Collection(Arc::new(options)),
        )
    }

    fn with_accessor(
        member: Option<String>,
        accessor: Accessor,
        element_executor: ElementExecutor,
    ) -> Self {
        Self {
            member,
            property_name_override: None,
            display_name: None,
            expression: None,
            accessor,
            transformer: None,
            elements: Vec::new(),
            dependent_rules: Vec::new(),
            cascade: None,
            rule_sets: Vec::new(),
            on_failure: None,
            message_builder: None,
            element_executor,
            container_type: Arc::from(""),
            config: Arc::new(ValidatorConfig::default()),
        }
    }

    // ------------------------------------------------------------------------
    // Composition
    // ------------------------------------------------------------------------

    /// Appends a worker with default metadata.
    #[must_use = "builder methods must be chained or built"]
    pub fn must(self, worker: impl Worker + 'static) -> Self {
        self.must_with(worker, ElementMetadata::default())
    }

    /// Appends a worker with metadata overrides.
    #[must_use = "builder methods must be chained or built"]
    pub fn must_with(mut self, worker: impl Worker + 'static, metadata: ElementMetadata) -> Self {
        self.add_worker(Arc::new(worker), metadata);
        self
    }

    /// Appends a shared worker using this rule's element executor.
    pub fn add_worker(&mut self, worker: SharedWorker, metadata: ElementMetadata) {
        let element = RuleElement::new(worker, metadata, self.element_executor.clone());
        self.elements.push(element);
    }

    /// Appends a worker that runs once per element of the collection held
    /// by this property, even on a plain property rule.
    pub fn add_collection_worker(
        &mut self,
        worker: SharedWorker,
        metadata: ElementMetadata,
        options: CollectionOptions,
    ) {
        let executor = ElementExecutor::Collection(Arc::new(options));
        self.elements.push(RuleElement::new(worker, metadata, executor));
    }

    /// Builder form of [`add_collection_worker`](Self::add_collection_worker).
    #[must_use = "builder methods must be chained or built"]
    pub fn must_each(mut self, worker: impl Worker + 'static, options: CollectionOptions) -> Self {
        self.add_collection_worker(Arc::new(worker), ElementMetadata::default(), options);
        self
    }

    /// Appends a rule that runs only if this rule produced no failures.
    pub fn add_dependent_rule(&mut self, rule: Rule) {
        self.dependent_rules.push(rule);
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn dependent_rule(mut self, rule: Rule) -> Self {
        self.add_dependent_rule(rule);
        self
    }

    /// Wraps existing elements in a condition.
    ///
    /// With [`ApplyConditionTo::AllValidators`] every current element and
    /// every current dependent rule is wrapped. Elements added later are not.
    ///
    /// # Errors
    ///
    /// [`EngineError::Configuration`] if `CurrentValidator` is requested on
    /// a rule with no elements.
    pub fn apply_condition(
        &mut self,
        condition: &Condition,
        apply_to: ApplyConditionTo,
    ) -> EngineResult<()> {
        match apply_to {
            ApplyConditionTo::AllValidators => {
                self.wrap_all(condition);
                Ok(())
            }
            ApplyConditionTo::CurrentValidator => {
                let Some(last) = self.elements.last_mut() else {
                    return Err(EngineError::configuration(
                        "cannot apply a condition to the current validator of a rule \
                         with no validators",
                    ));
                };
                last.replace_worker(|inner| Arc::new(Conditional::new(condition.clone(), inner)));
                Ok(())
            }
        }
    }

    fn wrap_all(&mut self, condition: &Condition) {
        for element in &mut self.elements {
            element.replace_worker(|inner| Arc::new(Conditional::new(condition.clone(), inner)));
        }
        for dependent in &mut self.dependent_rules {
            dependent.wrap_all(condition);
        }
    }

    /// Gates every element added so far on `condition`.
    #[must_use = "builder methods must be chained or built"]
    pub fn when(mut self, condition: Condition) -> Self {
        self.wrap_all(&condition);
        self
    }

    /// Gates every element added so far on the negation of `condition`.
    #[must_use = "builder methods must be chained or built"]
    pub fn unless(self, condition: Condition) -> Self {
        self.when(condition.negate())
    }

    /// Gates only the last element added on `condition`.
    ///
    /// # Errors
    ///
    /// [`EngineError::Configuration`] if the rule has no elements yet.
    pub fn when_current(mut self, condition: Condition) -> EngineResult<Self> {
        self.apply_condition(&condition, ApplyConditionTo::CurrentValidator)?;
        Ok(self)
    }

    // ------------------------------------------------------------------------
    // Options
    // ------------------------------------------------------------------------

    /// Overrides the rule's cascade mode.
    #[must_use = "builder methods must be chained or built"]
    pub fn cascade(mut self, mode: CascadeMode) -> Self {
        self.cascade = Some(mode);
        self
    }

    /// Replaces the member name used for the path segment.
    #[must_use = "builder methods must be chained or built"]
    pub fn override_property_name(mut self, name: impl Into<String>) -> Self {
        self.property_name_override = Some(name.into());
        self
    }

    /// Replaces the display name used in messages.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(DisplayName::Static(name.into()));
        self
    }

    /// Computes the display name from the container.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_display_name_fn<F>(mut self, name: F) -> Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        self.display_name = Some(DisplayName::Computed(Arc::new(name)));
        self
    }

    /// Describes the accessor for display-name resolvers.
    #[must_use = "builder methods must be chained or built"]
    pub fn described_as(mut self, expression: impl Into<String>) -> Self {
        self.expression = Some(expression.into());
        self
    }

    /// Maps the property value before validation.
    #[must_use = "builder methods must be chained or built"]
    pub fn transform<F>(mut self, transformer: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.transformer = Some(Arc::new(transformer));
        self
    }

    /// Assigns the rule to named rule sets.
    #[must_use = "builder methods must be chained or built"]
    pub fn in_rule_sets<I, S>(mut self, sets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rule_sets = sets.into_iter().map(Into::into).collect();
        self
    }

    /// Invoked with the container whenever the rule fails.
    #[must_use = "builder methods must be chained or built"]
    pub fn on_failure<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.on_failure = Some(Arc::new(callback));
        self
    }

    /// Replaces message formatting for every element of the rule.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_message_builder<F>(mut self, builder: F) -> Self
    where
        F: Fn(&MessageContext<'_>) -> String + Send + Sync + 'static,
    {
        self.message_builder = Some(Arc::new(builder));
        self
    }

    /// Installs the validator's configuration on this rule and its dependents.
    pub(crate) fn bind(&mut self, container_type: &Arc<str>, config: &Arc<ValidatorConfig>) {
        self.container_type = Arc::clone(container_type);
        self.config = Arc::clone(config);
        for dependent in &mut self.dependent_rules {
            dependent.bind(container_type, config);
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Member name the rule was declared for.
    #[must_use]
    pub fn member(&self) -> Option<&str> {
        self.member.as_deref()
    }

    #[must_use]
    pub fn elements(&self) -> &[RuleElement] {
        &self.elements
    }

    #[must_use]
    pub fn dependent_rules(&self) -> &[Rule] {
        &self.dependent_rules
    }

    #[must_use]
    pub fn rule_sets(&self) -> &[String] {
        &self.rule_sets
    }

    /// Effective cascade mode.
    #[must_use]
    pub fn cascade_mode(&self) -> CascadeMode {
        self.cascade.unwrap_or(self.config.default_cascade)
    }

    #[must_use]
    pub fn is_collection(&self) -> bool {
        matches!(self.element_executor, ElementExecutor::Collection(_))
    }

    #[must_use]
    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub(crate) fn message_builder(&self) -> Option<&MessageBuilder> {
        self.message_builder.as_ref()
    }

    /// Reads the property from `container` and applies the transformer.
    #[must_use]
    pub fn read_value(&self, container: &Value) -> Value {
        let value = (self.accessor)(container);
        match &self.transformer {
            Some(transform) => transform(value),
            None => value,
        }
    }

    /// The segment this rule appends to the path.
    ///
    /// Falls back to a static or computed display name when the rule has no
    /// member name, and to the empty string after that.
    #[must_use]
    pub fn path_segment(&self, container: &Value) -> String {
        if let Some(name) = self.property_name_override.as_ref().or(self.member.as_ref()) {
            return name.clone();
        }
        match &self.display_name {
            Some(DisplayName::Static(name)) => name.clone(),
            Some(DisplayName::Computed(name)) => name(container),
            None => String::new(),
        }
    }

    /// Name used for the `{PropertyName}` placeholder.
    #[must_use]
    pub fn display_name(&self, container: &Value) -> String {
        match &self.display_name {
            Some(DisplayName::Static(name)) => return name.clone(),
            Some(DisplayName::Computed(name)) => return name(container),
            None => {}
        }
        let member = self.property_name_override.as_deref().or(self.member.as_deref());
        self.config
            .resolve_display_name(DisplayNameQuery {
                container_type: &self.container_type,
                member,
                expression: self.expression.as_deref(),
            })
            .unwrap_or_default()
    }

    fn skip_dependents(&self, property_name: &str) {
        if !self.dependent_rules.is_empty() {
            tracing::debug!(
                property = %property_name,
                skipped = self.dependent_rules.len(),
                "rule failed, dependent rules skipped"
            );
        }
    }

    fn notify_failure(&self, ctx: &ValidationContext) {
        if let Some(callback) = &self.on_failure {
            callback(ctx.model());
        }
    }

    // ------------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------------

    /// Runs the rule synchronously against `ctx`.
    ///
    /// # Errors
    ///
    /// Worker faults and configuration errors are propagated as-is.
    pub fn validate(&self, ctx: &ValidationContext) -> EngineResult<()> {
        let segment = self.path_segment(ctx.model());
        let property_name = ctx.path().build_property_name(&segment);

        if !ctx.selector().can_execute(self, &property_name, ctx) {
            tracing::debug!(property = %property_name, "rule skipped by selector");
            return Ok(());
        }

        let cascade = self.cascade_mode();
        let mut failed = false;

        for element in &self.elements {
            let ok = if element.should_execute_async(ctx) {
                let cancellation = CancellationToken::new();
                futures::executor::block_on(element.validate_async(
                    self,
                    ctx,
                    &property_name,
                    &cancellation,
                ))?
            } else {
                element.validate(self, ctx, &property_name)?
            };

            if !ok {
                failed = true;
                if cascade == CascadeMode::StopOnFirstFailure {
                    tracing::debug!(property = %property_name, "stopping after first failure");
                    break;
                }
            }
        }

        if failed {
            self.skip_dependents(&property_name);
            self.notify_failure(ctx);
            return Ok(());
        }

        for dependent in &self.dependent_rules {
            dependent.validate(ctx)?;
        }
        Ok(())
    }

    /// Runs the rule asynchronously against `ctx`.
    ///
    /// # Errors
    ///
    /// [`EngineError::Cancelled`] once `cancellation` fires. A cancelled
    /// element counts as a failure, so the failure callback still runs and
    /// dependent rules are skipped.
    pub fn validate_async<'a>(
        &'a self,
        ctx: &'a ValidationContext,
        cancellation: &'a CancellationToken,
    ) -> BoxFuture<'a, EngineResult<()>> {
        async move {
            let segment = self.path_segment(ctx.model());
            let property_name = ctx.path().build_property_name(&segment);

            if !ctx.selector().can_execute(self, &property_name, ctx) {
                tracing::debug!(property = %property_name, "rule skipped by selector");
                return Ok(());
            }

            let cascade = self.cascade_mode();
            let (async_elements, sync_elements): (Vec<&RuleElement>, Vec<&RuleElement>) = self
                .elements
                .iter()
                .partition(|element| element.should_execute_async(ctx));

            let mut failed = false;
            let mut cancelled = false;

            for element in sync_elements {
                if cancellation.is_cancelled() {
                    cancelled = true;
                    break;
                }
                if !element.validate(self, ctx, &property_name)? {
                    failed = true;
                    if cascade == CascadeMode::StopOnFirstFailure {
                        break;
                    }
                }
            }

            let stopped = cancelled || (failed && cascade == CascadeMode::StopOnFirstFailure);
            if !stopped && !async_elements.is_empty() {
                match cascade {
                    CascadeMode::StopOnFirstFailure => {
                        for element in async_elements {
                            match element
                                .validate_async(self, ctx, &property_name, cancellation)
                                .await
                            {
                                Ok(true) => {}
                                Ok(false) => {
                                    failed = true;
                                    break;
                                }
                                Err(EngineError::Cancelled) => {
                                    cancelled = true;
                                    break;
                                }
                                Err(error) => return Err(error),
                            }
                        }
                    }
                    CascadeMode::Continue => {
                        let outcomes = join_all(async_elements.into_iter().map(|element| {
                            element.validate_async(self, ctx, &property_name, cancellation)
                        }))
                        .await;
                        for outcome in outcomes {
                            match outcome {
                                Ok(ok) => failed |= !ok,
                                Err(EngineError::Cancelled) => cancelled = true,
                                Err(error) => return Err(error),
                            }
                        }
                    }
                }
            }

            if cancelled {
                tracing::debug!(property = %property_name, "rule cancelled");
                self.notify_failure(ctx);
                return Err(EngineError::Cancelled);
            }
            if failed {
                self.skip_dependents(&property_name);
                self.notify_failure(ctx);
                return Ok(());
            }

            for dependent in &self.dependent_rules {
                if cancellation.is_cancelled() {
                    return Err(EngineError::Cancelled);
                }
                dependent.validate_async(ctx, cancellation).await?;
            }
            Ok(())
        }
        .boxed()
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("member", &self.member)
            .field("property_name_override", &self.property_name_override)
            .field("elements", &self.elements)
            .field("dependent_rules", &self.dependent_rules.len())
            .field("cascade", &self.cascade)
            .field("rule_sets", &self.rule_sets)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::{Length, NotNull};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn run(rule: &Rule, instance: Value) -> Vec<String> {
        let ctx = ValidationContext::new(instance);
        rule.validate(&ctx).unwrap();
        ctx.into_result()
            .failures()
            .iter()
            .map(|f| f.property_name().to_owned())
            .collect()
    }

    #[test]
    fn test_missing_member_reads_null() {
        let rule = Rule::for_property("Name");
        assert_eq!(rule.read_value(&json!({})), Value::Null);
        assert_eq!(rule.read_value(&json!({"Name": "x"})), json!("x"));
    }

    #[test]
    fn test_transformer_applies_after_accessor() {
        let rule = Rule::for_property("Name")
            .transform(|v| json!(v.as_str().unwrap_or_default().trim()));
        assert_eq!(rule.read_value(&json!({"Name": "  bob "})), json!("bob"));
    }

    #[test]
    fn test_continue_reports_every_element() {
        let rule = Rule::for_property("Name").must(NotNull).must(Length::min(3));
        assert_eq!(run(&rule, json!({})), vec!["Name"]);

        let rule = Rule::for_property("Name").must(Length::min(3)).must(Length::max(1));
        assert_eq!(run(&rule, json!({"Name": "ab"})), vec!["Name", "Name"]);
    }

    #[test]
    fn test_stop_on_first_failure() {
        let rule = Rule::for_property("Name")
            .cascade(CascadeMode::StopOnFirstFailure)
            .must(Length::min(3))
            .must(Length::max(1));
        assert_eq!(run(&rule, json!({"Name": "ab"})), vec!["Name"]);
    }

    #[test]
    fn test_current_validator_requires_an_element() {
        let mut rule = Rule::for_property("Name");
        let error = rule
            .apply_condition(&Condition::new(|_| true), ApplyConditionTo::CurrentValidator)
            .unwrap_err();
        assert!(error.is_configuration());
    }

    #[test]
    fn test_path_segment_prefers_override() {
        let rule = Rule::for_property("Name").override_property_name("FullName");
        assert_eq!(rule.path_segment(&json!({})), "FullName");

        let rule = Rule::for_instance().with_display_name("Customer");
        assert_eq!(rule.path_segment(&json!({})), "Customer");
        assert_eq!(Rule::for_instance().path_segment(&json!({})), "");
    }

    #[test]
    fn test_display_name_resolution() {
        let rule = Rule::for_property("FirstName");
        assert_eq!(rule.display_name(&json!({})), "First Name");

        let rule = Rule::for_property("FirstName")
            .with_display_name_fn(|c| format!("{} name", c["Kind"].as_str().unwrap_or("?")));
        assert_eq!(rule.display_name(&json!({"Kind": "given"})), "given name");
    }

    #[test]
    fn test_rule_set_membership() {
        let rule = Rule::for_property("Name").in_rule_sets(["a", "b"]);
        assert_eq!(rule.rule_sets(), ["a".to_owned(), "b".to_owned()]);
    }
}
