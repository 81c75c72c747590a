//! The root validator
//!
//! A [`Validator`] owns the ordered rules of one object type. Running it
//! creates a root context, executes every rule in declaration order and
//! returns the collected failures.
//!
//! # Examples
//!
//! ```rust,ignore
//! use ruleweave_validator::prelude::*;
//!
//! let validator = Validator::builder("Customer")
//!     .rule(Rule::for_property("Name").must(NotNull).must(Length::max(50)))
//!     .rule(Rule::for_property("Email").must(Matches::new(r"^\S+@\S+$")?))
//!     .build();
//!
//! let result = validator.validate(&customer)?;
//! assert!(result.is_valid());
//! ```

use crate::config::ValidatorConfig;
use crate::context::{SharedData, ValidationContext};
use crate::error::{EngineError, EngineResult};
use crate::failure::ValidationResult;
use crate::rule::Rule;
use crate::selector::{DefaultSelector, RuleSelector};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

// ============================================================================
// OPTIONS
// ============================================================================

/// Per-run options.
#[derive(Clone, Default)]
pub struct ValidateOptions {
    selector: Option<Arc<dyn RuleSelector>>,
    shared: Option<SharedData>,
}

impl ValidateOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts which rules run.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_selector(mut self, selector: impl RuleSelector + 'static) -> Self {
        self.selector = Some(Arc::new(selector));
        self
    }

    /// Seeds the shared data map. The caller keeps a handle to read it back.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_shared_data(mut self, shared: SharedData) -> Self {
        self.shared = Some(shared);
        self
    }

    fn root_context(self, instance: Value, is_async: bool) -> ValidationContext {
        ValidationContext::root(
            Arc::new(instance),
            self.selector.unwrap_or_else(|| Arc::new(DefaultSelector)),
            self.shared.unwrap_or_default(),
            is_async,
        )
    }
}

impl fmt::Debug for ValidateOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidateOptions")
            .field("selector", &self.selector.is_some())
            .field("shared", &self.shared)
            .finish()
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Collects rules and configuration for a [`Validator`].
#[derive(Debug)]
pub struct ValidatorBuilder {
    type_name: String,
    rules: Vec<Rule>,
    config: ValidatorConfig,
}

impl ValidatorBuilder {
    #[must_use = "builder methods must be chained or built"]
    pub fn config(mut self, config: ValidatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Appends a rule. Rules run in the order they are added.
    #[must_use = "builder methods must be chained or built"]
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Binds the configuration into every rule.
    #[must_use]
    pub fn build(self) -> Validator {
        let type_name: Arc<str> = Arc::from(self.type_name);
        let config = Arc::new(self.config);
        let mut rules = self.rules;
        for rule in &mut rules {
            rule.bind(&type_name, &config);
        }
        Validator {
            type_name,
            rules,
            config,
        }
    }
}

// ============================================================================
// VALIDATOR
// ============================================================================

/// Ordered rules for one object type.
#[derive(Clone)]
pub struct Validator {
    type_name: Arc<str>,
    rules: Vec<Rule>,
    config: Arc<ValidatorConfig>,
}

impl Validator {
    /// Starts a validator for objects of `type_name`.
    ///
    /// The name is passed to display-name resolvers.
    pub fn builder(type_name: impl Into<String>) -> ValidatorBuilder {
        ValidatorBuilder {
            type_name: type_name.into(),
            rules: Vec::new(),
            config: ValidatorConfig::default(),
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    #[must_use]
    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validates a serializable instance.
    ///
    /// # Errors
    ///
    /// [`EngineError::Serialization`] if the instance cannot be converted,
    /// otherwise any configuration error or worker fault raised by a rule.
    pub fn validate<T: Serialize + ?Sized>(&self, instance: &T) -> EngineResult<ValidationResult> {
        self.validate_with(serde_json::to_value(instance)?, ValidateOptions::default())
    }

    /// Validates an instance that is already an object graph.
    ///
    /// # Errors
    ///
    /// Configuration errors and worker faults raised by a rule.
    pub fn validate_value(&self, instance: Value) -> EngineResult<ValidationResult> {
        self.validate_with(instance, ValidateOptions::default())
    }

    /// Validates with a selector or seeded shared data.
    ///
    /// # Errors
    ///
    /// Configuration errors and worker faults raised by a rule.
    #[tracing::instrument(skip_all, fields(validator = %self.type_name))]
    pub fn validate_with(
        &self,
        instance: Value,
        options: ValidateOptions,
    ) -> EngineResult<ValidationResult> {
        let ctx = options.root_context(instance, false);
        self.execute(&ctx)?;
        let result = ctx.into_result();
        tracing::debug!(failures = result.failures().len(), "validation finished");
        Ok(result)
    }

    /// Validates a serializable instance asynchronously.
    ///
    /// # Errors
    ///
    /// [`EngineError::Cancelled`] if `cancellation` fires before the run
    /// completes. Partial failures are discarded in that case.
    pub async fn validate_async<T: Serialize + ?Sized>(
        &self,
        instance: &T,
        cancellation: &CancellationToken,
    ) -> EngineResult<ValidationResult> {
        let instance = serde_json::to_value(instance)?;
        self.validate_with_async(instance, ValidateOptions::default(), cancellation)
            .await
    }

    /// Asynchronous form of [`validate_value`](Self::validate_value).
    ///
    /// # Errors
    ///
    /// See [`validate_async`](Self::validate_async).
    pub async fn validate_value_async(
        &self,
        instance: Value,
        cancellation: &CancellationToken,
    ) -> EngineResult<ValidationResult> {
        self.validate_with_async(instance, ValidateOptions::default(), cancellation)
            .await
    }

    /// Asynchronous form of [`validate_with`](Self::validate_with).
    ///
    /// # Errors
    ///
    /// See [`validate_async`](Self::validate_async).
    #[tracing::instrument(skip_all, fields(validator = %self.type_name))]
    pub async fn validate_with_async(
        &self,
        instance: Value,
        options: ValidateOptions,
        cancellation: &CancellationToken,
    ) -> EngineResult<ValidationResult> {
        let ctx = options.root_context(instance, true);
        self.execute_async(&ctx, cancellation).await?;
        if cancellation.is_cancelled() {
            tracing::debug!("validation cancelled");
            return Err(EngineError::Cancelled);
        }
        let result = ctx.into_result();
        tracing::debug!(failures = result.failures().len(), "validation finished");
        Ok(result)
    }

    /// Runs every rule against an existing context.
    ///
    /// # Errors
    ///
    /// Configuration errors and worker faults raised by a rule.
    pub fn execute(&self, ctx: &ValidationContext) -> EngineResult<()> {
        for rule in &self.rules {
            rule.validate(ctx)?;
        }
        Ok(())
    }

    /// Runs every rule against an existing context, one rule at a time.
    ///
    /// # Errors
    ///
    /// [`EngineError::Cancelled`] once `cancellation` fires, and any error
    /// raised by a rule.
    pub async fn execute_async(
        &self,
        ctx: &ValidationContext,
        cancellation: &CancellationToken,
    ) -> EngineResult<()> {
        for rule in &self.rules {
            if cancellation.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            rule.validate_async(ctx, cancellation).await?;
        }
        Ok(())
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("type_name", &self.type_name)
            .field("rules", &self.rules.len())
            .field("config", &self.config)
            .finish()
    }
}
