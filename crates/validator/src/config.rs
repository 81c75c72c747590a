//! Engine configuration
//!
//! One [`ValidatorConfig`] value is threaded from the root validator into
//! every rule when the validator is built. There is no global state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Whether a rule keeps evaluating its elements after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeMode {
    /// Run every element regardless of earlier failures.
    #[default]
    Continue,
    /// Stop at the first element that reports a failure.
    StopOnFirstFailure,
}

/// Inputs handed to a [`DisplayNameResolver`].
#[derive(Debug, Clone, Copy)]
pub struct DisplayNameQuery<'a> {
    /// Name of the type that owns the member.
    pub container_type: &'a str,
    /// Member identifier, if the rule targets a named member.
    pub member: Option<&'a str>,
    /// Free-form description of the accessor, if one was supplied.
    pub expression: Option<&'a str>,
}

/// Resolves the display name of a member. Invoked lazily, once per failure.
pub type DisplayNameResolver = Arc<dyn Fn(DisplayNameQuery<'_>) -> Option<String> + Send + Sync>;

/// Resolves the error code of a failing leaf from its default code.
pub type ErrorCodeResolver = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Configuration shared by every rule of a validator.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Cascade mode for rules that do not set their own.
    pub default_cascade: CascadeMode,

    #[serde(skip)]
    display_name_resolver: Option<DisplayNameResolver>,

    #[serde(skip)]
    error_code_resolver: Option<ErrorCodeResolver>,
}

impl ValidatorConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default cascade mode.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_default_cascade(mut self, cascade: CascadeMode) -> Self {
        self.default_cascade = cascade;
        self
    }

    /// Installs a display-name resolver.
    ///
    /// Returning `None` falls back to the split member name.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_display_name_resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn(DisplayNameQuery<'_>) -> Option<String> + Send + Sync + 'static,
    {
        self.display_name_resolver = Some(Arc::new(resolver));
        self
    }

    /// Installs an error-code resolver.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_error_code_resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.error_code_resolver = Some(Arc::new(resolver));
        self
    }

    /// Resolves the display name for a member.
    #[must_use]
    pub fn resolve_display_name(&self, query: DisplayNameQuery<'_>) -> Option<String> {
        if let Some(resolver) = &self.display_name_resolver
            && let Some(name) = resolver(query)
        {
            return Some(name);
        }
        query.member.map(split_pascal_case)
    }

    /// Resolves the error code for a failing leaf.
    #[must_use]
    pub fn resolve_error_code(&self, default_code: &str) -> String {
        match &self.error_code_resolver {
            Some(resolver) => resolver(default_code),
            None => default_code.to_owned(),
        }
    }
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            default_cascade: CascadeMode::Continue,
            display_name_resolver: None,
            error_code_resolver: None,
        }
    }
}

impl fmt::Debug for ValidatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorConfig")
            .field("default_cascade", &self.default_cascade)
            .field("display_name_resolver", &self.display_name_resolver.is_some())
            .field("error_code_resolver", &self.error_code_resolver.is_some())
            .finish()
    }
}

/// Splits a PascalCase identifier into words: `FirstName` → `First Name`.
#[must_use]
pub fn split_pascal_case(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut output = String::with_capacity(input.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower)
            {
                output.push(' ');
            }
        }
        output.push(c);
    }
    output
}
