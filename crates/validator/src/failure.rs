//! Validation failures and the aggregate result
//!
//! A [`ValidationFailure`] is immutable once built. Failures are collected
//! into the root sink during a run and handed back to the caller inside a
//! [`ValidationResult`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// SEVERITY
// ============================================================================

/// Severity level of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Failure that must be fixed (default).
    #[default]
    Error,
    /// Should be addressed but carries the same control flow as an error.
    Warning,
    /// Informational.
    Info,
}

// ============================================================================
// VALIDATION FAILURE
// ============================================================================

/// A single validation failure.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationFailure {
    property_name: String,
    message: String,
    attempted_value: Value,
    severity: Severity,
    error_code: Option<String>,
    custom_state: Option<Value>,
    placeholders: BTreeMap<String, Value>,
}

impl ValidationFailure {
    /// Creates a failure for `property_name` with `message`.
    pub fn new(property_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
            message: message.into(),
            attempted_value: Value::Null,
            severity: Severity::Error,
            error_code: None,
            custom_state: None,
            placeholders: BTreeMap::new(),
        }
    }

    /// Sets the value that failed validation.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_attempted_value(mut self, value: Value) -> Self {
        self.attempted_value = value;
        self
    }

    /// Sets the severity.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Sets the error code.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_error_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self
    }

    /// Attaches an opaque custom payload.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_custom_state(mut self, state: Value) -> Self {
        self.custom_state = Some(state);
        self
    }

    /// Records the placeholder values used to format the message.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_placeholders(mut self, placeholders: BTreeMap<String, Value>) -> Self {
        self.placeholders = placeholders;
        self
    }

    /// Rendered path of the offending value.
    #[must_use]
    pub fn property_name(&self) -> &str {
        &self.property_name
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Value that failed validation.
    #[must_use]
    pub fn attempted_value(&self) -> &Value {
        &self.attempted_value
    }

    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    #[must_use]
    pub fn error_code(&self) -> Option<&str> {
        self.error_code.as_deref()
    }

    #[must_use]
    pub fn custom_state(&self) -> Option<&Value> {
        self.custom_state.as_ref()
    }

    /// Placeholder values used when the message was formatted.
    #[must_use]
    pub fn placeholders(&self) -> &BTreeMap<String, Value> {
        &self.placeholders
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.property_name.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.property_name, self.message)
        }
    }
}

// ============================================================================
// MESSAGE FORMATTER
// ============================================================================

/// Replaces `{Name}` placeholders in a message template.
///
/// Unknown placeholders are left untouched.
#[derive(Debug, Clone, Default)]
pub struct MessageFormatter {
    placeholders: BTreeMap<String, Value>,
}

impl MessageFormatter {
    pub const PROPERTY_NAME: &'static str = "PropertyName";
    pub const PROPERTY_VALUE: &'static str = "PropertyValue";

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a placeholder value.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.placeholders.insert(name.into(), value.into());
        self
    }

    /// Appends the display name of the property.
    pub fn append_property_name(&mut self, display_name: &str) -> &mut Self {
        self.append(Self::PROPERTY_NAME, display_name)
    }

    /// Appends the value under validation.
    pub fn append_property_value(&mut self, value: &Value) -> &mut Self {
        self.append(Self::PROPERTY_VALUE, value.clone())
    }

    /// Formats `template` with the collected placeholders.
    ///
    /// Each `{Name}` token of the template is resolved once. Inserted values
    /// are copied as-is and never scanned for further placeholders.
    #[must_use]
    pub fn build_message(&self, template: &str) -> String {
        let mut message = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            message.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                message.push_str(&rest[open..]);
                return message;
            };
            match self.placeholders.get(&after[..close]) {
                Some(value) => {
                    message.push_str(&render_placeholder(value));
                    rest = &after[close + 1..];
                }
                None => {
                    message.push('{');
                    rest = after;
                }
            }
        }
        message.push_str(rest);
        message
    }

    #[must_use]
    pub fn placeholders(&self) -> &BTreeMap<String, Value> {
        &self.placeholders
    }

    pub(crate) fn into_placeholders(self) -> BTreeMap<String, Value> {
        self.placeholders
    }
}

fn render_placeholder(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

// ============================================================================
// VALIDATION RESULT
// ============================================================================

/// Aggregate outcome of one validation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationResult {
    failures: Vec<ValidationFailure>,
}

impl ValidationResult {
    #[must_use]
    pub fn new(failures: Vec<ValidationFailure>) -> Self {
        Self { failures }
    }

    /// True when no failure was recorded, whatever its severity.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }

    /// Failures in the order they were recorded.
    #[must_use]
    pub fn failures(&self) -> &[ValidationFailure] {
        &self.failures
    }

    #[must_use]
    pub fn into_failures(self) -> Vec<ValidationFailure> {
        self.failures
    }

    /// Failures recorded for exactly `path`.
    pub fn failures_for<'a>(
        &'a self,
        path: &'a str,
    ) -> impl Iterator<Item = &'a ValidationFailure> + 'a {
        self.failures
            .iter()
            .filter(move |failure| failure.property_name == path)
    }

    /// Failures with [`Severity::Error`].
    pub fn errors(&self) -> impl Iterator<Item = &ValidationFailure> {
        self.by_severity(Severity::Error)
    }

    /// Failures with [`Severity::Warning`].
    pub fn warnings(&self) -> impl Iterator<Item = &ValidationFailure> {
        self.by_severity(Severity::Warning)
    }

    fn by_severity(&self, severity: Severity) -> impl Iterator<Item = &ValidationFailure> {
        self.failures
            .iter()
            .filter(move |failure| failure.severity == severity)
    }

    /// Rendered paths of every failure, in order.
    #[must_use]
    pub fn property_names(&self) -> Vec<&str> {
        self.failures
            .iter()
            .map(ValidationFailure::property_name)
            .collect()
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            return f.write_str("Validation succeeded");
        }
        writeln!(f, "Validation failed with {} failure(s):", self.failures.len())?;
        for (i, failure) in self.failures.iter().enumerate() {
            writeln!(f, "  {}. {}", i + 1, failure)?;
        }
        Ok(())
    }
}
