//! Length validators
//!
//! Strings are measured in Unicode scalar values, arrays by element count.
//! `null` and other kinds of value pass; combine with [`NotNull`] to
//! require presence.
//!
//! [`NotNull`]: super::NotNull

use crate::context::PropertyContext;
use crate::error::EngineResult;
use crate::failure::MessageFormatter;
use super::PropertyValidator;
use serde_json::Value;

fn measure(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

crate::property_validator! {
    /// Requires at least `min` characters.
    pub MinLength { min: usize };
    code = "min_length";
    message = "The length of '{PropertyName}' must be at least {MinLength} characters. \
               You entered {TotalLength} characters.";
    rule(self, value) { measure(value).is_none_or(|len| len >= self.min) }
    placeholders(self, value, formatter) {
        formatter
            .append("MinLength", self.min)
            .append("TotalLength", measure(value).unwrap_or(0));
    }
    fn min_length(min: usize);
}

crate::property_validator! {
    /// Allows at most `max` characters.
    pub MaxLength { max: usize };
    code = "max_length";
    message = "The length of '{PropertyName}' must be {MaxLength} characters or fewer. \
               You entered {TotalLength} characters.";
    rule(self, value) { measure(value).is_none_or(|len| len <= self.max) }
    placeholders(self, value, formatter) {
        formatter
            .append("MaxLength", self.max)
            .append("TotalLength", measure(value).unwrap_or(0));
    }
    fn max_length(max: usize);
}

/// Inclusive length range with an optional upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Length {
    min: usize,
    max: Option<usize>,
}

impl Length {
    #[must_use]
    pub const fn between(min: usize, max: usize) -> Self {
        Self { min, max: Some(max) }
    }

    #[must_use]
    pub const fn min(min: usize) -> Self {
        Self { min, max: None }
    }

    #[must_use]
    pub const fn max(max: usize) -> Self {
        Self { min: 0, max: Some(max) }
    }

    #[must_use]
    pub const fn exact(len: usize) -> Self {
        Self::between(len, len)
    }
}

impl PropertyValidator for Length {
    fn code(&self) -> &'static str {
        match (self.min, self.max) {
            (_, None) => "min_length",
            (0, Some(_)) => "max_length",
            (min, Some(max)) if min == max => "exact_length",
            _ => "length",
        }
    }

    fn message_template(&self) -> &str {
        match (self.min, self.max) {
            (_, None) => {
                "The length of '{PropertyName}' must be at least {MinLength} characters. \
                 You entered {TotalLength} characters."
            }
            (0, Some(_)) => {
                "The length of '{PropertyName}' must be {MaxLength} characters or fewer. \
                 You entered {TotalLength} characters."
            }
            (min, Some(max)) if min == max => {
                "'{PropertyName}' must be {MaxLength} characters in length. \
                 You entered {TotalLength} characters."
            }
            _ => {
                "'{PropertyName}' must be between {MinLength} and {MaxLength} characters. \
                 You entered {TotalLength} characters."
            }
        }
    }

    fn is_valid(&self, ctx: &PropertyContext<'_>) -> EngineResult<bool> {
        Ok(measure(ctx.value())
            .is_none_or(|len| len >= self.min && self.max.is_none_or(|max| len <= max)))
    }

    fn append_placeholders(&self, ctx: &PropertyContext<'_>, formatter: &mut MessageFormatter) {
        formatter
            .append("MinLength", self.min)
            .append("TotalLength", measure(ctx.value()).unwrap_or(0));
        if let Some(max) = self.max {
            formatter.append("MaxLength", max);
        }
    }
}
