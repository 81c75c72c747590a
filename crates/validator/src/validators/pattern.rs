//! Regular-expression validator

use super::PropertyValidator;
use crate::context::PropertyContext;
use crate::error::{EngineError, EngineResult};
use crate::failure::MessageFormatter;
use regex::Regex;

/// Requires a string value that matches a regular expression.
///
/// `null` passes. Any other non-string value fails.
#[derive(Debug, Clone)]
pub struct Matches {
    regex: Regex,
}

impl Matches {
    /// Compiles `pattern`.
    ///
    /// # Errors
    ///
    /// [`EngineError::Configuration`] if the pattern does not compile.
    pub fn new(pattern: &str) -> EngineResult<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| EngineError::configuration(format!("invalid pattern '{pattern}': {e}")))?;
        Ok(Self { regex })
    }

    #[must_use]
    pub fn from_regex(regex: Regex) -> Self {
        Self { regex }
    }
}

impl PropertyValidator for Matches {
    fn code(&self) -> &'static str {
        "matches"
    }

    fn message_template(&self) -> &str {
        "'{PropertyName}' is not in the correct format."
    }

    fn is_valid(&self, ctx: &PropertyContext<'_>) -> EngineResult<bool> {
        let value = ctx.value();
        if value.is_null() {
            return Ok(true);
        }
        Ok(value.as_str().is_some_and(|s| self.regex.is_match(s)))
    }

    fn append_placeholders(&self, _ctx: &PropertyContext<'_>, formatter: &mut MessageFormatter) {
        formatter.append("RegularExpression", self.regex.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_pattern_is_configuration_error() {
        let error = Matches::new("(unclosed").unwrap_err();
        assert!(error.is_configuration());
    }
}
