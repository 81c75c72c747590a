//! Engine error types
//!
//! Validation failures are data, not errors: they travel in
//! [`ValidationResult`](crate::ValidationResult). [`EngineError`] covers
//! misconfiguration, unexpected worker faults and cancellation.

use std::borrow::Cow;

/// Boxed source error carried by [`EngineError::Worker`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by the rule engine itself.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EngineError {
    /// A rule or validator was configured incorrectly.
    ///
    /// Raised at the point of misuse and never converted into a failure.
    #[error("invalid rule configuration: {message}")]
    Configuration { message: Cow<'static, str> },

    /// A worker failed in a way that is not a validation outcome.
    #[error("worker '{worker}' failed: {source}")]
    Worker {
        worker: Cow<'static, str>,
        #[source]
        source: BoxError,
    },

    /// The run was cancelled through its cancellation token.
    #[error("validation was cancelled")]
    Cancelled,

    /// The instance could not be converted into a JSON object graph.
    #[error("failed to convert instance into an object graph: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Wraps an unexpected worker error.
    pub fn worker(worker: impl Into<Cow<'static, str>>, source: impl Into<BoxError>) -> Self {
        Self::Worker {
            worker: worker.into(),
            source: source.into(),
        }
    }

    /// Returns `true` for the cancelled outcome.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns `true` for configuration errors.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}

/// Result alias used across the engine.
pub type EngineResult<T> = Result<T, EngineError>;
