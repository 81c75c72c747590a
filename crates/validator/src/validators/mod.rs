//! Built-in leaf validators
//!
//! A [`PropertyValidator`] is a check over one property value with a
//! default error code and message template. Every property validator is a
//! [`Worker`]: on failure it formats its message and appends one failure.
//!
//! # Validators
//!
//! - **Presence**: [`NotNull`], [`NotEmpty`]
//! - **Length**: [`Length`], [`MinLength`], [`MaxLength`]
//! - **Pattern**: [`Matches`]
//! - **Custom**: [`Must`], [`MustAsync`], [`Custom`], [`CustomAsync`]

pub mod custom;
pub mod length;
pub mod nullable;
pub mod pattern;

pub use custom::{Custom, CustomAsync, CustomInput, Must, MustAsync};
pub use length::{Length, MaxLength, MinLength, max_length, min_length};
pub use nullable::{NotEmpty, NotNull, not_empty, not_null};
pub use pattern::Matches;

use crate::context::{PropertyContext, ValidationContext};
use crate::error::EngineResult;
use crate::failure::MessageFormatter;
use crate::worker::Worker;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// A check over a single property value.
#[async_trait]
pub trait PropertyValidator: Send + Sync {
    /// Error code used unless the element overrides it.
    fn code(&self) -> &'static str;

    /// Message template used unless the element overrides it.
    fn message_template(&self) -> &str;

    /// Returns `Ok(true)` when the value passes.
    fn is_valid(&self, ctx: &PropertyContext<'_>) -> EngineResult<bool>;

    async fn is_valid_async(
        &self,
        ctx: &PropertyContext<'_>,
        cancellation: &CancellationToken,
    ) -> EngineResult<bool> {
        let _ = cancellation;
        self.is_valid(ctx)
    }

    /// True if the validator has a genuinely asynchronous check.
    fn is_async(&self) -> bool {
        false
    }

    /// Adds validator-specific placeholders such as `{MaxLength}`.
    fn append_placeholders(&self, ctx: &PropertyContext<'_>, formatter: &mut MessageFormatter) {
        let _ = (ctx, formatter);
    }
}

fn report<V: PropertyValidator + ?Sized>(validator: &V, ctx: &PropertyContext<'_>) {
    let mut formatter = MessageFormatter::new();
    validator.append_placeholders(ctx, &mut formatter);
    let failure = ctx.create_failure(validator.code(), validator.message_template(), formatter);
    ctx.add_failure(failure);
}

#[async_trait]
impl<V: PropertyValidator> Worker for V {
    fn execute(&self, ctx: &PropertyContext<'_>) -> EngineResult<bool> {
        if self.is_valid(ctx)? {
            return Ok(true);
        }
        report(self, ctx);
        Ok(false)
    }

    async fn execute_async(
        &self,
        ctx: &PropertyContext<'_>,
        cancellation: &CancellationToken,
    ) -> EngineResult<bool> {
        if self.is_valid_async(ctx, cancellation).await? {
            return Ok(true);
        }
        report(self, ctx);
        Ok(false)
    }

    fn should_execute_async(&self, ctx: &ValidationContext) -> bool {
        self.is_async() && ctx.is_async()
    }

    fn name(&self) -> &str {
        self.code()
    }
}
