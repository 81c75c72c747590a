//! # ruleweave-validator
//!
//! Declarative rule composition and execution over JSON object graphs.
//!
//! Callers attach ordered, optionally conditional rules to named properties
//! of an object. The engine runs them against an instance and returns a flat
//! list of failures, each annotated with the dotted and indexed path to the
//! offending value (`Orders[2].Lines[0].Sku`).
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ruleweave_validator::prelude::*;
//!
//! let validator = Validator::builder("Customer")
//!     .rule(
//!         Rule::for_property("Name")
//!             .cascade(CascadeMode::StopOnFirstFailure)
//!             .must(NotNull)
//!             .must(Length::max(50)),
//!     )
//!     .rule(Rule::for_each("Orders").must(ChildValidator::new(order_validator)))
//!     .build();
//!
//! let result = validator.validate(&customer)?;
//! for failure in result.failures() {
//!     println!("{failure}");
//! }
//! ```
//!
//! ## Sync and async
//!
//! [`Validator::validate`] and [`Validator::validate_async`] produce the
//! same failures for the same rules. Async runs can be cancelled through a
//! [`CancellationToken`](tokio_util::sync::CancellationToken); a cancelled
//! run returns [`EngineError::Cancelled`] instead of a partial result.
//!
//! ## Writing validators
//!
//! Use [`property_validator!`] for simple checks, implement
//! [`PropertyValidator`](validators::PropertyValidator) for checks with
//! placeholders, or [`Worker`] for full control over failure reporting.

#![allow(clippy::type_complexity)]

pub mod combinators;
pub mod config;
pub mod context;
pub mod error;
pub mod failure;
mod macros;
pub mod path;
pub mod prelude;
pub mod rule;
pub mod selector;
pub mod validator;
pub mod validators;
pub mod worker;

pub use config::{CascadeMode, ValidatorConfig};
pub use context::{PropertyContext, SharedData, ValidationContext};
pub use error::{EngineError, EngineResult};
pub use failure::{Severity, ValidationFailure, ValidationResult};
pub use path::{PathSegment, PropertyPath};
pub use rule::{ApplyConditionTo, Rule};
pub use validator::{ValidateOptions, Validator, ValidatorBuilder};
pub use worker::{SharedWorker, Worker};
