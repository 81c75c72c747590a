//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use ruleweave_validator::prelude::*;
//! ```

// ============================================================================
// CORE: Engine types, errors, results
// ============================================================================

pub use crate::config::{CascadeMode, ValidatorConfig};
pub use crate::context::{PropertyContext, SharedData, ValidationContext};
pub use crate::error::{EngineError, EngineResult};
pub use crate::failure::{MessageFormatter, Severity, ValidationFailure, ValidationResult};
pub use crate::path::{PathSegment, PropertyPath};
pub use crate::validator::{ValidateOptions, Validator};
pub use crate::worker::{SharedWorker, Worker};

// ============================================================================
// RULES: Composition and selection
// ============================================================================

pub use crate::rule::{ApplyConditionTo, CollectionOptions, ElementMetadata, Rule};
pub use crate::selector::{DefaultSelector, MemberNameSelector, RuleSelector, RuleSetSelector};

// ============================================================================
// VALIDATORS AND COMBINATORS
// ============================================================================

pub use crate::combinators::{ChildValidator, Condition, Lazy};
pub use crate::validators::{
    Custom, CustomAsync, CustomInput, Length, Matches, MaxLength, MinLength, Must, MustAsync,
    NotEmpty, NotNull, PropertyValidator,
};

pub use tokio_util::sync::CancellationToken;
