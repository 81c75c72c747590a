//! Workers that wrap or delegate to other workers
//!
//! - [`Conditional`] - runs its inner worker only while a [`Condition`] holds
//! - [`ChildValidator`] - validates a nested object with its own validator
//! - [`Lazy`] - builds its worker from the container at execution time

mod child;
mod condition;
mod lazy;

pub use child::{ChildValidator, ValidatorFactory};
pub use condition::{AsyncPredicate, Condition, Conditional, SyncPredicate};
pub use lazy::{Lazy, WorkerFactory};
