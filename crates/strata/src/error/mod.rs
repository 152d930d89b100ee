//! Error values and kinds
//!
//! Staged failures are [`ErrorValue`]s. Each carries an [`ErrorKind`] drawn
//! from a static single-inheritance tree, which is what `catch_error` and
//! `wait_expecting` match against.

mod kind;
mod value;

pub use kind::{kinds, Ancestors, ErrorKind};
pub use value::ErrorValue;

/// Result produced by task bodies and handlers
pub type TaskResult<T> = Result<T, ErrorValue>;
