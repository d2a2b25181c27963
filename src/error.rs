//! Call Error Taxonomy
//!
//! Recoverable failures of the coercion/invocation pipeline. Conversion
//! faults are deliberately absent: a structurally inconvertible type pairing
//! is a contract violation between caller and callable and panics instead of
//! being returned (see `convert`).

use thiserror::Error;

use crate::returns::BoxedFailure;

/// Result alias used across the crate.
pub type CallResult<T> = Result<T, CallError>;

/// Errors surfaced to the caller of [`call`](crate::call).
#[derive(Debug, Error)]
pub enum CallError {
    /// Supplied argument count does not equal the declared parameter count.
    /// Raised before any coercion or invocation takes place.
    #[error("expected {expected} parameters, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    /// A structured argument could not be populated from its source mapping.
    /// Wraps the structural decoder's message; coercion aborts at the first
    /// failing argument.
    #[error("argument {index}: {message}")]
    Decode { index: usize, message: String },

    /// The callable itself signaled failure through its trailing error-like
    /// return value. All other return values were discarded.
    #[error("{0}")]
    Failed(BoxedFailure),
}
