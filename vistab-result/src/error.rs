use std::fmt;
use thiserror::Error;

/// Unified error type for all vistab operations.
///
/// The enum spans the whole stack, from selection validation in the
/// mapping planner to Arrow kernel failures in the group-sort engine.
/// Variants carry a message describing what went wrong; structured
/// matching on the variant is the supported way to branch on failures.
///
/// # Thread Safety
///
/// `Error` is `Send + Sync`, so failures can cross thread boundaries when
/// range iteration is fanned out.
#[derive(Error, Debug)]
pub enum Error {
    /// Arrow library error during columnar data operations.
    ///
    /// Raised by the Arrow compute kernels (`take`, array construction)
    /// that the group-sort engine drives. Typically indicates a type or
    /// allocation problem inside Arrow rather than bad planner state.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Invalid user input or API parameter.
    ///
    /// Examples: a selection index exceeding the column extent along some
    /// dimension, group-sort arrays of mismatched type or length, arrays
    /// carrying nulls, or requesting a concrete output shape from a
    /// mapping that does not have one.
    ///
    /// These errors are recoverable — fix the input and retry.
    #[error("Invalid argument: {0}")]
    InvalidArgumentError(String),

    /// Recognized but deliberately unsupported input.
    ///
    /// Raised for undefined rows in variable-shape columns and for columns
    /// whose per-row dimensionality varies, neither of which can be laid
    /// out in a flat columnar buffer.
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// A dimension size was requested that cannot be resolved.
    ///
    /// Genuinely variable columns only know their non-row extents per row;
    /// asking for a global size along such a dimension fails with this
    /// variant.
    #[error("Index error: {0}")]
    IndexError(String),

    /// Internal error indicating a bug or unexpected state.
    ///
    /// This should never occur during normal operation. The message
    /// records which invariant broke (for example, a plan producing zero
    /// ranges). Please report occurrences with reproduction steps.
    #[error("An internal operation failed: {0}")]
    Internal(String),
}

impl Error {
    /// Create an [`Error::InvalidArgumentError`] from any displayable value.
    #[inline]
    pub fn invalid_argument<E: fmt::Display>(err: E) -> Self {
        Error::InvalidArgumentError(err.to_string())
    }

    /// Create an [`Error::Internal`] from any displayable value.
    #[inline]
    pub fn internal<E: fmt::Display>(err: E) -> Self {
        Error::Internal(err.to_string())
    }
}
