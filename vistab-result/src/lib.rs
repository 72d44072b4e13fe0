//! Error types and result definitions for the vistab workspace.
//!
//! This crate provides a unified error type ([`Error`]) and result alias
//! ([`Result<T>`]) used throughout all vistab crates. Every fallible
//! operation returns `Result<T>` and propagates failures with the `?`
//! operator; errors are classified at the point they are raised so callers
//! can match on the variant without parsing messages.
//!
//! # Error Categories
//!
//! - **User input errors** ([`Error::InvalidArgumentError`]): selections
//!   out of range, mismatched array types or lengths, null-bearing inputs.
//! - **Unsupported shapes** ([`Error::NotImplemented`]): recognized inputs
//!   the planner deliberately refuses, such as columns whose per-row
//!   dimensionality varies.
//! - **Unresolvable sizes** ([`Error::IndexError`]): a dimension size was
//!   requested that only a per-row context could answer.
//! - **Data format errors** ([`Error::Arrow`]): failures surfaced by the
//!   Arrow kernels used for gathering and merging.
//! - **Internal errors** ([`Error::Internal`]): broken invariants that
//!   should be unreachable; these indicate a bug.

pub mod error;
pub mod result;

pub use error::Error;
pub use result::Result;
