use crate::error::Error;

/// Result type alias used throughout vistab.
///
/// A shorthand for `std::result::Result<T, Error>`; all vistab operations
/// that can fail return this type.
pub type Result<T> = std::result::Result<T, Error>;
