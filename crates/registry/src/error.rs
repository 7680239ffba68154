//! Registry Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Storage failures are raised as [`ErrorKind::Storage`]
//! with the storage crate's error tree attached as a child.

use derive_more::{Display, Error};

/// A registry error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// No pack exists under the requested slug. Only raised by operations
    /// that need an existing pack; plain lookups return `None` instead.
    #[display("pack not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// A pack record does not satisfy its field constraints. Nothing has been
    /// written when this is raised.
    #[display("invalid pack field '{field}': {reason}")]
    Validation {
        /// The offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
    /// Reading or writing a sidecar or artifact failed.
    #[display("storage error")]
    Storage,
    /// A sidecar could not be encoded or decoded.
    #[display("invalid sidecar data")]
    Serialization,
}

impl ErrorKind {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation { field, reason: reason.into() }
    }
}
