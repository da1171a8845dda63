//! Page Cache Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A page cache error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for page cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// No such category is configured
    #[display("unknown category: {_0}")]
    UnknownCategory(#[error(not(source))] String),
    /// Record store query failed
    #[display("record store error")]
    Records,
    /// Fragment store operation failed
    #[display("fragment store error")]
    Store,
    /// Fragment rendering failed
    #[display("fragment rendering error")]
    Render,
    /// A reader could not acquire the category lock within its timeout
    #[display("timed out waiting for category lock: {_0}")]
    LockTimeout(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Records | Self::Store | Self::LockTimeout(_))
    }
}
