//! Submission Intake Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A submission intake error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for submission intake operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// Rejected or throttled submissions are *not* errors — they are ordinary
/// [`Outcome`](crate::Outcome)s. These cover the infrastructure underneath.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Record store insert failed
    #[display("record store error")]
    Records,
    /// Page cache regeneration failed after the record was stored
    #[display("page cache error")]
    Pages,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Records | Self::Pages)
    }
}
