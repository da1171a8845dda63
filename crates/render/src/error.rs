//! Render Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A render error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for render operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Embedded template asset missing or not valid UTF-8
    #[display("template asset not found: {_0}")]
    AssetNotFound(#[error(not(source))] String),
    /// Template failed to compile
    #[display("template compilation failed")]
    Template,
    /// Template failed to render against its parameters
    #[display("fragment rendering failed")]
    Render,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
