//! Fragment metadata returned by store listing and stat operations.

use std::path::PathBuf;
use time::OffsetDateTime;

/// Metadata for a single stored fragment.
///
/// Used by listing operations (e.g. sweeping stale overflow pages after a
/// regeneration shrinks a category) and by `stat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentInfo {
    /// Relative path from the store root
    pub path: PathBuf,
    /// Fragment size in bytes
    pub size: u64,
    /// Last modified timestamp
    pub modified: OffsetDateTime,
}

impl FragmentInfo {
    pub fn new(path: impl Into<PathBuf>, size: u64, modified: OffsetDateTime) -> Self {
        Self { path: path.into(), size, modified }
    }
}
