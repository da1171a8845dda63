//! Fragment store trait and implementations.
//!
//! This module defines the `FragmentStore` trait, a unified interface over
//! wherever generated page fragments end up living (local filesystem for the
//! classic deployment, an in-memory map for tests).

mod local;
#[cfg(feature = "mock")]
mod mock;

pub use self::local::LocalStore;
#[cfg(feature = "mock")]
pub use self::mock::MemoryStore;
use crate::error::Result;
use crate::info::FragmentInfo;
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::path::Path;
use std::pin::Pin;

type FragmentInfoStream<'a> = Pin<Box<dyn Stream<Item = Result<FragmentInfo>> + Send + 'a>>;

/// Unified interface for fragment stores.
///
/// All operations are asynchronous and take paths relative to the store root.
/// Paths must survive [`validate_path`](crate::validate_path) — implementations
/// enforce this, so a caller can pass request-derived paths without building
/// its own traversal guard.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use vitrine_store::{FragmentStore, error::Result};
///
/// async fn fragment_size(store: &dyn FragmentStore, page: u64) -> Result<u64> {
///     let path = format!("links/page-{page}.html");
///     if store.exists(Path::new(&path)).await? {
///         let data = store.read(Path::new(&path)).await?;
///         Ok(data.len() as u64)
///     } else {
///         Ok(0)
///     }
/// }
/// ```
#[async_trait]
pub trait FragmentStore: Send + Sync {
    /// Name of the configured store (used for logging only).
    fn name(&self) -> &str;

    /// List all fragments matching an optional prefix.
    ///
    /// Default implementation collects [`list_stream()`](Self::list_stream)
    /// into a [`Vec`] before returning.
    async fn list(&self, prefix: Option<&Path>) -> Result<Vec<FragmentInfo>> {
        self.list_stream(prefix).try_collect().await
    }

    /// Stream fragment metadata matching an optional prefix.
    ///
    /// Yields results incrementally. If a prefix is provided, only fragments
    /// whose paths start with the prefix (component-wise) are returned.
    /// Listing a prefix that doesn't exist yields an empty stream, not an
    /// error.
    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FragmentInfoStream<'a>;

    /// Check if a fragment exists.
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Read a fragment's complete contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the
    /// fragment does not exist.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Write a fragment.
    ///
    /// Creates a new fragment or overwrites an existing one with the provided
    /// data. A partially-performed write must never be observable at `path`:
    /// implementations either publish the whole fragment or leave the
    /// previous contents in place.
    ///
    /// # Notes
    /// - Implementations create parent directories as needed.
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// Delete a fragment.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the
    /// fragment does not exist.
    async fn delete(&self, path: &Path) -> Result<()>;

    /// Rename/move a fragment within the same store.
    ///
    /// This is the publish primitive: regeneration stages fragments under a
    /// scratch prefix and renames each one over its published path.
    ///
    /// # Notes
    /// - Implementations create parent directories as needed
    /// - If the destination already exists, it is overwritten
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the source
    /// does not exist.
    async fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// Get fragment metadata without reading contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the
    /// fragment does not exist.
    async fn stat(&self, path: &Path) -> Result<FragmentInfo>;
}
