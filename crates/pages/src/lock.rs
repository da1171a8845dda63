//! Named shared/exclusive locks, one per category.
//!
//! The lock is the whole concurrency story: a regeneration holds a
//! category's lock exclusively for the duration of its rewrite, readers hold
//! it shared for the duration of one fragment read. Categories are fully
//! independent — there is no cross-category ordering to get wrong.

use crate::error::{ErrorKind, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

/// Guard held by readers for the duration of one fragment read.
pub type SharedGuard = OwnedRwLockReadGuard<()>;
/// Guard held by the regenerator for the duration of one full rewrite.
pub type ExclusiveGuard = OwnedRwLockWriteGuard<()>;

/// Registry of per-category locks, created lazily on first use.
///
/// Guards are owned (not borrowed from the registry) so they can be held
/// across await points while other categories proceed independently.
#[derive(Debug, Default)]
pub struct CategoryLocks {
    locks: Mutex<HashMap<String, Arc<RwLock<()>>>>,
}

impl CategoryLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, slug: &str) -> Arc<RwLock<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|poison| poison.into_inner());
        locks.entry(slug.to_string()).or_default().clone()
    }

    /// Attempt to take the category's lock exclusively, without blocking.
    ///
    /// `None` means a regeneration (or a reader) currently holds the lock;
    /// the caller should skip its pass rather than queue behind it.
    pub fn try_exclusive(&self, slug: &str) -> Option<ExclusiveGuard> {
        self.entry(slug).try_write_owned().ok()
    }

    /// Take the category's lock in shared mode, waiting at most `timeout`.
    ///
    /// Shared holders don't block each other; only an exclusive holder makes
    /// this wait. The timeout bounds how long a reader can hang behind a
    /// stuck regeneration, surfacing as
    /// [`LockTimeout`](crate::error::ErrorKind::LockTimeout).
    pub async fn shared(&self, slug: &str, timeout: Duration) -> Result<SharedGuard> {
        tokio::time::timeout(timeout, self.entry(slug).read_owned())
            .await
            .map_err(|_| ErrorKind::LockTimeout(slug.to_string()).into())
    }
}
