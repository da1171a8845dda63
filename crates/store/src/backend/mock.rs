//! In-memory fragment store for testing.

use super::FragmentInfoStream;
use crate::error::{ErrorKind, Result};
use crate::info::FragmentInfo;
use crate::path::validate as validate_path;
use async_stream::stream;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::FragmentStore;

/// In-memory fragment store for testing.
///
/// Fragments live in a `HashMap` behind a [`RwLock`], so all trait methods
/// can operate on `&self` without external synchronisation. Ideal for unit
/// tests that need a [`FragmentStore`] without filesystem dependencies.
///
/// Write faults can be injected per path to exercise the failure half of a
/// regeneration: a path registered via [`fail_writes_at`](Self::fail_writes_at)
/// makes every `write` to it return a backend error until
/// [`clear_write_faults`](Self::clear_write_faults) is called.
///
/// # Examples
///
/// ```
/// use vitrine_store::backend::{MemoryStore, FragmentStore};
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::with_fragments([
///     ("links/home.html", b"<ul></ul>"),
/// ]);
/// assert!(store.exists(Path::new("links/home.html")).await?);
///
/// store.write(Path::new("links/page-1.html"), b"...").await?;
/// assert!(store.exists(Path::new("links/page-1.html")).await?);
/// # Ok(())
/// # }
/// ```
pub struct MemoryStore {
    name: String,
    storage: RwLock<HashMap<PathBuf, (OffsetDateTime, Vec<u8>)>>,
    write_faults: Mutex<HashSet<PathBuf>>,
}

impl MemoryStore {
    /// Create a memory store pre-populated with fragments.
    ///
    /// Panics if any path fails validation (e.g. path traversal). If test
    /// setup is wrong, then the test should not pass.
    pub fn with_fragments(
        fragments: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<Vec<u8>>)>,
    ) -> Self {
        let mut map = HashMap::new();
        let now = OffsetDateTime::now_utc();
        for (path, data) in fragments {
            let path = path.into();
            let Ok(validated) = validate_path(&path) else {
                // The panic here is DELIBERATE. MemoryStore is intended to be
                // used in tests; panics are expected. There is no error result.
                panic!("MemoryStore::with_fragments: invalid path {}", path.display());
            };
            map.insert(validated, (now, data.into()));
        }
        Self {
            name: "mock".to_string(),
            storage: RwLock::new(map),
            write_faults: Mutex::new(HashSet::new()),
        }
    }

    /// Change the name of the memory store.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Make every subsequent `write` to `path` fail with a backend error.
    ///
    /// Panics on an invalid path, same as [`with_fragments`](Self::with_fragments).
    pub fn fail_writes_at(&self, path: impl AsRef<Path>) {
        let Ok(validated) = validate_path(path.as_ref()) else {
            panic!("MemoryStore::fail_writes_at: invalid path {}", path.as_ref().display());
        };
        self.write_faults.lock().unwrap().insert(validated);
    }

    /// Remove all injected write faults.
    pub fn clear_write_faults(&self) {
        self.write_faults.lock().unwrap().clear();
    }

    fn info(&self, path: &Path, size: u64, inserted: OffsetDateTime) -> FragmentInfo {
        FragmentInfo::new(path, size, inserted)
    }
}
impl Default for MemoryStore {
    fn default() -> Self {
        let fragments: [(&str, &str); 0] = [];
        Self::with_fragments(fragments)
    }
}

#[async_trait]
impl FragmentStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FragmentInfoStream<'a> {
        let validated_prefix = match prefix.map(validate_path).transpose() {
            Ok(pfx) => pfx,
            Err(e) => return Box::pin(futures::stream::once(async { Err(e) })),
        };

        Box::pin(stream! {
            // Snapshot matching entries under the read lock, then drop it
            // before yielding to avoid holding the lock across yield points.
            let entries: Vec<(PathBuf, (OffsetDateTime, u64))> = {
                let guard = self.storage.read().await;
                guard
                    .iter()
                    .filter(|(path, _)| match &validated_prefix {
                        Some(pfx) => path.starts_with(pfx),
                        None => true,
                    })
                    .map(|(path, (inserted, data))| (path.clone(), (*inserted, data.len() as u64)))
                    .collect()
            };
            for (path, (inserted, size)) in entries {
                yield Ok(self.info(&path, size, inserted));
            }
        })
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let path = validate_path(path)?;
        Ok(self.storage.read().await.contains_key(&path))
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let path = validate_path(path)?;
        let (_inserted, data) =
            self.storage.read().await.get(&path).cloned().ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path)))?;
        Ok(data)
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let path = validate_path(path)?;
        if self.write_faults.lock().unwrap().contains(&path) {
            exn::bail!(ErrorKind::Backend(format!("injected write fault: {}", path.display())));
        }
        self.storage.write().await.insert(path, (OffsetDateTime::now_utc(), data.to_vec()));
        Ok(())
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        let path = validate_path(path)?;
        self.storage.write().await.remove(&path).map(|_| ()).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path)))
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let from = validate_path(from)?;
        let to = validate_path(to)?;
        let mut guard = self.storage.write().await;
        let data = guard.remove(&from).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(from)))?;
        guard.insert(to, data);
        Ok(())
    }

    async fn stat(&self, path: &Path) -> Result<FragmentInfo> {
        let path = validate_path(path)?;
        let guard = self.storage.read().await;
        let (inserted, data) = guard.get(&path).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path.clone())))?;
        Ok(self.info(&path, data.len() as u64, *inserted))
    }
}
