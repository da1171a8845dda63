//! Local filesystem fragment store.
//!
//! Fragments are stored as plain files under a configured root directory and
//! accessed via `tokio::fs` for async I/O. Writes never land directly on the
//! published path: data goes to a sibling temporary file first and is renamed
//! into place, so a crash mid-write cannot leave a torn fragment where a page
//! server would read it.

use crate::backend::FragmentInfoStream;
use crate::error::ErrorKind;
use crate::{FragmentInfo, FragmentStore, error::Result, path::validate as validate_path};
use async_stream::stream;
use async_trait::async_trait;
use exn::ResultExt;
use std::fs::{Metadata, create_dir_all as sync_create_dir};
use std::path::{Path, PathBuf};
use tokio::fs::{self, DirEntry};

enum WalkEntry {
    Fragment(FragmentInfo),
    Descend(PathBuf),
    Skip,
}

/// Local filesystem fragment store.
///
/// Stores fragments in a directory on the local filesystem. All paths are
/// relative to the configured root directory.
///
/// # Examples
///
/// ```no_run
/// use vitrine_store::backend::LocalStore;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = LocalStore::new("local", "/var/www/fragments")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LocalStore {
    name: String,
    /// Root directory for published fragments
    root: PathBuf,
}
impl LocalStore {
    /// Create a new local filesystem store.
    ///
    /// # Arguments
    /// * `root` - Absolute path to the fragment root directory
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not absolute, or exists but is not a
    /// directory.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }

        if root.exists() {
            if !root.is_dir() {
                exn::bail!(ErrorKind::InvalidPath(root));
            }
        } else {
            // Use non-async here; it'll only happen once on store
            // initialization and it's not worth making the constructor async.
            sync_create_dir(&root).map_err(|e| Self::map_io_error(e, &root))?;
        }

        Ok(Self { name: name.into(), root })
    }

    /// Get the absolute path for a relative fragment path.
    ///
    /// Validates the path and joins it with the root directory.
    fn absolute_path(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let validated = validate_path(path.as_ref())?;
        Ok(self.root.join(validated))
    }

    /// Convert an absolute path back to a relative fragment path.
    fn relative_path(&self, absolute: impl AsRef<Path>) -> Result<PathBuf> {
        let absolute = absolute.as_ref();
        if !absolute.is_absolute() {
            exn::bail!(ErrorKind::Backend(format!(
                "attempting to get relative path of non-absolute path `{:?}`",
                absolute
            )))
        }
        let relative = absolute.strip_prefix(&self.root).or_raise(|| {
            ErrorKind::Backend(format!("path `{:?}` is not within root `{:?}`", absolute, self.root))
        })?;
        // Validate path will also canonicalize it.
        Ok(validate_path(relative)?)
    }

    /// Re-use the same metadata mapping for both list and stat.
    fn info(path: &Path, metadata: Metadata) -> Result<FragmentInfo> {
        let modified = metadata.modified().map_err(ErrorKind::Io)?.into();
        Ok(FragmentInfo::new(PathBuf::from(path), metadata.len(), modified))
    }

    fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
            _ => ErrorKind::Io(e),
        }
    }

    /// Sibling scratch path used by [`write`](FragmentStore::write). Staying
    /// in the same directory keeps the final rename on one filesystem.
    fn scratch_path(abs_path: &Path) -> PathBuf {
        let mut name = std::ffi::OsString::from(".");
        name.push(abs_path.file_name().unwrap_or_else(|| std::ffi::OsStr::new("fragment")));
        name.push(".tmp");
        abs_path.with_file_name(name)
    }

    /// Helper so the stream loop below can `?` errors instead of converting,
    /// yielding, and continuing by hand at every call site.
    async fn process_entry(&self, entry: DirEntry, prefix: Option<&Path>) -> Result<WalkEntry> {
        let path = entry.path();
        let metadata = entry.metadata().await.map_err(|e| Self::map_io_error(e, &path))?;
        let relative = self.relative_path(&path)?;
        if let Some(pfx) = prefix
            && !relative.starts_with(pfx)
        {
            return Ok(WalkEntry::Skip);
        }
        if metadata.is_dir() {
            return Ok(WalkEntry::Descend(path));
        }
        if metadata.is_file() {
            return Ok(WalkEntry::Fragment(Self::info(&relative, metadata)?));
        }
        // Note: silently drop what is most likely a broken symlink.
        Ok(WalkEntry::Skip)
    }
}

#[async_trait]
impl FragmentStore for LocalStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FragmentInfoStream<'a> {
        let validated_prefix = match prefix.map(validate_path).transpose() {
            Ok(pfx) => pfx,
            Err(e) => return Box::pin(futures::stream::once(async { Result::Err(e) })),
        };

        let start_dir = validated_prefix
            .as_ref()
            // Walk from the parent directory of the prefix path. Ensures
            // prefix is a directory and avoids erroring on prefixes where
            // the leaf component doesn't exist yet or is a file.
            // So the prefix "links/page" would become a starting directory
            // of "links" and match:
            // - [MATCH] "links/page/x.html"
            // - [MATCH] "links/page" (could be file)
            // - [NOT MATCH] "links/pages/x.html" (Path::starts_with is component-based)
            .map(|prefix| self.root.join(prefix).parent().unwrap_or_else(|| &self.root).to_path_buf())
            .unwrap_or_else(|| self.root.clone());
        let mut stack = vec![start_dir];

        Box::pin(stream! {
            'dirs: while let Some(current) = stack.pop() {
                let mut entries = match fs::read_dir(&current).await {
                    Ok(entries) => entries,
                    // Asking for the contents of a directory that doesn't
                    // exist results in an empty list, not an error.
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                    Err(err) => {
                        yield Err(exn::Exn::from(Self::map_io_error(err, &current)));
                        continue 'dirs;
                    }
                };

                'entries: loop {
                    let entry = match entries.next_entry().await {
                        Ok(Some(entry)) => entry,
                        Ok(None) => break 'entries,
                        Err(e) => { yield Err(exn::Exn::from(Self::map_io_error(e, &current))); continue 'entries; },
                    };
                    match self.process_entry(entry, validated_prefix.as_deref()).await {
                        Ok(WalkEntry::Fragment(f)) => yield Ok(f),
                        Ok(WalkEntry::Descend(d)) => stack.push(d),
                        Ok(WalkEntry::Skip) => {},
                        Err(e) => yield Err(e),
                    };
                }
            }
        })
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::try_exists(&abs_path).await.map_err(ErrorKind::Io)?)
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::read(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        if let Some(parent) = abs_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| Self::map_io_error(e, path))?;
        }
        // Write-then-rename: a reader of `path` sees either the previous
        // fragment or the new one, never a prefix of the new one.
        let scratch = Self::scratch_path(&abs_path);
        if let Err(e) = fs::write(&scratch, data).await {
            _ = fs::remove_file(&scratch).await;
            return Err(Self::map_io_error(e, path).into());
        }
        match fs::rename(&scratch, &abs_path).await {
            Ok(()) => Ok(()),
            Err(e) => {
                // Don't leave scratch files around on a failed publish.
                _ = fs::remove_file(&scratch).await;
                Err(Self::map_io_error(e, path).into())
            },
        }
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::remove_file(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let from_path = self.absolute_path(from)?;
        let to_path = self.absolute_path(to)?;
        if let Some(parent) = to_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| Self::map_io_error(e, to))?;
        }
        Ok(fs::rename(&from_path, &to_path).await.map_err(|e| Self::map_io_error(e, to))?)
    }

    async fn stat(&self, path: &Path) -> Result<FragmentInfo> {
        let abs_path = self.absolute_path(path)?;
        let metadata = fs::metadata(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?;
        Self::info(path, metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_new_requires_absolute_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(LocalStore::new("name", temp_dir.path()).is_ok());
        assert!(LocalStore::new("name", "relative/path").is_err());
        assert!(LocalStore::new("name", "./relative").is_err());
    }

    #[test]
    fn test_absolute_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new("name", temp_dir.path()).unwrap();
        let expected = temp_dir.path().join("links/page-2.html");
        assert_eq!(store.absolute_path(Path::new("links/page-2.html")).unwrap(), expected);
        // Path traversal is prevented
        assert!(store.absolute_path(Path::new("../etc/passwd")).is_err());
    }

    #[test]
    fn test_relative_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new("name", temp_dir.path()).unwrap();
        let abs = temp_dir.path().join("links/page-2.html");
        assert_eq!(store.relative_path(&abs).unwrap(), Path::new("links/page-2.html"));
        // Path outside root fails
        let outside = PathBuf::from("/other/fragment.html");
        assert!(store.relative_path(&outside).is_err());
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new("name", temp_dir.path()).unwrap();
        let data = b"<ul><li>hello</li></ul>";
        store.write(Path::new("home.html"), data).await.unwrap();
        let read_data = store.read(Path::new("home.html")).await.unwrap();
        assert_eq!(read_data, data);
    }

    #[tokio::test]
    async fn test_write_leaves_no_scratch_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new("name", temp_dir.path()).unwrap();
        store.write(Path::new("links/home.html"), b"data").await.unwrap();
        let listed = store.list(None).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].path, Path::new("links/home.html"));
    }

    #[tokio::test]
    async fn test_write_creates_directories() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new("name", temp_dir.path()).unwrap();
        store.write(Path::new("a/b/c/page-1.html"), b"data").await.unwrap();
        assert!(store.exists(Path::new("a/b/c/page-1.html")).await.unwrap());
    }

    #[tokio::test]
    async fn test_overwrite_replaces_whole_fragment() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new("name", temp_dir.path()).unwrap();
        store.write(Path::new("page-1.html"), b"a much longer first revision").await.unwrap();
        store.write(Path::new("page-1.html"), b"short").await.unwrap();
        assert_eq!(store.read(Path::new("page-1.html")).await.unwrap(), b"short");
    }

    #[tokio::test]
    async fn test_exists() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new("name", temp_dir.path()).unwrap();
        assert!(!store.exists(Path::new("nonexistent.html")).await.unwrap());
        store.write(Path::new("exists.html"), b"data").await.unwrap();
        assert!(store.exists(Path::new("exists.html")).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new("name", temp_dir.path()).unwrap();
        store.write(Path::new("page-9.html"), b"data").await.unwrap();
        assert!(store.exists(Path::new("page-9.html")).await.unwrap());
        store.delete(Path::new("page-9.html")).await.unwrap();
        assert!(!store.exists(Path::new("page-9.html")).await.unwrap());
        // Deleting a nonexistent fragment returns an error
        let err = store.delete(Path::new("nonexistent.html")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_rename() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new("name", temp_dir.path()).unwrap();
        store.write(Path::new("links/.stage/home.html"), b"data").await.unwrap();
        store.rename(Path::new("links/.stage/home.html"), Path::new("links/home.html")).await.unwrap();
        assert!(!store.exists(Path::new("links/.stage/home.html")).await.unwrap());
        assert_eq!(store.read(Path::new("links/home.html")).await.unwrap(), b"data");
    }

    #[tokio::test]
    async fn test_rename_overwrites_destination() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new("name", temp_dir.path()).unwrap();
        store.write(Path::new("old/page-1.html"), b"new revision").await.unwrap();
        store.write(Path::new("page-1.html"), b"previous revision").await.unwrap();
        store.rename(Path::new("old/page-1.html"), Path::new("page-1.html")).await.unwrap();
        assert_eq!(store.read(Path::new("page-1.html")).await.unwrap(), b"new revision");
    }

    #[tokio::test]
    async fn test_stat() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new("name", temp_dir.path()).unwrap();
        let data = b"<p>fragment</p>";
        store.write(Path::new("home.html"), data).await.unwrap();
        let info = store.stat(Path::new("home.html")).await.unwrap();
        assert_eq!(info.path, PathBuf::from("home.html"));
        assert_eq!(info.size, data.len() as u64);
    }

    #[tokio::test]
    async fn test_list_empty_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new("name", temp_dir.path()).unwrap();
        let fragments = store.list(None).await.unwrap();
        assert_eq!(fragments.len(), 0);
    }

    #[tokio::test]
    async fn test_list_with_prefix() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new("name", temp_dir.path()).unwrap();
        store.write(Path::new("links/page-1.html"), b"data").await.unwrap();
        store.write(Path::new("links/page-2.html"), b"data").await.unwrap();
        store.write(Path::new("exhibits/page-1.html"), b"data").await.unwrap();
        let all = store.list(None).await.unwrap();
        assert_eq!(all.len(), 3);
        let links = store.list(Some(Path::new("links/"))).await.unwrap();
        assert_eq!(links.len(), 2);
        let paths: Vec<_> = links.iter().map(|f| &f.path).collect();
        assert!(paths.contains(&&PathBuf::from("links/page-1.html")));
        assert!(paths.contains(&&PathBuf::from("links/page-2.html")));
    }

    #[tokio::test]
    async fn test_list_nonexistent_prefix() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new("name", temp_dir.path()).unwrap();
        let fragments = store.list(Some(Path::new("nonexistent/"))).await.unwrap();
        assert_eq!(fragments.len(), 0);
    }

    #[tokio::test]
    async fn test_path_security() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new("name", temp_dir.path()).unwrap();
        // Attempts to escape the root should fail
        assert!(store.read(Path::new("../etc/passwd")).await.is_err());
        assert!(store.read(Path::new("etc/../../passwd")).await.is_err());
        assert!(store.write(Path::new("../etc/passwd"), b"data").await.is_err());
        assert!(store.delete(Path::new("../../fragment")).await.is_err());
    }
}
