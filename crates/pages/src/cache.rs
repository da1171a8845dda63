//! The page cache: regeneration and reading.
//!
//! [`PageCache`] owns the wiring the fragment pipeline needs — the record
//! repository, a fragment store handle, the formatter, and the per-category
//! locks — and exposes the two operations the outside world calls:
//! [`regenerate`](PageCache::regenerate) after a submission is accepted, and
//! [`read`](PageCache::read) from the page-serving layer.

use crate::error::{ErrorKind, Result};
use crate::layout::Layout;
use crate::lock::CategoryLocks;
use crate::plan::{PagePlan, PageSlice};
use exn::{OptionExt, ResultExt};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use vitrine_records::{Record, Repository};
use vitrine_render::{Formatter, PageContext};
use vitrine_store::StoreHandle;
use vitrine_store::error::ErrorKind as StoreErrorKind;

/// Readers give up on a wedged category after this long unless configured
/// otherwise.
const DEFAULT_READER_TIMEOUT: Duration = Duration::from_secs(5);

/// Fixed per-category pagination configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySettings {
    /// Category identifier; also the fragment directory name and the
    /// `category` value in the record store.
    pub slug: String,
    /// Records per listing page.
    pub page_size: u64,
    /// Records in the front-page preview.
    pub home_count: u64,
}

impl CategorySettings {
    pub fn new(slug: impl Into<String>, page_size: u64, home_count: u64) -> Self {
        Self { slug: slug.into(), page_size, home_count }
    }
}

/// Outcome of a [`regenerate`](PageCache::regenerate) call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regenerated {
    /// A new fragment set was published.
    Completed {
        /// Records in the snapshot the set was cut from.
        records: u64,
        /// Overflow pages beyond the implicit first page.
        overflow_pages: u64,
    },
    /// Another regeneration held the lock; this pass was skipped. The
    /// in-flight pass re-reads the whole record store, so its output is just
    /// as valid — no retry is scheduled.
    Skipped,
}

/// Regenerates and serves the static fragment sets for all configured
/// categories.
pub struct PageCache {
    repo: Repository,
    store: StoreHandle,
    formatter: Formatter,
    locks: CategoryLocks,
    categories: HashMap<String, CategorySettings>,
    reader_timeout: Duration,
}

impl PageCache {
    /// Create a page cache over the given repository and fragment store.
    ///
    /// Compiles the fragment templates eagerly; returns
    /// [`ErrorKind::Render`] if any fail.
    pub fn new(
        repo: Repository,
        store: StoreHandle,
        categories: impl IntoIterator<Item = CategorySettings>,
    ) -> Result<Self> {
        let formatter = Formatter::new().or_raise(|| ErrorKind::Render)?;
        let categories = categories.into_iter().map(|c| (c.slug.clone(), c)).collect();
        Ok(Self {
            repo,
            store,
            formatter,
            locks: CategoryLocks::new(),
            categories,
            reader_timeout: DEFAULT_READER_TIMEOUT,
        })
    }

    /// Change how long readers wait behind an in-flight regeneration.
    pub fn with_reader_timeout(mut self, timeout: Duration) -> Self {
        self.reader_timeout = timeout;
        self
    }

    fn settings(&self, category: &str) -> Result<&CategorySettings> {
        self.categories.get(category).ok_or_raise(|| ErrorKind::UnknownCategory(category.to_string()))
    }

    /// Rebuild and publish the category's whole fragment set.
    ///
    /// Holds the category's lock exclusively for the duration. If the lock
    /// is taken, returns [`Regenerated::Skipped`] without blocking — the
    /// holder's pass produces an equally valid result.
    ///
    /// Publishing is transactional with respect to failure: every fragment
    /// (and the page-count file) is staged first, and only after every
    /// staged write succeeded are they renamed over the published paths.
    /// A record-store or staging failure therefore leaves the previously
    /// published set fully intact. The count file is renamed last, so a
    /// count never describes fragments that are not yet in place.
    #[instrument(skip(self))]
    pub async fn regenerate(&self, category: &str) -> Result<Regenerated> {
        let settings = self.settings(category)?;
        let layout = Layout::new(&settings.slug);
        let Some(_guard) = self.locks.try_exclusive(&settings.slug) else {
            debug!(category, "regeneration already in flight; skipping");
            return Ok(Regenerated::Skipped);
        };

        // One ordered query for the whole category: every fragment of this
        // pass is cut from the same snapshot.
        let records = self.repo.list(category).await.or_raise(|| ErrorKind::Records)?;
        let total = records.len() as u64;
        let plan = PagePlan::compute(total, settings.page_size, settings.home_count);

        // Render everything before writing anything.
        let mut fragments: Vec<(PathBuf, Vec<u8>)> = Vec::with_capacity(plan.overflow.len() + 3);
        let home = self
            .formatter
            .home(window(&records, PageSlice { number: 0, offset: 0, limit: plan.home_len }))
            .or_raise(|| ErrorKind::Render)?;
        fragments.push((layout.home(), home.into_bytes()));
        let first = self
            .formatter
            .page(window(&records, plan.first_page), PageContext { page: 1, next: plan.next_after(1) })
            .or_raise(|| ErrorKind::Render)?;
        fragments.push((layout.page(1), first.into_bytes()));
        for slice in &plan.overflow {
            let html = self
                .formatter
                .page(window(&records, *slice), PageContext { page: slice.number, next: plan.next_after(slice.number) })
                .or_raise(|| ErrorKind::Render)?;
            fragments.push((layout.page(slice.number), html.into_bytes()));
        }
        // Last in the list means renamed last: the published count always
        // refers to fragments that are already in place.
        fragments.push((layout.count(), plan.overflow_pages().to_string().into_bytes()));

        // Stage, then publish.
        for (published, bytes) in &fragments {
            if let Err(e) = self.store.write(&layout.stage(published), bytes).await {
                for (p, _) in &fragments {
                    // Deleting never-staged paths is expected to fail here.
                    _ = self.store.delete(&layout.stage(p)).await;
                }
                return Err(e).or_raise(|| ErrorKind::Store);
            }
        }
        for (published, _) in &fragments {
            self.store.rename(&layout.stage(published), published).await.or_raise(|| ErrorKind::Store)?;
        }

        self.sweep_stale(&layout, plan.last_page()).await;

        debug!(category, records = total, overflow_pages = plan.overflow_pages(), "published fragment set");
        Ok(Regenerated::Completed { records: total, overflow_pages: plan.overflow_pages() })
    }

    /// Read one published listing page.
    ///
    /// Takes the category's lock in shared mode (bounded by the reader
    /// timeout), consults the page-count file for the valid range, and
    /// returns the fragment verbatim. A category that has never been
    /// regenerated, a corrupted count file, or an out-of-range page all
    /// read as `Ok(None)` — "no content yet", not an error.
    #[instrument(skip(self))]
    pub async fn read(&self, category: &str, page: u64) -> Result<Option<Vec<u8>>> {
        let settings = self.settings(category)?;
        let layout = Layout::new(&settings.slug);
        let _guard = self.locks.shared(&settings.slug, self.reader_timeout).await?;
        if page == 0 {
            return Ok(None);
        }
        let Some(overflow_pages) = self.read_count(&layout).await? else {
            return Ok(None);
        };
        if page > overflow_pages + 1 {
            return Ok(None);
        }
        self.read_fragment(&layout.page(page)).await
    }

    /// Read the category's front-page preview fragment.
    ///
    /// Same fail-soft contract as [`read`](Self::read).
    #[instrument(skip(self))]
    pub async fn read_home(&self, category: &str) -> Result<Option<Vec<u8>>> {
        let settings = self.settings(category)?;
        let layout = Layout::new(&settings.slug);
        let _guard = self.locks.shared(&settings.slug, self.reader_timeout).await?;
        self.read_fragment(&layout.home()).await
    }

    /// Number of overflow pages beyond the first, `0` when the category has
    /// never been regenerated.
    pub async fn page_count(&self, category: &str) -> Result<u64> {
        let settings = self.settings(category)?;
        let layout = Layout::new(&settings.slug);
        let _guard = self.locks.shared(&settings.slug, self.reader_timeout).await?;
        Ok(self.read_count(&layout).await?.unwrap_or(0))
    }

    async fn read_count(&self, layout: &Layout) -> Result<Option<u64>> {
        let bytes = match self.store.read(&layout.count()).await {
            Ok(bytes) => bytes,
            Err(e) if matches!(&*e, StoreErrorKind::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e).or_raise(|| ErrorKind::Store),
        };
        match str::from_utf8(&bytes).ok().map(str::trim).and_then(|s| s.parse::<u64>().ok()) {
            Some(count) => Ok(Some(count)),
            None => {
                warn!(path = %layout.count().display(), "unparseable page-count file; serving category as empty");
                Ok(None)
            },
        }
    }

    async fn read_fragment(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        match self.store.read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if matches!(&*e, StoreErrorKind::NotFound(_)) => Ok(None),
            Err(e) => Err(e).or_raise(|| ErrorKind::Store),
        }
    }

    /// Delete overflow fragments beyond the freshly published last page.
    ///
    /// Runs under the exclusive lock, after publish. Failures are logged,
    /// not fatal: a stale page beyond the published count is unreachable
    /// through [`read`](Self::read) anyway.
    async fn sweep_stale(&self, layout: &Layout, last_page: u64) {
        let listed = match self.store.list(Some(&layout.prefix())).await {
            Ok(listed) => listed,
            Err(e) => {
                warn!(error = ?e, "could not list fragments for stale sweep");
                return;
            },
        };
        for info in listed {
            if let Some(number) = layout.overflow_number(&info.path)
                && number > last_page
            {
                if let Err(e) = self.store.delete(&info.path).await {
                    warn!(error = ?e, path = %info.path.display(), "could not delete stale overflow fragment");
                }
            }
        }
    }
}

/// The sub-slice of the newest-first snapshot covered by one page window,
/// clamped to the records that actually exist.
fn window(records: &[Record], slice: PageSlice) -> &[Record] {
    let start = (slice.offset as usize).min(records.len());
    let end = (slice.offset.saturating_add(slice.limit) as usize).min(records.len());
    &records[start..end]
}
