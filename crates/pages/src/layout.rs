//! On-store fragment layout for one category.
//!
//! Published layout per category slug:
//!
//! ```text
//! <slug>/home.html      front-page preview
//! <slug>/page-1.html    first listing page
//! <slug>/page-<n>.html  overflow pages, n >= 2
//! <slug>/pages.count    overflow page count (ASCII decimal)
//! <slug>/.stage/…       staging area during a regeneration
//! ```

use std::path::{Path, PathBuf};

const HOME: &str = "home.html";
const COUNT: &str = "pages.count";
const STAGE_DIR: &str = ".stage";

/// Path arithmetic for one category's fragments.
#[derive(Debug, Clone)]
pub(crate) struct Layout {
    slug: String,
}

impl Layout {
    pub(crate) fn new(slug: impl Into<String>) -> Self {
        Self { slug: slug.into() }
    }

    pub(crate) fn prefix(&self) -> PathBuf {
        PathBuf::from(&self.slug)
    }

    pub(crate) fn home(&self) -> PathBuf {
        [self.slug.as_str(), HOME].iter().collect()
    }

    pub(crate) fn page(&self, number: u64) -> PathBuf {
        [self.slug.as_str(), &format!("page-{number}.html")].iter().collect()
    }

    pub(crate) fn count(&self) -> PathBuf {
        [self.slug.as_str(), COUNT].iter().collect()
    }

    /// The staging twin of a published path (`links/home.html` →
    /// `links/.stage/home.html`).
    pub(crate) fn stage(&self, published: &Path) -> PathBuf {
        let name = published.file_name().unwrap_or_default();
        [Path::new(&self.slug), Path::new(STAGE_DIR), Path::new(name)].iter().collect()
    }

    /// Parse the overflow page number out of a published fragment path.
    ///
    /// Only matches direct children of the category directory named
    /// `page-<n>.html` with `n >= 2` — staged files and the first page
    /// don't count. Used to sweep stale overflow pages after a shrink.
    pub(crate) fn overflow_number(&self, path: &Path) -> Option<u64> {
        let mut components = path.components();
        if components.next()?.as_os_str() != Path::new(&self.slug).as_os_str() {
            return None;
        }
        let name = components.next()?.as_os_str().to_str()?;
        if components.next().is_some() {
            return None;
        }
        let number: u64 = name.strip_prefix("page-")?.strip_suffix(".html")?.parse().ok()?;
        (number >= 2).then_some(number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_published_paths() {
        let layout = Layout::new("links");
        assert_eq!(layout.home(), Path::new("links/home.html"));
        assert_eq!(layout.page(1), Path::new("links/page-1.html"));
        assert_eq!(layout.page(7), Path::new("links/page-7.html"));
        assert_eq!(layout.count(), Path::new("links/pages.count"));
    }

    #[test]
    fn test_stage_twin() {
        let layout = Layout::new("links");
        assert_eq!(layout.stage(&layout.home()), Path::new("links/.stage/home.html"));
        assert_eq!(layout.stage(&layout.page(3)), Path::new("links/.stage/page-3.html"));
    }

    #[test]
    fn test_overflow_number() {
        let layout = Layout::new("links");
        assert_eq!(layout.overflow_number(Path::new("links/page-2.html")), Some(2));
        assert_eq!(layout.overflow_number(Path::new("links/page-10.html")), Some(10));
        // The first page is not an overflow page.
        assert_eq!(layout.overflow_number(Path::new("links/page-1.html")), None);
        // Other categories, staged files, and non-page files don't match.
        assert_eq!(layout.overflow_number(Path::new("exhibits/page-2.html")), None);
        assert_eq!(layout.overflow_number(Path::new("links/.stage/page-2.html")), None);
        assert_eq!(layout.overflow_number(Path::new("links/home.html")), None);
        assert_eq!(layout.overflow_number(Path::new("links/page-x.html")), None);
    }
}
