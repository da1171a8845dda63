//! Lock-guarded regeneration and serving of static listing fragments.
//!
//! Every category of submitted records (network links, code examples,
//! curated exhibits) has a pre-rendered set of HTML fragments: a front-page
//! preview, a first listing page, overflow pages, and a page-count file.
//! This crate recomputes that set in full whenever a submission is accepted,
//! and serves fragments back to the page-serving layer.
//!
//! # Consistency
//! Each category owns a named shared/exclusive lock. A regeneration holds it
//! exclusively; readers hold it shared. A regeneration that finds the lock
//! taken skips instead of queueing — the in-flight pass re-reads the whole
//! record store, so its output is just as valid. All fragments are staged
//! first and renamed into place only after every staged write succeeded, so
//! an I/O failure mid-pass leaves the previous fragment set fully servable.

mod cache;
pub mod error;
mod layout;
mod lock;
mod plan;

pub use crate::cache::{CategorySettings, PageCache, Regenerated};
pub use crate::lock::CategoryLocks;
pub use crate::plan::{PagePlan, PageSlice};
