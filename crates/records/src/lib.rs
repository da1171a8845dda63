//! SQLite store for submitted listing records.
//!
//! This crate owns the relational side of the listing pipeline: every record
//! a visitor submits (a link, an example, an exhibit) lands here, and the
//! page cache reads the whole category back out — newest first — each time
//! it regenerates the static fragments.
//!
//! # Architecture
//! One table, `records`, keyed by an autoincrement id. Records are written
//! once and never updated in place; removal is an administrative action.
//! The `(category, submitted_at DESC, id DESC)` index backs every paginated
//! query the regenerator issues.

mod db;
pub mod error;
mod model;
mod repo;
mod row;

pub use crate::db::Database;
pub use crate::model::{NewRecord, Record};
pub use crate::repo::Repository;
