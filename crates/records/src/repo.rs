//! Repository for submitted records.
//!
//! Thin query layer over the `records` table. The regenerator only ever
//! reads (count + paged listing); the single writer is the submission
//! intake, and deletion is an administrative path.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::model::{NewRecord, Record};
use crate::row::RecordRow;
use exn::ResultExt;
use sqlx::SqlitePool;

/// Repository for managing records in the store.
///
/// Cheap to clone; every instance shares the same connection pool.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a record, returning the id the store assigned.
    ///
    /// Records are write-once: there is deliberately no update counterpart.
    pub async fn insert(&self, record: &NewRecord) -> Result<i64> {
        let result = sqlx::query(include_str!("../queries/insert_record.sql"))
            .bind(&record.category)
            .bind(&record.title)
            .bind(&record.author)
            .bind(&record.url)
            .bind(&record.image_url)
            .bind(&record.description)
            .bind(record.submitted_at.unix_timestamp())
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.last_insert_rowid())
    }

    /// List an entire category, newest submissions first.
    ///
    /// The regenerator cuts every fragment of one pass from this single
    /// result set, so the published page set always reflects one snapshot of
    /// the store even if a submission lands mid-regeneration.
    pub async fn list(&self, category: impl AsRef<str>) -> Result<Vec<Record>> {
        let rows: Vec<RecordRow> = sqlx::query_as(include_str!("../queries/list_records.sql"))
            .bind(category.as_ref())
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(|r| r.try_into()).collect()
    }

    /// List one page of a category, newest submissions first.
    ///
    /// Ordering is `submitted_at DESC, id DESC` — the id tie-break keeps
    /// pagination total when two records share a timestamp, so consecutive
    /// pages never overlap or skip.
    pub async fn list_page(&self, category: impl AsRef<str>, limit: u64, offset: u64) -> Result<Vec<Record>> {
        let limit = i64::try_from(limit).or_raise(|| ErrorKind::InvalidData("limit"))?;
        let offset = i64::try_from(offset).or_raise(|| ErrorKind::InvalidData("offset"))?;
        let rows: Vec<RecordRow> = sqlx::query_as(include_str!("../queries/list_page.sql"))
            .bind(category.as_ref())
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(|r| r.try_into()).collect()
    }

    /// Count all records in a category.
    pub async fn count(&self, category: impl AsRef<str>) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(include_str!("../queries/count_records.sql"))
            .bind(category.as_ref())
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        u64::try_from(count).or_raise(|| ErrorKind::InvalidData("record count"))
    }

    /// List all distinct categories with at least one record.
    pub async fn categories(&self) -> Result<Vec<String>> {
        let categories: Vec<String> = sqlx::query_scalar(include_str!("../queries/list_categories.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(categories)
    }

    /// Delete a record by id (administrative action).
    ///
    /// Returns `true` if a record was deleted, `false` if the id was not
    /// found. The caller is responsible for regenerating the affected
    /// category afterwards.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(include_str!("../queries/delete_record.sql"))
            .bind(id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }
}
