//! Record models.

use time::UtcDateTime;

/// One submitted listing item, as stored.
///
/// Records are immutable once inserted: the submission timestamp is the sole
/// sort key for every listing, so rewriting a record in place would silently
/// reorder published pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Assigned by the store on insert.
    pub id: i64,
    /// Category the record was submitted to (e.g. `"network-links"`).
    pub category: String,
    pub title: String,
    pub author: String,
    pub url: String,
    pub image_url: Option<String>,
    pub description: Option<String>,
    /// Submission time; the sole sort key (ties broken by `id`).
    pub submitted_at: UtcDateTime,
}

/// A record as it arrives from a submission handler, before the store has
/// assigned it an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub category: String,
    pub title: String,
    pub author: String,
    pub url: String,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub submitted_at: UtcDateTime,
}

impl NewRecord {
    /// The stored form of this record, with the id the store assigned.
    pub fn into_record(self, id: i64) -> Record {
        Record {
            id,
            category: self.category,
            title: self.title,
            author: self.author,
            url: self.url,
            image_url: self.image_url,
            description: self.description,
            submitted_at: self.submitted_at,
        }
    }
}
