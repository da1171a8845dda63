//! Submission intake pipeline.
//!
//! Validate, throttle, insert, regenerate — in that order. Validation comes
//! first so a blocked client still gets its field errors back; the throttle
//! only starts a client's window once a submission is actually accepted.

use crate::error::{ErrorKind, Result};
use crate::throttle::Throttle;
use crate::validate::{FieldError, blank_as_none, obfuscate_email, validate};
use exn::ResultExt;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use time::UtcDateTime;
use tracing::{debug, instrument};
use vitrine_pages::{PageCache, Regenerated};
use vitrine_records::{NewRecord, Repository};

/// A submission as it arrives from the form, untrimmed and untrusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub title: String,
    pub author: String,
    /// Contact address; obfuscated into the stored author credit, never
    /// stored raw.
    pub email: Option<String>,
    pub url: String,
    pub image_url: Option<String>,
    pub description: Option<String>,
}

impl Submission {
    /// The record this submission stores, stamped with the current time.
    ///
    /// Fields are trimmed, blank optionals dropped, and a contact address
    /// folded into the author credit in obfuscated form — the raw address
    /// never reaches the store.
    fn into_record(self, category: &str) -> NewRecord {
        let credit = self.author.trim();
        let author = match blank_as_none(self.email.as_deref()) {
            Some(email) => format!("{credit} ({})", obfuscate_email(email)),
            None => credit.to_string(),
        };
        NewRecord {
            category: category.to_string(),
            title: self.title.trim().to_string(),
            author,
            url: self.url.trim().to_string(),
            image_url: blank_as_none(self.image_url.as_deref()).map(str::to_string),
            description: blank_as_none(self.description.as_deref()).map(str::to_string),
            submitted_at: UtcDateTime::now(),
        }
    }
}

/// Outcome of a submission attempt.
///
/// Only infrastructure failures are `Err`; being rejected or throttled is a
/// normal outcome the form renders back to the visitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Stored, with the regeneration result for the category.
    ///
    /// `regenerated` is [`Regenerated::Skipped`] when another pass held the
    /// category lock; that pass re-reads the store and will include this
    /// record, so nothing further is scheduled.
    Accepted { id: i64, regenerated: Regenerated },
    /// The client is still inside its submission window.
    Throttled { retry_after: Duration },
    /// One or more fields failed validation; nothing was stored.
    Rejected(Vec<FieldError>),
}

/// The submission side of a listing category.
pub struct Intake {
    repo: Repository,
    cache: Arc<PageCache>,
    throttle: Throttle,
}

impl Intake {
    pub fn new(repo: Repository, cache: Arc<PageCache>) -> Self {
        Self { repo, cache, throttle: Throttle::default() }
    }

    /// Replace the default five-minute throttle.
    pub fn with_throttle(mut self, throttle: Throttle) -> Self {
        self.throttle = throttle;
        self
    }

    /// Run one submission through the pipeline.
    ///
    /// On acceptance the record is inserted and the category's fragment set
    /// regenerated before returning, so by the time the visitor sees the
    /// "thanks" page the listing already carries their record.
    #[instrument(skip(self, submission))]
    pub async fn submit(&self, category: &str, submission: Submission, client: IpAddr) -> Result<Outcome> {
        let errors = validate(&submission);
        if !errors.is_empty() {
            debug!(%client, errors = errors.len(), "submission rejected");
            return Ok(Outcome::Rejected(errors));
        }
        if let Some(retry_after) = self.throttle.retry_after(client) {
            return Ok(Outcome::Throttled { retry_after });
        }

        let record = submission.into_record(category);
        let id = self.repo.insert(&record).await.or_raise(|| ErrorKind::Records)?;
        self.throttle.note(client);
        let regenerated = self.cache.regenerate(category).await.or_raise(|| ErrorKind::Pages)?;
        debug!(%client, id, ?regenerated, "submission accepted");
        Ok(Outcome::Accepted { id, regenerated })
    }
}
