//! Data access traits for the PawMap collections.
//!
//! Each trait covers one collection of the backing document store. Jobs
//! receive the stores they need explicitly; nothing here holds process-wide
//! state.
//!
//! Fetch methods return [`Fetched`]: the outer `Result` reports a failure of
//! the store itself, while each inner `Result` carries either a decoded record
//! or a [`MalformedRecord`] describing a document that failed validation.
//! Callers log and skip malformed records instead of aborting a batch.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{Author, Place, PlaceId, Report, ReportId, Review, ReviewId, TopPicksList, UserId};

mod notify;
#[cfg(feature = "store-sqlite")]
mod schema;
#[cfg(feature = "store-sqlite")]
mod sqlite;

pub use notify::{LogNotifier, ModerationAlert, ModeratorNotifier, NotifyError};
#[cfg(feature = "store-sqlite")]
pub use schema::{SCHEMA_VERSION, SchemaError, initialise_schema};
#[cfg(feature = "store-sqlite")]
pub use sqlite::SqliteStore;

/// Records read from a collection, with per-document decoding failures.
pub type Fetched<T> = Result<Vec<Result<T, MalformedRecord>>, StoreError>;

/// Failure raised by a store collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached.
    #[error("store unavailable during {operation}: {reason}")]
    Unavailable {
        /// Operation being attempted.
        operation: &'static str,
        /// Human readable cause.
        reason: String,
    },
    /// A document required by the operation does not exist.
    #[error("{collection} document {id} not found")]
    NotFound {
        /// Collection that was searched.
        collection: &'static str,
        /// Identifier that was requested.
        id: String,
    },
    /// A document could not be encoded or decoded as JSON.
    #[error("failed to {operation}")]
    Serialization {
        /// Description of the failed operation.
        operation: &'static str,
        /// Source error from `serde_json`.
        #[source]
        source: serde_json::Error,
    },
    /// A `SQLite` statement failed.
    #[cfg(feature = "store-sqlite")]
    #[error("failed to {operation}")]
    Sqlite {
        /// Description of the failed operation.
        operation: &'static str,
        /// Source error from `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
}

impl StoreError {
    /// Report whether the failure is transient and worth retrying later.
    ///
    /// Retrying is the scheduler's responsibility; jobs never retry.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Unavailable { .. } => true,
            Self::NotFound { .. } | Self::Serialization { .. } => false,
            #[cfg(feature = "store-sqlite")]
            Self::Sqlite { source, .. } => matches!(
                source.sqlite_error_code(),
                Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked)
            ),
        }
    }
}

/// A stored document that could not be decoded into a typed record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed {collection} document {id}: {reason}")]
pub struct MalformedRecord {
    /// Collection holding the document.
    pub collection: &'static str,
    /// Raw document identifier.
    pub id: String,
    /// Description of the validation failure.
    pub reason: String,
}

impl MalformedRecord {
    /// Describe a malformed document.
    #[must_use]
    pub fn new(collection: &'static str, id: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            collection,
            id: id.into(),
            reason: reason.to_string(),
        }
    }
}

/// Access to the place collection.
pub trait PlaceStore {
    /// Return every place.
    fn fetch_places(&self) -> Fetched<Place>;

    /// Return the places added by `author`.
    fn places_created_by(&self, author: &UserId) -> Fetched<Place>;

    /// Overwrite the stored rating aggregate of a place.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] when the place does not exist.
    fn update_rating(
        &self,
        place: &PlaceId,
        rating: f64,
        review_count: u32,
    ) -> Result<(), StoreError>;

    /// Mark a place as needing manual review.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] when the place does not exist.
    fn flag_for_review(&self, place: &PlaceId, flagged_at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Replace the author fields of a place.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] when the place does not exist.
    fn reattribute_place(&self, place: &PlaceId, author: &Author) -> Result<(), StoreError>;
}

/// Access to the review collection.
pub trait ReviewStore {
    /// Return every review.
    fn fetch_reviews(&self) -> Fetched<Review>;

    /// Return the reviews left for `place`.
    fn reviews_for_place(&self, place: &PlaceId) -> Fetched<Review>;

    /// Return the reviews written by `author`.
    fn reviews_by_author(&self, author: &UserId) -> Fetched<Review>;

    /// Replace the author fields of a review.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] when the review does not exist.
    fn reattribute_review(&self, review: &ReviewId, author: &Author) -> Result<(), StoreError>;
}

/// Access to the report collection.
pub trait ReportStore {
    /// Persist a new report and bump the place's report count.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] when the reported place does not
    /// exist.
    fn create_report(&self, report: &Report) -> Result<(), StoreError>;

    /// Return the unresolved reports filed against `place`.
    fn unresolved_reports_for_place(&self, place: &PlaceId) -> Fetched<Report>;

    /// Return resolved reports created strictly before `cutoff`.
    fn resolved_reports_before(&self, cutoff: DateTime<Utc>) -> Fetched<Report>;

    /// Delete the given reports as a single batch, returning how many were
    /// removed.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the batch could not be applied; no report
    /// is deleted in that case.
    fn delete_reports(&self, reports: &[ReportId]) -> Result<usize, StoreError>;
}

/// Access to the ranked output documents.
pub trait TopPicksStore {
    /// Replace the document stored under `key`.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the write fails; the previous document is
    /// left untouched.
    fn replace_top_picks(&self, key: &str, list: &TopPicksList) -> Result<(), StoreError>;

    /// Read the document stored under `key`, if any.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the document cannot be read or decoded.
    fn top_picks(&self, key: &str) -> Result<Option<TopPicksList>, StoreError>;
}

/// Counts of per-user documents removed when an account is deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountPurge {
    /// Profile documents removed.
    pub profiles: usize,
    /// Statistics documents removed.
    pub stats: usize,
    /// Preference documents removed.
    pub preferences: usize,
    /// Favourite entries removed.
    pub favorites: usize,
}

impl AccountPurge {
    /// Total number of documents removed.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.profiles + self.stats + self.preferences + self.favorites
    }
}

/// Access to per-user account documents.
pub trait AccountStore {
    /// Remove the profile, stats, preferences, and favourites of `user`.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the deletion could not be applied.
    fn purge_account(&self, user: &UserId) -> Result<AccountPurge, StoreError>;

    /// Return the accounts registered as moderators.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the moderator list cannot be read.
    fn moderators(&self) -> Result<Vec<UserId>, StoreError>;
}
