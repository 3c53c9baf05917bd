//! Storage backends for medication records.
//!
//! Two interchangeable adapters implement [`MedicationStore`]: a SQLite
//! document store and a sled key-item store. The server picks one at startup;
//! everything above the trait is backend-agnostic.

mod schema;
mod sled;
mod sqlite;

pub use schema::SCHEMA;
pub use sled::SledStore;
pub use sqlite::SqliteStore;

use thiserror::Error;

use crate::models::{Medication, MedicationChanges, MedicationSummary, Review};

/// Storage errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Sled error: {0}")]
    Sled(#[from] ::sled::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Lock poisoned: {0}")]
    Poisoned(String),
}

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        StoreError::Poisoned(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Result of a conditional update: whether the filter matched a record and
/// whether stored data actually changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched: bool,
    pub modified: bool,
}

impl UpdateOutcome {
    pub fn unmatched() -> Self {
        Self {
            matched: false,
            modified: false,
        }
    }
}

/// Persistence interface shared by both storage backends.
///
/// Mutations that require ownership take the id and the owner together so
/// each adapter can apply the combined filter as one atomic operation.
pub trait MedicationStore: Send + Sync {
    /// Persist a new medication record.
    fn insert(&self, medication: &Medication) -> StoreResult<()>;

    /// Shelf listing: summaries of all records with the given first letter.
    fn find_by_letter(&self, letter: &str) -> StoreResult<Vec<MedicationSummary>>;

    /// Full record by id, `None` when absent.
    fn find_by_id(&self, id: &str) -> StoreResult<Option<Medication>>;

    /// Replace caller-editable fields of the record matching id AND owner.
    fn update(
        &self,
        id: &str,
        owner_id: &str,
        changes: &MedicationChanges,
    ) -> StoreResult<UpdateOutcome>;

    /// Delete the record matching id AND owner, reviews included.
    fn delete(&self, id: &str, owner_id: &str) -> StoreResult<bool>;

    /// Exact-name existence check.
    fn exists_by_name(&self, name: &str) -> StoreResult<bool>;

    /// Case-insensitive substring search over names, full records.
    fn search_by_name(&self, query: &str) -> StoreResult<Vec<Medication>>;

    /// Append a review; `false` when the medication is absent.
    fn push_review(&self, medication_id: &str, review: &Review) -> StoreResult<bool>;

    /// All reviews of a medication, `None` when the medication is absent.
    fn find_reviews(&self, medication_id: &str) -> StoreResult<Option<Vec<Review>>>;

    /// One review by id, `None` when either the medication or review is absent.
    fn find_review(&self, medication_id: &str, review_id: &str) -> StoreResult<Option<Review>>;

    /// Replace text and rating of a review, refreshing its date.
    fn update_review(
        &self,
        medication_id: &str,
        review_id: &str,
        text: &str,
        rating: u8,
    ) -> StoreResult<UpdateOutcome>;

    /// Remove the review matching medication AND review AND author in one
    /// atomic step; `false` when nothing matched.
    fn delete_review(
        &self,
        medication_id: &str,
        review_id: &str,
        author_id: &str,
    ) -> StoreResult<bool>;
}
