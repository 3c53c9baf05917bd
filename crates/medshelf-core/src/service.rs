//! Domain operations over a storage backend.
//!
//! Validation, identity snapshots, and authorization sequencing live here so
//! the two storage adapters stay interchangeable. Ownership checks on
//! medications ride inside the store's combined id/owner filters; the review
//! edit path resolves first so a missing review and a foreign review report
//! different errors.

use std::sync::Arc;

use thiserror::Error;

use crate::models::{
    is_owner, Identity, Medication, MedicationChanges, MedicationSummary, Review,
};
use crate::store::{MedicationStore, StoreError};

/// Domain errors surfaced to the HTTP layer.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Medication domain service over an interchangeable storage backend.
pub struct MedicationService {
    store: Arc<dyn MedicationStore>,
}

impl MedicationService {
    pub fn new(store: Arc<dyn MedicationStore>) -> Self {
        Self { store }
    }

    /// Create a medication owned by the requesting identity.
    pub fn create(
        &self,
        identity: &Identity,
        changes: MedicationChanges,
    ) -> ServiceResult<Medication> {
        let changes = trimmed_name(changes)?;
        let medication = Medication::new(changes, identity.as_owner());
        self.store.insert(&medication)?;
        Ok(medication)
    }

    /// Shelf listing for one letter, case-insensitive on input.
    pub fn list_by_letter(&self, letter: &str) -> ServiceResult<Vec<MedicationSummary>> {
        let letter = letter.trim().to_uppercase();
        Ok(self.store.find_by_letter(&letter)?)
    }

    /// Full record by id; absent records are not an error.
    pub fn get(&self, id: &str) -> ServiceResult<Option<Medication>> {
        Ok(self.store.find_by_id(id)?)
    }

    /// Replace caller-editable fields; only the owner may update.
    ///
    /// Returns whether stored data actually changed.
    pub fn update(
        &self,
        identity: &Identity,
        id: &str,
        changes: MedicationChanges,
    ) -> ServiceResult<bool> {
        let changes = trimmed_name(changes)?;
        let outcome = self.store.update(id, &identity.user_id, &changes)?;
        if !outcome.matched {
            return Err(ServiceError::Unauthorized(
                "User is not authorized to modify this medication".into(),
            ));
        }
        Ok(outcome.modified)
    }

    /// Delete a medication and its reviews; only the owner may delete.
    pub fn delete(&self, identity: &Identity, id: &str) -> ServiceResult<bool> {
        let deleted = self.store.delete(id, &identity.user_id)?;
        if !deleted {
            return Err(ServiceError::Unauthorized(
                "User is not authorized to delete this medication".into(),
            ));
        }
        Ok(deleted)
    }

    /// Exact-name existence check used by the duplicate-name validator.
    pub fn exists(&self, name: &str) -> ServiceResult<bool> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::Validation("Medication name is required".into()));
        }
        Ok(self.store.exists_by_name(name)?)
    }

    /// Case-insensitive substring search over medication names.
    pub fn search(&self, query: &str) -> ServiceResult<Vec<Medication>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ServiceError::Validation("Search query is required".into()));
        }
        Ok(self.store.search_by_name(query)?)
    }

    /// Add a review; any authenticated identity may review any medication.
    pub fn add_review(
        &self,
        identity: &Identity,
        medication_id: &str,
        text: &str,
        rating: u8,
    ) -> ServiceResult<Review> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ServiceError::Validation("Review text is required".into()));
        }
        let review = Review::new(text.to_string(), rating, identity.as_reviewer());
        if !self.store.push_review(medication_id, &review)? {
            return Err(ServiceError::NotFound("Medication not found".into()));
        }
        Ok(review)
    }

    /// All reviews of a medication.
    pub fn list_reviews(&self, medication_id: &str) -> ServiceResult<Vec<Review>> {
        match self.store.find_reviews(medication_id)? {
            Some(reviews) => Ok(reviews),
            None => Err(ServiceError::NotFound("Medication not found".into())),
        }
    }

    /// One review by id; absent reviews are not an error.
    pub fn get_review(
        &self,
        medication_id: &str,
        review_id: &str,
    ) -> ServiceResult<Option<Review>> {
        Ok(self.store.find_review(medication_id, review_id)?)
    }

    /// Edit review text and rating; only the author may edit.
    pub fn update_review(
        &self,
        identity: &Identity,
        medication_id: &str,
        review_id: &str,
        text: &str,
        rating: u8,
    ) -> ServiceResult<bool> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ServiceError::Validation("Review text is required".into()));
        }

        let review = self
            .store
            .find_review(medication_id, review_id)?
            .ok_or_else(|| ServiceError::NotFound("Review not found".into()))?;
        if !is_owner(&review.by.user_id, &identity.user_id) {
            return Err(ServiceError::Unauthorized(
                "User is not authorized to modify this review".into(),
            ));
        }

        let outcome = self
            .store
            .update_review(medication_id, review_id, text, rating)?;
        if !outcome.matched {
            // Removed between the ownership check and the write
            return Err(ServiceError::NotFound("Review not found".into()));
        }
        Ok(outcome.modified)
    }

    /// Remove a review the requester authored.
    ///
    /// Removing an absent review is not an error; the result reports whether
    /// anything was removed.
    pub fn delete_review(
        &self,
        identity: &Identity,
        medication_id: &str,
        review_id: &str,
    ) -> ServiceResult<bool> {
        Ok(self
            .store
            .delete_review(medication_id, review_id, &identity.user_id)?)
    }
}

/// Reject blank names, returning the changes with the name trimmed.
fn trimmed_name(mut changes: MedicationChanges) -> ServiceResult<MedicationChanges> {
    let name = changes.name.trim();
    if name.is_empty() {
        return Err(ServiceError::Validation("Medication name is required".into()));
    }
    changes.name = name.to_string();
    Ok(changes)
}
