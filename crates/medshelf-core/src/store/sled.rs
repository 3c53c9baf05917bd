//! Sled key-item adapter.
//!
//! Key layout:
//!
//! ```text
//! med/{id}            -> medication JSON
//! ix/letter/{L}/{id}  -> {id, name} summary JSON
//! ```
//!
//! The letter index duplicates data so the shelf listing reads index values
//! only; every mutation maintains it inside the same transaction that touches
//! the primary key, then flushes so acknowledged writes are on disk. Name
//! lookups (exists, search) scan the primary records.

use std::path::Path;

use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::Tree;

use super::{MedicationStore, StoreError, StoreResult, UpdateOutcome};
use crate::models::{Medication, MedicationChanges, MedicationSummary, Review};

/// Key-item store backed by an embedded sled tree.
pub struct SledStore {
    tree: Tree,
}

const MED_PREFIX: &[u8] = b"med/";

fn med_key(id: &str) -> Vec<u8> {
    format!("med/{}", id).into_bytes()
}

fn letter_key(letter: &str, id: &str) -> Vec<u8> {
    format!("ix/letter/{}/{}", letter, id).into_bytes()
}

fn letter_prefix(letter: &str) -> Vec<u8> {
    format!("ix/letter/{}/", letter).into_bytes()
}

fn map_tx_err(e: TransactionError<StoreError>) -> StoreError {
    match e {
        TransactionError::Abort(e) => e,
        TransactionError::Storage(e) => StoreError::Sled(e),
    }
}

fn abort_json(e: serde_json::Error) -> ConflictableTransactionError<StoreError> {
    ConflictableTransactionError::Abort(StoreError::Json(e))
}

impl SledStore {
    /// Open the store at path, creating it if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = sled::open(path)?;
        let tree = db.open_tree("medications")?;
        Ok(Self { tree })
    }
}

impl MedicationStore for SledStore {
    fn insert(&self, medication: &Medication) -> StoreResult<()> {
        let doc = serde_json::to_vec(medication)?;
        let summary = serde_json::to_vec(&MedicationSummary::from(medication))?;
        let key = med_key(&medication.id);
        let ix_key = letter_key(&medication.first_letter, &medication.id);

        self.tree
            .transaction(|tx| {
                tx.insert(key.as_slice(), doc.as_slice())?;
                tx.insert(ix_key.as_slice(), summary.as_slice())?;
                Ok(())
            })
            .map_err(map_tx_err)?;
        self.tree.flush()?;
        Ok(())
    }

    fn find_by_letter(&self, letter: &str) -> StoreResult<Vec<MedicationSummary>> {
        let mut out = Vec::new();
        for entry in self.tree.scan_prefix(letter_prefix(letter)) {
            let (_, value) = entry?;
            out.push(serde_json::from_slice(&value)?);
        }
        Ok(out)
    }

    fn find_by_id(&self, id: &str) -> StoreResult<Option<Medication>> {
        match self.tree.get(med_key(id))? {
            Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            None => Ok(None),
        }
    }

    fn update(
        &self,
        id: &str,
        owner_id: &str,
        changes: &MedicationChanges,
    ) -> StoreResult<UpdateOutcome> {
        let key = med_key(id);

        let outcome = self
            .tree
            .transaction(|tx| {
                let raw = match tx.get(key.as_slice())? {
                    Some(raw) => raw,
                    None => return Ok(UpdateOutcome::unmatched()),
                };
                let mut medication: Medication =
                    serde_json::from_slice(&raw).map_err(abort_json)?;
                if medication.added_by.user_id != owner_id {
                    return Ok(UpdateOutcome::unmatched());
                }

                let old_letter = medication.first_letter.clone();
                if !medication.apply_changes(changes) {
                    return Ok(UpdateOutcome {
                        matched: true,
                        modified: false,
                    });
                }

                let doc = serde_json::to_vec(&medication).map_err(abort_json)?;
                let summary =
                    serde_json::to_vec(&MedicationSummary::from(&medication)).map_err(abort_json)?;

                if old_letter != medication.first_letter {
                    tx.remove(letter_key(&old_letter, id))?;
                }
                tx.insert(letter_key(&medication.first_letter, id), summary)?;
                tx.insert(key.as_slice(), doc)?;

                Ok(UpdateOutcome {
                    matched: true,
                    modified: true,
                })
            })
            .map_err(map_tx_err)?;
        if outcome.modified {
            self.tree.flush()?;
        }
        Ok(outcome)
    }

    fn delete(&self, id: &str, owner_id: &str) -> StoreResult<bool> {
        let key = med_key(id);

        let deleted = self
            .tree
            .transaction(|tx| {
                let raw = match tx.get(key.as_slice())? {
                    Some(raw) => raw,
                    None => return Ok(false),
                };
                let medication: Medication = serde_json::from_slice(&raw).map_err(abort_json)?;
                if medication.added_by.user_id != owner_id {
                    return Ok(false);
                }

                tx.remove(key.as_slice())?;
                tx.remove(letter_key(&medication.first_letter, id))?;
                Ok(true)
            })
            .map_err(map_tx_err)?;
        if deleted {
            self.tree.flush()?;
        }
        Ok(deleted)
    }

    fn exists_by_name(&self, name: &str) -> StoreResult<bool> {
        for entry in self.tree.scan_prefix(MED_PREFIX) {
            let (_, value) = entry?;
            let medication: Medication = serde_json::from_slice(&value)?;
            if medication.name == name {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn search_by_name(&self, query: &str) -> StoreResult<Vec<Medication>> {
        let needle = query.to_lowercase();
        let mut out: Vec<Medication> = Vec::new();
        for entry in self.tree.scan_prefix(MED_PREFIX) {
            let (_, value) = entry?;
            let medication: Medication = serde_json::from_slice(&value)?;
            if medication.name.to_lowercase().contains(&needle) {
                out.push(medication);
            }
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    fn push_review(&self, medication_id: &str, review: &Review) -> StoreResult<bool> {
        let key = med_key(medication_id);

        let pushed = self
            .tree
            .transaction(|tx| {
                let raw = match tx.get(key.as_slice())? {
                    Some(raw) => raw,
                    None => return Ok(false),
                };
                let mut medication: Medication =
                    serde_json::from_slice(&raw).map_err(abort_json)?;
                medication.reviews.push(review.clone());

                let doc = serde_json::to_vec(&medication).map_err(abort_json)?;
                tx.insert(key.as_slice(), doc)?;
                Ok(true)
            })
            .map_err(map_tx_err)?;
        if pushed {
            self.tree.flush()?;
        }
        Ok(pushed)
    }

    fn find_reviews(&self, medication_id: &str) -> StoreResult<Option<Vec<Review>>> {
        let medication = self.find_by_id(medication_id)?;
        Ok(medication.map(|m| m.reviews))
    }

    fn find_review(&self, medication_id: &str, review_id: &str) -> StoreResult<Option<Review>> {
        let medication = self.find_by_id(medication_id)?;
        Ok(medication.and_then(|m| m.reviews.into_iter().find(|r| r.id == review_id)))
    }

    fn update_review(
        &self,
        medication_id: &str,
        review_id: &str,
        text: &str,
        rating: u8,
    ) -> StoreResult<UpdateOutcome> {
        let key = med_key(medication_id);

        let outcome = self
            .tree
            .transaction(|tx| {
                let raw = match tx.get(key.as_slice())? {
                    Some(raw) => raw,
                    None => return Ok(UpdateOutcome::unmatched()),
                };
                let mut medication: Medication =
                    serde_json::from_slice(&raw).map_err(abort_json)?;
                let review = match medication.reviews.iter_mut().find(|r| r.id == review_id) {
                    Some(review) => review,
                    None => return Ok(UpdateOutcome::unmatched()),
                };
                review.apply_edit(text, rating);

                let doc = serde_json::to_vec(&medication).map_err(abort_json)?;
                tx.insert(key.as_slice(), doc)?;

                Ok(UpdateOutcome {
                    matched: true,
                    modified: true,
                })
            })
            .map_err(map_tx_err)?;
        if outcome.modified {
            self.tree.flush()?;
        }
        Ok(outcome)
    }

    fn delete_review(
        &self,
        medication_id: &str,
        review_id: &str,
        author_id: &str,
    ) -> StoreResult<bool> {
        let key = med_key(medication_id);

        let removed = self
            .tree
            .transaction(|tx| {
                let raw = match tx.get(key.as_slice())? {
                    Some(raw) => raw,
                    None => return Ok(false),
                };
                let mut medication: Medication =
                    serde_json::from_slice(&raw).map_err(abort_json)?;

                let before = medication.reviews.len();
                medication
                    .reviews
                    .retain(|r| !(r.id == review_id && r.by.user_id == author_id));
                if medication.reviews.len() == before {
                    return Ok(false);
                }

                let doc = serde_json::to_vec(&medication).map_err(abort_json)?;
                tx.insert(key.as_slice(), doc)?;
                Ok(true)
            })
            .map_err(map_tx_err)?;
        if removed {
            self.tree.flush()?;
        }
        Ok(removed)
    }
}
