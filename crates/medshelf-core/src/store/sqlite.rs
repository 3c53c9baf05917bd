//! SQLite document-store adapter.
//!
//! Each medication is one row holding the full aggregate as a JSON document.
//! Review edits are read-modify-write inside a transaction, so the combined
//! id/owner filters stay atomic.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use super::{MedicationStore, StoreResult, UpdateOutcome, SCHEMA};
use crate::models::{Medication, MedicationChanges, MedicationSummary, Review};

/// Document-style store backed by an embedded SQLite database.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open the store at path, creating the schema if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

/// Escape LIKE wildcards in a user-supplied search fragment.
fn escape_like(fragment: &str) -> String {
    fragment
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

impl MedicationStore for SqliteStore {
    fn insert(&self, medication: &Medication) -> StoreResult<()> {
        let conn = self.conn.lock()?;
        let doc = serde_json::to_string(medication)?;
        conn.execute(
            r#"
            INSERT INTO medications (id, name, first_letter, owner_id, doc, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                medication.id,
                medication.name,
                medication.first_letter,
                medication.added_by.user_id,
                doc,
                medication.created_at,
                medication.updated_at,
            ],
        )?;
        Ok(())
    }

    fn find_by_letter(&self, letter: &str) -> StoreResult<Vec<MedicationSummary>> {
        let conn = self.conn.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, name FROM medications WHERE first_letter = ? ORDER BY name",
        )?;

        let rows = stmt.query_map([letter], |row| {
            Ok(MedicationSummary {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn find_by_id(&self, id: &str) -> StoreResult<Option<Medication>> {
        let conn = self.conn.lock()?;
        let doc: Option<String> = conn
            .query_row("SELECT doc FROM medications WHERE id = ?", [id], |row| {
                row.get(0)
            })
            .optional()?;

        match doc {
            Some(doc) => Ok(Some(serde_json::from_str(&doc)?)),
            None => Ok(None),
        }
    }

    fn update(
        &self,
        id: &str,
        owner_id: &str,
        changes: &MedicationChanges,
    ) -> StoreResult<UpdateOutcome> {
        let mut conn = self.conn.lock()?;
        let tx = conn.transaction()?;

        let doc: Option<String> = tx
            .query_row(
                "SELECT doc FROM medications WHERE id = ?1 AND owner_id = ?2",
                params![id, owner_id],
                |row| row.get(0),
            )
            .optional()?;
        let doc = match doc {
            Some(doc) => doc,
            None => return Ok(UpdateOutcome::unmatched()),
        };

        let mut medication: Medication = serde_json::from_str(&doc)?;
        if !medication.apply_changes(changes) {
            return Ok(UpdateOutcome {
                matched: true,
                modified: false,
            });
        }

        let doc = serde_json::to_string(&medication)?;
        tx.execute(
            r#"
            UPDATE medications
            SET name = ?2, first_letter = ?3, doc = ?4, updated_at = ?5
            WHERE id = ?1 AND owner_id = ?6
            "#,
            params![
                id,
                medication.name,
                medication.first_letter,
                doc,
                medication.updated_at,
                owner_id,
            ],
        )?;
        tx.commit()?;

        Ok(UpdateOutcome {
            matched: true,
            modified: true,
        })
    }

    fn delete(&self, id: &str, owner_id: &str) -> StoreResult<bool> {
        let conn = self.conn.lock()?;
        let rows_affected = conn.execute(
            "DELETE FROM medications WHERE id = ?1 AND owner_id = ?2",
            params![id, owner_id],
        )?;
        Ok(rows_affected > 0)
    }

    fn exists_by_name(&self, name: &str) -> StoreResult<bool> {
        let conn = self.conn.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM medications WHERE name = ?",
            [name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn search_by_name(&self, query: &str) -> StoreResult<Vec<Medication>> {
        let pattern = format!("%{}%", escape_like(query));
        let conn = self.conn.lock()?;
        let mut stmt = conn.prepare(
            r#"SELECT doc FROM medications WHERE name LIKE ? ESCAPE '\' ORDER BY name"#,
        )?;

        let rows = stmt.query_map([pattern], |row| row.get::<_, String>(0))?;
        let mut out = Vec::new();
        for doc in rows {
            out.push(serde_json::from_str(&doc?)?);
        }
        Ok(out)
    }

    fn push_review(&self, medication_id: &str, review: &Review) -> StoreResult<bool> {
        let mut conn = self.conn.lock()?;
        let tx = conn.transaction()?;

        let doc: Option<String> = tx
            .query_row(
                "SELECT doc FROM medications WHERE id = ?",
                [medication_id],
                |row| row.get(0),
            )
            .optional()?;
        let doc = match doc {
            Some(doc) => doc,
            None => return Ok(false),
        };

        let mut medication: Medication = serde_json::from_str(&doc)?;
        medication.reviews.push(review.clone());

        let doc = serde_json::to_string(&medication)?;
        tx.execute(
            "UPDATE medications SET doc = ?2 WHERE id = ?1",
            params![medication_id, doc],
        )?;
        tx.commit()?;
        Ok(true)
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
        let mut conn = self.conn.lock()?;
        let tx = conn.transaction()?;

        let doc: Option<String> = tx
            .query_row(
                "SELECT doc FROM medications WHERE id = ?",
                [medication_id],
                |row| row.get(0),
            )
            .optional()?;
        let doc = match doc {
            Some(doc) => doc,
            None => return Ok(UpdateOutcome::unmatched()),
        };

        let mut medication: Medication = serde_json::from_str(&doc)?;
        let review = match medication.reviews.iter_mut().find(|r| r.id == review_id) {
            Some(review) => review,
            None => return Ok(UpdateOutcome::unmatched()),
        };
        review.apply_edit(text, rating);

        let doc = serde_json::to_string(&medication)?;
        tx.execute(
            "UPDATE medications SET doc = ?2 WHERE id = ?1",
            params![medication_id, doc],
        )?;
        tx.commit()?;

        Ok(UpdateOutcome {
            matched: true,
            modified: true,
        })
    }

    fn delete_review(
        &self,
        medication_id: &str,
        review_id: &str,
        author_id: &str,
    ) -> StoreResult<bool> {
        let mut conn = self.conn.lock()?;
        let tx = conn.transaction()?;

        let doc: Option<String> = tx
            .query_row(
                "SELECT doc FROM medications WHERE id = ?",
                [medication_id],
                |row| row.get(0),
            )
            .optional()?;
        let doc = match doc {
            Some(doc) => doc,
            None => return Ok(false),
        };

        let mut medication: Medication = serde_json::from_str(&doc)?;
        let before = medication.reviews.len();
        medication
            .reviews
            .retain(|r| !(r.id == review_id && r.by.user_id == author_id));
        if medication.reviews.len() == before {
            return Ok(false);
        }

        let doc = serde_json::to_string(&medication)?;
        tx.execute(
            "UPDATE medications SET doc = ?2 WHERE id = ?1",
            params![medication_id, doc],
        )?;
        tx.commit()?;
        Ok(true)
    }
}
