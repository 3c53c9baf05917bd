//! Medication record models.

use serde::{Deserialize, Serialize};

use super::Review;

/// How a medication is dispensed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Availability {
    Prescription,
    #[serde(rename = "OTC")]
    Otc,
}

impl Default for Availability {
    fn default() -> Self {
        Availability::Prescription
    }
}

/// Reference to an uploaded image held in external blob storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageRef {
    /// Stored filename under the upload root
    pub filename: String,
    /// Name the file had on the uploader's machine
    pub originalname: String,
}

/// Snapshot of the account that created a medication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Owner {
    pub user_id: String,
    pub fullname: String,
    pub email: String,
}

/// Caller-editable fields of a medication record.
///
/// Used both when creating a record and when replacing its fields on update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicationChanges {
    pub name: String,
    pub generic_name: String,
    pub medication_class: String,
    pub availability: Availability,
    pub images: Vec<ImageRef>,
}

/// A medication record with its embedded reviews.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Medication {
    /// UUID - generated at creation
    pub id: String,
    /// Brand name
    pub name: String,
    /// Generic (chemical) name
    pub generic_name: String,
    /// Therapeutic class (e.g., "NSAID", "antibiotic")
    pub medication_class: String,
    /// Prescription or over-the-counter
    pub availability: Availability,
    /// Uppercase first character of `name`, kept for shelf grouping
    pub first_letter: String,
    /// Uploaded image references
    pub images: Vec<ImageRef>,
    /// Account that created the record - immutable after creation
    pub added_by: Owner,
    /// Reviews, embedded so they live and die with the record
    pub reviews: Vec<Review>,
    /// Creation timestamp
    pub created_at: String,
    /// Last field-edit timestamp (review changes do not touch it)
    pub updated_at: String,
}

/// Projection used by the shelf listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicationSummary {
    pub id: String,
    pub name: String,
}

impl From<&Medication> for MedicationSummary {
    fn from(medication: &Medication) -> Self {
        Self {
            id: medication.id.clone(),
            name: medication.name.clone(),
        }
    }
}

/// Uppercase first character of a name.
///
/// The only place the shelf letter is derived; callers never supply it.
fn derive_first_letter(name: &str) -> String {
    name.chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_default()
}

impl Medication {
    /// Create a new record from caller-supplied fields and the creator snapshot.
    pub fn new(changes: MedicationChanges, added_by: Owner) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        let first_letter = derive_first_letter(&changes.name);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: changes.name,
            generic_name: changes.generic_name,
            medication_class: changes.medication_class,
            availability: changes.availability,
            first_letter,
            images: changes.images,
            added_by,
            reviews: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Replace the caller-editable fields, re-deriving the shelf letter.
    ///
    /// Returns whether anything actually changed; `updated_at` is only
    /// refreshed when it did.
    pub fn apply_changes(&mut self, changes: &MedicationChanges) -> bool {
        let next_letter = derive_first_letter(&changes.name);
        let changed = self.name != changes.name
            || self.first_letter != next_letter
            || self.generic_name != changes.generic_name
            || self.medication_class != changes.medication_class
            || self.availability != changes.availability
            || self.images != changes.images;

        if changed {
            self.name = changes.name.clone();
            self.first_letter = next_letter;
            self.generic_name = changes.generic_name.clone();
            self.medication_class = changes.medication_class.clone();
            self.availability = changes.availability;
            self.images = changes.images.clone();
            self.updated_at = chrono::Utc::now().to_rfc3339();
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn make_owner() -> Owner {
        Owner {
            user_id: "user-1".into(),
            fullname: "Pat Smith".into(),
            email: "pat@example.com".into(),
        }
    }

    fn make_changes(name: &str) -> MedicationChanges {
        MedicationChanges {
            name: name.into(),
            generic_name: "acetylsalicylic acid".into(),
            medication_class: "NSAID".into(),
            availability: Availability::Otc,
            images: Vec::new(),
        }
    }

    #[test]
    fn test_new_medication() {
        let medication = Medication::new(make_changes("aspirin"), make_owner());
        assert_eq!(medication.name, "aspirin");
        assert_eq!(medication.first_letter, "A");
        assert_eq!(medication.added_by.user_id, "user-1");
        assert!(medication.reviews.is_empty());
        assert_eq!(medication.id.len(), 36); // UUID format
        assert_eq!(medication.created_at, medication.updated_at);
    }

    #[test]
    fn test_apply_changes_rename_moves_letter() {
        let mut medication = Medication::new(make_changes("Aspirin"), make_owner());
        let changed = medication.apply_changes(&make_changes("Tylenol"));
        assert!(changed);
        assert_eq!(medication.name, "Tylenol");
        assert_eq!(medication.first_letter, "T");
    }

    #[test]
    fn test_apply_changes_identical_is_noop() {
        let mut medication = Medication::new(make_changes("Aspirin"), make_owner());
        let before = medication.updated_at.clone();
        let changed = medication.apply_changes(&make_changes("Aspirin"));
        assert!(!changed);
        assert_eq!(medication.updated_at, before);
    }

    #[test]
    fn test_availability_wire_strings() {
        assert_eq!(
            serde_json::to_string(&Availability::Prescription).unwrap(),
            "\"Prescription\""
        );
        assert_eq!(serde_json::to_string(&Availability::Otc).unwrap(), "\"OTC\"");
        let parsed: Availability = serde_json::from_str("\"OTC\"").unwrap();
        assert_eq!(parsed, Availability::Otc);
    }

    proptest! {
        #[test]
        fn prop_first_letter_is_uppercased_first_char(name in "[a-zA-Z][a-zA-Z0-9 ]{0,20}") {
            let medication = Medication::new(make_changes(&name), make_owner());
            let expected: String = name.chars().next().unwrap().to_uppercase().collect();
            prop_assert_eq!(medication.first_letter, expected);
        }
    }
}
