//! Medshelf Core Library
//!
//! Medication records with embedded reviews, stored behind an
//! interchangeable backend interface.
//!
//! # Architecture
//!
//! ```text
//! HTTP handler
//!      │
//!      ▼
//! MedicationService        validation, identity snapshots, authorization
//!      │
//!      ▼
//! dyn MedicationStore
//!      ├── SqliteStore     document rows (JSON doc + indexed columns)
//!      └── SledStore       key-item pairs (primary keys + letter index keys)
//! ```
//!
//! # Core Principle
//!
//! **Identity comes from the verified token, never from request data.**
//! Ownership filters travel with the mutation into the store so the check and
//! the write are one atomic step.
//!
//! # Modules
//!
//! - [`models`]: Domain types (Medication, Review, Identity)
//! - [`store`]: Storage backends (SQLite document store, sled key-item store)
//! - [`service`]: Domain operations and error taxonomy

pub mod models;
pub mod service;
pub mod store;

// Re-export commonly used types
pub use models::{
    is_owner, Availability, Identity, ImageRef, Medication, MedicationChanges,
    MedicationSummary, Owner, Review, Reviewer,
};
pub use service::{MedicationService, ServiceError, ServiceResult};
pub use store::{MedicationStore, SledStore, SqliteStore, StoreError, UpdateOutcome};
