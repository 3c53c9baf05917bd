//! Review models.

use serde::{Deserialize, Serialize};

/// Snapshot of the account that authored a review.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reviewer {
    pub user_id: String,
    pub fullname: String,
}

/// A review embedded in a medication record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    /// UUID - generated at creation
    pub id: String,
    /// Review text
    pub review: String,
    /// Star rating
    pub rating: u8,
    /// Author snapshot - immutable after creation
    pub by: Reviewer,
    /// Authored or last-edited timestamp
    pub date: String,
}

impl Review {
    /// Create a new review with a fresh id and timestamp.
    pub fn new(review: String, rating: u8, by: Reviewer) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            review,
            rating,
            by,
            date: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Replace text and rating, refreshing the date stamp.
    pub fn apply_edit(&mut self, review: &str, rating: u8) {
        self.review = review.to_string();
        self.rating = rating;
        self.date = chrono::Utc::now().to_rfc3339();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_reviewer() -> Reviewer {
        Reviewer {
            user_id: "user-2".into(),
            fullname: "Sam Lee".into(),
        }
    }

    #[test]
    fn test_new_review() {
        let review = Review::new("Works well".into(), 4, make_reviewer());
        assert_eq!(review.review, "Works well");
        assert_eq!(review.rating, 4);
        assert_eq!(review.by.user_id, "user-2");
        assert_eq!(review.id.len(), 36); // UUID format
        assert!(!review.date.is_empty());
    }

    #[test]
    fn test_apply_edit() {
        let mut review = Review::new("Okay".into(), 3, make_reviewer());
        review.apply_edit("Actually great", 5);
        assert_eq!(review.review, "Actually great");
        assert_eq!(review.rating, 5);
        // Author never changes with an edit
        assert_eq!(review.by.user_id, "user-2");
    }
}
