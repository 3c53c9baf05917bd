//! Requester identity derived from a verified token.

use serde::{Deserialize, Serialize};

use super::{Owner, Reviewer};

/// Identity of an authenticated requester.
///
/// Built from token claims the server verified itself; request bodies never
/// carry identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Identity {
    pub user_id: String,
    pub fullname: String,
    pub email: String,
}

impl Identity {
    /// Owner snapshot stored on records this identity creates.
    pub fn as_owner(&self) -> Owner {
        Owner {
            user_id: self.user_id.clone(),
            fullname: self.fullname.clone(),
            email: self.email.clone(),
        }
    }

    /// Author snapshot stored on reviews this identity writes.
    pub fn as_reviewer(&self) -> Reviewer {
        Reviewer {
            user_id: self.user_id.clone(),
            fullname: self.fullname.clone(),
        }
    }
}

/// Whether the requester is the record owner. Applied to mutations only;
/// reads are public.
pub fn is_owner(owner_id: &str, requester_id: &str) -> bool {
    owner_id == requester_id
}
