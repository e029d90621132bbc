//! Collaborator contracts
//!
//! The scheduler does not own users or courts. These traits are the only
//! questions it asks of them, so any backing store (or a test double) can
//! answer.

use crate::error::Result;
use crate::models::{CourtId, User, UserId};

/// Identity lookups used for roster eligibility
pub trait UserDirectory {
    /// Find a user account by ID
    fn find_user(&self, id: UserId) -> Result<Option<User>>;
}

/// Court existence checks made before any scheduling logic
pub trait CourtRegistry {
    /// True when the court is known
    fn court_exists(&self, id: CourtId) -> Result<bool>;
}
