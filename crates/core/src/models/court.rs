//! Court model - the bookable resource

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CourtId;

/// A court that can be booked by one roster at a time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Court {
    pub id: CourtId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields for creating or editing a court
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourtDraft {
    pub name: String,
    pub description: Option<String>,
}

impl CourtDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
