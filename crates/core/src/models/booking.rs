//! Booking and roster models

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookingId, CourtId, UserId};
use crate::slot::TimeWindow;

/// A committed booking row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub created_by: UserId,
    pub court_id: CourtId,
    pub window: TimeWindow,
    pub duration_blocks: u8,
    pub created_at: DateTime<Utc>,
}

/// A booking request as submitted by a caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub court_id: CourtId,
    /// Court-local wall-clock start
    pub start: NaiveDateTime,
    pub duration_blocks: u8,
    /// Other players, creator excluded
    pub participants: Vec<UserId>,
}

/// A resolved roster member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_creator: bool,
}

/// A booking together with its court name and resolved roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDetails {
    #[serde(flatten)]
    pub booking: Booking,
    pub court_name: String,
    pub participants: Vec<Participant>,
}

impl BookingDetails {
    pub fn roster_ids(&self) -> Vec<UserId> {
        self.participants.iter().map(|p| p.user_id).collect()
    }
}
