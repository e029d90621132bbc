//! Permission system for booking operations

use crate::error::{Error, Result};
use crate::models::{Actor, Booking};

/// Mutations a caller can attempt on an existing booking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingAction {
    /// Cancel the booking outright
    Delete,
    /// Replace the participant list
    EditRoster,
}

/// Permission matrix for booking actions
pub struct PermissionMatrix;

impl PermissionMatrix {
    /// Check if `actor` may perform `action` on `booking`
    pub fn can_perform(actor: &Actor, booking: &Booking, action: BookingAction) -> bool {
        let is_creator = actor.user_id == booking.created_by;
        match action {
            // Staff may cancel anything
            BookingAction::Delete => is_creator || actor.is_privileged,

            // Rosters belong to whoever booked
            BookingAction::EditRoster => is_creator,
        }
    }

    /// Like [`can_perform`](Self::can_perform), failing with an
    /// authorization error
    pub fn authorize(actor: &Actor, booking: &Booking, action: BookingAction) -> Result<()> {
        if Self::can_perform(actor, booking, action) {
            return Ok(());
        }
        let verb = match action {
            BookingAction::Delete => "delete",
            BookingAction::EditRoster => "edit the roster of",
        };
        Err(Error::Authorization(format!(
            "user {} may not {} booking {}",
            actor.user_id, verb, booking.id
        )))
    }
}
