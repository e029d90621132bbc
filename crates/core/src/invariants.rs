//! Developer guardrails and invariants
//!
//! Debug assertions for detecting impossible states during development.
//! These checks are compiled out in release builds.

use crate::models::{Booking, BookingDetails};
use crate::roster::{Roster, RosterFormat};
use crate::slot::{self, TimeWindow};

/// Validate that a window is a legal booking footprint
pub fn assert_window_invariants(window: &TimeWindow) {
    debug_assert!(
        window.start < window.end,
        "Window {} is empty or inverted",
        window
    );

    let blocks = window.blocks();
    debug_assert!(
        (i64::from(slot::MIN_BLOCKS)..=i64::from(slot::MAX_BLOCKS)).contains(&blocks),
        "Window {} spans {} blocks",
        window,
        blocks
    );
}

/// Validate that a stored booking agrees with its own window
pub fn assert_booking_invariants(booking: &Booking) {
    assert_window_invariants(&booking.window);
    debug_assert!(
        booking.window.blocks() == i64::from(booking.duration_blocks),
        "Booking {} stores {} blocks but its window spans {}",
        booking.id,
        booking.duration_blocks,
        booking.window.blocks()
    );
}

/// Validate that a roster's size matches its format
pub fn assert_roster_invariants(roster: &Roster) {
    debug_assert!(
        RosterFormat::from_total(roster.headcount()) == Some(roster.format()),
        "Roster of {} players tagged as {:?}",
        roster.headcount(),
        roster.format()
    );

    debug_assert!(
        !roster.participants().contains(&roster.creator()),
        "Creator {} listed among participants",
        roster.creator()
    );
}

/// Validate a committed booking as returned to callers
pub fn assert_booking_details_invariants(details: &BookingDetails) {
    assert_booking_invariants(&details.booking);

    let total = details.participants.len();
    debug_assert!(
        total == 2 || total == 4,
        "Booking {} has {} players",
        details.booking.id,
        total
    );

    // Exactly one creator, and it is the booking's owner
    let creators: Vec<_> = details.participants.iter().filter(|p| p.is_creator).collect();
    debug_assert!(
        creators.len() == 1 && creators[0].user_id == details.booking.created_by,
        "Booking {} roster has {} creator entries",
        details.booking.id,
        creators.len()
    );
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime, Utc};

    use super::*;
    use crate::models::{BookingId, CourtId, Participant, UserId};

    fn ten() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 20)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn participant(id: i64, is_creator: bool) -> Participant {
        Participant {
            user_id: UserId(id),
            first_name: "P".into(),
            last_name: format!("{id}"),
            email: format!("p{id}@example.com"),
            is_creator,
        }
    }

    fn details(participants: Vec<Participant>) -> BookingDetails {
        BookingDetails {
            booking: Booking {
                id: BookingId(1),
                created_by: UserId(1),
                court_id: CourtId(1),
                window: TimeWindow::from_blocks(ten(), 2),
                duration_blocks: 2,
                created_at: Utc::now(),
            },
            court_name: "Central".into(),
            participants,
        }
    }

    #[test]
    fn test_valid_details() {
        assert_booking_details_invariants(&details(vec![
            participant(1, true),
            participant(2, false),
        ]));
    }

    #[test]
    #[should_panic]
    #[cfg(debug_assertions)]
    fn test_three_players_panics() {
        assert_booking_details_invariants(&details(vec![
            participant(1, true),
            participant(2, false),
            participant(3, false),
        ]));
    }

    #[test]
    #[should_panic]
    #[cfg(debug_assertions)]
    fn test_missing_creator_panics() {
        assert_booking_details_invariants(&details(vec![
            participant(2, false),
            participant(3, false),
        ]));
    }

    #[test]
    #[should_panic]
    #[cfg(debug_assertions)]
    fn test_overlong_window_panics() {
        assert_window_invariants(&TimeWindow::from_blocks(ten(), 7));
    }
}
