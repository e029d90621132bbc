//! Participant schedule conflicts
//!
//! A player cannot be on two courts at once. Scans cover every court and
//! every booking where the user is on the roster or is the creator.

use rusqlite::Connection;
use tracing::{debug, instrument};

use crate::error::{ConflictError, Result};
use crate::models::{BookingId, CourtId, UserId};
use crate::roster::Roster;
use crate::slot::TimeWindow;
use crate::storage::BookingStore;

/// An existing booking that keeps a user busy during a requested window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserConflict {
    pub user_id: UserId,
    pub booking_id: BookingId,
    pub court_id: CourtId,
    pub court_name: String,
    pub window: TimeWindow,
}

/// First booking of `user_id` overlapping `window`, ignoring `exclude`
#[instrument(skip(conn, window), fields(window = %window))]
pub fn find_user_conflict(
    conn: &Connection,
    user_id: UserId,
    window: &TimeWindow,
    exclude: Option<BookingId>,
) -> Result<Option<UserConflict>> {
    let candidates = BookingStore::new(conn).candidates_for_user(user_id, window)?;
    Ok(candidates
        .into_iter()
        .filter(|c| Some(c.booking.id) != exclude)
        .find(|c| c.booking.window.overlaps(window))
        .map(|c| UserConflict {
            user_id,
            booking_id: c.booking.id,
            court_id: c.booking.court_id,
            court_name: c.court_name,
            window: c.booking.window,
        }))
}

/// Fail on the first roster member (creator first) who is already busy.
///
/// One busy member blocks the whole booking.
pub fn ensure_roster_free(
    conn: &Connection,
    roster: &Roster,
    window: &TimeWindow,
    exclude: Option<BookingId>,
) -> Result<()> {
    for user_id in roster.members() {
        if let Some(conflict) = find_user_conflict(conn, user_id, window, exclude)? {
            debug!(
                user_id = %conflict.user_id,
                booking_id = %conflict.booking_id,
                "Roster member already booked"
            );
            return Err(ConflictError::UserBusy(conflict).into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;
    use crate::models::{CourtDraft, NewUser, User};
    use crate::roster::validate_roster;
    use crate::storage::Database;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    struct Fixture {
        db: Database,
        creator: User,
        partner: User,
        outsider: User,
        west: CourtId,
    }

    /// Creator and partner play on Central 09:00-09:30
    fn setup() -> Fixture {
        let db = Database::open_in_memory().unwrap();
        let users = db.users();
        let creator = users.create(&NewUser::new("c@example.com", "Cora", "Vidal")).unwrap();
        let partner = users.create(&NewUser::new("p@example.com", "Pau", "Roig")).unwrap();
        let outsider = users.create(&NewUser::new("o@example.com", "Olga", "Sanz")).unwrap();
        let central = db.courts().create(&CourtDraft::new("Central")).unwrap();
        let west = db.courts().create(&CourtDraft::new("West")).unwrap();

        let records = db.booking_records();
        let window = TimeWindow::from_blocks(at("2026-10-20 09:00"), 1);
        let booking = records.insert(creator.id, central.id, &window, 1).unwrap();
        records.insert_participant(booking.id, creator.id).unwrap();
        records.insert_participant(booking.id, partner.id).unwrap();

        Fixture {
            db,
            creator,
            partner,
            outsider,
            west: west.id,
        }
    }

    #[test]
    fn test_conflict_across_courts() {
        let f = setup();
        let window = TimeWindow::from_blocks(at("2026-10-20 09:00"), 2);
        let conflict = find_user_conflict(&f.db.conn, f.partner.id, &window, None)
            .unwrap()
            .unwrap();
        assert_eq!(conflict.court_name, "Central");
        assert_eq!(conflict.window.end, at("2026-10-20 09:30"));
        assert_ne!(conflict.court_id, f.west);
    }

    #[test]
    fn test_creator_counted_without_roster_row() {
        let f = setup();
        f.db.conn
            .execute("DELETE FROM booking_participants WHERE user_id = ?1", [f.creator.id.get()])
            .unwrap();
        let window = TimeWindow::from_blocks(at("2026-10-20 09:00"), 1);
        assert!(find_user_conflict(&f.db.conn, f.creator.id, &window, None)
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_adjacent_is_free() {
        let f = setup();
        let window = TimeWindow::from_blocks(at("2026-10-20 09:30"), 2);
        assert!(find_user_conflict(&f.db.conn, f.partner.id, &window, None)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_any_busy_member_blocks_roster() {
        let f = setup();
        let roster = validate_roster(&f.db, f.outsider.id, &[f.partner.id]).unwrap();
        let window = TimeWindow::from_blocks(at("2026-10-20 08:30"), 2);
        let err = ensure_roster_free(&f.db.conn, &roster, &window, None).unwrap_err();
        match err {
            crate::error::Error::Conflict(ConflictError::UserBusy(conflict)) => {
                assert_eq!(conflict.user_id, f.partner.id);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_free_roster_passes() {
        let f = setup();
        let roster = validate_roster(&f.db, f.outsider.id, &[f.partner.id]).unwrap();
        let window = TimeWindow::from_blocks(at("2026-10-20 10:00"), 2);
        ensure_roster_free(&f.db.conn, &roster, &window, None).unwrap();
    }
}
