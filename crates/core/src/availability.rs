//! Court availability checks
//!
//! A court holds one booking at a time. Every function takes the
//! connection (or open transaction) to read from, so the same check runs
//! unchanged on the fast path and inside the writing transaction.

use rusqlite::Connection;
use tracing::instrument;

use crate::error::{ConflictError, Result};
use crate::models::{Booking, BookingId, CourtId};
use crate::slot::TimeWindow;
use crate::storage::BookingStore;

/// First booking on `court_id` overlapping `window`, ignoring `exclude`
#[instrument(skip(conn, window), fields(window = %window))]
pub fn find_court_conflict(
    conn: &Connection,
    court_id: CourtId,
    window: &TimeWindow,
    exclude: Option<BookingId>,
) -> Result<Option<Booking>> {
    let candidates = BookingStore::new(conn).candidates_on_court(court_id, window)?;
    Ok(candidates
        .into_iter()
        .filter(|b| Some(b.id) != exclude)
        .find(|b| b.window.overlaps(window)))
}

/// True iff nothing on the court overlaps `window`
pub fn is_court_available(
    conn: &Connection,
    court_id: CourtId,
    window: &TimeWindow,
    exclude: Option<BookingId>,
) -> Result<bool> {
    Ok(find_court_conflict(conn, court_id, window, exclude)?.is_none())
}

/// Fail with [`ConflictError::CourtUnavailable`] if the court is taken
pub fn ensure_court_available(
    conn: &Connection,
    court_id: CourtId,
    window: &TimeWindow,
    exclude: Option<BookingId>,
) -> Result<()> {
    match find_court_conflict(conn, court_id, window, exclude)? {
        Some(existing) => Err(ConflictError::CourtUnavailable {
            court_id,
            window: existing.window,
            booking_id: existing.id,
        }
        .into()),
        None => Ok(()),
    }
}
