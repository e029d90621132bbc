//! Booking and roster row storage
//!
//! Reads are public. Writes are crate-private: the booking manager is the
//! only writer path and always calls them inside its own transaction.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rusqlite::{params, Connection, Row};
use tracing::instrument;

use super::parse::{format_local, parse_datetime, parse_local, OptionalExt};
use crate::error::{Error, Result};
use crate::models::{Booking, BookingId, CourtId, Participant, UserId};
use crate::slot::{max_booking_length, TimeWindow};

const BOOKING_COLUMNS: &str =
    "b.id, b.created_by, b.court_id, b.start_at, b.end_at, b.duration_blocks, b.created_at";

/// A booking row joined with its court's name
#[derive(Debug, Clone)]
pub struct BookingOnCourt {
    pub booking: Booking,
    pub court_name: String,
}

pub struct BookingStore<'a> {
    conn: &'a Connection,
}

impl<'a> BookingStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Find booking by ID
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: BookingId) -> Result<Option<Booking>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {BOOKING_COLUMNS} FROM bookings b WHERE b.id = ?1"))?;

        let booking = stmt.query_row(params![id.get()], booking_from_row).optional()?;
        Ok(booking)
    }

    /// Find booking by ID together with its court name
    #[instrument(skip(self))]
    pub fn find_on_court(&self, id: BookingId) -> Result<Option<BookingOnCourt>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {BOOKING_COLUMNS}, c.name
             FROM bookings b
             INNER JOIN courts c ON c.id = b.court_id
             WHERE b.id = ?1"
        ))?;

        let found = stmt
            .query_row(params![id.get()], booking_on_court_from_row)
            .optional()?;
        Ok(found)
    }

    /// Bookings on a court that could overlap `window`.
    ///
    /// Only an index-friendly bound on `start_at`: no booking is longer than
    /// the maximum length, so anything starting earlier has ended. Callers
    /// decide overlap with [`TimeWindow::overlaps`].
    #[instrument(skip(self, window), fields(window = %window))]
    pub fn candidates_on_court(&self, court_id: CourtId, window: &TimeWindow) -> Result<Vec<Booking>> {
        let (lower, upper) = scan_bounds(window);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {BOOKING_COLUMNS}
             FROM bookings b
             WHERE b.court_id = ?1 AND b.start_at > ?2 AND b.start_at < ?3
             ORDER BY b.start_at, b.id"
        ))?;

        let bookings = stmt
            .query_map(params![court_id.get(), lower, upper], booking_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(bookings)
    }

    /// Bookings on any court where the user is on the roster (or is the
    /// creator) that could overlap `window`. Same bound as
    /// [`candidates_on_court`](Self::candidates_on_court).
    #[instrument(skip(self, window), fields(window = %window))]
    pub fn candidates_for_user(&self, user_id: UserId, window: &TimeWindow) -> Result<Vec<BookingOnCourt>> {
        let (lower, upper) = scan_bounds(window);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT DISTINCT {BOOKING_COLUMNS}, c.name
             FROM bookings b
             INNER JOIN courts c ON c.id = b.court_id
             LEFT JOIN booking_participants p ON p.booking_id = b.id
             WHERE (p.user_id = ?1 OR b.created_by = ?1)
               AND b.start_at > ?2 AND b.start_at < ?3
             ORDER BY b.start_at, b.id"
        ))?;

        let bookings = stmt
            .query_map(params![user_id.get(), lower, upper], booking_on_court_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(bookings)
    }

    /// Bookings starting on `date`, ordered by court name then start
    #[instrument(skip(self))]
    pub fn list_for_date(&self, date: NaiveDate, court_id: Option<CourtId>) -> Result<Vec<BookingOnCourt>> {
        let from = format_local(date.and_time(NaiveTime::MIN));
        let to = match date.succ_opt() {
            Some(next) => format_local(next.and_time(NaiveTime::MIN)),
            None => return Ok(Vec::new()),
        };

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {BOOKING_COLUMNS}, c.name
             FROM bookings b
             INNER JOIN courts c ON c.id = b.court_id
             WHERE b.start_at >= ?1 AND b.start_at < ?2
               AND (?3 IS NULL OR b.court_id = ?3)
             ORDER BY c.name ASC, b.start_at ASC, b.id ASC"
        ))?;

        let bookings = stmt
            .query_map(params![from, to, court_id.map(CourtId::get)], booking_on_court_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(bookings)
    }

    /// Resolved roster of a booking, creator first
    #[instrument(skip(self))]
    pub fn roster(&self, booking_id: BookingId) -> Result<Vec<Participant>> {
        let mut stmt = self.conn.prepare(
            "SELECT u.id, u.first_name, u.last_name, u.email, u.id = b.created_by
             FROM booking_participants p
             INNER JOIN users u ON u.id = p.user_id
             INNER JOIN bookings b ON b.id = p.booking_id
             WHERE p.booking_id = ?1
             ORDER BY (u.id = b.created_by) DESC, p.id ASC",
        )?;

        let participants = stmt
            .query_map(params![booking_id.get()], |row| {
                Ok(Participant {
                    user_id: UserId(row.get(0)?),
                    first_name: row.get(1)?,
                    last_name: row.get(2)?,
                    email: row.get(3)?,
                    is_creator: row.get::<_, bool>(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(participants)
    }

    /// Number of roster rows stored for a booking
    pub fn count_participants(&self, booking_id: BookingId) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM booking_participants WHERE booking_id = ?1",
            params![booking_id.get()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Bookings on a court that have not fully elapsed at `now`
    pub fn count_unexpired_on_court(&self, court_id: CourtId, now: NaiveDateTime) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM bookings WHERE court_id = ?1 AND end_at > ?2",
            params![court_id.get(), format_local(now)],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Insert a booking row
    pub(crate) fn insert(
        &self,
        created_by: UserId,
        court_id: CourtId,
        window: &TimeWindow,
        duration_blocks: u8,
    ) -> Result<Booking> {
        let created_at = Utc::now();
        self.conn
            .execute(
                "INSERT INTO bookings (created_by, court_id, start_at, end_at, duration_blocks, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    created_by.get(),
                    court_id.get(),
                    format_local(window.start),
                    format_local(window.end),
                    duration_blocks,
                    created_at.to_rfc3339(),
                ],
            )
            .map_err(Error::from_write)?;

        Ok(Booking {
            id: BookingId(self.conn.last_insert_rowid()),
            created_by,
            court_id,
            window: *window,
            duration_blocks,
            created_at,
        })
    }

    /// Insert one roster row
    pub(crate) fn insert_participant(&self, booking_id: BookingId, user_id: UserId) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO booking_participants (booking_id, user_id) VALUES (?1, ?2)",
                params![booking_id.get(), user_id.get()],
            )
            .map_err(Error::from_write)?;
        Ok(())
    }

    /// Delete every roster row of a booking
    pub(crate) fn delete_participants(&self, booking_id: BookingId) -> Result<usize> {
        let removed = self
            .conn
            .execute(
                "DELETE FROM booking_participants WHERE booking_id = ?1",
                params![booking_id.get()],
            )
            .map_err(Error::from_write)?;
        Ok(removed)
    }

    /// Delete a booking row; its roster must already be gone
    pub(crate) fn delete(&self, booking_id: BookingId) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM bookings WHERE id = ?1", params![booking_id.get()])
            .map_err(Error::from_write)?;
        Ok(removed > 0)
    }

    /// Delete bookings (roster first) on a court that ended at or before `now`
    pub(crate) fn delete_expired_on_court(&self, court_id: CourtId, now: NaiveDateTime) -> Result<u64> {
        let now = format_local(now);
        self.conn
            .execute(
                "DELETE FROM booking_participants WHERE booking_id IN (
                     SELECT id FROM bookings WHERE court_id = ?1 AND end_at <= ?2
                 )",
                params![court_id.get(), now],
            )
            .map_err(Error::from_write)?;

        let removed = self
            .conn
            .execute(
                "DELETE FROM bookings WHERE court_id = ?1 AND end_at <= ?2",
                params![court_id.get(), now],
            )
            .map_err(Error::from_write)?;

        Ok(removed as u64)
    }
}

/// Exclusive `start_at` bounds for a candidate scan around `window`
fn scan_bounds(window: &TimeWindow) -> (String, String) {
    let lower = window
        .start
        .checked_sub_signed(max_booking_length())
        .unwrap_or(NaiveDateTime::MIN);
    (format_local(lower), format_local(window.end))
}

fn booking_from_row(row: &Row<'_>) -> rusqlite::Result<Booking> {
    let start = parse_local(&row.get::<_, String>(3)?)?;
    let end = parse_local(&row.get::<_, String>(4)?)?;
    Ok(Booking {
        id: BookingId(row.get(0)?),
        created_by: UserId(row.get(1)?),
        court_id: CourtId(row.get(2)?),
        window: TimeWindow::new(start, end),
        duration_blocks: row.get(5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?)?,
    })
}

fn booking_on_court_from_row(row: &Row<'_>) -> rusqlite::Result<BookingOnCourt> {
    Ok(BookingOnCourt {
        booking: booking_from_row(row)?,
        court_name: row.get(7)?,
    })
}
