//! Booking transaction manager
//!
//! The only writer of booking and roster rows. Every mutation runs the
//! checkers once on the plain connection to fail fast, then again inside a
//! `BEGIN IMMEDIATE` transaction. The second pass is the authority: SQLite
//! grants one write lock at a time, so no other writer can slip a booking
//! in between the re-check and the insert.

use chrono::{Local, NaiveDate, NaiveDateTime};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::{debug, info, instrument, warn};

use crate::availability::ensure_court_available;
use crate::conflict::ensure_roster_free;
use crate::error::{ConflictError, Error, NotFoundError, Result};
use crate::invariants::{assert_booking_details_invariants, assert_roster_invariants};
use crate::models::{Actor, Booking, BookingDetails, BookingId, BookingRequest, CourtId, UserId};
use crate::permissions::{BookingAction, PermissionMatrix};
use crate::roster::{validate_roster, Roster, RosterFormat};
use crate::slot::{validate_footprint, TimeWindow};
use crate::storage::{BookingOnCourt, BookingStore, CourtRegistry, CourtStore, UserStore};

/// Where a create request currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatePhase {
    Validating,
    CheckingConflicts,
    Persisting,
    Committed,
    Aborted,
}

impl CreatePhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CreatePhase::Committed | CreatePhase::Aborted)
    }
}

/// Tracks the phase of one create request for logging
#[derive(Debug)]
struct CreateProgress {
    phase: CreatePhase,
}

impl CreateProgress {
    fn new() -> Self {
        Self {
            phase: CreatePhase::Validating,
        }
    }

    fn enter(&mut self, next: CreatePhase) {
        debug_assert!(!self.phase.is_terminal(), "create already finished in {:?}", self.phase);
        debug!(from = ?self.phase, to = ?next, "Create phase");
        self.phase = next;
    }
}

/// Runs booking mutations against one connection
pub struct BookingManager<'a> {
    conn: &'a mut Connection,
}

impl<'a> BookingManager<'a> {
    pub fn new(conn: &'a mut Connection) -> Self {
        Self { conn }
    }

    /// Create a booking for `creator`.
    ///
    /// Returns the committed booking with its resolved roster, or the first
    /// failing check. Conflicts are never retried here.
    #[instrument(
        skip(self, request),
        fields(court_id = %request.court_id, start = %request.start, blocks = request.duration_blocks)
    )]
    pub fn create_booking(&mut self, creator: UserId, request: &BookingRequest) -> Result<BookingDetails> {
        let mut progress = CreateProgress::new();
        match self.run_create(creator, request, &mut progress) {
            Ok(details) => {
                progress.enter(CreatePhase::Committed);
                info!(
                    booking_id = %details.booking.id,
                    court = %details.court_name,
                    window = %details.booking.window,
                    players = details.participants.len(),
                    "Booking created"
                );
                Ok(details)
            }
            Err(err) => {
                let failed_in = progress.phase;
                progress.enter(CreatePhase::Aborted);
                debug!(phase = ?failed_in, error = %err, "Booking rejected");
                Err(err)
            }
        }
    }

    fn run_create(
        &mut self,
        creator: UserId,
        request: &BookingRequest,
        progress: &mut CreateProgress,
    ) -> Result<BookingDetails> {
        // Fast path on committed state
        let (window, roster) = validate_request(self.conn, creator, request)?;
        progress.enter(CreatePhase::CheckingConflicts);
        check_conflicts(self.conn, request.court_id, &window, &roster, None)?;

        let tx = begin_immediate(self.conn)?;

        let (window, roster) = validate_request(&tx, creator, request)?;
        if let Err(err) = check_conflicts(&tx, request.court_id, &window, &roster, None) {
            warn!(error = %err, "Conflict appeared after the fast path");
            return Err(err);
        }

        progress.enter(CreatePhase::Persisting);
        let store = BookingStore::new(&tx);
        let booking = store.insert(creator, request.court_id, &window, request.duration_blocks)?;
        for user_id in roster.members() {
            store.insert_participant(booking.id, user_id)?;
        }
        ensure_stored_roster_size(&store, booking.id)?;

        let details = load_details(&tx, booking.id)?.ok_or(NotFoundError::Booking(booking.id))?;
        tx.commit().map_err(Error::from_write)?;

        assert_booking_details_invariants(&details);
        Ok(details)
    }

    /// Delete a booking and its roster. Allowed for the creator and for
    /// privileged actors.
    #[instrument(skip(self), fields(actor_id = %actor.user_id))]
    pub fn delete_booking(&mut self, booking_id: BookingId, actor: &Actor) -> Result<()> {
        let booking = find_booking(self.conn, booking_id)?;
        PermissionMatrix::authorize(actor, &booking, BookingAction::Delete)?;

        let tx = begin_immediate(self.conn)?;
        let booking = find_booking(&tx, booking_id)?;
        PermissionMatrix::authorize(actor, &booking, BookingAction::Delete)?;

        let store = BookingStore::new(&tx);
        let removed_players = store.delete_participants(booking_id)?;
        if !store.delete(booking_id)? {
            return Err(NotFoundError::Booking(booking_id).into());
        }
        tx.commit().map_err(Error::from_write)?;

        info!(%booking_id, removed_players, "Booking deleted");
        Ok(())
    }

    /// Swap the whole roster of a booking. Creator only.
    ///
    /// On any failure the existing roster stays as it was.
    #[instrument(skip(self, participants), fields(actor_id = %actor.user_id, players = participants.len() + 1))]
    pub fn replace_roster(
        &mut self,
        booking_id: BookingId,
        actor: &Actor,
        participants: &[UserId],
    ) -> Result<BookingDetails> {
        let booking = find_booking(self.conn, booking_id)?;
        let roster = authorize_roster_change(self.conn, actor, &booking, participants)?;
        ensure_roster_free(self.conn, &roster, &booking.window, Some(booking_id))?;

        let tx = begin_immediate(self.conn)?;
        let booking = find_booking(&tx, booking_id)?;
        let roster = authorize_roster_change(&tx, actor, &booking, participants)?;
        if let Err(err) = ensure_roster_free(&tx, &roster, &booking.window, Some(booking_id)) {
            warn!(error = %err, "Conflict appeared after the fast path");
            return Err(err);
        }

        let store = BookingStore::new(&tx);
        let replaced = store.delete_participants(booking_id)?;
        for user_id in roster.members() {
            store.insert_participant(booking_id, user_id)?;
        }
        ensure_stored_roster_size(&store, booking_id)?;

        let details = load_details(&tx, booking_id)?.ok_or(NotFoundError::Booking(booking_id))?;
        tx.commit().map_err(Error::from_write)?;

        assert_booking_details_invariants(&details);
        info!(%booking_id, replaced, players = details.participants.len(), "Roster replaced");
        Ok(details)
    }

    /// Remove every booking on a court that has fully elapsed by now
    pub fn purge_expired_bookings(&mut self, court_id: CourtId) -> Result<u64> {
        self.purge_expired_bookings_at(court_id, Local::now().naive_local())
    }

    /// Remove every booking on a court that has fully elapsed by `now`
    #[instrument(skip(self))]
    pub fn purge_expired_bookings_at(&mut self, court_id: CourtId, now: NaiveDateTime) -> Result<u64> {
        let tx = begin_immediate(self.conn)?;
        ensure_court_exists(&tx, court_id)?;
        let purged = BookingStore::new(&tx).delete_expired_on_court(court_id, now)?;
        tx.commit().map_err(Error::from_write)?;

        if purged > 0 {
            info!(%court_id, purged, "Expired bookings purged");
        }
        Ok(purged)
    }

    /// Delete a court, purging its expired bookings first.
    ///
    /// Fails without changing anything if upcoming bookings remain.
    /// Returns how many expired bookings went with it.
    pub fn retire_court(&mut self, court_id: CourtId) -> Result<u64> {
        self.retire_court_at(court_id, Local::now().naive_local())
    }

    #[instrument(skip(self))]
    pub fn retire_court_at(&mut self, court_id: CourtId, now: NaiveDateTime) -> Result<u64> {
        let tx = begin_immediate(self.conn)?;
        ensure_court_exists(&tx, court_id)?;

        let store = BookingStore::new(&tx);
        let purged = store.delete_expired_on_court(court_id, now)?;
        let remaining = store.count_unexpired_on_court(court_id, now)?;
        if remaining > 0 {
            return Err(ConflictError::CourtHasBookings { court_id, remaining }.into());
        }

        CourtStore::new(&tx).delete(court_id)?;
        tx.commit().map_err(Error::from_write)?;

        info!(%court_id, purged, "Court retired");
        Ok(purged)
    }

    /// A booking with its court name and roster
    #[instrument(skip(self))]
    pub fn get_booking(&mut self, booking_id: BookingId) -> Result<BookingDetails> {
        let tx = self.conn.transaction()?;
        let details = load_details(&tx, booking_id)?.ok_or(NotFoundError::Booking(booking_id))?;
        tx.commit()?;
        Ok(details)
    }

    /// Bookings starting on `date`, by court name then start time
    #[instrument(skip(self))]
    pub fn list_bookings(&mut self, date: NaiveDate, court_id: Option<CourtId>) -> Result<Vec<BookingDetails>> {
        // One read transaction so every roster matches its booking
        let tx = self.conn.transaction()?;
        if let Some(court_id) = court_id {
            ensure_court_exists(&tx, court_id)?;
        }

        let store = BookingStore::new(&tx);
        let bookings = store
            .list_for_date(date, court_id)?
            .into_iter()
            .map(|found| with_roster(&store, found))
            .collect::<Result<Vec<_>>>()?;
        tx.commit()?;

        Ok(bookings)
    }
}

fn begin_immediate(conn: &mut Connection) -> Result<Transaction<'_>> {
    conn.transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(Error::from_write)
}

/// Footprint, court, creator and roster checks, in that order
fn validate_request(conn: &Connection, creator: UserId, request: &BookingRequest) -> Result<(TimeWindow, Roster)> {
    let window = validate_footprint(request.start, request.duration_blocks)?;
    ensure_court_exists(conn, request.court_id)?;

    let users = UserStore::new(conn);
    if users.find_by_id(creator)?.is_none() {
        return Err(NotFoundError::User {
            user_id: creator,
            reason: "unknown creator",
        }
        .into());
    }
    let roster = validate_roster(&users, creator, &request.participants)?;
    assert_roster_invariants(&roster);

    Ok((window, roster))
}

fn check_conflicts(
    conn: &Connection,
    court_id: CourtId,
    window: &TimeWindow,
    roster: &Roster,
    exclude: Option<BookingId>,
) -> Result<()> {
    ensure_court_available(conn, court_id, window, exclude)?;
    ensure_roster_free(conn, roster, window, exclude)
}

fn authorize_roster_change(
    conn: &Connection,
    actor: &Actor,
    booking: &Booking,
    participants: &[UserId],
) -> Result<Roster> {
    PermissionMatrix::authorize(actor, booking, BookingAction::EditRoster)?;
    validate_roster(&UserStore::new(conn), booking.created_by, participants)
}

fn ensure_court_exists(conn: &Connection, court_id: CourtId) -> Result<()> {
    if CourtStore::new(conn).court_exists(court_id)? {
        Ok(())
    } else {
        Err(NotFoundError::Court(court_id).into())
    }
}

fn find_booking(conn: &Connection, booking_id: BookingId) -> Result<Booking> {
    BookingStore::new(conn)
        .find_by_id(booking_id)?
        .ok_or_else(|| NotFoundError::Booking(booking_id).into())
}

/// Reject a roster whose stored size is not 2 or 4 before commit
fn ensure_stored_roster_size(store: &BookingStore<'_>, booking_id: BookingId) -> Result<()> {
    let stored = store.count_participants(booking_id)?;
    if RosterFormat::from_total(stored).is_none() {
        return Err(ConflictError::StoreRejected(format!(
            "booking {booking_id} would be stored with {stored} players"
        ))
        .into());
    }
    Ok(())
}

fn load_details(conn: &Connection, booking_id: BookingId) -> Result<Option<BookingDetails>> {
    let store = BookingStore::new(conn);
    match store.find_on_court(booking_id)? {
        Some(found) => Ok(Some(with_roster(&store, found)?)),
        None => Ok(None),
    }
}

fn with_roster(store: &BookingStore<'_>, found: BookingOnCourt) -> Result<BookingDetails> {
    let participants = store.roster(found.booking.id)?;
    Ok(BookingDetails {
        booking: found.booking,
        court_name: found.court_name,
        participants,
    })
}
