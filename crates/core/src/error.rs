//! Error types for courtside
//!
//! Every failure a caller can see falls into one of five kinds (see
//! [`ErrorKind`]); transport layers match on the kind, not on messages.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::ErrorCode;
use thiserror::Error;

use crate::config::ConfigError;
use crate::conflict::UserConflict;
use crate::models::{BookingId, CourtId, UserId};
use crate::slot::TimeWindow;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("Not found: {0}")]
    NotFound(#[from] NotFoundError),

    #[error("Permission denied: {0}")]
    Authorization(String),

    #[error("Conflict: {0}")]
    Conflict(#[from] ConflictError),

    #[error("Database error: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Malformed input; the caller must correct it before trying again
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("duration must be between 1 and 6 blocks of 30 minutes, got {blocks}")]
    InvalidDuration { blocks: u8 },

    #[error("bookings must start on the hour or half hour, got {start}")]
    MisalignedStart { start: NaiveDateTime },

    #[error("bookings can only start between 08:00 and 22:00, got {start}")]
    StartOutsideHours { start: NaiveDateTime },

    #[error("booking would end at {end}, after the 22:00 closing time")]
    EndsAfterClose { end: NaiveDateTime },

    #[error("participant id {id} is not a valid user id")]
    InvalidParticipantId { id: i64 },

    #[error("participant {user_id} is listed more than once")]
    DuplicateParticipant { user_id: UserId },

    #[error("the creator ({user_id}) must not be listed as a participant")]
    CreatorListedAsParticipant { user_id: UserId },

    #[error("a booking needs 2 (singles) or 4 (doubles) players, got {total}")]
    InvalidRosterSize { total: usize },

    #[error("invalid date '{input}', expected YYYY-MM-DD")]
    InvalidDate { input: String },
}

/// A referenced entity does not exist
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotFoundError {
    #[error("court {0}")]
    Court(CourtId),

    #[error("booking {0}")]
    Booking(BookingId),

    #[error("user {user_id} ({reason})")]
    User { user_id: UserId, reason: &'static str },
}

/// The request collides with existing state; a different slot, or a plain
/// retry after `SerializationLost`, may succeed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConflictError {
    #[error("court {court_id} is already booked for {window} (booking {booking_id})")]
    CourtUnavailable {
        court_id: CourtId,
        window: TimeWindow,
        booking_id: BookingId,
    },

    #[error(
        "user {} already plays on court '{}' at {}",
        .0.user_id, .0.court_name, .0.window
    )]
    UserBusy(UserConflict),

    #[error("a concurrent booking won the race; retry the request")]
    SerializationLost,

    #[error("the store rejected the write: {0}")]
    StoreRejected(String),

    #[error("court {court_id} still has {remaining} upcoming booking(s)")]
    CourtHasBookings { court_id: CourtId, remaining: u64 },
}

/// The five failure kinds callers map to transport statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Authorization,
    Conflict,
    Persistence,
}

impl ErrorKind {
    /// Only conflicts can succeed when the request is repeated
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Conflict)
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Authorization(_) => ErrorKind::Authorization,
            Error::Conflict(_) => ErrorKind::Conflict,
            Error::Persistence(_)
            | Error::Io(_)
            | Error::Serialization(_)
            | Error::Config(_) => ErrorKind::Persistence,
        }
    }

    pub fn invalid_date(input: &str) -> Self {
        Error::Validation(ValidationError::InvalidDate {
            input: input.to_string(),
        })
    }

    /// Translate a failure raised while writing inside a transaction.
    ///
    /// Busy/locked means another writer held the lock past the busy
    /// timeout; constraint failures mean the store itself refused the row.
    pub(crate) fn from_write(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
                Error::Conflict(ConflictError::SerializationLost)
            }
            Some(ErrorCode::ConstraintViolation) => {
                Error::Conflict(ConflictError::StoreRejected(err.to_string()))
            }
            _ => Error::Persistence(err),
        }
    }
}

/// Parse a `YYYY-MM-DD` date supplied by a caller
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| Error::invalid_date(input))
}
