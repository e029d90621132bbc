//! Courtside Core Library
//!
//! Court booking rules, conflict checking and the transactional booking
//! manager, backed by SQLite.

pub mod availability;
pub mod booking;
pub mod config;
pub mod conflict;
pub mod error;
pub mod invariants;
pub mod models;
pub mod permissions;
pub mod roster;
pub mod slot;
pub mod storage;

pub use availability::{ensure_court_available, find_court_conflict, is_court_available};
pub use booking::{BookingManager, CreatePhase};
pub use config::{Config, ConfigError, DatabaseConfig, JournalMode, LoggingConfig};
pub use conflict::{ensure_roster_free, find_user_conflict, UserConflict};
pub use error::{
    parse_date, ConflictError, Error, ErrorKind, NotFoundError, Result, ValidationError,
};
pub use models::*;
pub use permissions::*;
pub use roster::{validate_roster, Roster, RosterFormat};
pub use slot::{validate_footprint, TimeWindow};
pub use storage::{
    BookingOnCourt, BookingStore, CourtRegistry, CourtStore, Database, UserDirectory, UserStore,
};
