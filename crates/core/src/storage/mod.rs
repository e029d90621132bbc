//! SQLite storage layer for courtside
//!
//! A [`Database`] owns exactly one connection. Workers that run in
//! parallel each open their own; SQLite's locking is the only coordination
//! between them.

mod bookings;
mod courts;
mod migrations;
mod parse;
mod traits;
mod users;

use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;
use tracing::{debug, instrument};

use crate::booking::BookingManager;
use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::models::{CourtId, User, UserId};

pub use bookings::{BookingOnCourt, BookingStore};
pub use courts::CourtStore;
pub use parse::{format_local, parse_local, LOCAL_TIME_FORMAT};
pub use traits::{CourtRegistry, UserDirectory};
pub use users::UserStore;

/// Main database handle
pub struct Database {
    pub(crate) conn: Connection,
}

impl Database {
    /// Open or create database at the given path with default settings
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_at(path.as_ref(), &DatabaseConfig::default())
    }

    /// Open the database described by `config`, creating its directory
    pub fn open_with(config: &DatabaseConfig) -> Result<Self> {
        let path = config.resolved_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::open_at(&path, config)
    }

    #[instrument(skip(path, config), fields(path = %path.display()))]
    fn open_at(path: &Path, config: &DatabaseConfig) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::apply_pragmas(&conn, config)?;
        let mode: String = conn.pragma_update_and_check(
            None,
            "journal_mode",
            config.journal_mode.as_pragma(),
            |row| row.get(0),
        )?;
        debug!(journal_mode = %mode, "Database opened");
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Open in-memory database (for testing)
    #[instrument]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::apply_pragmas(&conn, &DatabaseConfig::default())?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    fn apply_pragmas(conn: &Connection, config: &DatabaseConfig) -> Result<()> {
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        Ok(())
    }

    /// Initialize database schema via migrations
    fn init(&self) -> Result<()> {
        migrations::run_migrations(&self.conn)?;
        Ok(())
    }

    /// Get current schema version
    pub fn schema_version(&self) -> Result<u32> {
        migrations::current_version(&self.conn)
    }

    /// Get user store
    pub fn users(&self) -> UserStore<'_> {
        UserStore::new(&self.conn)
    }

    /// Get court store
    pub fn courts(&self) -> CourtStore<'_> {
        CourtStore::new(&self.conn)
    }

    /// Read-only access to booking rows
    pub fn booking_records(&self) -> BookingStore<'_> {
        BookingStore::new(&self.conn)
    }

    /// Get the booking manager, the only path that mutates bookings
    pub fn bookings(&mut self) -> BookingManager<'_> {
        BookingManager::new(&mut self.conn)
    }
}

impl UserDirectory for Database {
    fn find_user(&self, id: UserId) -> Result<Option<User>> {
        self.users().find_by_id(id)
    }
}

impl CourtRegistry for Database {
    fn court_exists(&self, id: CourtId) -> Result<bool> {
        self.courts().court_exists(id)
    }
}
