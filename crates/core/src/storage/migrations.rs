//! Database migration system
//!
//! Tracks schema versions and applies migrations in order.

use rusqlite::Connection;
use tracing::{info, instrument};

use crate::error::Result;

/// A database migration
pub struct Migration {
    /// Version number (must be sequential starting from 1)
    pub version: u32,
    /// Description of what this migration does
    pub description: &'static str,
    /// SQL to run for this migration
    pub sql: &'static str,
}

/// All migrations in order
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema",
        sql: r#"
            -- Users table (accounts are owned by the identity provider)
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                is_admin INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            -- Courts table
            CREATE TABLE IF NOT EXISTS courts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                description TEXT,
                created_at TEXT NOT NULL
            );

            -- Bookings table
            -- start_at/end_at are court-local 'YYYY-MM-DD HH:MM:SS'
            CREATE TABLE IF NOT EXISTS bookings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created_by INTEGER NOT NULL,
                court_id INTEGER NOT NULL,
                start_at TEXT NOT NULL,
                end_at TEXT NOT NULL,
                duration_blocks INTEGER NOT NULL CHECK (duration_blocks BETWEEN 1 AND 6),
                created_at TEXT NOT NULL,
                CHECK (start_at < end_at),
                FOREIGN KEY (created_by) REFERENCES users(id),
                FOREIGN KEY (court_id) REFERENCES courts(id)
            );

            -- Roster rows, creator included
            CREATE TABLE IF NOT EXISTS booking_participants (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                booking_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                FOREIGN KEY (booking_id) REFERENCES bookings(id),
                FOREIGN KEY (user_id) REFERENCES users(id),
                UNIQUE(booking_id, user_id)
            );
        "#,
    },
    Migration {
        version: 2,
        description: "Add indexes for range and roster lookups",
        sql: r#"
            -- Court availability scans
            CREATE INDEX IF NOT EXISTS idx_bookings_court_start ON bookings(court_id, start_at);

            -- Day listings
            CREATE INDEX IF NOT EXISTS idx_bookings_start ON bookings(start_at);

            -- Per-user schedule scans
            CREATE INDEX IF NOT EXISTS idx_bookings_creator ON bookings(created_by);
            CREATE INDEX IF NOT EXISTS idx_participants_user ON booking_participants(user_id);
        "#,
    },
];

/// Initialize the migrations table
fn init_migrations_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

/// Get the current schema version
pub(crate) fn current_version(conn: &Connection) -> Result<u32> {
    let version: Option<u32> =
        conn.query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get(0)
        })?;
    Ok(version.unwrap_or(0))
}

/// Record that a migration was applied
fn record_migration(conn: &Connection, migration: &Migration) -> Result<()> {
    conn.execute(
        "INSERT INTO schema_migrations (version, description, applied_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![
            migration.version,
            migration.description,
            chrono::Utc::now().to_rfc3339()
        ],
    )?;
    Ok(())
}

/// Run all pending migrations
#[instrument(skip(conn))]
pub fn run_migrations(conn: &Connection) -> Result<()> {
    init_migrations_table(conn)?;

    let current = current_version(conn)?;
    info!(current_version = current, "Checking for pending migrations");

    for migration in MIGRATIONS {
        if migration.version > current {
            info!(
                version = migration.version,
                description = migration.description,
                "Applying migration"
            );

            let tx = conn.unchecked_transaction()?;
            tx.execute_batch(migration.sql)?;
            record_migration(&tx, migration)?;
            tx.commit()?;

            info!(version = migration.version, "Migration complete");
        }
    }

    let new_version = current_version(conn)?;
    if new_version > current {
        info!(
            from = current,
            to = new_version,
            "Database schema updated"
        );
    }

    Ok(())
}
