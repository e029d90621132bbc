//! Court storage operations
//!
//! Plain metadata CRUD. Court deletion is not offered here: a court is
//! retired through the booking manager so expired bookings are purged in
//! the same transaction.

use chrono::Utc;
use rusqlite::{params, Connection, Row};
use tracing::instrument;

use super::parse::{parse_datetime, OptionalExt};
use super::traits::CourtRegistry;
use crate::error::{Error, NotFoundError, Result};
use crate::models::{Court, CourtDraft, CourtId};

const COURT_COLUMNS: &str = "id, name, description, created_at";

pub struct CourtStore<'a> {
    conn: &'a Connection,
}

impl<'a> CourtStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a court; names are unique
    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub fn create(&self, draft: &CourtDraft) -> Result<Court> {
        let created_at = Utc::now();
        self.conn
            .execute(
                "INSERT INTO courts (name, description, created_at) VALUES (?1, ?2, ?3)",
                params![draft.name, draft.description, created_at.to_rfc3339()],
            )
            .map_err(Error::from_write)?;

        Ok(Court {
            id: CourtId(self.conn.last_insert_rowid()),
            name: draft.name.clone(),
            description: draft.description.clone(),
            created_at,
        })
    }

    /// Find court by ID
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: CourtId) -> Result<Option<Court>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {COURT_COLUMNS} FROM courts WHERE id = ?1"))?;

        let court = stmt.query_row(params![id.get()], court_from_row).optional()?;
        Ok(court)
    }

    /// List all courts by name
    pub fn list(&self) -> Result<Vec<Court>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {COURT_COLUMNS} FROM courts ORDER BY name"))?;

        let courts = stmt
            .query_map([], court_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(courts)
    }

    /// Edit a court's name and description
    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub fn update(&self, id: CourtId, draft: &CourtDraft) -> Result<Court> {
        let changed = self
            .conn
            .execute(
                "UPDATE courts SET name = ?1, description = ?2 WHERE id = ?3",
                params![draft.name, draft.description, id.get()],
            )
            .map_err(Error::from_write)?;

        if changed == 0 {
            return Err(NotFoundError::Court(id).into());
        }

        self.find_by_id(id)?
            .ok_or_else(|| NotFoundError::Court(id).into())
    }

    /// Remove the court row. Callers must have cleared its bookings.
    pub(crate) fn delete(&self, id: CourtId) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM courts WHERE id = ?1", params![id.get()])
            .map_err(Error::from_write)?;
        Ok(removed > 0)
    }
}

fn court_from_row(row: &Row<'_>) -> rusqlite::Result<Court> {
    Ok(Court {
        id: CourtId(row.get(0)?),
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: parse_datetime(&row.get::<_, String>(3)?)?,
    })
}

impl CourtRegistry for CourtStore<'_> {
    fn court_exists(&self, id: CourtId) -> Result<bool> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM courts WHERE id = ?1)",
            params![id.get()],
            |row| row.get::<_, bool>(0),
        )?;
        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConflictError;
    use crate::storage::Database;

    #[test]
    fn test_create_find_update() {
        let db = Database::open_in_memory().unwrap();
        let store = db.courts();

        let court = store
            .create(&CourtDraft::new("Central").with_description("Clay, covered"))
            .unwrap();
        assert!(store.court_exists(court.id).unwrap());

        let updated = store
            .update(court.id, &CourtDraft::new("Central Court"))
            .unwrap();
        assert_eq!(updated.name, "Central Court");
        assert_eq!(updated.description, None);
        assert_eq!(updated.created_at, court.created_at);
    }

    #[test]
    fn test_unknown_court() {
        let db = Database::open_in_memory().unwrap();
        let store = db.courts();
        assert!(!store.court_exists(CourtId(5)).unwrap());
        assert!(matches!(
            store.update(CourtId(5), &CourtDraft::new("Nowhere")),
            Err(Error::NotFound(NotFoundError::Court(CourtId(5))))
        ));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let db = Database::open_in_memory().unwrap();
        let store = db.courts();
        store.create(&CourtDraft::new("Central")).unwrap();
        assert!(matches!(
            store.create(&CourtDraft::new("Central")),
            Err(Error::Conflict(ConflictError::StoreRejected(_)))
        ));
    }

    #[test]
    fn test_list_sorted() {
        let db = Database::open_in_memory().unwrap();
        let store = db.courts();
        store.create(&CourtDraft::new("West")).unwrap();
        store.create(&CourtDraft::new("East")).unwrap();
        let names: Vec<_> = store.list().unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["East", "West"]);
    }
}
