//! User storage operations

use chrono::Utc;
use rusqlite::{params, Connection, Row};
use tracing::instrument;

use super::parse::{parse_datetime, OptionalExt};
use super::traits::UserDirectory;
use crate::error::{Error, Result};
use crate::models::{NewUser, User, UserId};

const USER_COLUMNS: &str = "id, email, first_name, last_name, is_admin, created_at";

pub struct UserStore<'a> {
    conn: &'a Connection,
}

impl<'a> UserStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Register a user
    #[instrument(skip(self, user), fields(email = %user.email, is_admin = user.is_admin))]
    pub fn create(&self, user: &NewUser) -> Result<User> {
        let created_at = Utc::now();
        self.conn
            .execute(
                "INSERT INTO users (email, first_name, last_name, is_admin, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    user.email,
                    user.first_name,
                    user.last_name,
                    user.is_admin as i32,
                    created_at.to_rfc3339(),
                ],
            )
            .map_err(Error::from_write)?;

        Ok(User {
            id: UserId(self.conn.last_insert_rowid()),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_admin: user.is_admin,
            created_at,
        })
    }

    /// Find user by ID
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))?;

        let user = stmt.query_row(params![id.get()], user_from_row).optional()?;
        Ok(user)
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: UserId(row.get(0)?),
        email: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        is_admin: row.get::<_, i32>(4)? != 0,
        created_at: parse_datetime(&row.get::<_, String>(5)?)?,
    })
}

impl UserDirectory for UserStore<'_> {
    fn find_user(&self, id: UserId) -> Result<Option<User>> {
        self.find_by_id(id)
    }
}
