//! Session persistence: opaque bearer tokens with a TTL.

use chrono::{DateTime, Duration, Utc};
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Session, User};

impl Database {
    /// Persist a new session for `user_id`, valid for `ttl_secs` seconds.
    pub fn create_session(&self, token: &str, user_id: Uuid, ttl_secs: i64) -> Result<Session> {
        let now = Utc::now();
        let expires_at = now + Duration::seconds(ttl_secs);

        self.conn().execute(
            "INSERT INTO sessions (token, user_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                token,
                user_id.to_string(),
                now.to_rfc3339(),
                expires_at.to_rfc3339(),
            ],
        )?;

        Ok(Session {
            token: token.to_string(),
            user_id,
            created_at: now,
            expires_at,
        })
    }

    /// Resolve a token to its user. `NotFound` for unknown or expired
    /// tokens; expired rows are deleted on the way out.
    pub fn resolve_session(&self, token: &str) -> Result<User> {
        let (user_id_str, expires_str) = self
            .conn()
            .query_row(
                "SELECT user_id, expires_at FROM sessions WHERE token = ?1",
                params![token],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })?;

        let expires_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&expires_str)
            .map(|dt| dt.with_timezone(&Utc))?;

        if expires_at <= Utc::now() {
            self.delete_session(token)?;
            return Err(StoreError::NotFound);
        }

        self.get_user(Uuid::parse_str(&user_id_str)?)
    }

    /// Delete a session (logout). Returns `true` if a row was deleted.
    pub fn delete_session(&self, token: &str) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
        Ok(affected > 0)
    }

    /// Drop all expired sessions. Returns how many were removed.
    pub fn purge_expired_sessions(&self) -> Result<usize> {
        let affected = self.conn().execute(
            "DELETE FROM sessions WHERE expires_at <= ?1",
            params![Utc::now().to_rfc3339()],
        )?;
        Ok(affected)
    }
}
