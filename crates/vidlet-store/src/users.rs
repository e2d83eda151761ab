//! CRUD operations for [`User`] records.

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::User;

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new user. Fails with `Conflict` when the username or email
    /// is already taken.
    pub fn create_user(&self, user: &User) -> Result<()> {
        if self.username_or_email_taken(&user.username, &user.email)? {
            return Err(StoreError::Conflict(
                "username or email already in use".to_string(),
            ));
        }

        self.conn().execute(
            "INSERT INTO users (id, username, email, full_name, password_hash,
                                avatar_url, cover_image_url, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                user.id.to_string(),
                user.username,
                user.email,
                user.full_name,
                user.password_hash,
                user.avatar_url,
                user.cover_image_url,
                user.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single user by UUID.
    pub fn get_user(&self, id: Uuid) -> Result<User> {
        self.conn()
            .query_row(
                "SELECT id, username, email, full_name, password_hash,
                        avatar_url, cover_image_url, created_at
                 FROM users
                 WHERE id = ?1",
                params![id.to_string()],
                row_to_user,
            )
            .map_err(not_found)
    }

    /// Fetch a user by username (case-insensitive).
    pub fn get_user_by_username(&self, username: &str) -> Result<User> {
        self.conn()
            .query_row(
                "SELECT id, username, email, full_name, password_hash,
                        avatar_url, cover_image_url, created_at
                 FROM users
                 WHERE username = ?1 COLLATE NOCASE",
                params![username],
                row_to_user,
            )
            .map_err(not_found)
    }

    /// Fetch a user by username or email, for login.
    pub fn find_user_for_login(&self, username_or_email: &str) -> Result<User> {
        self.conn()
            .query_row(
                "SELECT id, username, email, full_name, password_hash,
                        avatar_url, cover_image_url, created_at
                 FROM users
                 WHERE username = ?1 COLLATE NOCASE OR email = ?1",
                params![username_or_email],
                row_to_user,
            )
            .map_err(not_found)
    }

    /// Whether a user already claims the username or email.
    pub fn username_or_email_taken(&self, username: &str, email: &str) -> Result<bool> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM users
             WHERE username = ?1 COLLATE NOCASE OR email = ?2",
            params![username, email],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Update the mutable account fields. Returns the updated record.
    pub fn update_user_profile(
        &self,
        id: Uuid,
        full_name: Option<&str>,
        email: Option<&str>,
    ) -> Result<User> {
        let affected = self.conn().execute(
            "UPDATE users SET
                 full_name = COALESCE(?2, full_name),
                 email = COALESCE(?3, email)
             WHERE id = ?1",
            params![id.to_string(), full_name, email],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_user(id)
    }

    /// Replace the stored password hash.
    pub fn update_user_password(&self, id: Uuid, password_hash: &str) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE users SET password_hash = ?2 WHERE id = ?1",
            params![id.to_string(), password_hash],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Replace the avatar URL. Returns the previous URL so the caller can
    /// clean up the old media object.
    pub fn update_user_avatar(&self, id: Uuid, avatar_url: &str) -> Result<String> {
        let previous = self.get_user(id)?.avatar_url;
        self.conn().execute(
            "UPDATE users SET avatar_url = ?2 WHERE id = ?1",
            params![id.to_string(), avatar_url],
        )?;
        Ok(previous)
    }

    /// Replace the cover image URL. Returns the previous URL.
    pub fn update_user_cover_image(&self, id: Uuid, cover_image_url: &str) -> Result<String> {
        let previous = self.get_user(id)?.cover_image_url;
        self.conn().execute(
            "UPDATE users SET cover_image_url = ?2 WHERE id = ?1",
            params![id.to_string(), cover_image_url],
        )?;
        Ok(previous)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn not_found(e: rusqlite::Error) -> StoreError {
    match e {
        rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
        other => StoreError::Sqlite(other),
    }
}

/// Map a `rusqlite::Row` to a [`User`].
fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let id_str: String = row.get(0)?;
    let created_str: String = row.get(7)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(User {
        id,
        username: row.get(1)?,
        email: row.get(2)?,
        full_name: row.get(3)?,
        password_hash: row.get(4)?,
        avatar_url: row.get(5)?,
        cover_image_url: row.get(6)?,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixture_user;

    #[test]
    fn create_and_get() {
        let db = Database::open_in_memory().unwrap();
        let user = fixture_user(&db, "alice");

        let fetched = db.get_user(user.id).unwrap();
        assert_eq!(fetched, user);
    }

    #[test]
    fn username_lookup_is_case_insensitive() {
        let db = Database::open_in_memory().unwrap();
        let user = fixture_user(&db, "Alice");

        let fetched = db.get_user_by_username("aLiCe").unwrap();
        assert_eq!(fetched.id, user.id);
    }

    #[test]
    fn duplicate_username_is_conflict() {
        let db = Database::open_in_memory().unwrap();
        let first = fixture_user(&db, "taken");

        let mut dup = first.clone();
        dup.id = Uuid::new_v4();
        dup.email = "other@example.com".to_string();
        let err = db.create_user(&dup).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn missing_user_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let err = db.get_user(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[test]
    fn profile_update_keeps_unset_fields() {
        let db = Database::open_in_memory().unwrap();
        let user = fixture_user(&db, "bob");

        let updated = db
            .update_user_profile(user.id, Some("Robert Tables"), None)
            .unwrap();
        assert_eq!(updated.full_name, "Robert Tables");
        assert_eq!(updated.email, user.email);
    }

    #[test]
    fn avatar_update_returns_previous_url() {
        let db = Database::open_in_memory().unwrap();
        let user = fixture_user(&db, "carol");

        let prev = db.update_user_avatar(user.id, "/media/new").unwrap();
        assert_eq!(prev, "");
        let prev2 = db.update_user_avatar(user.id, "/media/newer").unwrap();
        assert_eq!(prev2, "/media/new");
    }
}
