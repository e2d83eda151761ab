//! CRUD operations for [`CommunityPost`] records.

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{CommunityPost, RelationKind};

impl Database {
    /// Insert a new community post.
    pub fn create_post(&self, post: &CommunityPost) -> Result<()> {
        self.conn().execute(
            "INSERT INTO community_posts (id, owner_id, content, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                post.id.to_string(),
                post.owner_id.to_string(),
                post.content,
                post.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Fetch a single post by UUID.
    pub fn get_post(&self, id: Uuid) -> Result<CommunityPost> {
        self.conn()
            .query_row(
                "SELECT id, owner_id, content, created_at
                 FROM community_posts
                 WHERE id = ?1",
                params![id.to_string()],
                row_to_post,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// List all posts by a user, newest first.
    pub fn list_user_posts(&self, owner_id: Uuid) -> Result<Vec<CommunityPost>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, owner_id, content, created_at
             FROM community_posts
             WHERE owner_id = ?1
             ORDER BY created_at DESC",
        )?;

        let rows = stmt.query_map(params![owner_id.to_string()], row_to_post)?;

        let mut posts = Vec::new();
        for row in rows {
            posts.push(row?);
        }
        Ok(posts)
    }

    /// Replace a post's content. Returns the updated record.
    pub fn update_post(&self, id: Uuid, content: &str) -> Result<CommunityPost> {
        let affected = self.conn().execute(
            "UPDATE community_posts SET content = ?2 WHERE id = ?1",
            params![id.to_string(), content],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_post(id)
    }

    /// Delete a post by UUID. Like relations on the post go with it.
    pub fn delete_post(&self, id: Uuid) -> Result<()> {
        let affected = self.conn().execute(
            "DELETE FROM community_posts WHERE id = ?1",
            params![id.to_string()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.delete_relations_to(RelationKind::LikePost, id)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` to a [`CommunityPost`].
fn row_to_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<CommunityPost> {
    let id_str: String = row.get(0)?;
    let owner_str: String = row.get(1)?;
    let created_str: String = row.get(3)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let owner_id = Uuid::parse_str(&owner_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(CommunityPost {
        id,
        owner_id,
        content: row.get(2)?,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixture_post, fixture_user};

    #[test]
    fn create_get_update_delete() {
        let db = Database::open_in_memory().unwrap();
        let user = fixture_user(&db, "alice");
        let post = fixture_post(&db, user.id, "hello channel");

        assert_eq!(db.get_post(post.id).unwrap(), post);

        let updated = db.update_post(post.id, "edited").unwrap();
        assert_eq!(updated.content, "edited");

        db.toggle_relation(user.id, post.id, RelationKind::LikePost)
            .unwrap();
        db.delete_post(post.id).unwrap();
        assert!(matches!(
            db.get_post(post.id).unwrap_err(),
            StoreError::NotFound
        ));
        // Any like rows went with it.
        assert_eq!(
            db.count_relations_to(RelationKind::LikePost, post.id).unwrap(),
            0
        );
    }

    #[test]
    fn listing_is_scoped_to_owner() {
        let db = Database::open_in_memory().unwrap();
        let alice = fixture_user(&db, "alice");
        let bob = fixture_user(&db, "bob");
        fixture_post(&db, alice.id, "mine");
        fixture_post(&db, bob.id, "theirs");

        let posts = db.list_user_posts(alice.id).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].content, "mine");
    }
}
