//! CRUD operations for [`Comment`] records.

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Comment, RelationKind};

impl Database {
    /// Insert a new comment. The video must exist.
    pub fn create_comment(&self, comment: &Comment) -> Result<()> {
        // The FK is enforced by SQLite, but a missing video should surface
        // as NotFound rather than a constraint error.
        self.get_video(comment.video_id)?;

        self.conn().execute(
            "INSERT INTO comments (id, video_id, owner_id, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                comment.id.to_string(),
                comment.video_id.to_string(),
                comment.owner_id.to_string(),
                comment.content,
                comment.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Fetch a single comment by UUID.
    pub fn get_comment(&self, id: Uuid) -> Result<Comment> {
        self.conn()
            .query_row(
                "SELECT id, video_id, owner_id, content, created_at
                 FROM comments
                 WHERE id = ?1",
                params![id.to_string()],
                row_to_comment,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// List comments on a video, newest first, paginated.
    pub fn list_video_comments(&self, video_id: Uuid, page: u32, limit: u32) -> Result<Vec<Comment>> {
        let page = page.max(1);
        let limit = limit.clamp(1, 100);
        // Widen before multiplying; page is client-controlled and u32 math
        // would overflow on large page numbers.
        let offset = i64::from(page - 1) * i64::from(limit);

        let mut stmt = self.conn().prepare(
            "SELECT id, video_id, owner_id, content, created_at
             FROM comments
             WHERE video_id = ?1
             ORDER BY created_at DESC
             LIMIT ?2 OFFSET ?3",
        )?;

        let rows = stmt.query_map(params![video_id.to_string(), limit, offset], row_to_comment)?;

        let mut comments = Vec::new();
        for row in rows {
            comments.push(row?);
        }
        Ok(comments)
    }

    /// Replace a comment's content. Returns the updated record.
    pub fn update_comment(&self, id: Uuid, content: &str) -> Result<Comment> {
        let affected = self.conn().execute(
            "UPDATE comments SET content = ?2 WHERE id = ?1",
            params![id.to_string(), content],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_comment(id)
    }

    /// Delete a comment by UUID. Like relations on the comment go with it.
    pub fn delete_comment(&self, id: Uuid) -> Result<()> {
        let affected = self
            .conn()
            .execute("DELETE FROM comments WHERE id = ?1", params![id.to_string()])?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.delete_relations_to(RelationKind::LikeComment, id)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` to a [`Comment`].
fn row_to_comment(row: &rusqlite::Row<'_>) -> rusqlite::Result<Comment> {
    let id_str: String = row.get(0)?;
    let video_str: String = row.get(1)?;
    let owner_str: String = row.get(2)?;
    let created_str: String = row.get(4)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let video_id = Uuid::parse_str(&video_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let owner_id = Uuid::parse_str(&owner_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Comment {
        id,
        video_id,
        owner_id,
        content: row.get(3)?,
        created_at,
    })
}
