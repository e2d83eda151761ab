//! CRUD operations for [`Video`] records, plus view counting and watch
//! history.

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{RelationKind, Video, WatchEntry};

/// Sortable columns for video listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoSort {
    #[default]
    CreatedAt,
    Views,
    Duration,
    Title,
}

impl VideoSort {
    fn column(&self) -> &'static str {
        match self {
            VideoSort::CreatedAt => "created_at",
            VideoSort::Views => "views",
            VideoSort::Duration => "duration",
            VideoSort::Title => "title",
        }
    }

    /// Parse a query-string value; unknown values fall back to `CreatedAt`.
    pub fn parse(s: &str) -> Self {
        match s {
            "views" => VideoSort::Views,
            "duration" => VideoSort::Duration,
            "title" => VideoSort::Title,
            _ => VideoSort::CreatedAt,
        }
    }
}

/// Filter for the public video listing. Only published videos are returned.
#[derive(Debug, Clone, Default)]
pub struct VideoQuery {
    /// Restrict to one owner (channel).
    pub owner_id: Option<Uuid>,
    /// Case-insensitive substring match on title or description.
    pub search: Option<String>,
    /// 1-based page number.
    pub page: u32,
    pub limit: u32,
    pub sort: VideoSort,
    pub ascending: bool,
}

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new video.
    pub fn create_video(&self, video: &Video) -> Result<()> {
        self.conn().execute(
            "INSERT INTO videos (id, owner_id, title, description, video_url,
                                 thumbnail_url, duration, views, published, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                video.id.to_string(),
                video.owner_id.to_string(),
                video.title,
                video.description,
                video.video_url,
                video.thumbnail_url,
                video.duration,
                video.views,
                video.published as i64,
                video.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single video by UUID.
    pub fn get_video(&self, id: Uuid) -> Result<Video> {
        self.conn()
            .query_row(
                &format!("SELECT {VIDEO_COLUMNS} FROM videos WHERE id = ?1"),
                params![id.to_string()],
                row_to_video,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// List published videos matching the filter, paginated.
    pub fn list_videos(&self, query: &VideoQuery) -> Result<Vec<Video>> {
        let page = query.page.max(1);
        let limit = query.limit.clamp(1, 100);
        // Widen before multiplying; page is client-controlled and u32 math
        // would overflow on large page numbers.
        let offset = i64::from(page - 1) * i64::from(limit);
        let direction = if query.ascending { "ASC" } else { "DESC" };

        // Sort column comes from the VideoSort whitelist, never from input.
        let sql = format!(
            "SELECT {VIDEO_COLUMNS} FROM videos
             WHERE published = 1
               AND (?1 IS NULL OR owner_id = ?1)
               AND (?2 IS NULL OR title LIKE ?2 OR description LIKE ?2)
             ORDER BY {} {direction}
             LIMIT ?3 OFFSET ?4",
            query.sort.column()
        );

        let owner = query.owner_id.map(|id| id.to_string());
        let pattern = query.search.as_ref().map(|s| format!("%{s}%"));

        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params![owner, pattern, limit, offset], row_to_video)?;

        let mut videos = Vec::new();
        for row in rows {
            videos.push(row?);
        }
        Ok(videos)
    }

    /// List every video owned by a channel, published or not, newest first.
    pub fn list_channel_videos(&self, owner_id: Uuid) -> Result<Vec<Video>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {VIDEO_COLUMNS} FROM videos
             WHERE owner_id = ?1
             ORDER BY created_at DESC"
        ))?;

        let rows = stmt.query_map(params![owner_id.to_string()], row_to_video)?;

        let mut videos = Vec::new();
        for row in rows {
            videos.push(row?);
        }
        Ok(videos)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Update title, description and/or thumbnail. Unset fields keep their
    /// current value. Returns the updated record.
    pub fn update_video(
        &self,
        id: Uuid,
        title: Option<&str>,
        description: Option<&str>,
        thumbnail_url: Option<&str>,
    ) -> Result<Video> {
        let affected = self.conn().execute(
            "UPDATE videos SET
                 title = COALESCE(?2, title),
                 description = COALESCE(?3, description),
                 thumbnail_url = COALESCE(?4, thumbnail_url)
             WHERE id = ?1",
            params![id.to_string(), title, description, thumbnail_url],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_video(id)
    }

    /// Flip the published flag. Returns the updated record.
    pub fn toggle_video_published(&self, id: Uuid) -> Result<Video> {
        let affected = self.conn().execute(
            "UPDATE videos SET published = 1 - published WHERE id = ?1",
            params![id.to_string()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_video(id)
    }

    /// Add one to the view counter.
    pub fn increment_video_views(&self, id: Uuid) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE videos SET views = views + 1 WHERE id = ?1",
            params![id.to_string()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete a video, returning the deleted record so the caller can clean
    /// up its media objects. Like relations on the video go with it.
    pub fn delete_video(&self, id: Uuid) -> Result<Video> {
        let video = self.get_video(id)?;
        self.conn()
            .execute("DELETE FROM videos WHERE id = ?1", params![id.to_string()])?;
        self.delete_relations_to(RelationKind::LikeVideo, id)?;
        Ok(video)
    }

    // ------------------------------------------------------------------
    // Watch history
    // ------------------------------------------------------------------

    /// Record that `user_id` watched `video_id` now; a repeat watch just
    /// refreshes the timestamp.
    pub fn record_watch(&self, user_id: Uuid, video_id: Uuid) -> Result<()> {
        self.conn().execute(
            "INSERT INTO watch_history (user_id, video_id, watched_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (user_id, video_id) DO UPDATE SET watched_at = excluded.watched_at",
            params![
                user_id.to_string(),
                video_id.to_string(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// The user's watch history, most recent first.
    pub fn watch_history(&self, user_id: Uuid) -> Result<Vec<WatchEntry>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {}, h.watched_at
             FROM watch_history h
             JOIN videos v ON v.id = h.video_id
             WHERE h.user_id = ?1
             ORDER BY h.watched_at DESC",
            VIDEO_COLUMNS_PREFIXED
        ))?;

        let rows = stmt.query_map(params![user_id.to_string()], |row| {
            let video = row_to_video(row)?;
            let watched_str: String = row.get(10)?;
            let watched_at = DateTime::parse_from_rfc3339(&watched_str)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        10,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
            Ok(WatchEntry { video, watched_at })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const VIDEO_COLUMNS: &str =
    "id, owner_id, title, description, video_url, thumbnail_url, duration, views, published, created_at";

const VIDEO_COLUMNS_PREFIXED: &str =
    "v.id, v.owner_id, v.title, v.description, v.video_url, v.thumbnail_url, v.duration, v.views, v.published, v.created_at";

/// Map a `rusqlite::Row` to a [`Video`].
fn row_to_video(row: &rusqlite::Row<'_>) -> rusqlite::Result<Video> {
    let id_str: String = row.get(0)?;
    let owner_str: String = row.get(1)?;
    let published: i64 = row.get(8)?;
    let created_str: String = row.get(9)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let owner_id = Uuid::parse_str(&owner_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(9, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Video {
        id,
        owner_id,
        title: row.get(2)?,
        description: row.get(3)?,
        video_url: row.get(4)?,
        thumbnail_url: row.get(5)?,
        duration: row.get(6)?,
        views: row.get(7)?,
        published: published != 0,
        created_at,
    })
}
