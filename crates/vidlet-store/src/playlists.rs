//! CRUD operations for [`Playlist`] records and their ordered video
//! membership.
//!
//! Invariant: a video appears at most once per playlist, enforced by the
//! primary key on `playlist_videos(playlist_id, video_id)`.

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Playlist;

impl Database {
    /// Insert a new, empty playlist.
    pub fn create_playlist(&self, playlist: &Playlist) -> Result<()> {
        self.conn().execute(
            "INSERT INTO playlists (id, owner_id, name, description, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                playlist.id.to_string(),
                playlist.owner_id.to_string(),
                playlist.name,
                playlist.description,
                playlist.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Fetch a playlist with its videos in playlist order.
    pub fn get_playlist(&self, id: Uuid) -> Result<Playlist> {
        let (owner_id, name, description, created_at) = self
            .conn()
            .query_row(
                "SELECT owner_id, name, description, created_at
                 FROM playlists
                 WHERE id = ?1",
                params![id.to_string()],
                row_to_playlist_head,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })?;

        let videos = self.playlist_video_ids(id)?;

        Ok(Playlist {
            id,
            owner_id,
            name,
            description,
            videos,
            created_at,
        })
    }

    /// List all playlists of a user, newest first.
    pub fn list_user_playlists(&self, owner_id: Uuid) -> Result<Vec<Playlist>> {
        let mut stmt = self.conn().prepare(
            "SELECT id FROM playlists
             WHERE owner_id = ?1
             ORDER BY created_at DESC",
        )?;

        let ids = stmt
            .query_map(params![owner_id.to_string()], |row| {
                row.get::<_, String>(0)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut playlists = Vec::with_capacity(ids.len());
        for id_str in ids {
            playlists.push(self.get_playlist(Uuid::parse_str(&id_str)?)?);
        }
        Ok(playlists)
    }

    /// Rename / re-describe a playlist. Returns the updated record.
    pub fn update_playlist(
        &self,
        id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Playlist> {
        let affected = self.conn().execute(
            "UPDATE playlists SET
                 name = COALESCE(?2, name),
                 description = COALESCE(?3, description)
             WHERE id = ?1",
            params![id.to_string(), name, description],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_playlist(id)
    }

    /// Delete a playlist (membership rows cascade).
    pub fn delete_playlist(&self, id: Uuid) -> Result<()> {
        let affected = self.conn().execute(
            "DELETE FROM playlists WHERE id = ?1",
            params![id.to_string()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Append a video to a playlist. `Conflict` if it is already a member,
    /// `NotFound` if either the playlist or the video does not exist.
    pub fn add_video_to_playlist(&self, playlist_id: Uuid, video_id: Uuid) -> Result<Playlist> {
        // Both must exist before touching the membership table.
        self.get_video(video_id)?;
        let playlist = self.get_playlist(playlist_id)?;

        let inserted = self.conn().execute(
            "INSERT OR IGNORE INTO playlist_videos (playlist_id, video_id, position)
             SELECT ?1, ?2, COALESCE(MAX(position), -1) + 1
             FROM playlist_videos WHERE playlist_id = ?1",
            params![playlist_id.to_string(), video_id.to_string()],
        )?;

        if inserted == 0 {
            return Err(StoreError::Conflict(format!(
                "video already in playlist '{}'",
                playlist.name
            )));
        }

        self.get_playlist(playlist_id)
    }

    /// Remove a video from a playlist. `NotFound` when the playlist does not
    /// exist; removing a video that is not a member is a no-op.
    pub fn remove_video_from_playlist(
        &self,
        playlist_id: Uuid,
        video_id: Uuid,
    ) -> Result<Playlist> {
        self.get_playlist(playlist_id)?;

        self.conn().execute(
            "DELETE FROM playlist_videos WHERE playlist_id = ?1 AND video_id = ?2",
            params![playlist_id.to_string(), video_id.to_string()],
        )?;

        self.get_playlist(playlist_id)
    }

    fn playlist_video_ids(&self, playlist_id: Uuid) -> Result<Vec<Uuid>> {
        let mut stmt = self.conn().prepare(
            "SELECT video_id FROM playlist_videos
             WHERE playlist_id = ?1
             ORDER BY position ASC",
        )?;

        let rows = stmt.query_map(params![playlist_id.to_string()], |row| {
            row.get::<_, String>(0)
        })?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(Uuid::parse_str(&row?)?);
        }
        Ok(ids)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

type PlaylistHead = (Uuid, String, String, DateTime<Utc>);

fn row_to_playlist_head(row: &rusqlite::Row<'_>) -> rusqlite::Result<PlaylistHead> {
    let owner_str: String = row.get(0)?;
    let created_str: String = row.get(3)?;

    let owner_id = Uuid::parse_str(&owner_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok((owner_id, row.get(1)?, row.get(2)?, created_at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixture_user, fixture_video};

    fn fixture_playlist(db: &Database, owner_id: Uuid, name: &str) -> Playlist {
        let playlist = Playlist {
            id: Uuid::new_v4(),
            owner_id,
            name: name.to_string(),
            description: format!("{name} description"),
            videos: Vec::new(),
            created_at: Utc::now(),
        };
        db.create_playlist(&playlist).unwrap();
        playlist
    }

    #[test]
    fn create_and_get_empty() {
        let db = Database::open_in_memory().unwrap();
        let user = fixture_user(&db, "alice");
        let playlist = fixture_playlist(&db, user.id, "favs");

        let fetched = db.get_playlist(playlist.id).unwrap();
        assert_eq!(fetched, playlist);
        assert!(fetched.videos.is_empty());
    }

    #[test]
    fn add_preserves_order_and_rejects_duplicates() {
        let db = Database::open_in_memory().unwrap();
        let user = fixture_user(&db, "bob");
        let playlist = fixture_playlist(&db, user.id, "mix");
        let a = fixture_video(&db, user.id, "a", 0);
        let b = fixture_video(&db, user.id, "b", 0);

        db.add_video_to_playlist(playlist.id, a.id).unwrap();
        let updated = db.add_video_to_playlist(playlist.id, b.id).unwrap();
        assert_eq!(updated.videos, vec![a.id, b.id]);

        let err = db.add_video_to_playlist(playlist.id, a.id).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        // Playlist unchanged after the rejected add.
        assert_eq!(db.get_playlist(playlist.id).unwrap().videos, vec![a.id, b.id]);
    }

    #[test]
    fn remove_video() {
        let db = Database::open_in_memory().unwrap();
        let user = fixture_user(&db, "carol");
        let playlist = fixture_playlist(&db, user.id, "mix");
        let a = fixture_video(&db, user.id, "a", 0);
        let b = fixture_video(&db, user.id, "b", 0);
        db.add_video_to_playlist(playlist.id, a.id).unwrap();
        db.add_video_to_playlist(playlist.id, b.id).unwrap();

        let updated = db.remove_video_from_playlist(playlist.id, a.id).unwrap();
        assert_eq!(updated.videos, vec![b.id]);
    }

    #[test]
    fn add_to_missing_playlist_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let user = fixture_user(&db, "dave");
        let video = fixture_video(&db, user.id, "v", 0);

        let err = db
            .add_video_to_playlist(Uuid::new_v4(), video.id)
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }
}
