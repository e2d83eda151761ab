//! Relation store and toggle engine.
//!
//! A relation is a set membership record: "subject likes object" or
//! "subject subscribes to object". The table carries a primary key on
//! (subject, object, kind), so insert/delete behave as set operations and
//! counts are always derivable -- nothing is stored redundantly.
//!
//! [`Database::toggle_relation`] is deliberately not a read-then-write
//! sequence. It is expressed as a conditional insert (ignored on duplicate
//! key) followed, only when nothing was inserted, by a conditional delete.
//! Whichever statement affects a row decides the reported state, so two
//! concurrent toggles on the same key each produce exactly one net state
//! flip.

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Relation, RelationKind, Toggle, ToggleState};

impl Database {
    /// Flip the membership state of (subject, object, kind).
    ///
    /// The referenced object must exist in its kind-specific table
    /// (`NotFound` otherwise). Returns the new state, with the freshly
    /// inserted record on toggle-on.
    pub fn toggle_relation(
        &self,
        subject_id: Uuid,
        object_id: Uuid,
        kind: RelationKind,
    ) -> Result<Toggle> {
        if !self.relation_object_exists(object_id, kind)? {
            return Err(StoreError::NotFound);
        }

        if let Some(record) = self.try_insert_relation(subject_id, object_id, kind)? {
            return Ok(Toggle {
                state: ToggleState::On,
                record: Some(record),
            });
        }

        let deleted = self.conn().execute(
            "DELETE FROM relations WHERE subject_id = ?1 AND object_id = ?2 AND kind = ?3",
            params![subject_id.to_string(), object_id.to_string(), kind.as_str()],
        )?;
        if deleted > 0 {
            return Ok(Toggle {
                state: ToggleState::Off,
                record: None,
            });
        }

        // Both branches lost a race: the row existed at insert time and was
        // gone by delete time. Retry the insert exactly once.
        if let Some(record) = self.try_insert_relation(subject_id, object_id, kind)? {
            return Ok(Toggle {
                state: ToggleState::On,
                record: Some(record),
            });
        }

        Err(StoreError::Conflict(
            "concurrent toggle on the same relation".to_string(),
        ))
    }

    /// Conditional insert keyed on the uniqueness invariant. Returns the new
    /// record, or `None` when the relation already existed.
    fn try_insert_relation(
        &self,
        subject_id: Uuid,
        object_id: Uuid,
        kind: RelationKind,
    ) -> Result<Option<Relation>> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        let inserted = self.conn().execute(
            "INSERT OR IGNORE INTO relations (id, subject_id, object_id, kind, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                id.to_string(),
                subject_id.to_string(),
                object_id.to_string(),
                kind.as_str(),
                now.to_rfc3339(),
            ],
        )?;

        if inserted == 0 {
            return Ok(None);
        }

        Ok(Some(Relation {
            id,
            subject_id,
            object_id,
            kind,
            created_at: now,
        }))
    }

    /// Whether a relation row exists for the key.
    pub fn relation_exists(
        &self,
        subject_id: Uuid,
        object_id: Uuid,
        kind: RelationKind,
    ) -> Result<bool> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM relations
             WHERE subject_id = ?1 AND object_id = ?2 AND kind = ?3",
            params![subject_id.to_string(), object_id.to_string(), kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Count relations of `kind` pointing at `object_id` (e.g. subscribers
    /// of a channel, likes on a video).
    pub fn count_relations_to(&self, kind: RelationKind, object_id: Uuid) -> Result<i64> {
        let count = self.conn().query_row(
            "SELECT COUNT(*) FROM relations WHERE kind = ?1 AND object_id = ?2",
            params![kind.as_str(), object_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Count relations of `kind` originating from `subject_id` (e.g. how
    /// many channels a user subscribes to).
    pub fn count_relations_from(&self, kind: RelationKind, subject_id: Uuid) -> Result<i64> {
        let count = self.conn().query_row(
            "SELECT COUNT(*) FROM relations WHERE kind = ?1 AND subject_id = ?2",
            params![kind.as_str(), subject_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// List relations of `kind` originating from `subject_id`, in insertion
    /// order.
    pub fn relations_from(&self, kind: RelationKind, subject_id: Uuid) -> Result<Vec<Relation>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, subject_id, object_id, kind, created_at
             FROM relations
             WHERE kind = ?1 AND subject_id = ?2
             ORDER BY created_at ASC, rowid ASC",
        )?;

        let rows = stmt.query_map(params![kind.as_str(), subject_id.to_string()], row_to_relation)?;

        let mut relations = Vec::new();
        for row in rows {
            relations.push(row?);
        }
        Ok(relations)
    }

    /// List relations of `kind` pointing at `object_id`, in insertion order.
    pub fn relations_to(&self, kind: RelationKind, object_id: Uuid) -> Result<Vec<Relation>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, subject_id, object_id, kind, created_at
             FROM relations
             WHERE kind = ?1 AND object_id = ?2
             ORDER BY created_at ASC, rowid ASC",
        )?;

        let rows = stmt.query_map(params![kind.as_str(), object_id.to_string()], row_to_relation)?;

        let mut relations = Vec::new();
        for row in rows {
            relations.push(row?);
        }
        Ok(relations)
    }

    /// Remove every relation of `kind` pointing at `object_id`. Called when
    /// the object itself is deleted, so likes never reference dead content.
    pub(crate) fn delete_relations_to(&self, kind: RelationKind, object_id: Uuid) -> Result<usize> {
        let deleted = self.conn().execute(
            "DELETE FROM relations WHERE kind = ?1 AND object_id = ?2",
            params![kind.as_str(), object_id.to_string()],
        )?;
        Ok(deleted)
    }

    /// Whether the object a relation of this kind points at actually exists.
    fn relation_object_exists(&self, object_id: Uuid, kind: RelationKind) -> Result<bool> {
        let table = match kind {
            RelationKind::LikeVideo => "videos",
            RelationKind::LikeComment => "comments",
            RelationKind::LikePost => "community_posts",
            RelationKind::Subscribe => "users",
        };
        let sql = format!("SELECT COUNT(*) FROM {table} WHERE id = ?1");
        let count: i64 =
            self.conn()
                .query_row(&sql, params![object_id.to_string()], |row| row.get(0))?;
        Ok(count > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` to a [`Relation`].
fn row_to_relation(row: &rusqlite::Row<'_>) -> rusqlite::Result<Relation> {
    let id_str: String = row.get(0)?;
    let subject_str: String = row.get(1)?;
    let object_str: String = row.get(2)?;
    let kind_str: String = row.get(3)?;
    let created_str: String = row.get(4)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let subject_id = Uuid::parse_str(&subject_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let object_id = Uuid::parse_str(&object_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let kind = RelationKind::from_str(&kind_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown relation kind: {kind_str}").into(),
        )
    })?;
    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Relation {
        id,
        subject_id,
        object_id,
        kind,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixture_user, fixture_video};

    #[test]
    fn toggle_pair_returns_to_original_state() {
        let db = Database::open_in_memory().unwrap();
        let user = fixture_user(&db, "alice");
        let video = fixture_video(&db, user.id, "first", 0);

        let on = db
            .toggle_relation(user.id, video.id, RelationKind::LikeVideo)
            .unwrap();
        assert_eq!(on.state, ToggleState::On);
        assert!(on.record.is_some());

        let off = db
            .toggle_relation(user.id, video.id, RelationKind::LikeVideo)
            .unwrap();
        assert_eq!(off.state, ToggleState::Off);
        assert!(off.record.is_none());

        let on_again = db
            .toggle_relation(user.id, video.id, RelationKind::LikeVideo)
            .unwrap();
        assert_eq!(on_again.state, ToggleState::On);
    }

    #[test]
    fn toggle_parity_row_counts() {
        let db = Database::open_in_memory().unwrap();
        let user = fixture_user(&db, "bob");
        let video = fixture_video(&db, user.id, "clip", 0);

        // Odd number of toggles: exactly one row.
        for _ in 0..3 {
            db.toggle_relation(user.id, video.id, RelationKind::LikeVideo)
                .unwrap();
        }
        assert_eq!(
            db.count_relations_to(RelationKind::LikeVideo, video.id)
                .unwrap(),
            1
        );

        // One more (even total): zero rows.
        db.toggle_relation(user.id, video.id, RelationKind::LikeVideo)
            .unwrap();
        assert_eq!(
            db.count_relations_to(RelationKind::LikeVideo, video.id)
                .unwrap(),
            0
        );
    }

    #[test]
    fn toggle_missing_object_is_not_found_and_writes_nothing() {
        let db = Database::open_in_memory().unwrap();
        let user = fixture_user(&db, "carol");
        let missing = Uuid::new_v4();

        let err = db
            .toggle_relation(user.id, missing, RelationKind::LikeVideo)
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
        assert_eq!(
            db.count_relations_from(RelationKind::LikeVideo, user.id)
                .unwrap(),
            0
        );
    }

    #[test]
    fn subscribe_targets_users_table() {
        let db = Database::open_in_memory().unwrap();
        let viewer = fixture_user(&db, "viewer");
        let channel = fixture_user(&db, "channel");

        let on = db
            .toggle_relation(viewer.id, channel.id, RelationKind::Subscribe)
            .unwrap();
        assert_eq!(on.state, ToggleState::On);
        assert!(db
            .relation_exists(viewer.id, channel.id, RelationKind::Subscribe)
            .unwrap());
    }

    #[test]
    fn relations_from_preserves_insertion_order() {
        let db = Database::open_in_memory().unwrap();
        let user = fixture_user(&db, "dave");
        let a = fixture_video(&db, user.id, "a", 0);
        let b = fixture_video(&db, user.id, "b", 0);
        let c = fixture_video(&db, user.id, "c", 0);

        for video in [&a, &b, &c] {
            db.toggle_relation(user.id, video.id, RelationKind::LikeVideo)
                .unwrap();
        }

        let relations = db.relations_from(RelationKind::LikeVideo, user.id).unwrap();
        let objects: Vec<Uuid> = relations.iter().map(|r| r.object_id).collect();
        assert_eq!(objects, vec![a.id, b.id, c.id]);
    }
}
