//! Derived read-side views over the content and relation tables.
//!
//! Nothing here is persisted or cached: every call recomputes from current
//! store state, so results are always consistent with the latest writes.
//! Absent aggregation groups come back as zero, never as null.

use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{ChannelProfile, ChannelStats, RelationKind};

impl Database {
    /// Per-channel statistics: video count, summed views, subscriber count.
    ///
    /// `NotFound` when the channel user does not exist. A channel with no
    /// videos reports zeros.
    pub fn channel_stats(&self, channel_id: Uuid) -> Result<ChannelStats> {
        // Both queries bind the same typed channel id.
        let channel = channel_id.to_string();

        if !self.user_exists(&channel)? {
            return Err(StoreError::NotFound);
        }

        let (total_videos, total_views): (i64, i64) = self.conn().query_row(
            "SELECT COUNT(*), COALESCE(SUM(views), 0)
             FROM videos
             WHERE owner_id = ?1",
            params![channel],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let total_subscribers = self.count_relations_to(RelationKind::Subscribe, channel_id)?;

        Ok(ChannelStats {
            total_videos,
            total_views,
            total_subscribers,
        })
    }

    /// Public channel profile for a username (case-insensitive), with
    /// subscription figures relative to an optional viewer.
    ///
    /// Anonymous viewers (`viewer_id == None`) get `is_subscribed == false`.
    pub fn channel_profile(
        &self,
        username: &str,
        viewer_id: Option<Uuid>,
    ) -> Result<ChannelProfile> {
        let channel = self.get_user_by_username(username)?;

        let subscribers_count = self.count_relations_to(RelationKind::Subscribe, channel.id)?;
        let subscribed_to_count = self.count_relations_from(RelationKind::Subscribe, channel.id)?;

        let is_subscribed = match viewer_id {
            Some(viewer) => self.relation_exists(viewer, channel.id, RelationKind::Subscribe)?,
            None => false,
        };

        Ok(ChannelProfile {
            id: channel.id,
            username: channel.username,
            full_name: channel.full_name,
            email: channel.email,
            avatar_url: channel.avatar_url,
            cover_image_url: channel.cover_image_url,
            subscribers_count,
            subscribed_to_count,
            is_subscribed,
        })
    }

    /// Ids of the videos a viewer has liked, in like order (oldest first).
    pub fn liked_video_ids(&self, viewer_id: Uuid) -> Result<Vec<Uuid>> {
        let relations = self.relations_from(RelationKind::LikeVideo, viewer_id)?;
        Ok(relations.into_iter().map(|r| r.object_id).collect())
    }

    /// Ids of the subscribers of a channel, in subscription order.
    pub fn channel_subscriber_ids(&self, channel_id: Uuid) -> Result<Vec<Uuid>> {
        let relations = self.relations_to(RelationKind::Subscribe, channel_id)?;
        Ok(relations.into_iter().map(|r| r.subject_id).collect())
    }

    /// Ids of the channels a user subscribes to, in subscription order.
    pub fn subscribed_channel_ids(&self, subscriber_id: Uuid) -> Result<Vec<Uuid>> {
        let relations = self.relations_from(RelationKind::Subscribe, subscriber_id)?;
        Ok(relations.into_iter().map(|r| r.object_id).collect())
    }

    fn user_exists(&self, id: &str) -> Result<bool> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM users WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}
