//! Domain model structs persisted in the SQLite database, plus the derived
//! (never persisted) aggregation views.
//!
//! Every struct derives `Serialize` so it can be handed directly to the HTTP
//! layer; wire names are camelCase to match the public API envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A registered user. Every user is also a channel.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    /// PHC-formatted argon2id hash. Never serialized.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub avatar_url: String,
    pub cover_image_url: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// An authenticated session, resolved from an opaque bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Video
// ---------------------------------------------------------------------------

/// An uploaded video. `published` gates visibility in listing queries.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    /// Duration in seconds.
    pub duration: f64,
    pub views: i64,
    pub published: bool,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Comment
// ---------------------------------------------------------------------------

/// A comment on a video.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub video_id: Uuid,
    pub owner_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Community post
// ---------------------------------------------------------------------------

/// A text post on a user's channel, independent of any video.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommunityPost {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Playlist
// ---------------------------------------------------------------------------

/// A named, ordered collection of videos. A video appears at most once.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    /// Video ids in playlist order.
    pub videos: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Relation (likes, subscriptions)
// ---------------------------------------------------------------------------

/// What a relation row means. Determines which content table the object id
/// must reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationKind {
    /// Subject likes a video.
    LikeVideo,
    /// Subject likes a comment.
    LikeComment,
    /// Subject likes a community post.
    LikePost,
    /// Subject subscribes to a channel (user).
    Subscribe,
}

impl RelationKind {
    /// Stable TEXT encoding used in the `relations.kind` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::LikeVideo => "like_video",
            RelationKind::LikeComment => "like_comment",
            RelationKind::LikePost => "like_post",
            RelationKind::Subscribe => "subscribe",
        }
    }

    /// Inverse of [`RelationKind::as_str`].
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "like_video" => Some(RelationKind::LikeVideo),
            "like_comment" => Some(RelationKind::LikeComment),
            "like_post" => Some(RelationKind::LikePost),
            "subscribe" => Some(RelationKind::Subscribe),
            _ => None,
        }
    }
}

/// A toggled membership record ("user likes video", "user subscribes to
/// channel"). At most one exists per (subject, object, kind).
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub object_id: Uuid,
    pub kind: RelationKind,
    pub created_at: DateTime<Utc>,
}

/// Membership state reported by a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ToggleState {
    On,
    Off,
}

/// Result of flipping a relation: the new membership state, and the freshly
/// created record when the toggle turned the relation on.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Toggle {
    pub state: ToggleState,
    pub record: Option<Relation>,
}

// ---------------------------------------------------------------------------
// Derived views (computed on demand, never persisted)
// ---------------------------------------------------------------------------

/// Per-channel statistics. Zero-valued when the channel has no videos.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub total_videos: i64,
    pub total_views: i64,
    pub total_subscribers: i64,
}

/// Public channel profile: a fixed whitelist of user fields plus derived
/// subscription figures.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub avatar_url: String,
    pub cover_image_url: String,
    pub subscribers_count: i64,
    pub subscribed_to_count: i64,
    /// Whether the requesting viewer subscribes to this channel. `false`
    /// for anonymous viewers.
    pub is_subscribed: bool,
}

/// One watch-history entry.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WatchEntry {
    pub video: Video,
    pub watched_at: DateTime<Utc>,
}
