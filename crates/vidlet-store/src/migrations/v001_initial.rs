//! v001 -- Initial schema creation.
//!
//! Creates the content tables (`users`, `videos`, `comments`,
//! `community_posts`, `playlists`, `playlist_videos`), the generic
//! `relations` table backing likes and subscriptions, and the auth tables
//! (`sessions`, `watch_history`).

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users (channels)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id              TEXT PRIMARY KEY NOT NULL,          -- UUID v4
    username        TEXT NOT NULL COLLATE NOCASE UNIQUE,
    email           TEXT NOT NULL UNIQUE,
    full_name       TEXT NOT NULL,
    password_hash   TEXT NOT NULL,                      -- PHC string (argon2id)
    avatar_url      TEXT NOT NULL DEFAULT '',
    cover_image_url TEXT NOT NULL DEFAULT '',
    created_at      TEXT NOT NULL                       -- ISO-8601 / RFC-3339
);

-- ----------------------------------------------------------------
-- Sessions (opaque bearer tokens)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS sessions (
    token      TEXT PRIMARY KEY NOT NULL,               -- 64 hex chars
    user_id    TEXT NOT NULL,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL,

    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);

-- ----------------------------------------------------------------
-- Videos
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS videos (
    id            TEXT PRIMARY KEY NOT NULL,            -- UUID v4
    owner_id      TEXT NOT NULL,
    title         TEXT NOT NULL,
    description   TEXT NOT NULL,
    video_url     TEXT NOT NULL,
    thumbnail_url TEXT NOT NULL,
    duration      REAL NOT NULL DEFAULT 0,              -- seconds
    views         INTEGER NOT NULL DEFAULT 0,
    published     INTEGER NOT NULL DEFAULT 1,           -- boolean 0/1
    created_at    TEXT NOT NULL,

    FOREIGN KEY (owner_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_videos_owner ON videos(owner_id);

-- ----------------------------------------------------------------
-- Comments
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS comments (
    id         TEXT PRIMARY KEY NOT NULL,               -- UUID v4
    video_id   TEXT NOT NULL,
    owner_id   TEXT NOT NULL,
    content    TEXT NOT NULL,
    created_at TEXT NOT NULL,

    FOREIGN KEY (video_id) REFERENCES videos(id) ON DELETE CASCADE,
    FOREIGN KEY (owner_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_comments_video ON comments(video_id, created_at DESC);

-- ----------------------------------------------------------------
-- Community posts
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS community_posts (
    id         TEXT PRIMARY KEY NOT NULL,               -- UUID v4
    owner_id   TEXT NOT NULL,
    content    TEXT NOT NULL,
    created_at TEXT NOT NULL,

    FOREIGN KEY (owner_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_posts_owner ON community_posts(owner_id);

-- ----------------------------------------------------------------
-- Playlists
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS playlists (
    id          TEXT PRIMARY KEY NOT NULL,              -- UUID v4
    owner_id    TEXT NOT NULL,
    name        TEXT NOT NULL,
    description TEXT NOT NULL,
    created_at  TEXT NOT NULL,

    FOREIGN KEY (owner_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_playlists_owner ON playlists(owner_id);

-- Ordered video membership; a video may appear at most once per playlist.
CREATE TABLE IF NOT EXISTS playlist_videos (
    playlist_id TEXT NOT NULL,
    video_id    TEXT NOT NULL,
    position    INTEGER NOT NULL,

    PRIMARY KEY (playlist_id, video_id),
    FOREIGN KEY (playlist_id) REFERENCES playlists(id) ON DELETE CASCADE,
    FOREIGN KEY (video_id) REFERENCES videos(id) ON DELETE CASCADE
);

-- ----------------------------------------------------------------
-- Relations (likes, subscriptions)
-- ----------------------------------------------------------------
-- Set membership records: at most one row per (subject, object, kind).
CREATE TABLE IF NOT EXISTS relations (
    id         TEXT NOT NULL,                           -- UUID v4
    subject_id TEXT NOT NULL,                           -- the acting user
    object_id  TEXT NOT NULL,                           -- video/comment/post/channel
    kind       TEXT NOT NULL,                           -- like_video | like_comment | like_post | subscribe
    created_at TEXT NOT NULL,

    PRIMARY KEY (subject_id, object_id, kind)
);

CREATE INDEX IF NOT EXISTS idx_relations_object ON relations(kind, object_id);
CREATE INDEX IF NOT EXISTS idx_relations_subject ON relations(kind, subject_id);

-- ----------------------------------------------------------------
-- Watch history (latest watch wins)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS watch_history (
    user_id    TEXT NOT NULL,
    video_id   TEXT NOT NULL,
    watched_at TEXT NOT NULL,

    PRIMARY KEY (user_id, video_id),
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (video_id) REFERENCES videos(id) ON DELETE CASCADE
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
