//! # vidlet-store
//!
//! Persistence layer for the vidlet backend, backed by SQLite.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers for every domain
//! model, the relation toggle engine (likes and subscriptions), and the
//! derived aggregation queries (channel stats, channel profile, liked
//! videos).

pub mod aggregates;
pub mod comments;
pub mod database;
pub mod migrations;
pub mod models;
pub mod playlists;
pub mod posts;
pub mod relations;
pub mod sessions;
pub mod users;
pub mod videos;

mod error;

#[cfg(test)]
pub(crate) mod test_support;

pub use database::Database;
pub use error::StoreError;
pub use models::*;
pub use videos::{VideoQuery, VideoSort};
