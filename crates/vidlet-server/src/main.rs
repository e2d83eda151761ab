//! # vidlet-server
//!
//! HTTP backend for the Vidlet video-sharing platform.
//!
//! This binary provides:
//! - **REST API** (axum) for accounts, videos, comments, community posts,
//!   playlists, likes, subscriptions, and the channel dashboard
//! - **SQLite persistence** via `vidlet-store`
//! - **Disk-backed media storage** for video files, thumbnails, avatars, and
//!   cover images, served from `/media/{id}`
//! - **Session auth** with opaque bearer tokens and periodic expiry cleanup

mod auth;
mod config;
mod error;
mod media_store;
mod response;
mod routes;

use std::sync::{Arc, Mutex};

use tracing::info;
use tracing_subscriber::EnvFilter;
use vidlet_store::Database;

use crate::config::ServerConfig;
use crate::media_store::MediaStore;
use crate::routes::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,vidlet_server=debug")),
        )
        .init();

    info!("Starting Vidlet server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------

    // Media store (creates directory if missing)
    let media = Arc::new(
        MediaStore::new(config.media_storage_path.clone(), config.max_upload_size).await?,
    );

    // Database (creates the parent directory if missing)
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let db = Arc::new(Mutex::new(Database::open_at(&config.db_path)?));
    info!(path = %config.db_path.display(), "Database ready");

    let state = AppState {
        db,
        media,
        config: Arc::new(config.clone()),
    };

    // -----------------------------------------------------------------------
    // 4. Spawn background tasks
    // -----------------------------------------------------------------------

    // Periodic session cleanup (every 10 minutes)
    let purge_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(600));
        loop {
            interval.tick().await;
            match purge_state.db().purge_expired_sessions() {
                Ok(0) => {}
                Ok(n) => info!(count = n, "Purged expired sessions"),
                Err(e) => tracing::warn!(error = %e, "Session purge failed"),
            }
        }
    });

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    // tokio::select! ensures that if either the HTTP server or a shutdown
    // signal arrives, we exit cleanly.
    tokio::select! {
        result = routes::serve(state, config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
