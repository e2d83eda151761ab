//! Channel dashboard: aggregate stats and the owner-facing video listing.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::Router;
use vidlet_store::{ChannelStats, Video};

use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::routes::{parse_id, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats/{channelId}", get(channel_stats))
        .route("/videos/{channelId}", get(channel_videos))
}

async fn channel_stats(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<ApiResponse<ChannelStats>, ApiError> {
    let channel_id = parse_id(&raw_id, "channel")?;
    let stats = state.db().channel_stats(channel_id)?;
    Ok(ApiResponse::ok(stats, "Channel stats fetched successfully"))
}

/// Every video the channel owns, published or not, newest first.
async fn channel_videos(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<ApiResponse<Vec<Video>>, ApiError> {
    let channel_id = parse_id(&raw_id, "channel")?;
    let videos = state.db().list_channel_videos(channel_id)?;
    Ok(ApiResponse::ok(
        videos,
        "Channel videos fetched successfully",
    ))
}
