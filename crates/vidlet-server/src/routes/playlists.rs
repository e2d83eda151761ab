//! Playlists: named, ordered collections of videos.

use axum::extract::{Path, State};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use vidlet_store::Playlist;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::routes::{ensure_owner, parse_id, require_field, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_playlist))
        .route("/user/{userId}", get(list_user_playlists))
        .route("/{playlistId}", get(get_playlist))
        .route("/{playlistId}", patch(update_playlist))
        .route("/{playlistId}", delete(delete_playlist))
        .route("/add/{videoId}/to/{playlistId}", patch(add_video))
        .route("/remove/{videoId}/from/{playlistId}", patch(remove_video))
}

#[derive(Deserialize)]
struct CreatePlaylistRequest {
    name: String,
    description: String,
}

async fn create_playlist(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreatePlaylistRequest>,
) -> Result<ApiResponse<Playlist>, ApiError> {
    require_field(&req.name, "name")?;
    require_field(&req.description, "description")?;

    let playlist = Playlist {
        id: Uuid::new_v4(),
        owner_id: auth.user.id,
        name: req.name.trim().to_string(),
        description: req.description.trim().to_string(),
        videos: Vec::new(),
        created_at: Utc::now(),
    };
    state.db().create_playlist(&playlist)?;

    Ok(ApiResponse::created(playlist, "Playlist created successfully"))
}

async fn list_user_playlists(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<ApiResponse<Vec<Playlist>>, ApiError> {
    let user_id = parse_id(&raw_id, "user")?;
    let playlists = state.db().list_user_playlists(user_id)?;
    Ok(ApiResponse::ok(playlists, "Playlists fetched successfully"))
}

async fn get_playlist(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<ApiResponse<Playlist>, ApiError> {
    let playlist_id = parse_id(&raw_id, "playlist")?;
    let playlist = state.db().get_playlist(playlist_id)?;
    Ok(ApiResponse::ok(playlist, "Playlist fetched successfully"))
}

#[derive(Deserialize)]
struct UpdatePlaylistRequest {
    name: Option<String>,
    description: Option<String>,
}

async fn update_playlist(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(raw_id): Path<String>,
    Json(req): Json<UpdatePlaylistRequest>,
) -> Result<ApiResponse<Playlist>, ApiError> {
    let playlist_id = parse_id(&raw_id, "playlist")?;

    if req.name.is_none() && req.description.is_none() {
        return Err(ApiError::InvalidArgument(
            "At least one of 'name' or 'description' is required".to_string(),
        ));
    }
    if let Some(name) = req.name.as_deref() {
        require_field(name, "name")?;
    }

    let db = state.db();
    let existing = db.get_playlist(playlist_id)?;
    ensure_owner(existing.owner_id, auth.user.id, "playlist")?;
    let updated = db.update_playlist(playlist_id, req.name.as_deref(), req.description.as_deref())?;

    Ok(ApiResponse::ok(updated, "Playlist updated successfully"))
}

async fn delete_playlist(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(raw_id): Path<String>,
) -> Result<ApiResponse<()>, ApiError> {
    let playlist_id = parse_id(&raw_id, "playlist")?;

    let db = state.db();
    let existing = db.get_playlist(playlist_id)?;
    ensure_owner(existing.owner_id, auth.user.id, "playlist")?;
    db.delete_playlist(playlist_id)?;

    Ok(ApiResponse::ok((), "Playlist deleted successfully"))
}

async fn add_video(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((raw_video, raw_playlist)): Path<(String, String)>,
) -> Result<ApiResponse<Playlist>, ApiError> {
    let video_id = parse_id(&raw_video, "video")?;
    let playlist_id = parse_id(&raw_playlist, "playlist")?;

    let db = state.db();
    let existing = db.get_playlist(playlist_id)?;
    ensure_owner(existing.owner_id, auth.user.id, "playlist")?;
    let updated = db.add_video_to_playlist(playlist_id, video_id)?;

    Ok(ApiResponse::ok(updated, "Video added to playlist"))
}

async fn remove_video(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((raw_video, raw_playlist)): Path<(String, String)>,
) -> Result<ApiResponse<Playlist>, ApiError> {
    let video_id = parse_id(&raw_video, "video")?;
    let playlist_id = parse_id(&raw_playlist, "playlist")?;

    let db = state.db();
    let existing = db.get_playlist(playlist_id)?;
    ensure_owner(existing.owner_id, auth.user.id, "playlist")?;
    let updated = db.remove_video_from_playlist(playlist_id, video_id)?;

    Ok(ApiResponse::ok(updated, "Video removed from playlist"))
}
