//! Community posts: short text updates attached to a channel.

use axum::extract::{Path, State};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use vidlet_store::CommunityPost;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::routes::{ensure_owner, parse_id, require_field, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_post))
        .route("/user/{userId}", get(list_user_posts))
        .route("/{postId}", patch(update_post))
        .route("/{postId}", delete(delete_post))
}

#[derive(Deserialize)]
struct PostRequest {
    content: String,
}

async fn create_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<PostRequest>,
) -> Result<ApiResponse<CommunityPost>, ApiError> {
    require_field(&req.content, "content")?;

    let post = CommunityPost {
        id: Uuid::new_v4(),
        owner_id: auth.user.id,
        content: req.content.trim().to_string(),
        created_at: Utc::now(),
    };
    state.db().create_post(&post)?;

    Ok(ApiResponse::created(post, "Post created successfully"))
}

async fn list_user_posts(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<ApiResponse<Vec<CommunityPost>>, ApiError> {
    let user_id = parse_id(&raw_id, "user")?;
    let posts = state.db().list_user_posts(user_id)?;
    Ok(ApiResponse::ok(posts, "Posts fetched successfully"))
}

async fn update_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(raw_id): Path<String>,
    Json(req): Json<PostRequest>,
) -> Result<ApiResponse<CommunityPost>, ApiError> {
    let post_id = parse_id(&raw_id, "post")?;
    require_field(&req.content, "content")?;

    let db = state.db();
    let existing = db.get_post(post_id)?;
    ensure_owner(existing.owner_id, auth.user.id, "post")?;
    let updated = db.update_post(post_id, req.content.trim())?;

    Ok(ApiResponse::ok(updated, "Post updated successfully"))
}

async fn delete_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(raw_id): Path<String>,
) -> Result<ApiResponse<()>, ApiError> {
    let post_id = parse_id(&raw_id, "post")?;

    let db = state.db();
    let existing = db.get_post(post_id)?;
    ensure_owner(existing.owner_id, auth.user.id, "post")?;
    db.delete_post(post_id)?;

    Ok(ApiResponse::ok((), "Post deleted successfully"))
}
