//! Comments on videos.

use axum::extract::{Path, Query, State};
use axum::routing::{delete, get, patch};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use vidlet_store::Comment;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::routes::{ensure_owner, parse_id, require_field, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{videoId}", get(list_comments).post(create_comment))
        .route("/c/{commentId}", patch(update_comment))
        .route("/c/{commentId}", delete(delete_comment))
}

#[derive(Deserialize, Default)]
struct PageParams {
    page: Option<u32>,
    limit: Option<u32>,
}

async fn list_comments(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<ApiResponse<Vec<Comment>>, ApiError> {
    let video_id = parse_id(&raw_id, "video")?;

    let comments = {
        let db = state.db();
        // Distinguish "no comments" from "no such video".
        db.get_video(video_id)?;
        db.list_video_comments(video_id, params.page.unwrap_or(1), params.limit.unwrap_or(10))?
    };

    Ok(ApiResponse::ok(comments, "Comments fetched successfully"))
}

#[derive(Deserialize)]
struct CommentRequest {
    content: String,
}

async fn create_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(raw_id): Path<String>,
    Json(req): Json<CommentRequest>,
) -> Result<ApiResponse<Comment>, ApiError> {
    let video_id = parse_id(&raw_id, "video")?;
    require_field(&req.content, "content")?;

    let comment = Comment {
        id: Uuid::new_v4(),
        video_id,
        owner_id: auth.user.id,
        content: req.content.trim().to_string(),
        created_at: Utc::now(),
    };
    state.db().create_comment(&comment)?;

    Ok(ApiResponse::created(comment, "Comment added successfully"))
}

async fn update_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(raw_id): Path<String>,
    Json(req): Json<CommentRequest>,
) -> Result<ApiResponse<Comment>, ApiError> {
    let comment_id = parse_id(&raw_id, "comment")?;
    require_field(&req.content, "content")?;

    let db = state.db();
    let existing = db.get_comment(comment_id)?;
    ensure_owner(existing.owner_id, auth.user.id, "comment")?;
    let updated = db.update_comment(comment_id, req.content.trim())?;

    Ok(ApiResponse::ok(updated, "Comment updated successfully"))
}

async fn delete_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(raw_id): Path<String>,
) -> Result<ApiResponse<()>, ApiError> {
    let comment_id = parse_id(&raw_id, "comment")?;

    let db = state.db();
    let existing = db.get_comment(comment_id)?;
    ensure_owner(existing.owner_id, auth.user.id, "comment")?;
    db.delete_comment(comment_id)?;

    Ok(ApiResponse::ok((), "Comment deleted successfully"))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::*;
    use axum::http::StatusCode;
    use uuid::Uuid;

    #[tokio::test]
    async fn comment_lifecycle() {
        let t = test_app().await;
        let (user_id, token) = register_and_login(&t.app, "talker").await;
        let video_id = seed_video(&t.db, user_id.parse().unwrap(), "clip");
        let base = format!("/comments/{video_id}");

        let (status, body) = send_json(
            &t.app,
            "POST",
            &base,
            Some(&token),
            Some(serde_json::json!({"content": "first!"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let comment_id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = send_json(&t.app, "GET", &base, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let (status, body) = send_json(
            &t.app,
            "PATCH",
            &format!("/comments/c/{comment_id}"),
            Some(&token),
            Some(serde_json::json!({"content": "edited"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["content"], "edited");

        let (status, _) = send_json(
            &t.app,
            "DELETE",
            &format!("/comments/c/{comment_id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send_json(&t.app, "GET", &base, None, None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn commenting_on_missing_video_is_not_found() {
        let t = test_app().await;
        let (_, token) = register_and_login(&t.app, "talker").await;

        let (status, _) = send_json(
            &t.app,
            "POST",
            &format!("/comments/{}", Uuid::new_v4()),
            Some(&token),
            Some(serde_json::json!({"content": "hello?"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn empty_comment_is_rejected() {
        let t = test_app().await;
        let (user_id, token) = register_and_login(&t.app, "talker").await;
        let video_id = seed_video(&t.db, user_id.parse().unwrap(), "clip");

        let (status, _) = send_json(
            &t.app,
            "POST",
            &format!("/comments/{video_id}"),
            Some(&token),
            Some(serde_json::json!({"content": "   "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn strangers_cannot_edit_comments() {
        let t = test_app().await;
        let (user_id, owner_token) = register_and_login(&t.app, "talker").await;
        let (_, stranger_token) = register_and_login(&t.app, "lurker").await;
        let video_id = seed_video(&t.db, user_id.parse().unwrap(), "clip");

        let (_, body) = send_json(
            &t.app,
            "POST",
            &format!("/comments/{video_id}"),
            Some(&owner_token),
            Some(serde_json::json!({"content": "mine"})),
        )
        .await;
        let comment_id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, _) = send_json(
            &t.app,
            "PATCH",
            &format!("/comments/c/{comment_id}"),
            Some(&stranger_token),
            Some(serde_json::json!({"content": "hijacked"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
