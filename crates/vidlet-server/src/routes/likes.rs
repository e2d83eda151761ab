//! Like toggles for videos, comments, and community posts.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Router;
use uuid::Uuid;
use vidlet_store::{RelationKind, Toggle, ToggleState};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::routes::{parse_id, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/toggle/video/{videoId}", post(toggle_video_like))
        .route("/toggle/comment/{commentId}", post(toggle_comment_like))
        .route("/toggle/comunity-posts/{postId}", post(toggle_post_like))
        .route("/videos", get(liked_videos))
}

async fn toggle_video_like(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(raw_id): Path<String>,
) -> Result<ApiResponse<Toggle>, ApiError> {
    let video_id = parse_id(&raw_id, "video")?;
    toggle_like(&state, auth.user.id, video_id, RelationKind::LikeVideo, "Video")
}

async fn toggle_comment_like(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(raw_id): Path<String>,
) -> Result<ApiResponse<Toggle>, ApiError> {
    let comment_id = parse_id(&raw_id, "comment")?;
    toggle_like(
        &state,
        auth.user.id,
        comment_id,
        RelationKind::LikeComment,
        "Comment",
    )
}

async fn toggle_post_like(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(raw_id): Path<String>,
) -> Result<ApiResponse<Toggle>, ApiError> {
    let post_id = parse_id(&raw_id, "post")?;
    toggle_like(&state, auth.user.id, post_id, RelationKind::LikePost, "Post")
}

fn toggle_like(
    state: &AppState,
    user_id: Uuid,
    object_id: Uuid,
    kind: RelationKind,
    noun: &str,
) -> Result<ApiResponse<Toggle>, ApiError> {
    let toggle = state.db().toggle_relation(user_id, object_id, kind)?;
    let message = match toggle.state {
        ToggleState::On => format!("{noun} liked successfully"),
        ToggleState::Off => format!("{noun} unliked successfully"),
    };
    Ok(ApiResponse::ok(toggle, message))
}

/// Ids of the videos the acting user has liked, oldest like first.
async fn liked_videos(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<ApiResponse<Vec<Uuid>>, ApiError> {
    let ids = state.db().liked_video_ids(auth.user.id)?;
    Ok(ApiResponse::ok(ids, "Liked videos fetched successfully"))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::*;
    use axum::http::StatusCode;
    use uuid::Uuid;

    #[tokio::test]
    async fn like_toggles_on_and_off() {
        let t = test_app().await;
        let (user_id, token) = register_and_login(&t.app, "viewer").await;
        let video_id = seed_video(&t.db, user_id.parse().unwrap(), "clip");

        let uri = format!("/likes/toggle/video/{video_id}");

        let (status, body) = send_json(&t.app, "POST", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["state"], "ON");
        assert!(body["data"]["record"].is_object());

        let (status, body) = send_json(&t.app, "POST", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["state"], "OFF");
        assert!(body["data"]["record"].is_null());
    }

    #[tokio::test]
    async fn liking_missing_video_is_not_found() {
        let t = test_app().await;
        let (_, token) = register_and_login(&t.app, "viewer").await;

        let uri = format!("/likes/toggle/video/{}", Uuid::new_v4());
        let (status, body) = send_json(&t.app, "POST", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn liked_videos_reflect_toggle_history() {
        let t = test_app().await;
        let (user_id, token) = register_and_login(&t.app, "viewer").await;
        let owner: Uuid = user_id.parse().unwrap();
        let a = seed_video(&t.db, owner, "first");
        let b = seed_video(&t.db, owner, "second");

        for id in [a, b] {
            let uri = format!("/likes/toggle/video/{id}");
            send_json(&t.app, "POST", &uri, Some(&token), None).await;
        }
        // Unlike the first; only the second remains.
        let uri = format!("/likes/toggle/video/{a}");
        send_json(&t.app, "POST", &uri, Some(&token), None).await;

        let (status, body) = send_json(&t.app, "GET", "/likes/videos", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], serde_json::json!([b.to_string()]));
    }

    #[tokio::test]
    async fn comment_and_post_likes_share_the_toggle() {
        let t = test_app().await;
        let (user_id, token) = register_and_login(&t.app, "viewer").await;
        let owner: Uuid = user_id.parse().unwrap();
        let video_id = seed_video(&t.db, owner, "clip");

        let (status, body) = send_json(
            &t.app,
            "POST",
            &format!("/comments/{video_id}"),
            Some(&token),
            Some(serde_json::json!({"content": "nice"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let comment_id = body["data"]["id"].as_str().unwrap().to_string();

        let uri = format!("/likes/toggle/comment/{comment_id}");
        let (status, body) = send_json(&t.app, "POST", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["state"], "ON");
    }
}
