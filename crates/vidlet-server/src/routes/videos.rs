//! Video CRUD: multipart upload, public listing, playback fetch with view
//! counting, owner mutations, and the publish toggle.

use axum::extract::{Multipart, Path, Query, State};
use axum::routing::{delete, get, patch, post};
use axum::Router;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use vidlet_store::{Video, VideoQuery, VideoSort};

use crate::auth::{AuthUser, OptionalAuthUser};
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::routes::{ensure_owner, parse_id, require_field, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_videos).post(publish_video))
        .route("/{videoId}", get(get_video))
        .route("/{videoId}", patch(update_video))
        .route("/{videoId}", delete(delete_video))
        .route("/toggle/publish/{videoId}", patch(toggle_publish))
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    page: Option<u32>,
    limit: Option<u32>,
    query: Option<String>,
    sort_by: Option<String>,
    sort_type: Option<String>,
    user_id: Option<String>,
}

async fn list_videos(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<ApiResponse<Vec<Video>>, ApiError> {
    let owner_id = match params.user_id.as_deref() {
        Some(raw) => Some(parse_id(raw, "user")?),
        None => None,
    };

    let query = VideoQuery {
        owner_id,
        search: params.query.filter(|s| !s.trim().is_empty()),
        page: params.page.unwrap_or(1),
        limit: params.limit.unwrap_or(10),
        sort: params
            .sort_by
            .as_deref()
            .map(VideoSort::parse)
            .unwrap_or_default(),
        ascending: params.sort_type.as_deref() == Some("asc"),
    };

    let videos = state.db().list_videos(&query)?;
    Ok(ApiResponse::ok(videos, "Videos fetched successfully"))
}

/// Collected multipart fields for the upload and edit endpoints.
#[derive(Default)]
struct VideoForm {
    video_file: Option<Vec<u8>>,
    thumbnail: Option<Vec<u8>>,
    title: Option<String>,
    description: Option<String>,
    duration: Option<f64>,
}

impl VideoForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = VideoForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::InvalidArgument(format!("Multipart error: {e}")))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match name.as_str() {
                "videoFile" => form.video_file = Some(read_bytes(field, &name).await?),
                "thumbnail" => form.thumbnail = Some(read_bytes(field, &name).await?),
                "title" => form.title = Some(read_text(field, &name).await?),
                "description" => form.description = Some(read_text(field, &name).await?),
                "duration" => {
                    let raw = read_text(field, &name).await?;
                    form.duration = Some(raw.trim().parse().map_err(|_| {
                        ApiError::InvalidArgument("Field 'duration' must be a number".to_string())
                    })?);
                }
                _ => {}
            }
        }
        Ok(form)
    }
}

async fn read_bytes(field: axum::extract::multipart::Field<'_>, name: &str) -> Result<Vec<u8>, ApiError> {
    Ok(field
        .bytes()
        .await
        .map_err(|e| ApiError::InvalidArgument(format!("Failed to read '{name}': {e}")))?
        .to_vec())
}

async fn read_text(field: axum::extract::multipart::Field<'_>, name: &str) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::InvalidArgument(format!("Failed to read '{name}': {e}")))
}

async fn publish_video(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<ApiResponse<Video>, ApiError> {
    let form = VideoForm::read(multipart).await?;

    let title = form
        .title
        .ok_or_else(|| ApiError::InvalidArgument("Field 'title' is required".to_string()))?;
    require_field(&title, "title")?;
    let video_bytes = form
        .video_file
        .ok_or_else(|| ApiError::InvalidArgument("Field 'videoFile' is required".to_string()))?;
    let thumbnail_bytes = form
        .thumbnail
        .ok_or_else(|| ApiError::InvalidArgument("Field 'thumbnail' is required".to_string()))?;

    // Upload both objects before touching the database; a failed upload must
    // not leave a row pointing at nothing.
    let video_object = state.media.store(&video_bytes).await?;
    let thumbnail_object = match state.media.store(&thumbnail_bytes).await {
        Ok(object) => object,
        Err(e) => {
            state.media.delete_by_url(&video_object.url).await;
            return Err(e);
        }
    };

    let video = Video {
        id: Uuid::new_v4(),
        owner_id: auth.user.id,
        title: title.trim().to_string(),
        description: form.description.unwrap_or_default(),
        video_url: video_object.url,
        thumbnail_url: thumbnail_object.url,
        duration: form.duration.unwrap_or(0.0),
        views: 0,
        published: true,
        created_at: chrono::Utc::now(),
    };

    state.db().create_video(&video)?;
    info!(video = %video.id, owner = %video.owner_id, "Video published");

    Ok(ApiResponse::created(video, "Video published successfully"))
}

/// Fetch one video. An authenticated viewer counts as a view and the fetch
/// lands in their watch history; anonymous fetches change nothing.
async fn get_video(
    State(state): State<AppState>,
    viewer: OptionalAuthUser,
    Path(raw_id): Path<String>,
) -> Result<ApiResponse<Video>, ApiError> {
    let video_id = parse_id(&raw_id, "video")?;

    let video = {
        let db = state.db();
        let video = db.get_video(video_id)?;
        if let Some(user) = viewer.0 {
            db.increment_video_views(video_id)?;
            db.record_watch(user.id, video_id)?;
            db.get_video(video_id)?
        } else {
            video
        }
    };

    Ok(ApiResponse::ok(video, "Video fetched successfully"))
}

async fn update_video(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(raw_id): Path<String>,
    multipart: Multipart,
) -> Result<ApiResponse<Video>, ApiError> {
    let video_id = parse_id(&raw_id, "video")?;
    let form = VideoForm::read(multipart).await?;

    if form.title.is_none() && form.description.is_none() && form.thumbnail.is_none() {
        return Err(ApiError::InvalidArgument(
            "At least one of 'title', 'description' or 'thumbnail' is required".to_string(),
        ));
    }
    if let Some(title) = form.title.as_deref() {
        require_field(title, "title")?;
    }

    let existing = state.db().get_video(video_id)?;
    ensure_owner(existing.owner_id, auth.user.id, "video")?;

    let new_thumbnail = match form.thumbnail {
        Some(bytes) => Some(state.media.store(&bytes).await?),
        None => None,
    };

    let updated = state.db().update_video(
        video_id,
        form.title.as_deref(),
        form.description.as_deref(),
        new_thumbnail.as_ref().map(|o| o.url.as_str()),
    )?;

    if new_thumbnail.is_some() {
        state.media.delete_by_url(&existing.thumbnail_url).await;
    }

    Ok(ApiResponse::ok(updated, "Video updated successfully"))
}

/// Delete the row first; the media objects are cleaned up best-effort after.
async fn delete_video(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(raw_id): Path<String>,
) -> Result<ApiResponse<()>, ApiError> {
    let video_id = parse_id(&raw_id, "video")?;

    let deleted = {
        let db = state.db();
        let existing = db.get_video(video_id)?;
        ensure_owner(existing.owner_id, auth.user.id, "video")?;
        db.delete_video(video_id)?
    };

    state.media.delete_by_url(&deleted.video_url).await;
    state.media.delete_by_url(&deleted.thumbnail_url).await;

    info!(video = %video_id, "Video deleted");
    Ok(ApiResponse::ok((), "Video deleted successfully"))
}

async fn toggle_publish(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(raw_id): Path<String>,
) -> Result<ApiResponse<Video>, ApiError> {
    let video_id = parse_id(&raw_id, "video")?;

    let db = state.db();
    let existing = db.get_video(video_id)?;
    ensure_owner(existing.owner_id, auth.user.id, "video")?;
    let video = db.toggle_video_published(video_id)?;

    let message = if video.published {
        "Video published successfully"
    } else {
        "Video unpublished successfully"
    };
    Ok(ApiResponse::ok(video, message))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::*;
    use axum::http::StatusCode;
    use uuid::Uuid;

    #[tokio::test]
    async fn listing_shows_only_published_videos() {
        let t = test_app().await;
        let (user_id, token) = register_and_login(&t.app, "creator").await;
        let owner: Uuid = user_id.parse().unwrap();
        let a = seed_video(&t.db, owner, "public");
        let b = seed_video(&t.db, owner, "hidden");

        send_json(
            &t.app,
            "PATCH",
            &format!("/videos/toggle/publish/{b}"),
            Some(&token),
            None,
        )
        .await;

        let (status, body) = send_json(&t.app, "GET", "/videos", None, None).await;
        assert_eq!(status, StatusCode::OK);
        let listed = body["data"].as_array().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["id"], a.to_string());
    }

    #[tokio::test]
    async fn search_filters_by_title() {
        let t = test_app().await;
        let (user_id, _) = register_and_login(&t.app, "creator").await;
        let owner: Uuid = user_id.parse().unwrap();
        seed_video(&t.db, owner, "rust tutorial");
        seed_video(&t.db, owner, "cooking show");

        let (status, body) =
            send_json(&t.app, "GET", "/videos?query=rust", None, None).await;
        assert_eq!(status, StatusCode::OK);
        let listed = body["data"].as_array().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["title"], "rust tutorial");
    }

    #[tokio::test]
    async fn authenticated_fetch_counts_a_view() {
        let t = test_app().await;
        let (user_id, token) = register_and_login(&t.app, "viewer").await;
        let owner: Uuid = user_id.parse().unwrap();
        let video_id = seed_video(&t.db, owner, "clip");

        // Anonymous fetch: no view counted.
        let uri = format!("/videos/{video_id}");
        let (status, body) = send_json(&t.app, "GET", &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["views"], 0);

        let (status, body) = send_json(&t.app, "GET", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["views"], 1);

        // And it shows up in the watch history.
        let (status, body) = send_json(&t.app, "GET", "/users/history", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["video"]["id"], video_id.to_string());
    }

    #[tokio::test]
    async fn only_the_owner_can_delete() {
        let t = test_app().await;
        let (owner_id, owner_token) = register_and_login(&t.app, "creator").await;
        let (_, stranger_token) = register_and_login(&t.app, "stranger").await;
        let video_id = seed_video(&t.db, owner_id.parse().unwrap(), "mine");

        let uri = format!("/videos/{video_id}");
        let (status, _) = send_json(&t.app, "DELETE", &uri, Some(&stranger_token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send_json(&t.app, "DELETE", &uri, Some(&owner_token), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send_json(&t.app, "GET", &uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn fetching_missing_video_is_not_found() {
        let t = test_app().await;
        let (status, body) = send_json(
            &t.app,
            "GET",
            &format!("/videos/{}", Uuid::new_v4()),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }
}
