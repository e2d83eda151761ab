//! Account and channel-profile endpoints.

use axum::extract::{Multipart, Path, State};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use vidlet_store::{ChannelProfile, User, WatchEntry};

use crate::auth::{hash_password, new_session_token, verify_password, AuthUser, OptionalAuthUser};
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::routes::{require_field, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/current-user", get(current_user))
        .route("/change-password", post(change_password))
        .route("/update-profile", patch(update_profile))
        .route("/update-avatar", patch(update_avatar))
        .route("/update-cover-image", patch(update_cover_image))
        .route("/channels/{username}", get(channel_profile))
        .route("/history", get(watch_history))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    username: String,
    email: String,
    full_name: String,
    password: String,
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<ApiResponse<User>, ApiError> {
    require_field(&req.username, "username")?;
    require_field(&req.email, "email")?;
    require_field(&req.full_name, "fullName")?;
    require_field(&req.password, "password")?;

    let user = User {
        id: Uuid::new_v4(),
        username: req.username.trim().to_string(),
        email: req.email.trim().to_string(),
        full_name: req.full_name.trim().to_string(),
        password_hash: hash_password(&req.password)?,
        avatar_url: String::new(),
        cover_image_url: String::new(),
        created_at: Utc::now(),
    };

    state.db().create_user(&user)?;
    info!(username = %user.username, "User registered");

    Ok(ApiResponse::created(user, "User registered successfully"))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest {
    username: Option<String>,
    email: Option<String>,
    password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginData {
    user: User,
    access_token: String,
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<ApiResponse<LoginData>, ApiError> {
    let identifier = req
        .username
        .as_deref()
        .or(req.email.as_deref())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::InvalidArgument("Username or email is required".to_string()))?;

    let user = state
        .db()
        .find_user_for_login(identifier.trim())
        .map_err(|e| match e {
            vidlet_store::StoreError::NotFound => {
                ApiError::Unauthorized("Invalid credentials".to_string())
            }
            other => other.into(),
        })?;

    if !verify_password(&req.password, &user.password_hash)? {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let token = new_session_token();
    state
        .db()
        .create_session(&token, user.id, state.config.session_ttl_secs)?;

    info!(username = %user.username, "User logged in");

    Ok(ApiResponse::ok(
        LoginData {
            user,
            access_token: token,
        },
        "User logged in successfully",
    ))
}

async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<ApiResponse<()>, ApiError> {
    state.db().delete_session(&auth.token)?;
    Ok(ApiResponse::ok((), "User logged out successfully"))
}

async fn current_user(auth: AuthUser) -> ApiResponse<User> {
    ApiResponse::ok(auth.user, "Current user fetched successfully")
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordRequest {
    old_password: String,
    new_password: String,
}

async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<ApiResponse<()>, ApiError> {
    require_field(&req.new_password, "newPassword")?;

    if !verify_password(&req.old_password, &auth.user.password_hash)? {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let new_hash = hash_password(&req.new_password)?;
    state.db().update_user_password(auth.user.id, &new_hash)?;

    Ok(ApiResponse::ok((), "Password changed successfully"))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateProfileRequest {
    full_name: Option<String>,
    email: Option<String>,
}

async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<ApiResponse<User>, ApiError> {
    if req.full_name.is_none() && req.email.is_none() {
        return Err(ApiError::InvalidArgument(
            "At least one field is required".to_string(),
        ));
    }

    let updated = state.db().update_user_profile(
        auth.user.id,
        req.full_name.as_deref(),
        req.email.as_deref(),
    )?;

    Ok(ApiResponse::ok(updated, "Profile updated successfully"))
}

async fn update_avatar(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<ApiResponse<User>, ApiError> {
    update_user_image(state, auth, multipart, "avatar").await
}

async fn update_cover_image(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<ApiResponse<User>, ApiError> {
    update_user_image(state, auth, multipart, "coverImage").await
}

/// Shared flow for the two image endpoints: read the named multipart field,
/// upload it, swap the stored URL, then clean up the previous object.
async fn update_user_image(
    state: AppState,
    auth: AuthUser,
    mut multipart: Multipart,
    field_name: &str,
) -> Result<ApiResponse<User>, ApiError> {
    let mut data = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidArgument(format!("Multipart error: {e}")))?
    {
        if field.name() == Some(field_name) {
            data = Some(field.bytes().await.map_err(|e| {
                ApiError::InvalidArgument(format!("Failed to read '{field_name}': {e}"))
            })?);
            break;
        }
    }

    let data = data.ok_or_else(|| {
        ApiError::InvalidArgument(format!("Missing '{field_name}' field in multipart form"))
    })?;

    // Upload first; the row is only touched once the object is durable.
    let object = state.media.store(&data).await?;

    let previous = if field_name == "avatar" {
        state.db().update_user_avatar(auth.user.id, &object.url)?
    } else {
        state
            .db()
            .update_user_cover_image(auth.user.id, &object.url)?
    };

    if !previous.is_empty() {
        state.media.delete_by_url(&previous).await;
    }

    let user = state.db().get_user(auth.user.id)?;
    Ok(ApiResponse::ok(user, "Image updated successfully"))
}

async fn channel_profile(
    State(state): State<AppState>,
    viewer: OptionalAuthUser,
    Path(username): Path<String>,
) -> Result<ApiResponse<ChannelProfile>, ApiError> {
    require_field(&username, "username")?;

    let viewer_id = viewer.0.map(|u| u.id);
    let profile = state.db().channel_profile(username.trim(), viewer_id)?;

    Ok(ApiResponse::ok(
        profile,
        "Channel profile fetched successfully",
    ))
}

async fn watch_history(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<ApiResponse<Vec<WatchEntry>>, ApiError> {
    let history = state.db().watch_history(auth.user.id)?;
    Ok(ApiResponse::ok(history, "Watch history fetched successfully"))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn register_login_logout_flow() {
        let t = test_app().await;
        let (_user_id, token) = register_and_login(&t.app, "alice").await;

        let (status, body) =
            send_json(&t.app, "GET", "/users/current-user", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["username"], "alice");
        // Credential fields are never serialized.
        assert!(body["data"].get("passwordHash").is_none());
        assert!(body["data"].get("password_hash").is_none());

        let (status, _) = send_json(&t.app, "POST", "/users/logout", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) =
            send_json(&t.app, "GET", "/users/current-user", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn duplicate_registration_is_conflict() {
        let t = test_app().await;
        register_and_login(&t.app, "bob").await;

        let (status, body) = send_json(
            &t.app,
            "POST",
            "/users/register",
            None,
            Some(serde_json::json!({
                "username": "BOB",
                "email": "different@example.com",
                "fullName": "Bob Again",
                "password": "pw-123456",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT, "{body}");
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn login_with_wrong_password_is_unauthorized() {
        let t = test_app().await;
        register_and_login(&t.app, "carol").await;

        let (status, _) = send_json(
            &t.app,
            "POST",
            "/users/login",
            None,
            Some(serde_json::json!({"username": "carol", "password": "nope"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn channel_profile_reports_subscription_state() {
        let t = test_app().await;
        let (channel_id, _) = register_and_login(&t.app, "creator").await;
        let (_, fan_token) = register_and_login(&t.app, "fan").await;

        // Fan subscribes.
        let (status, _) = send_json(
            &t.app,
            "POST",
            &format!("/subscriptions/toggle/{channel_id}"),
            Some(&fan_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        // Seen by the fan: subscribed.
        let (status, body) = send_json(
            &t.app,
            "GET",
            "/users/channels/creator",
            Some(&fan_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["isSubscribed"], true);
        assert_eq!(body["data"]["subscribersCount"], 1);

        // Seen anonymously: not subscribed, same count.
        let (status, body) =
            send_json(&t.app, "GET", "/users/channels/CREATOR", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["isSubscribed"], false);
        assert_eq!(body["data"]["subscribersCount"], 1);
    }

    #[tokio::test]
    async fn missing_channel_profile_is_not_found() {
        let t = test_app().await;
        let (status, body) = send_json(&t.app, "GET", "/users/channels/ghost", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn change_password_requires_old_password() {
        let t = test_app().await;
        let (_, token) = register_and_login(&t.app, "dave").await;

        let (status, _) = send_json(
            &t.app,
            "POST",
            "/users/change-password",
            Some(&token),
            Some(serde_json::json!({"oldPassword": "wrong", "newPassword": "next-pw-1"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send_json(
            &t.app,
            "POST",
            "/users/change-password",
            Some(&token),
            Some(serde_json::json!({
                "oldPassword": "correct-horse-battery",
                "newPassword": "next-pw-1",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // New password works for login.
        let (status, _) = send_json(
            &t.app,
            "POST",
            "/users/login",
            None,
            Some(serde_json::json!({"username": "dave", "password": "next-pw-1"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}
