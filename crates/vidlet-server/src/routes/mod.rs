//! HTTP routing: application state, router assembly, and the handlers'
//! shared helpers. Resource-specific handlers live in the submodules.

pub mod comments;
pub mod dashboard;
pub mod likes;
pub mod playlists;
pub mod posts;
pub mod subscriptions;
pub mod users;
pub mod videos;

use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::Method;
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;
use vidlet_store::Database;

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::media_store::MediaStore;
use crate::response::ApiResponse;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub media: Arc<MediaStore>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Acquire the database handle for the duration of one store call.
    /// Guards must not be held across an await point.
    pub fn db(&self) -> MutexGuard<'_, Database> {
        self.db
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/healthcheck", get(healthcheck))
        .route("/media/{id}", get(serve_media))
        .nest("/users", users::router())
        .nest("/videos", videos::router())
        .nest("/comments", comments::router())
        .nest("/comunity-posts", posts::router())
        .nest("/playlists", playlists::router())
        .nest("/likes", likes::router())
        .nest("/subscriptions", subscriptions::router())
        .nest("/dashboard", dashboard::router())
        .layer(DefaultBodyLimit::max(state.config.max_upload_size))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthData {
    status: &'static str,
    instance: String,
    version: &'static str,
}

async fn healthcheck(State(state): State<AppState>) -> ApiResponse<HealthData> {
    ApiResponse::ok(
        HealthData {
            status: "ok",
            instance: state.config.instance_name.clone(),
            version: env!("CARGO_PKG_VERSION"),
        },
        "Service is healthy",
    )
}

async fn serve_media(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Vec<u8>, ApiError> {
    let id = parse_id(&id, "media")?;
    state.media.get(id).await
}

/// Parse a path id, rejecting malformed input before any store call.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| ApiError::InvalidArgument(format!("Invalid {what} id")))
}

/// Mutations require the acting user to own the entity.
pub(crate) fn ensure_owner(owner_id: Uuid, actor_id: Uuid, what: &str) -> Result<(), ApiError> {
    if owner_id != actor_id {
        return Err(ApiError::Forbidden(format!(
            "You do not own this {what}"
        )));
    }
    Ok(())
}

/// Reject empty or whitespace-only required text fields.
pub(crate) fn require_field(value: &str, name: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidArgument(format!(
            "Field '{name}' is required"
        )));
    }
    Ok(())
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn healthcheck_uses_success_envelope() {
        let t = test_app().await;
        let (status, body) = send_json(&t.app, "GET", "/healthcheck", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["statusCode"], 200);
        assert_eq!(body["data"]["status"], "ok");
    }

    #[tokio::test]
    async fn unknown_media_id_is_invalid_argument() {
        let t = test_app().await;
        let (status, body) = send_json(&t.app, "GET", "/media/not-a-uuid", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["errors"].is_array());
    }

    #[tokio::test]
    async fn missing_auth_is_unauthorized_envelope() {
        let t = test_app().await;
        let (status, body) = send_json(&t.app, "GET", "/likes/videos", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["statusCode"], 401);
    }
}
