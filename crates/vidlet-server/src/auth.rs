//! Session resolution and password handling.
//!
//! Sessions are opaque bearer tokens (random 32 bytes, hex-encoded) stored
//! with a TTL; the extractors below turn an `Authorization: Bearer` header
//! into the acting user. Passwords are hashed with Argon2id and stored as
//! PHC strings.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use vidlet_store::User;

use crate::error::ApiError;
use crate::routes::AppState;

/// Hash a password with Argon2id. Returns a PHC-formatted string safe for
/// database storage.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(format!("Password hashing failed: {e}")))?;
    Ok(hash.to_string())
}

/// Verify a password against its stored PHC hash.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, ApiError> {
    let parsed = PasswordHash::new(password_hash)
        .map_err(|e| ApiError::Internal(format!("Invalid password hash format: {e}")))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(ApiError::Internal(format!(
            "Password verification failed: {e}"
        ))),
    }
}

/// Mint a fresh session token: 32 random bytes, hex-encoded.
pub fn new_session_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

fn bearer_token(parts: &Parts) -> Option<String> {
    let auth = parts
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())?;
    auth.strip_prefix("Bearer ").map(str::to_string)
}

/// The authenticated acting user. Rejects with 401 when the bearer token is
/// missing, unknown, or expired.
pub struct AuthUser {
    pub user: User,
    /// The presented token, kept so logout can invalidate it.
    pub token: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

        let user = state
            .db()
            .resolve_session(&token)
            .map_err(|e| match e {
                vidlet_store::StoreError::NotFound => {
                    ApiError::Unauthorized("Invalid or expired session".to_string())
                }
                other => other.into(),
            })?;

        Ok(AuthUser { user, token })
    }
}

/// Like [`AuthUser`], but anonymous requests pass through with `None`
/// instead of being rejected. Used where a viewer identity merely enriches
/// the response (channel profile, video fetch).
pub struct OptionalAuthUser(pub Option<User>);

impl FromRequestParts<AppState> for OptionalAuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(OptionalAuthUser(None));
        };

        match state.db().resolve_session(&token) {
            Ok(user) => Ok(OptionalAuthUser(Some(user))),
            Err(vidlet_store::StoreError::NotFound) => Ok(OptionalAuthUser(None)),
            Err(e) => Err(e.into()),
        }
    }
}
