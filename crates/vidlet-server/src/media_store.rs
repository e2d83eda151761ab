//! Disk-backed media object store.
//!
//! This is the media capability consumed by the content handlers:
//! `store` accepts raw bytes and returns a durable URL, `delete` removes a
//! stored object and is best-effort on the cleanup paths. Entity creation
//! uploads first and persists the database row only when the upload
//! succeeded, so a failed upload never leaves an orphaned row.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ApiError;

/// A stored media object.
#[derive(Debug, Clone)]
pub struct MediaObject {
    pub id: Uuid,
    /// URL the object is served from (`/media/{id}`).
    pub url: String,
}

/// Verify that a resolved path stays within the expected base directory.
/// Prevents path traversal attacks.
fn ensure_within(base: &Path, target: &Path) -> Result<PathBuf, ApiError> {
    // Canonicalize base; target may not exist yet so normalize manually
    let canonical_base = base.canonicalize().unwrap_or_else(|_| base.to_path_buf());
    let mut resolved = canonical_base.clone();
    for component in target
        .strip_prefix(&canonical_base)
        .unwrap_or(target)
        .components()
    {
        match component {
            std::path::Component::Normal(c) => resolved.push(c),
            std::path::Component::ParentDir => {
                return Err(ApiError::InvalidArgument(
                    "Path traversal detected".to_string(),
                ));
            }
            _ => {} // RootDir, CurDir, Prefix — skip
        }
    }
    if !resolved.starts_with(&canonical_base) {
        return Err(ApiError::InvalidArgument(
            "Path traversal detected".to_string(),
        ));
    }
    Ok(resolved)
}

#[derive(Debug, Clone)]
pub struct MediaStore {
    base_path: PathBuf,
    max_size: usize,
}

impl MediaStore {
    pub async fn new(base_path: PathBuf, max_size: usize) -> Result<Self, ApiError> {
        fs::create_dir_all(&base_path).await.map_err(|e| {
            ApiError::Unavailable(format!(
                "Failed to create media directory '{}': {}",
                base_path.display(),
                e
            ))
        })?;

        info!(path = %base_path.display(), "Media store initialized");

        Ok(Self {
            base_path,
            max_size,
        })
    }

    /// Store an uploaded object and return its durable URL.
    pub async fn store(&self, data: &[u8]) -> Result<MediaObject, ApiError> {
        if data.is_empty() {
            return Err(ApiError::InvalidArgument("Empty upload".to_string()));
        }
        if data.len() > self.max_size {
            return Err(ApiError::PayloadTooLarge {
                size: data.len(),
                max: self.max_size,
            });
        }

        let id = Uuid::new_v4();
        let path = self.object_path(&id)?;

        fs::write(&path, data).await.map_err(|e| {
            ApiError::Unavailable(format!("Failed to write media object {id}: {e}"))
        })?;

        debug!(id = %id, size = data.len(), "Stored media object");
        Ok(MediaObject {
            id,
            url: format!("/media/{id}"),
        })
    }

    /// Read a stored object.
    pub async fn get(&self, id: Uuid) -> Result<Vec<u8>, ApiError> {
        let path = self.object_path(&id)?;

        if !path.exists() {
            return Err(ApiError::NotFound(format!("Media object {id} not found")));
        }

        let data = fs::read(&path).await.map_err(|e| {
            ApiError::Unavailable(format!("Failed to read media object {id}: {e}"))
        })?;

        debug!(id = %id, size = data.len(), "Retrieved media object");
        Ok(data)
    }

    /// Delete a stored object. Returns `true` if it existed.
    pub async fn delete(&self, id: Uuid) -> Result<bool, ApiError> {
        let path = self.object_path(&id)?;

        if !path.exists() {
            return Ok(false);
        }

        fs::remove_file(&path).await.map_err(|e| {
            ApiError::Unavailable(format!("Failed to delete media object {id}: {e}"))
        })?;

        debug!(id = %id, "Deleted media object");
        Ok(true)
    }

    /// Best-effort cleanup by stored URL. Failures are logged, never
    /// surfaced: the database row is already gone and a stray file must not
    /// fail the request.
    pub async fn delete_by_url(&self, url: &str) {
        let Some(id) = url
            .strip_prefix("/media/")
            .and_then(|s| Uuid::parse_str(s).ok())
        else {
            return;
        };

        match self.delete(id).await {
            Ok(_) => {}
            Err(e) => warn!(id = %id, error = %e, "Failed to clean up media object"),
        }
    }

    /// Safe object path that validates against traversal.
    fn object_path(&self, id: &Uuid) -> Result<PathBuf, ApiError> {
        let raw = self.base_path.join(id.to_string());
        ensure_within(&self.base_path, &raw)
    }
}
