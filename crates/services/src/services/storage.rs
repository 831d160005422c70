//! Object storage for floor plans, cleaning photos and organisation logos.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error};
use uuid::Uuid;

use super::error::ActionError;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid object key: {0}")]
    InvalidKey(String),
    #[error("object not found: {0}")]
    NotFound(String),
}

/// Blob store keyed by `{organisation_id}/{entity}/{entity_id}/...` paths.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<(), StorageError>;
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Filesystem-backed store rooted at a directory.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        debug!(key, content_type, size = bytes.len(), "Stored object");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// What an upload is for; decides which content types are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Photo,
    Logo,
    FloorPlan,
}

impl UploadKind {
    fn extension_for(self, content_type: &str) -> Option<&'static str> {
        let image = match content_type {
            "image/png" => Some("png"),
            "image/jpeg" => Some("jpg"),
            "image/webp" => Some("webp"),
            _ => None,
        };
        match self {
            UploadKind::Photo | UploadKind::Logo => image,
            UploadKind::FloorPlan => image.or(match content_type {
                "application/pdf" => Some("pdf"),
                _ => None,
            }),
        }
    }

    fn label(self) -> &'static str {
        match self {
            UploadKind::Photo => "Photos",
            UploadKind::Logo => "Logos",
            UploadKind::FloorPlan => "Floor plans",
        }
    }
}

/// Size and type guard. Returns the file extension to store under.
pub fn validate_upload(
    kind: UploadKind,
    content_type: &str,
    size: usize,
    max_bytes: usize,
) -> Result<&'static str, ActionError> {
    if size == 0 {
        return Err(ActionError::validation("File is empty"));
    }
    if size > max_bytes {
        return Err(ActionError::validation(format!(
            "File must be smaller than {} MB",
            max_bytes.div_ceil(1024 * 1024)
        )));
    }
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    kind.extension_for(&essence).ok_or_else(|| {
        ActionError::validation(format!(
            "{} must be {}",
            kind.label(),
            match kind {
                UploadKind::FloorPlan => "PNG, JPEG, WebP or PDF files",
                _ => "PNG, JPEG or WebP images",
            }
        ))
    })
}

/// `{organisation_id}/{entity}/{entity_id}/{random}.{ext}`
pub fn object_key(organisation_id: Uuid, entity: &str, entity_id: Uuid, extension: &str) -> String {
    format!(
        "{organisation_id}/{entity}/{entity_id}/{}.{extension}",
        Uuid::new_v4()
    )
}

/// Keys are readable only by members of the organisation that prefixes them.
pub fn key_belongs_to(key: &str, organisation_id: Uuid) -> bool {
    key.split('/')
        .next()
        .is_some_and(|prefix| prefix == organisation_id.to_string())
}

/// Validate, then write; blocks until the store acknowledges.
pub async fn store_upload(
    store: &dyn ObjectStore,
    kind: UploadKind,
    key_parts: (Uuid, &str, Uuid),
    content_type: &str,
    bytes: &[u8],
    max_bytes: usize,
) -> Result<String, ActionError> {
    let extension = validate_upload(kind, content_type, bytes.len(), max_bytes)?;
    let (organisation_id, entity, entity_id) = key_parts;
    let key = object_key(organisation_id, entity, entity_id, extension);
    store.put(&key, bytes, content_type).await.map_err(|e| {
        error!(error = %e, key = %key, "Failed to store upload");
        ActionError::Storage("Failed to upload file".to_string())
    })?;
    Ok(key)
}
