//! Blob storage for uploaded report photos.

use std::path::{Path, PathBuf};

use crate::{AppError, AppResult};

/// Metadata for a stored blob.
#[derive(Debug, Clone)]
pub struct StoredBlob {
    /// Storage key, a path relative to the storage root.
    pub key: String,
    /// Public URL the blob is served under.
    pub url: String,
    /// Size in bytes.
    pub size: u64,
    /// MIME content type as supplied by the uploader.
    pub content_type: String,
    /// MD5 digest of the contents.
    pub md5: String,
}

/// A place report photos can be written to and served from.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Write `data` under `key`, overwriting any previous blob.
    async fn upload(&self, key: &str, data: &[u8], content_type: &str) -> AppResult<StoredBlob>;

    /// Remove the blob under `key`. Removing a missing blob is not an error.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Public URL for `key`.
    fn public_url(&self, key: &str) -> String;

    /// Whether a blob exists under `key`.
    async fn exists(&self, key: &str) -> AppResult<bool>;
}

/// Filesystem-backed storage rooted at a configured directory.
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new local storage backend.
    #[must_use]
    pub const fn new(base_path: PathBuf, base_url: String) -> Self {
        Self {
            base_path,
            base_url,
        }
    }

    fn resolve(&self, key: &str) -> PathBuf {
        self.base_path.join(key)
    }
}

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn upload(&self, key: &str, data: &[u8], content_type: &str) -> AppResult<StoredBlob> {
        let path = self.resolve(key);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Internal(format!("mkdir {}: {e}", parent.display())))?;
        }

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Internal(format!("write {}: {e}", path.display())))?;

        Ok(StoredBlob {
            key: key.to_string(),
            url: self.public_url(key),
            size: data.len() as u64,
            content_type: content_type.to_string(),
            md5: format!("{:x}", md5::compute(data)),
        })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.resolve(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Internal(format!(
                "remove {}: {e}",
                path.display()
            ))),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(tokio::fs::try_exists(self.resolve(key)).await.unwrap_or(false))
    }
}

/// Build a collision-free storage key for an upload.
///
/// Keys are dated (`YYYY/MM/DD/<user>/<millis>_<uuid>.<ext>`) so the
/// backing directory stays browsable and old uploads are easy to archive.
/// The extension comes from the client file name; anything missing or
/// implausible falls back to `bin`.
#[must_use]
pub fn generate_storage_key(user_id: &str, original_name: &str) -> String {
    let now = chrono::Utc::now();

    let extension = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 10)
        .unwrap_or("bin");

    format!(
        "{}/{}/{}_{}.{}",
        now.format("%Y/%m/%d"),
        user_id,
        now.timestamp_millis(),
        uuid::Uuid::new_v4(),
        extension
    )
}
