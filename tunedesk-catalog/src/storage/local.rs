//! Filesystem-backed bucket

use super::{is_absolute_url, ObjectStore, StorageError};
use crate::decode::AudioAsset;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Largest object the bucket accepts (100 MiB)
pub const DEFAULT_MAX_OBJECT_BYTES: u64 = 100 * 1024 * 1024;

/// Bucket stored as a directory under the root folder
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    bucket_dir: PathBuf,
    public_base_url: Option<String>,
    max_object_bytes: u64,
}

impl LocalObjectStore {
    pub fn new(bucket_dir: impl Into<PathBuf>) -> Self {
        Self {
            bucket_dir: bucket_dir.into(),
            public_base_url: None,
            max_object_bytes: DEFAULT_MAX_OBJECT_BYTES,
        }
    }

    /// Serve resolved objects from this base URL instead of the local path
    pub fn with_public_base_url(mut self, base_url: Option<String>) -> Self {
        self.public_base_url = base_url.map(|u| u.trim_end_matches('/').to_string());
        self
    }

    pub fn with_max_object_bytes(mut self, limit: u64) -> Self {
        self.max_object_bytes = limit;
        self
    }

    pub fn bucket_dir(&self) -> &Path {
        &self.bucket_dir
    }

    /// Create the bucket directory if missing
    pub fn ensure_bucket(&self) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.bucket_dir).map_err(|e| map_io(e, &self.bucket_dir))?;
        info!("Bucket ready: {}", self.bucket_dir.display());
        Ok(())
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty() || key.contains(['/', '\\']) || key == "." || key == ".." {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.bucket_dir.join(key))
    }

    fn check_bucket(&self) -> Result<(), StorageError> {
        if self.bucket_dir.is_dir() {
            Ok(())
        } else {
            Err(StorageError::BucketNotFound(self.bucket_dir.display().to_string()))
        }
    }
}

fn map_io(e: std::io::Error, path: &Path) -> StorageError {
    match e.kind() {
        ErrorKind::PermissionDenied => StorageError::PermissionDenied(path.display().to_string()),
        ErrorKind::NotFound => StorageError::NotFound(path.display().to_string()),
        _ => StorageError::Io(e),
    }
}

#[async_trait::async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, key: &str, source: &Path) -> Result<(), StorageError> {
        self.check_bucket()?;
        let dest = self.object_path(key)?;

        let size = tokio::fs::metadata(source)
            .await
            .map_err(|e| map_io(e, source))?
            .len();
        if size > self.max_object_bytes {
            return Err(StorageError::PayloadTooLarge {
                size,
                limit: self.max_object_bytes,
            });
        }

        if tokio::fs::try_exists(&dest).await.unwrap_or(false) {
            return Err(StorageError::AlreadyExists(key.to_string()));
        }

        tokio::fs::copy(source, &dest)
            .await
            .map_err(|e| map_io(e, &dest))?;

        debug!(key, size_bytes = size, "Stored object");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.object_path(key)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| map_io(e, &path))?;
        debug!(key, "Removed object");
        Ok(())
    }

    async fn resolve(&self, location: &str) -> Result<AudioAsset, StorageError> {
        if is_absolute_url(location) {
            return Ok(AudioAsset::remote(location, 0));
        }

        let path = self.object_path(location)?;
        let byte_size = tokio::fs::metadata(&path)
            .await
            .map(|m| m.len())
            .map_err(|e| map_io(e, &path))?;

        match &self.public_base_url {
            Some(base) => Ok(AudioAsset::remote(format!("{}/{}", base, location), byte_size)),
            None => AudioAsset::from_path(&path).map_err(|e| map_io(e, &path)),
        }
    }
}
