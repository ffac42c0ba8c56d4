//! Object storage for uploaded audio
//!
//! Track records keep either an object key or an absolute URL. The store
//! resolves either form into an [`AudioAsset`] the estimator can decode.

pub mod local;

pub use local::LocalObjectStore;

use crate::decode::AudioAsset;
use std::path::Path;
use thiserror::Error;

/// Storage errors, classified the way upload feedback presents them
#[derive(Debug, Error)]
pub enum StorageError {
    /// Bucket directory or remote bucket is missing
    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    /// Write or read refused by the storage policy
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Object exceeds the store's size limit
    #[error("Object too large: {size} bytes (limit {limit})")]
    PayloadTooLarge { size: u64, limit: u64 },

    /// Caller is not authorised to use the store
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// An object already exists under this key (uploads never overwrite)
    #[error("Object already exists: {0}")]
    AlreadyExists(String),

    /// No object under this key
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Key contains path separators or parent references
    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Bucket abstraction injected into upload, library and correction services
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Copy a local file into the bucket under `key`
    async fn put(&self, key: &str, source: &Path) -> Result<(), StorageError>;

    /// Remove the object stored under `key`
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Turn a stored location (object key or absolute URL) into a decodable asset
    async fn resolve(&self, location: &str) -> Result<AudioAsset, StorageError>;
}

/// True when the location is already an absolute URL rather than a bucket key
pub fn is_absolute_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Build an object key from upload time and the original file name
///
/// Characters outside `[A-Za-z0-9.-]` become `_`.
pub fn object_key(unix_millis: i64, file_name: &str) -> String {
    let sanitized: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}-{}", unix_millis, sanitized)
}
