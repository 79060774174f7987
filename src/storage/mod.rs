//! Object storage collaborator
//!
//! Uploaded inputs and processed outputs live in S3-compatible object
//! storage. The service only ever talks to the narrow [`ObjectStore`]
//! trait; production wires in [`S3Store`], tests use [`MemoryStore`].

mod memory;
mod s3;
mod types;

pub use memory::MemoryStore;
pub use s3::S3Store;
pub use types::ObjectMetadata;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Storage-specific errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Storage SDK error: {0}")]
    SdkError(String),
}

/// Result type alias for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Blob storage boundary: upload, download, existence check, presigned URL
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store an object under `key`, overwriting any previous version
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> StorageResult<()>;

    /// Fetch an object's bytes
    async fn get(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Check whether an object exists without downloading it
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Object metadata
    async fn head(&self, key: &str) -> StorageResult<ObjectMetadata>;

    /// Delete an object; deleting a missing object is not an error
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Time-limited download URL for handing to clients
    async fn presign_get(&self, key: &str, expires_in: Duration) -> StorageResult<String>;
}
