//! In-memory object store
//!
//! Test double for the storage collaborator. Keeps objects in a map behind
//! a `parking_lot` lock; presigned URLs are synthetic `memory://` URIs.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use super::{ObjectMetadata, ObjectStore, StorageError, StorageResult};

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Vec<u8>,
    metadata: ObjectMetadata,
}

/// In-memory [`ObjectStore`] implementation
#[derive(Clone, Default)]
pub struct MemoryStore {
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> StorageResult<()> {
        let metadata = ObjectMetadata {
            key: key.to_string(),
            size: bytes.len() as i64,
            last_modified: Some(Utc::now()),
            content_type: Some(content_type.to_string()),
            etag: None,
        };
        self.objects
            .write()
            .insert(key.to_string(), StoredObject { bytes, metadata });
        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        self.objects
            .read()
            .get(key)
            .map(|o| o.bytes.clone())
            .ok_or_else(|| StorageError::ObjectNotFound(key.to_string()))
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.objects.read().contains_key(key))
    }

    async fn head(&self, key: &str) -> StorageResult<ObjectMetadata> {
        self.objects
            .read()
            .get(key)
            .map(|o| o.metadata.clone())
            .ok_or_else(|| StorageError::ObjectNotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.objects.write().remove(key);
        Ok(())
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        if !self.objects.read().contains_key(key) {
            return Err(StorageError::ObjectNotFound(key.to_string()));
        }
        Ok(format!("memory://{key}?expires={}", expires_in.as_secs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_round_trip() {
        let store = MemoryStore::new();
        store
            .put("jobs/a/in.pdf", vec![1, 2, 3], "application/pdf")
            .await
            .unwrap();

        assert!(store.exists("jobs/a/in.pdf").await.unwrap());
        assert_eq!(store.get("jobs/a/in.pdf").await.unwrap(), vec![1, 2, 3]);

        let meta = store.head("jobs/a/in.pdf").await.unwrap();
        assert_eq!(meta.size, 3);
        assert_eq!(meta.content_type.as_deref(), Some("application/pdf"));
    }

    #[tokio::test]
    async fn missing_objects_report_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.get("nope").await,
            Err(StorageError::ObjectNotFound(_))
        ));
        assert!(!store.exists("nope").await.unwrap());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryStore::new();
        store.put("k", vec![0], "application/pdf").await.unwrap();
        store.delete("k").await.unwrap();
        store.delete("k").await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn presign_requires_the_object() {
        let store = MemoryStore::new();
        store.put("k", vec![0], "application/pdf").await.unwrap();
        let url = store
            .presign_get("k", Duration::from_secs(600))
            .await
            .unwrap();
        assert_eq!(url, "memory://k?expires=600");
        assert!(store.presign_get("missing", Duration::from_secs(1)).await.is_err());
    }
}
