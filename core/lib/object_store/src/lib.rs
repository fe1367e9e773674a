//! Blob store facade (C3): create/delete/get of named byte blobs under a
//! parent namespace. Concrete backends (GCS, S3, filesystem) are external
//! collaborators per spec §1/§9 — this crate only defines the trait and an
//! in-memory implementation used by tests and local development, grounded
//! on the `async_trait`-based capability-interface style seen in the
//! retrieved `KeyManagementService` reference (`hanzo-kbs/kms.rs`).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum ObjectStoreError {
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("backend I/O error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, ObjectStoreError>;

/// A handle bound to one namespace (bucket, in blob-store terms).
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get_object(&self, bucket: &str, name: &str) -> Result<Vec<u8>>;

    /// Overwrites any existing object at `name` (spec §4.5 step 5:
    /// "deterministic filenames so re-uploads overwrite").
    async fn create_object(&self, bucket: &str, name: &str, content: &[u8]) -> Result<()>;

    async fn delete_object(&self, bucket: &str, name: &str) -> Result<()>;

    async fn exists(&self, bucket: &str, name: &str) -> Result<bool> {
        match self.get_object(bucket, name).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }
}

/// In-memory implementation for tests and local development.
#[derive(Debug, Default, Clone)]
pub struct InMemoryObjectStore {
    objects: Arc<RwLock<HashMap<(String, String), Vec<u8>>>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn get_object(&self, bucket: &str, name: &str) -> Result<Vec<u8>> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| ObjectStoreError::NotFound(name.to_string()))
    }

    async fn create_object(&self, bucket: &str, name: &str, content: &[u8]) -> Result<()> {
        self.objects
            .write()
            .await
            .insert((bucket.to_string(), name.to_string()), content.to_vec());
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, name: &str) -> Result<()> {
        self.objects
            .write()
            .await
            .remove(&(bucket.to_string(), name.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_an_object() {
        let store = InMemoryObjectStore::new();
        store.create_object("b", "k", b"v").await.unwrap();
        assert_eq!(store.get_object("b", "k").await.unwrap(), b"v");
    }

    #[tokio::test]
    async fn overwrite_replaces_content() {
        let store = InMemoryObjectStore::new();
        store.create_object("b", "k", b"v1").await.unwrap();
        store.create_object("b", "k", b"v2").await.unwrap();
        assert_eq!(store.get_object("b", "k").await.unwrap(), b"v2");
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let store = InMemoryObjectStore::new();
        store.create_object("b", "k", b"v").await.unwrap();
        store.delete_object("b", "k").await.unwrap();
        assert!(matches!(
            store.get_object("b", "k").await,
            Err(ObjectStoreError::NotFound(_))
        ));
        assert!(!store.exists("b", "k").await.unwrap());
    }
}
