//! In-memory object store.
//!
//! Backs unit and integration tests; also handy for dry runs where nothing
//! should touch disk.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::ObjectStore;
use crate::error::StoreError;

/// Object store holding everything in a `BTreeMap` behind an async lock.
#[derive(Default)]
pub struct MemoryStore {
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        self.objects
            .write()
            .await
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .objects
            .read()
            .await
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        store.put("a/1.json", b"one").await.expect("put");
        store.put("a/2.json", b"two").await.expect("put");
        store.put("b/3.json", b"three").await.expect("put");

        assert_eq!(store.get("a/2.json").await.expect("get"), b"two");
        assert_eq!(store.list("a/").await.expect("list").len(), 2);
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn test_memory_store_missing_key() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.get("missing").await,
            Err(StoreError::NotFound(_))
        ));
    }
}
