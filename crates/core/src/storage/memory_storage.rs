use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Storage, StorageError, StorageResult, WriteBatch};

/// In-memory storage, used by tests and ephemeral deployments
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    data: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    /// Create a new empty memory storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn put(&self, key: &str, data: &[u8]) -> StorageResult<()> {
        let mut store = self.data.write().await;
        store.insert(key.to_string(), data.to_vec());
        Ok(())
    }

    async fn put_batch(&self, batch: WriteBatch) -> StorageResult<()> {
        // One write guard for the whole batch, so readers see all or nothing
        let mut store = self.data.write().await;
        for (key, data) in batch.into_entries() {
            store.insert(key, data);
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        let store = self.data.read().await;
        store.get(key)
            .cloned()
            .ok_or_else(|| StorageError::KeyNotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let mut store = self.data.write().await;
        store.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let store = self.data.read().await;
        Ok(store.contains_key(key))
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let store = self.data.read().await;
        let keys = store.keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        Ok(keys)
    }

    fn base_path(&self) -> Option<PathBuf> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::JsonStorage;

    #[tokio::test]
    async fn test_put_get_delete() {
        let storage = MemoryStorage::new();
        storage.put("a/b", b"value").await.unwrap();

        assert_eq!(storage.get("a/b").await.unwrap(), b"value".to_vec());
        assert!(storage.exists("a/b").await.unwrap());

        storage.delete("a/b").await.unwrap();
        assert!(matches!(storage.get("a/b").await, Err(StorageError::KeyNotFound(_))));
    }

    #[tokio::test]
    async fn test_list_by_prefix() {
        let storage = MemoryStorage::new();
        storage.put_json("governance/proposals/0", &1u64).await.unwrap();
        storage.put_json("governance/proposals/1", &2u64).await.unwrap();
        storage.put_json("treasury/state", &3u64).await.unwrap();

        let keys = storage.list("governance/proposals/").await.unwrap();
        assert_eq!(keys, vec!["governance/proposals/0", "governance/proposals/1"]);
    }

    #[tokio::test]
    async fn test_batch_applies_every_entry() {
        let storage = MemoryStorage::new();
        let mut batch = WriteBatch::new();
        batch.put_json("x/1", &"one").unwrap();
        batch.put_json("x/2", &"two").unwrap();
        storage.put_batch(batch).await.unwrap();

        assert_eq!(storage.len().await, 2);
        let two: String = storage.get_json("x/2").await.unwrap();
        assert_eq!(two, "two");
        assert_eq!(storage.get_json_opt::<String>("x/3").await.unwrap(), None);
    }
}
