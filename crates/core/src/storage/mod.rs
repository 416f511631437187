//! Key-value storage for Steward components
//!
//! Keys are `/`-separated paths such as `governance/proposals/3`. Values are
//! opaque bytes; the [`JsonStorage`] extension trait layers serde on top.

use std::path::PathBuf;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Storage-related errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage options
#[derive(Debug, Clone)]
pub struct StorageOptions {
    pub sync_write: bool,
    pub use_cache: bool,
}

impl Default for StorageOptions {
    fn default() -> Self {
        StorageOptions {
            sync_write: true,
            use_cache: true,
        }
    }
}

/// A set of writes applied together by [`Storage::put_batch`].
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    entries: Vec<(String, Vec<u8>)>,
}

impl WriteBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue raw bytes under a key
    pub fn put(&mut self, key: impl Into<String>, data: Vec<u8>) {
        self.entries.push((key.into(), data));
    }

    /// Serialize a value and queue it under a key
    pub fn put_json<T: Serialize + ?Sized>(&mut self, key: impl Into<String>, value: &T) -> StorageResult<()> {
        let data = serde_json::to_vec_pretty(value)?;
        self.put(key, data);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the batch, yielding `(key, data)` pairs in insertion order
    pub fn into_entries(self) -> Vec<(String, Vec<u8>)> {
        self.entries
    }
}

/// The core Storage trait defining the operations all storage implementations must support
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    /// Store data at the specified key
    async fn put(&self, key: &str, data: &[u8]) -> StorageResult<()>;

    /// Store every entry of the batch.
    ///
    /// A failure while preparing the batch leaves storage untouched. Backends
    /// that cannot swap several keys in one step may leave a prefix of the
    /// batch visible if the final step fails; `FileStorage` is one of them.
    async fn put_batch(&self, batch: WriteBatch) -> StorageResult<()>;

    /// Retrieve data from the specified key
    async fn get(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Delete data at the specified key
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Check if a key exists
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// List all keys with a given prefix
    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>>;

    /// Get base path of the storage
    fn base_path(&self) -> Option<PathBuf>;
}

/// Extension trait for JSON serialization/deserialization
#[async_trait]
pub trait JsonStorage: Storage {
    /// Store a serializable value at the specified key
    async fn put_json<T: Serialize + Send + Sync>(&self, key: &str, value: &T) -> StorageResult<()> {
        let json_data = serde_json::to_vec_pretty(value)
            .map_err(StorageError::SerializationError)?;
        self.put(key, &json_data).await
    }

    /// Retrieve and deserialize a value from the specified key
    async fn get_json<T: DeserializeOwned + Send>(&self, key: &str) -> StorageResult<T> {
        let data = self.get(key).await?;
        serde_json::from_slice(&data)
            .map_err(StorageError::SerializationError)
    }

    /// Retrieve a value, returning `None` when the key is absent
    async fn get_json_opt<T: DeserializeOwned + Send>(&self, key: &str) -> StorageResult<Option<T>> {
        match self.get_json(key).await {
            Ok(value) => Ok(Some(value)),
            Err(StorageError::KeyNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl<T: Storage + ?Sized> JsonStorage for T {}

/// Escape `value` so it occupies exactly one segment of a key.
///
/// Principal identifiers are free-form, so `org` and `org/treasurer` must not
/// turn into a parent and a child path.
pub fn key_segment(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '%' => out.push_str("%25"),
            '/' => out.push_str("%2F"),
            c => out.push(c),
        }
    }
    out
}

/// Undo percent-encoding in one key segment
pub fn parse_key_segment(segment: &str) -> String {
    let bytes = segment.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let decoded = std::str::from_utf8(&bytes[i + 1..i + 3])
                .ok()
                .and_then(|hex| u8::from_str_radix(hex, 16).ok());
            if let Some(byte) = decoded {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

pub mod file_storage;
pub mod memory_storage;

pub use file_storage::FileStorage;
pub use memory_storage::MemoryStorage;
