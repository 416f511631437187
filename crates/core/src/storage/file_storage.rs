use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use async_trait::async_trait;
use tracing::{debug, trace, warn};

use super::{parse_key_segment, Storage, StorageError, StorageOptions, StorageResult, WriteBatch};

const TEMP_SUFFIX: &str = ".tmp";

/// A file-based storage implementation.
///
/// Each key maps to one file under the base directory. Key segments are
/// percent-encoded so that principal identifiers can be used verbatim in keys.
/// Writes go to a temporary file first and are renamed into place.
pub struct FileStorage {
    base_path: PathBuf,
    options: StorageOptions,
    cache: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl FileStorage {
    /// Create a new file storage instance
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = base_path.into();

        if !path.exists() {
            fs::create_dir_all(&path).await?;
        }

        Ok(Self {
            base_path: path,
            options: StorageOptions::default(),
            cache: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Set storage options
    pub fn with_options(mut self, options: StorageOptions) -> Self {
        self.options = options;
        self
    }

    /// Get the full path for a key
    fn get_path(&self, key: &str) -> StorageResult<PathBuf> {
        let mut path = self.base_path.clone();
        for segment in key.split('/').filter(|s| !s.is_empty()) {
            path.push(encode_segment(segment));
        }
        if path == self.base_path {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(path)
    }

    fn temp_path(path: &Path) -> PathBuf {
        let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(TEMP_SUFFIX);
        path.with_file_name(name)
    }

    /// Write data next to its final location without making it visible yet
    async fn stage(&self, path: &Path, data: &[u8]) -> StorageResult<PathBuf> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }

        let temp = Self::temp_path(path);
        let mut file = fs::File::create(&temp).await?;
        file.write_all(data).await?;
        if self.options.sync_write {
            file.sync_all().await?;
        }
        Ok(temp)
    }

    async fn discard(staged: &[(PathBuf, PathBuf)]) {
        for (temp, _) in staged {
            if let Err(e) = fs::remove_file(temp).await {
                warn!("Failed to remove staged file {}: {}", temp.display(), e);
            }
        }
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn put(&self, key: &str, data: &[u8]) -> StorageResult<()> {
        let path = self.get_path(key)?;
        let temp = self.stage(&path, data).await?;
        fs::rename(&temp, &path).await?;

        if self.options.use_cache {
            let mut cache = self.cache.write().await;
            cache.insert(key.to_string(), data.to_vec());
        }

        trace!("Stored data at key: {}", key);
        Ok(())
    }

    async fn put_batch(&self, batch: WriteBatch) -> StorageResult<()> {
        let entries = batch.into_entries();

        // Nothing becomes visible unless every file was staged
        let mut staged = Vec::with_capacity(entries.len());
        for (key, data) in &entries {
            let path = match self.get_path(key) {
                Ok(path) => path,
                Err(e) => {
                    Self::discard(&staged).await;
                    return Err(e);
                }
            };
            match self.stage(&path, data).await {
                Ok(temp) => staged.push((temp, path)),
                Err(e) => {
                    Self::discard(&staged).await;
                    return Err(e);
                }
            }
        }

        for (i, (temp, path)) in staged.iter().enumerate() {
            if let Err(e) = fs::rename(temp, path).await {
                warn!("Batch stopped after {} of {} keys: {}", i, staged.len(), e);
                Self::discard(&staged[i..]).await;
                return Err(e.into());
            }
        }

        if self.options.use_cache {
            let mut cache = self.cache.write().await;
            for (key, data) in entries {
                cache.insert(key, data);
            }
        }

        debug!("Committed batch of {} keys", staged.len());
        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        if self.options.use_cache {
            let cache = self.cache.read().await;
            if let Some(data) = cache.get(key) {
                trace!("Retrieved data from cache for key: {}", key);
                return Ok(data.clone());
            }
        }

        let path = self.get_path(key)?;
        if !path.exists() {
            return Err(StorageError::KeyNotFound(key.to_string()));
        }

        let data = fs::read(&path).await?;

        if self.options.use_cache {
            let mut cache = self.cache.write().await;
            cache.insert(key.to_string(), data.clone());
        }

        Ok(data)
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.get_path(key)?;
        if path.exists() {
            fs::remove_file(path).await?;
            debug!("Deleted key: {}", key);
        }

        if self.options.use_cache {
            let mut cache = self.cache.write().await;
            cache.remove(key);
        }

        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        if self.options.use_cache {
            let cache = self.cache.read().await;
            if cache.contains_key(key) {
                return Ok(true);
            }
        }

        Ok(self.get_path(key)?.exists())
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let path = self.get_path(prefix)?;

        if !path.exists() {
            return Ok(Vec::new());
        }

        if !path.is_dir() {
            return Err(StorageError::NotADirectory(prefix.to_string()));
        }

        let mut keys = self.list_directory(&path).await?;
        keys.sort();
        Ok(keys)
    }

    fn base_path(&self) -> Option<PathBuf> {
        Some(self.base_path.clone())
    }
}

impl FileStorage {
    /// Recursive helper to list directory contents as decoded keys
    async fn list_directory(&self, dir_path: &Path) -> StorageResult<Vec<String>> {
        let mut result = Vec::new();
        let mut pending = vec![dir_path.to_path_buf()];

        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();

                if path.is_dir() {
                    pending.push(path);
                    continue;
                }

                if path.extension().map_or(false, |ext| ext == &TEMP_SUFFIX[1..]) {
                    continue;
                }

                if let Ok(rel_path) = path.strip_prefix(&self.base_path) {
                    let key = rel_path
                        .components()
                        .map(|c| parse_key_segment(&c.as_os_str().to_string_lossy()))
                        .collect::<Vec<_>>()
                        .join("/");
                    result.push(key);
                }
            }
        }

        Ok(result)
    }
}

fn is_plain(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_'
}

/// Percent-encode every byte of a key segment that is not `[A-Za-z0-9_-]`
fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        if is_plain(byte) {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}
