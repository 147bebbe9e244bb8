use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use super::{Cache, CacheError};

/// File-backed cache, keyed by request digest, persisted as JSON.
///
/// Writes are atomic: the whole map is serialized to a `.tmp` sibling file,
/// `fsync`'d, then renamed over the destination. A crash at any point before
/// the rename leaves the previous file untouched.
pub struct FileCache<V> {
    path: PathBuf,
    inner: RwLock<HashMap<String, V>>,
}

impl<V> FileCache<V>
where
    V: Clone + Serialize + DeserializeOwned,
{
    /// Loads the cache from `path` if it exists, otherwise starts empty.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let path = path.into();
        let inner = match std::fs::read(&path) {
            Ok(bytes) => {
                serde_json::from_slice(&bytes).map_err(|e| CacheError::Io(e.to_string()))?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(CacheError::Io(e.to_string())),
        };
        Ok(Self {
            path,
            inner: RwLock::new(inner),
        })
    }

    fn write_atomic(path: &Path, map: &HashMap<String, V>) -> Result<(), CacheError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| CacheError::Io(e.to_string()))?;
            }
        }
        let tmp_path = path.with_extension("tmp");
        let bytes = serde_json::to_vec(map).map_err(|e| CacheError::Io(e.to_string()))?;
        {
            let mut file =
                std::fs::File::create(&tmp_path).map_err(|e| CacheError::Io(e.to_string()))?;
            use std::io::Write;
            file.write_all(&bytes)
                .map_err(|e| CacheError::Io(e.to_string()))?;
            file.sync_all().map_err(|e| CacheError::Io(e.to_string()))?;
        }
        std::fs::rename(&tmp_path, path).map_err(|e| CacheError::Io(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl<V> Cache<String, V> for FileCache<V>
where
    V: Clone + Serialize + DeserializeOwned + Send + Sync,
{
    async fn get(&self, key: &String) -> Option<V> {
        self.inner.read().unwrap().get(key).cloned()
    }

    async fn set(&self, key: String, value: V) -> Result<(), CacheError> {
        self.inner.write().unwrap().insert(key, value);
        Ok(())
    }

    async fn flush(&self) -> Result<(), CacheError> {
        let snapshot = self.inner.read().unwrap().clone();
        Self::write_atomic(&self.path, &snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_cache_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("llm-cache.json");

        {
            let cache: FileCache<String> = FileCache::load(&path).unwrap();
            cache.set("k1".into(), "v1".into()).await.unwrap();
            cache.flush().await.unwrap();
        }

        let reloaded: FileCache<String> = FileCache::load(&path).unwrap();
        assert_eq!(reloaded.get(&"k1".to_string()).await, Some("v1".into()));
    }

    #[tokio::test]
    async fn file_cache_starts_empty_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let cache: FileCache<String> = FileCache::load(&path).unwrap();
        assert_eq!(cache.get(&"k".to_string()).await, None);
    }
}
