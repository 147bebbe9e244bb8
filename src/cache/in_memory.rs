use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::{Cache, CacheError};

/// Process-local cache. Useful for tests and for the mock LLM client; the
/// real LLM client uses [`super::FileCache`] so responses survive restarts.
#[derive(Default)]
pub struct InMemoryCache<V> {
    inner: RwLock<HashMap<String, V>>,
}

impl<V> InMemoryCache<V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl<V> Cache<String, V> for InMemoryCache<V>
where
    V: Clone + Send + Sync,
{
    async fn get(&self, key: &String) -> Option<V> {
        self.inner.read().unwrap().get(key).cloned()
    }

    async fn set(&self, key: String, value: V) -> Result<(), CacheError> {
        self.inner.write().unwrap().insert(key, value);
        Ok(())
    }

    async fn flush(&self) -> Result<(), CacheError> {
        Ok(())
    }
}
