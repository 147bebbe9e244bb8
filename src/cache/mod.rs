//! Persistent key-value cache for LLM calls.
//!
//! Distinct from the simulation trace cache in [`crate::simulation`]: this
//! cache is keyed by a request digest over `(model, params, messages)` and
//! survives across processes so that identical LLM calls never hit the
//! network twice.

mod file;
mod in_memory;

pub use file::FileCache;
pub use in_memory::InMemoryCache;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache io error: {0}")]
    Io(String),
}

/// Key-value cache trait. The LLM client stores raw provider responses here,
/// keyed by a stable digest of the outbound request.
#[async_trait]
pub trait Cache<K, V>: Send + Sync
where
    K: Send + Sync,
    V: Clone + Send + Sync,
{
    async fn get(&self, key: &K) -> Option<V>;
    async fn set(&self, key: K, value: V) -> Result<(), CacheError>;
    async fn flush(&self) -> Result<(), CacheError>;
}
