//! Key-value store seam for the edge cache.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache operation errors.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Failed to serialize/deserialize cache entry.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Backend storage error.
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Byte-oriented key-value store co-located with request handling.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait EdgeStore: Send + Sync {
    /// Read a value. `Ok(None)` when the key is absent.
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Write a value, replacing any previous one.
    async fn put(&self, key: &str, value: &[u8]) -> CacheResult<()>;
}

/// Read and decode a JSON value.
pub async fn get_json<T: DeserializeOwned>(
    store: &dyn EdgeStore,
    key: &str,
) -> CacheResult<Option<T>> {
    match store.get(key).await? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

/// Encode and write a JSON value.
pub async fn put_json<T: Serialize + ?Sized>(
    store: &dyn EdgeStore,
    key: &str,
    value: &T,
) -> CacheResult<()> {
    let bytes = serde_json::to_vec(value)?;
    store.put(key, &bytes).await
}

/// Process-local store (for development/testing).
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn poisoned() -> CacheError {
        CacheError::Storage("in-memory store lock poisoned".to_string())
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl EdgeStore for InMemoryStore {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let entries = self.entries.lock().map_err(|_| Self::poisoned())?;
        Ok(entries.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &[u8]) -> CacheResult<()> {
        let mut entries = self.entries.lock().map_err(|_| Self::poisoned())?;
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}
