//! Spin Key-Value Store backend.

use async_trait::async_trait;

use crate::store::{CacheError, CacheResult, EdgeStore};

/// Edge store backed by a Spin Key-Value Store.
///
/// The store is opened per operation so the handle never outlives the call.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpinKvStore;

impl SpinKvStore {
    /// Use the component's default store.
    pub fn open_default() -> Self {
        Self
    }

    fn store(&self) -> CacheResult<spin_sdk::key_value::Store> {
        spin_sdk::key_value::Store::open_default().map_err(|e| CacheError::Storage(e.to_string()))
    }
}

#[async_trait(?Send)]
impl EdgeStore for SpinKvStore {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        self.store()?
            .get(key)
            .map_err(|e| CacheError::Storage(e.to_string()))
    }

    async fn put(&self, key: &str, value: &[u8]) -> CacheResult<()> {
        self.store()?
            .set(key, value)
            .map_err(|e| CacheError::Storage(e.to_string()))
    }
}
