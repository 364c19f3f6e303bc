//! In-process LRU store.

use kg_types::{CacheStore, CacheStoreError};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

/// Bounded in-memory store; least recently used entries fall out first.
pub struct InMemoryCacheStore {
    entries: Mutex<LruCache<String, Vec<u8>>>,
}

impl InMemoryCacheStore {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, LruCache<String, Vec<u8>>>, CacheStoreError> {
        self.entries
            .lock()
            .map_err(|_| CacheStoreError::Other("memory cache lock poisoned".to_string()))
    }
}

#[async_trait::async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheStoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), CacheStoreError> {
        self.lock()?.put(key.to_string(), value);
        Ok(())
    }

    async fn evict(&self, key: &str) -> Result<bool, CacheStoreError> {
        Ok(self.lock()?.pop(key).is_some())
    }

    async fn clear(&self) -> Result<usize, CacheStoreError> {
        let mut entries = self.lock()?;
        let n = entries.len();
        entries.clear();
        Ok(n)
    }

    async fn len(&self) -> Result<usize, CacheStoreError> {
        Ok(self.lock()?.len())
    }
}
