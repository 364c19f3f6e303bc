//! TTL-aware cache over a [`CacheStore`].

use crate::{cache_key, CacheEntry, Clock, SystemClock};
use kg_types::{CacheStore, CacheStoreError, Query, RetrievalParams, RetrievalResult, StrategyKind};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error(transparent)]
    Store(#[from] CacheStoreError),
    #[error("cache entry encode: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Counters since process start plus the physical entry count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub ttl_secs: u64,
}

/// Maps (query, strategy, params) to a stored result. Read failures and
/// corrupt or expired entries are reported as misses, never as errors.
pub struct CacheManager {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheManager {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self::with_clock(store, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn CacheStore>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            ttl,
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Default time-to-live for entries stored without an explicit one.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get(
        &self,
        query: &Query,
        strategy: StrategyKind,
        params: &RetrievalParams,
    ) -> Option<RetrievalResult> {
        self.get_by_key(&cache_key(query, strategy, params)).await
    }

    pub async fn get_by_key(&self, key: &str) -> Option<RetrievalResult> {
        let found = self.lookup(key).await;
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    async fn lookup(&self, key: &str) -> Option<RetrievalResult> {
        let bytes = match self.store.get(key).await {
            Ok(Some(b)) => b,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(cache_key = %key, error = %e, "cache read failed; treating as miss");
                return None;
            }
        };
        let entry = match serde_json::from_slice::<CacheEntry>(&bytes) {
            Ok(entry) if entry.key == key => entry,
            Ok(entry) => {
                tracing::warn!(cache_key = %key, stored_key = %entry.key, "cache entry under wrong key; evicting");
                self.evict_quietly(key).await;
                return None;
            }
            Err(e) => {
                tracing::warn!(cache_key = %key, error = %e, "corrupt cache entry; evicting");
                self.evict_quietly(key).await;
                return None;
            }
        };
        if entry.is_expired(self.clock.now()) {
            tracing::debug!(cache_key = %key, "cache entry expired");
            self.evict_quietly(key).await;
            return None;
        }
        Some(entry.result)
    }

    async fn evict_quietly(&self, key: &str) {
        if let Err(e) = self.store.evict(key).await {
            tracing::warn!(cache_key = %key, error = %e, "cache evict failed");
        }
    }

    /// Store `result`; `ttl` of `None` uses the manager default. Returns the key.
    pub async fn put(
        &self,
        query: &Query,
        strategy: StrategyKind,
        params: &RetrievalParams,
        result: &RetrievalResult,
        ttl: Option<Duration>,
    ) -> Result<String, CacheError> {
        let key = cache_key(query, strategy, params);
        self.put_by_key(&key, result, ttl).await?;
        Ok(key)
    }

    pub async fn put_by_key(
        &self,
        key: &str,
        result: &RetrievalResult,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let entry = CacheEntry::new(
            key.to_string(),
            self.clock.now(),
            ttl.unwrap_or(self.ttl),
            result.clone(),
        );
        let bytes = serde_json::to_vec(&entry)?;
        self.store.put(key, bytes).await?;
        tracing::debug!(cache_key = %key, strategy = %result.strategy, "cached result");
        Ok(())
    }

    pub async fn evict(
        &self,
        query: &Query,
        strategy: StrategyKind,
        params: &RetrievalParams,
    ) -> Result<bool, CacheError> {
        Ok(self.store.evict(&cache_key(query, strategy, params)).await?)
    }

    pub async fn clear(&self) -> Result<usize, CacheError> {
        let removed = self.store.clear().await?;
        tracing::info!(removed, "cache cleared");
        Ok(removed)
    }

    pub async fn stats(&self) -> Result<CacheStats, CacheError> {
        Ok(CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.store.len().await?,
            ttl_secs: self.ttl.as_secs(),
        })
    }
}
