use crate::{CacheManager, FileCacheStore, InMemoryCacheStore};
use kg_types::CacheStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_DIR: &str = ".kg-cache";
const DEFAULT_TTL_SECS: u64 = 3600;
const DEFAULT_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheBackend {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    pub dir: PathBuf,
    pub ttl: Duration,
    /// Entry bound for the memory backend.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::File,
            dir: PathBuf::from(DEFAULT_DIR),
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl CacheConfig {
    /// Reads `KG_CACHE_BACKEND`, `KG_CACHE_DIR`, `KG_CACHE_TTL_SECS`, `KG_CACHE_CAPACITY`.
    /// Unparseable values fall back to defaults with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let backend = match get("KG_CACHE_BACKEND").map(|v| v.trim().to_ascii_lowercase()) {
            None => defaults.backend,
            Some(v) if v == "file" => CacheBackend::File,
            Some(v) if v == "memory" => CacheBackend::Memory,
            Some(v) => {
                tracing::warn!(value = %v, "unknown KG_CACHE_BACKEND; using file");
                CacheBackend::File
            }
        };
        Self {
            backend,
            dir: get("KG_CACHE_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.dir),
            ttl: Duration::from_secs(parse_or(
                "KG_CACHE_TTL_SECS",
                get("KG_CACHE_TTL_SECS"),
                DEFAULT_TTL_SECS,
            )),
            capacity: parse_or("KG_CACHE_CAPACITY", get("KG_CACHE_CAPACITY"), DEFAULT_CAPACITY),
        }
    }

    pub fn store(&self) -> Arc<dyn CacheStore> {
        match self.backend {
            CacheBackend::File => Arc::new(FileCacheStore::new(self.dir.clone())),
            CacheBackend::Memory => Arc::new(InMemoryCacheStore::new(self.capacity)),
        }
    }

    pub fn build(&self) -> CacheManager {
        CacheManager::new(self.store(), self.ttl)
    }
}

fn parse_or<T: std::str::FromStr>(name: &str, raw: Option<String>, default: T) -> T {
    let Some(v) = raw else {
        return default;
    };
    match v.trim().parse() {
        Ok(parsed) => parsed,
        Err(_) => {
            tracing::warn!(var = name, value = %v, "invalid value; using default");
            default
        }
    }
}
