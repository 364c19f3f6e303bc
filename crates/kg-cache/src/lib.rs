//! Result cache: key derivation, TTL-checked entries, and the stores behind them.

mod clock;
mod config;
mod entry;
mod file;
mod key;
mod manager;
mod memory;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheBackend, CacheConfig};
pub use entry::CacheEntry;
pub use file::FileCacheStore;
pub use key::cache_key;
pub use kg_types::{CacheStore, CacheStoreError};
pub use manager::{CacheError, CacheManager, CacheStats};
pub use memory::InMemoryCacheStore;
