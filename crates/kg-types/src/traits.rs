//! Traits for the graph and cache backends, and the errors crossing them.

use crate::{Community, Neighbor, Node, Path};
use async_trait::async_trait;
use std::collections::BTreeSet;

/// Read-only capability boundary to the graph store.
///
/// Implementations decide how the four calls map onto storage; callers never
/// assume a query language. Unknown node ids yield empty results, not errors.
#[async_trait]
pub trait GraphClient: Send + Sync {
    /// Case-insensitive name lookup ranked exact > prefix > substring, then by
    /// descending degree, then ascending name.
    async fn find_nodes_by_name(
        &self,
        names: &[String],
        limit: usize,
    ) -> Result<Vec<Node>, GraphClientError>;

    /// All shortest paths between two nodes of at most `max_hops` hops
    /// (capped by the implementation).
    async fn shortest_paths(
        &self,
        from_id: &str,
        to_id: &str,
        max_hops: usize,
    ) -> Result<Vec<Path>, GraphClientError>;

    /// Directly connected nodes, in either direction.
    async fn neighbors(
        &self,
        node_id: &str,
        max_results: usize,
    ) -> Result<Vec<Neighbor>, GraphClientError>;

    /// Communities containing any of the given nodes.
    async fn communities_for(
        &self,
        node_ids: &BTreeSet<String>,
    ) -> Result<Vec<Community>, GraphClientError>;
}

/// Key-value medium behind the result cache. Values are opaque bytes; the
/// cache layer owns (de)serialization.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheStoreError>;

    /// Insert or atomically replace the value under `key`.
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), CacheStoreError>;

    /// Remove one entry; returns whether it existed.
    async fn evict(&self, key: &str) -> Result<bool, CacheStoreError>;

    /// Remove every entry; returns how many were removed.
    async fn clear(&self) -> Result<usize, CacheStoreError>;

    /// Number of physically stored entries (expired ones included).
    async fn len(&self) -> Result<usize, CacheStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum GraphClientError {
    #[error("graph store unavailable: {0}")]
    Unavailable(String),
    #[error("graph store protocol error: {0}")]
    Protocol(String),
}

#[derive(Debug, thiserror::Error)]
pub enum CacheStoreError {
    #[error("cache io: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid cache key: {0}")]
    InvalidKey(String),
    #[error("cache store error: {0}")]
    Other(String),
}

/// Errors that cross the retrieval boundary. Everything else degrades to an
/// empty or recomputed result.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("graph unavailable: {0}")]
    GraphUnavailable(#[from] GraphClientError),
}
