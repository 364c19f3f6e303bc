//! JSON graph snapshots loadable into [`crate::InMemoryGraphClient`].

use kg_types::{Community, Node, Relationship};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Serialized graph: `{"nodes": [...], "relationships": [...], "communities": [...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub communities: Vec<Community>,
}

impl GraphSnapshot {
    pub async fn read(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| SnapshotError::Io(format!("{}: {}", path.display(), e)))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot io: {0}")]
    Io(String),
    #[error("snapshot parse: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate node id: {0}")]
    DuplicateNode(String),
    #[error("{context} references unknown node {node_id}")]
    UnknownNode { context: String, node_id: String },
}
