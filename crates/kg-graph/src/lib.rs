//! Graph clients: in-memory property graph (JSON snapshots) and Neo4j over HTTP.

mod config;
#[cfg(feature = "test-util")]
pub mod fixtures;
mod memory;
mod neo4j;
mod snapshot;

pub use config::GraphConfig;
pub use kg_types::{Community, GraphClient, GraphClientError, Neighbor, Node, Path, Relationship};
pub use memory::{InMemoryGraphClient, MAX_SHORTEST_PATHS};
pub use neo4j::Neo4jGraphClient;
pub use snapshot::{GraphSnapshot, SnapshotError};
