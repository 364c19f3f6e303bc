//! Graph connection settings from the environment.

use crate::{InMemoryGraphClient, Neo4jGraphClient};
use kg_types::{GraphClient, GraphClientError};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_DATABASE: &str = "neo4j";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the graph lives. A snapshot file takes precedence over a server URI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphConfig {
    pub uri: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: String,
    pub snapshot: Option<PathBuf>,
}

impl GraphConfig {
    /// Reads `GRAPH_URI`, `GRAPH_USER`, `GRAPH_PASSWORD`, `GRAPH_DATABASE`, `GRAPH_SNAPSHOT`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| get(key).filter(|v| !v.trim().is_empty());
        Self {
            uri: non_empty("GRAPH_URI"),
            user: non_empty("GRAPH_USER"),
            password: get("GRAPH_PASSWORD"),
            database: non_empty("GRAPH_DATABASE").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            snapshot: non_empty("GRAPH_SNAPSHOT").map(PathBuf::from),
        }
    }

    /// Open the configured graph. A Neo4j endpoint is pinged once so that bad
    /// addresses or credentials fail here rather than on the first query.
    pub async fn connect(&self) -> Result<Arc<dyn GraphClient>, GraphClientError> {
        if let Some(ref path) = self.snapshot {
            let graph = InMemoryGraphClient::load(path)
                .await
                .map_err(|e| GraphClientError::Unavailable(e.to_string()))?;
            tracing::info!(
                snapshot = %path.display(),
                nodes = graph.node_count().await,
                relationships = graph.relationship_count().await,
                "loaded graph snapshot"
            );
            return Ok(Arc::new(graph));
        }
        let Some(ref uri) = self.uri else {
            return Err(GraphClientError::Unavailable(
                "no graph configured: set GRAPH_URI or GRAPH_SNAPSHOT".to_string(),
            ));
        };
        let client = Neo4jGraphClient::new(
            uri,
            &self.database,
            self.user.clone(),
            self.password.clone(),
            DEFAULT_TIMEOUT,
        )?;
        client.ping().await?;
        tracing::info!(uri = %uri, database = %self.database, "connected to graph server");
        Ok(Arc::new(client))
    }
}
