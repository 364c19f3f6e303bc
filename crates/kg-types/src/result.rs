//! Partial (per-strategy) and aggregated retrieval results.

use crate::{
    Community, ExtractedEntity, Node, Path, PathKey, Relationship, RelationshipKey,
    RetrievalParams, StrategyKind,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Output of one strategy invocation, before aggregation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialResult {
    pub strategy: StrategyKind,
    pub nodes: Vec<Node>,
    pub relationships: Vec<Relationship>,
    pub paths: Vec<Path>,
    pub communities: Vec<Community>,
}

impl PartialResult {
    pub fn empty(strategy: StrategyKind) -> Self {
        Self {
            strategy,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
            && self.relationships.is_empty()
            && self.paths.is_empty()
            && self.communities.is_empty()
    }
}

/// Which strategies produced each item, keyed by the item's identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    #[serde(default)]
    pub nodes: BTreeMap<String, BTreeSet<StrategyKind>>,
    #[serde(default)]
    pub relationships: BTreeMap<String, BTreeSet<StrategyKind>>,
    #[serde(default)]
    pub paths: BTreeMap<String, BTreeSet<StrategyKind>>,
    #[serde(default)]
    pub communities: BTreeMap<String, BTreeSet<StrategyKind>>,
}

/// Scalar and bookkeeping data attached to a result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultMetadata {
    #[serde(default)]
    pub entities: Vec<ExtractedEntity>,
    #[serde(default)]
    pub params: RetrievalParams,
    /// Strategies actually invoked (the sub-strategies for hybrid).
    #[serde(default)]
    pub strategies: Vec<StrategyKind>,
    #[serde(default)]
    pub cache_hit: bool,
    #[serde(default)]
    pub provenance: Provenance,
}

/// Deduplicated evidence returned by one `retrieve` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub strategy: StrategyKind,
    pub query: String,
    pub nodes: Vec<Node>,
    pub relationships: Vec<Relationship>,
    pub paths: Vec<Path>,
    pub communities: Vec<Community>,
    /// Wall-clock seconds spent computing the result.
    pub execution_time: f64,
    pub total_results: usize,
    #[serde(default)]
    pub metadata: ResultMetadata,
}

impl RetrievalResult {
    pub fn empty(strategy: StrategyKind, query: &str, params: RetrievalParams) -> Self {
        Self {
            strategy,
            query: query.to_string(),
            nodes: Vec::new(),
            relationships: Vec::new(),
            paths: Vec::new(),
            communities: Vec::new(),
            execution_time: 0.0,
            total_results: 0,
            metadata: ResultMetadata {
                params,
                ..Default::default()
            },
        }
    }

    pub fn node_ids(&self) -> BTreeSet<String> {
        self.nodes.iter().map(|n| n.id.clone()).collect()
    }

    pub fn relationship_keys(&self) -> BTreeSet<RelationshipKey> {
        self.relationships.iter().map(Relationship::key).collect()
    }

    pub fn path_keys(&self) -> BTreeSet<PathKey> {
        self.paths.iter().map(Path::key).collect()
    }
}
