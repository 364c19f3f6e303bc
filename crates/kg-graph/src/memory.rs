//! In-memory property graph client.

use crate::snapshot::{GraphSnapshot, SnapshotError};
use kg_types::{
    Community, GraphClient, GraphClientError, Neighbor, Node, Path, Relationship, RelationshipKey,
};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Upper bound on paths returned by one `shortest_paths` call.
pub const MAX_SHORTEST_PATHS: usize = 32;

type EdgeIndex = HashMap<String, Vec<usize>>;

/// How a node name matched a lookup term. Variant order is rank order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum NameMatch {
    Exact,
    Prefix,
    Substring,
}

impl NameMatch {
    /// Compare an already-lowercased name against an already-lowercased needle.
    pub(crate) fn classify(name: &str, needle: &str) -> Option<Self> {
        if name == needle {
            Some(NameMatch::Exact)
        } else if name.starts_with(needle) {
            Some(NameMatch::Prefix)
        } else if name.contains(needle) {
            Some(NameMatch::Substring)
        } else {
            None
        }
    }
}

#[derive(Default)]
struct GraphData {
    /// node_id -> node.
    nodes: HashMap<String, Node>,
    /// Relationships in insertion order, stored orientation.
    edges: Vec<Relationship>,
    edge_keys: HashSet<RelationshipKey>,
    /// source node_id -> edge indexes.
    out_index: EdgeIndex,
    /// target node_id -> edge indexes.
    in_index: EdgeIndex,
    /// community_id -> community.
    communities: BTreeMap<String, Community>,
}

impl GraphData {
    fn degree(&self, id: &str) -> usize {
        self.out_index.get(id).map_or(0, Vec::len) + self.in_index.get(id).map_or(0, Vec::len)
    }

    /// Edges touching `id` in either direction, ordered by type then far-end id.
    fn incident(&self, id: &str) -> Vec<usize> {
        let mut idxs: Vec<usize> = self
            .out_index
            .get(id)
            .into_iter()
            .chain(self.in_index.get(id))
            .flatten()
            .copied()
            .collect();
        idxs.sort_unstable();
        idxs.dedup();
        idxs.sort_by(|a, b| {
            let ea = &self.edges[*a];
            let eb = &self.edges[*b];
            ea.rel_type
                .cmp(&eb.rel_type)
                .then_with(|| ea.other_end(id).cmp(&eb.other_end(id)))
                .then_with(|| a.cmp(b))
        });
        idxs
    }

    fn insert_node(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
    }

    fn insert_edge(&mut self, rel: Relationship) -> Result<(), SnapshotError> {
        for end in [&rel.source, &rel.target] {
            if !self.nodes.contains_key(end) {
                return Err(SnapshotError::UnknownNode {
                    context: format!("relationship {}", rel.key()),
                    node_id: end.clone(),
                });
            }
        }
        if !self.edge_keys.insert(rel.key()) {
            return Ok(());
        }
        let idx = self.edges.len();
        self.out_index
            .entry(rel.source.clone())
            .or_default()
            .push(idx);
        self.in_index.entry(rel.target.clone()).or_default().push(idx);
        self.edges.push(Relationship {
            direction: Default::default(),
            ..rel
        });
        Ok(())
    }

    fn insert_community(&mut self, community: Community) -> Result<(), SnapshotError> {
        if let Some(missing) = community
            .members
            .iter()
            .find(|m| !self.nodes.contains_key(*m))
        {
            return Err(SnapshotError::UnknownNode {
                context: format!("community {}", community.id),
                node_id: missing.clone(),
            });
        }
        self.communities.insert(community.id.clone(), community);
        Ok(())
    }

    /// Walk predecessor lists back from `node` to `from`, emitting each full path.
    fn unwind<'a>(
        &'a self,
        from: &str,
        node: &'a str,
        preds: &HashMap<&'a str, Vec<(&'a str, usize)>>,
        suffix: &mut Vec<(usize, &'a str)>,
        out: &mut Vec<Path>,
    ) {
        if out.len() >= MAX_SHORTEST_PATHS {
            return;
        }
        if node == from {
            let Some(start) = self.nodes.get(from) else {
                return;
            };
            let mut path = Path::new(start.clone());
            let mut current = from;
            for &(idx, reached) in suffix.iter().rev() {
                let Some(next) = self.nodes.get(reached) else {
                    return;
                };
                let rel = self.edges[idx].clone().traversed_from(current);
                path = path.then(rel, next.clone());
                current = reached;
            }
            out.push(path);
            return;
        }
        for &(prev, idx) in preds.get(node).into_iter().flatten() {
            suffix.push((idx, node));
            self.unwind(from, prev, preds, suffix, out);
            suffix.pop();
        }
    }
}

/// Property graph held entirely in memory. Used for snapshots, tests, and small
/// deployments; safe to share across tasks.
#[derive(Clone, Default)]
pub struct InMemoryGraphClient {
    data: Arc<RwLock<GraphData>>,
}

impl InMemoryGraphClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from a snapshot. Relationships and communities must only
    /// reference nodes present in the snapshot.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Result<Self, SnapshotError> {
        let mut data = GraphData::default();
        for node in snapshot.nodes {
            if data.nodes.contains_key(&node.id) {
                return Err(SnapshotError::DuplicateNode(node.id));
            }
            data.insert_node(node);
        }
        for rel in snapshot.relationships {
            data.insert_edge(rel)?;
        }
        for community in snapshot.communities {
            data.insert_community(community)?;
        }
        Ok(Self {
            data: Arc::new(RwLock::new(data)),
        })
    }

    /// Load a JSON snapshot file.
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self, SnapshotError> {
        let snapshot = GraphSnapshot::read(path).await?;
        Self::from_snapshot(snapshot)
    }

    /// Insert or replace a node.
    pub async fn add_node(&self, node: Node) {
        self.data.write().await.insert_node(node);
    }

    /// Add a relationship between existing nodes; duplicates by key are ignored.
    pub async fn add_relationship(&self, rel: Relationship) -> Result<(), SnapshotError> {
        self.data.write().await.insert_edge(rel)
    }

    pub async fn add_community(&self, community: Community) -> Result<(), SnapshotError> {
        self.data.write().await.insert_community(community)
    }

    pub async fn node_count(&self) -> usize {
        self.data.read().await.nodes.len()
    }

    pub async fn relationship_count(&self) -> usize {
        self.data.read().await.edges.len()
    }
}

#[async_trait::async_trait]
impl GraphClient for InMemoryGraphClient {
    async fn find_nodes_by_name(
        &self,
        names: &[String],
        limit: usize,
    ) -> Result<Vec<Node>, GraphClientError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let data = self.data.read().await;
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        for name in names {
            let needle = name.trim().to_lowercase();
            if needle.is_empty() {
                continue;
            }
            let mut matches: Vec<(NameMatch, usize, &Node)> = data
                .nodes
                .values()
                .filter_map(|n| {
                    NameMatch::classify(&n.name().to_lowercase(), &needle)
                        .map(|m| (m, data.degree(&n.id), n))
                })
                .collect();
            matches.sort_by(|a, b| {
                a.0.cmp(&b.0)
                    .then_with(|| b.1.cmp(&a.1))
                    .then_with(|| a.2.name().cmp(b.2.name()))
                    .then_with(|| a.2.id.cmp(&b.2.id))
            });
            for (_, _, node) in matches {
                if result.len() >= limit {
                    return Ok(result);
                }
                if seen.insert(node.id.clone()) {
                    result.push(node.clone());
                }
            }
        }
        Ok(result)
    }

    async fn shortest_paths(
        &self,
        from_id: &str,
        to_id: &str,
        max_hops: usize,
    ) -> Result<Vec<Path>, GraphClientError> {
        if max_hops == 0 || from_id == to_id {
            return Ok(Vec::new());
        }
        let data = self.data.read().await;
        if !data.nodes.contains_key(from_id) || !data.nodes.contains_key(to_id) {
            return Ok(Vec::new());
        }

        // Layered BFS keeping every predecessor on a shortest route.
        let mut dist: HashMap<&str, usize> = HashMap::new();
        let mut preds: HashMap<&str, Vec<(&str, usize)>> = HashMap::new();
        dist.insert(from_id, 0);
        let mut frontier: Vec<&str> = vec![from_id];
        let mut depth = 0;
        while !frontier.is_empty() && depth < max_hops {
            depth += 1;
            let mut next = Vec::new();
            for &current in &frontier {
                for idx in data.incident(current) {
                    let Some(neighbor) = data.edges[idx].other_end(current) else {
                        continue;
                    };
                    match dist.get(neighbor) {
                        None => {
                            dist.insert(neighbor, depth);
                            preds.entry(neighbor).or_default().push((current, idx));
                            next.push(neighbor);
                        }
                        Some(&d) if d == depth => {
                            preds.entry(neighbor).or_default().push((current, idx));
                        }
                        Some(_) => {}
                    }
                }
            }
            if dist.contains_key(to_id) {
                break;
            }
            frontier = next;
        }
        if !dist.contains_key(to_id) {
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        data.unwind(from_id, to_id, &preds, &mut Vec::new(), &mut paths);
        Ok(paths)
    }

    async fn neighbors(
        &self,
        node_id: &str,
        max_results: usize,
    ) -> Result<Vec<Neighbor>, GraphClientError> {
        if max_results == 0 {
            return Ok(Vec::new());
        }
        let data = self.data.read().await;
        let mut result = Vec::new();
        for idx in data.incident(node_id) {
            if result.len() >= max_results {
                break;
            }
            let edge = &data.edges[idx];
            let Some(node) = edge.other_end(node_id).and_then(|id| data.nodes.get(id)) else {
                continue;
            };
            result.push(Neighbor {
                relationship: edge.clone().traversed_from(node_id),
                node: node.clone(),
            });
        }
        Ok(result)
    }

    async fn communities_for(
        &self,
        node_ids: &BTreeSet<String>,
    ) -> Result<Vec<Community>, GraphClientError> {
        let data = self.data.read().await;
        Ok(data
            .communities
            .values()
            .filter(|c| c.members.iter().any(|m| node_ids.contains(m)))
            .cloned()
            .collect())
    }
}
