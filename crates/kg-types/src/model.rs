//! Property-graph data model: nodes, relationships, paths, communities.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Node properties; ordered so serialized output is stable.
pub type Properties = BTreeMap<String, serde_json::Value>;

/// Graph node as returned by a graph client (read-only copy).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub properties: Properties,
}

impl Node {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            properties: Properties::new(),
        }
    }

    pub fn with_property(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    /// The `name` property, falling back to the node id.
    pub fn name(&self) -> &str {
        self.properties
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or(&self.id)
    }
}

/// How a relationship was walked: `Outgoing` when traversed source -> target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Outgoing,
    Incoming,
}

/// Typed, directed relationship between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(rename = "type")]
    pub rel_type: String,
    #[serde(default)]
    pub direction: Direction,
    pub source: String,
    pub target: String,
}

impl Relationship {
    pub fn new(
        rel_type: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            rel_type: rel_type.into(),
            direction: Direction::Outgoing,
            source: source.into(),
            target: target.into(),
        }
    }

    /// Identity key; independent of traversal direction.
    pub fn key(&self) -> RelationshipKey {
        RelationshipKey {
            source: self.source.clone(),
            rel_type: self.rel_type.clone(),
            target: self.target.clone(),
        }
    }

    /// Same relationship, marked as walked from `from_id`.
    pub fn traversed_from(mut self, from_id: &str) -> Self {
        self.direction = if self.source == from_id {
            Direction::Outgoing
        } else {
            Direction::Incoming
        };
        self
    }

    /// The endpoint opposite `id`, if `id` is an endpoint at all.
    pub fn other_end(&self, id: &str) -> Option<&str> {
        if self.source == id {
            Some(&self.target)
        } else if self.target == id {
            Some(&self.source)
        } else {
            None
        }
    }
}

/// (source, type, target) identity of a relationship.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationshipKey {
    pub source: String,
    pub rel_type: String,
    pub target: String,
}

impl fmt::Display for RelationshipKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-[{}]->{}", self.source, self.rel_type, self.target)
    }
}

/// Ordered chain `node (rel node)*`. Always holds at least one node and exactly
/// one more node than relationships.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "PathRepr", try_from = "PathRepr")]
pub struct Path {
    nodes: Vec<Node>,
    relationships: Vec<Relationship>,
}

impl Path {
    pub fn new(start: Node) -> Self {
        Self {
            nodes: vec![start],
            relationships: Vec::new(),
        }
    }

    /// Extend the path by one hop.
    pub fn then(mut self, relationship: Relationship, node: Node) -> Self {
        self.relationships.push(relationship);
        self.nodes.push(node);
        self
    }

    /// Build from parallel node/relationship lists; `None` if the counts don't line up.
    pub fn from_parts(nodes: Vec<Node>, relationships: Vec<Relationship>) -> Option<Self> {
        if nodes.is_empty() || nodes.len() != relationships.len() + 1 {
            return None;
        }
        Some(Self {
            nodes,
            relationships,
        })
    }

    /// Number of relationship hops.
    pub fn length(&self) -> usize {
        self.relationships.len()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn start(&self) -> &Node {
        &self.nodes[0]
    }

    pub fn end(&self) -> &Node {
        &self.nodes[self.nodes.len() - 1]
    }

    /// Hop-id sequence: node ids interleaved with relationship types.
    pub fn key(&self) -> PathKey {
        let mut ids = Vec::with_capacity(self.nodes.len() + self.relationships.len());
        ids.push(self.nodes[0].id.clone());
        for (rel, node) in self.relationships.iter().zip(self.nodes.iter().skip(1)) {
            ids.push(rel.rel_type.clone());
            ids.push(node.id.clone());
        }
        PathKey(ids)
    }
}

/// Identity of a path: its ordered hop ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathKey(pub Vec<String>);

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("|"))
    }
}

/// One element of a serialized path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PathHop {
    Node(Node),
    Relationship(Relationship),
}

/// Wire shape of a path: `{length, hops: [...]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathRepr {
    pub length: usize,
    pub hops: Vec<PathHop>,
}

impl From<Path> for PathRepr {
    fn from(path: Path) -> Self {
        let length = path.length();
        let mut hops = Vec::with_capacity(path.nodes.len() + path.relationships.len());
        let mut rels = path.relationships.into_iter();
        for node in path.nodes {
            hops.push(PathHop::Node(node));
            if let Some(rel) = rels.next() {
                hops.push(PathHop::Relationship(rel));
            }
        }
        Self { length, hops }
    }
}

impl TryFrom<PathRepr> for Path {
    type Error = String;

    fn try_from(repr: PathRepr) -> Result<Self, Self::Error> {
        let mut nodes = Vec::new();
        let mut relationships = Vec::new();
        for (i, hop) in repr.hops.into_iter().enumerate() {
            match (i % 2, hop) {
                (0, PathHop::Node(n)) => nodes.push(n),
                (1, PathHop::Relationship(r)) => relationships.push(r),
                _ => return Err(format!("path hop {} out of node/relationship order", i)),
            }
        }
        if relationships.len() != repr.length {
            return Err(format!(
                "path length {} does not match {} relationship hops",
                repr.length,
                relationships.len()
            ));
        }
        Path::from_parts(nodes, relationships).ok_or_else(|| "path must end on a node".to_string())
    }
}

/// Precomputed cluster of related nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Community {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    pub members: BTreeSet<String>,
}

impl Community {
    pub fn size(&self) -> usize {
        self.members.len()
    }
}

/// One neighbor of a node: the connecting relationship plus the node on the far side.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub relationship: Relationship,
    pub node: Node,
}

/// Candidate entity name pulled from a query, with its byte offset in the trimmed text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedEntity {
    pub name: String,
    pub offset: usize,
}

impl ExtractedEntity {
    pub fn new(name: impl Into<String>, offset: usize) -> Self {
        Self {
            name: name.into(),
            offset,
        }
    }
}

/// A question as received plus its normalized forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    raw: String,
    text: String,
    folded: String,
}

impl Query {
    pub fn new(raw: &str) -> Self {
        let text = raw.trim().to_string();
        let folded = text
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        Self {
            raw: raw.to_string(),
            text,
            folded,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Trimmed, case-preserved text used for extraction.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whitespace-collapsed, lowercased text used for matching and cache keys.
    pub fn folded(&self) -> &str {
        &self.folded
    }

    pub fn is_blank(&self) -> bool {
        self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hop_path() -> Path {
        Path::new(Node::new("frodo", "Character").with_property("name", "Frodo")).then(
            Relationship::new("CARRIES", "frodo", "ring"),
            Node::new("ring", "Artifact").with_property("name", "Ring of Power"),
        )
    }

    #[test]
    fn path_serializes_as_alternating_hops() {
        let j = serde_json::to_value(hop_path()).unwrap();
        assert_eq!(j["length"], 1);
        let hops = j["hops"].as_array().unwrap();
        assert_eq!(hops.len(), 3);
        assert_eq!(hops[0]["kind"], "node");
        assert_eq!(hops[1]["kind"], "relationship");
        assert_eq!(hops[1]["type"], "CARRIES");
        assert_eq!(hops[2]["id"], "ring");

        let back: Path = serde_json::from_value(j).unwrap();
        assert_eq!(back, hop_path());
    }

    #[test]
    fn path_rejects_misordered_hops() {
        let j = serde_json::json!({
            "length": 1,
            "hops": [
                { "kind": "relationship", "type": "X", "source": "a", "target": "b" },
                { "kind": "node", "id": "a", "label": "L" }
            ]
        });
        assert!(serde_json::from_value::<Path>(j).is_err());
    }

    #[test]
    fn path_key_interleaves_ids_and_types() {
        assert_eq!(hop_path().key().to_string(), "frodo|CARRIES|ring");
    }

    #[test]
    fn traversal_direction_follows_walk() {
        let rel = Relationship::new("MENTOR_OF", "gandalf", "frodo");
        assert_eq!(rel.clone().traversed_from("frodo").direction, Direction::Incoming);
        assert_eq!(rel.clone().traversed_from("gandalf").direction, Direction::Outgoing);
        assert_eq!(rel.other_end("frodo"), Some("gandalf"));
        assert_eq!(rel.other_end("sam"), None);
    }

    #[test]
    fn query_normalizes() {
        let q = Query::new("  Who   is Gandalf?  ");
        assert_eq!(q.text(), "Who   is Gandalf?");
        assert_eq!(q.folded(), "who is gandalf?");
        assert!(Query::new("   ").is_blank());
    }
}
