//! Merge partial results into one deduplicated [`RetrievalResult`].

use kg_types::{
    Community, Node, PartialResult, Path, PathKey, Provenance, Relationship, RelationshipKey,
    ResultMetadata, RetrievalResult, StrategyKind,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::Hash;

/// String form of an identity key for provenance maps. Distinct keys must
/// encode to distinct strings.
trait ProvenanceKey {
    fn encode(&self) -> String;
}

impl ProvenanceKey for String {
    fn encode(&self) -> String {
        self.clone()
    }
}

impl ProvenanceKey for RelationshipKey {
    fn encode(&self) -> String {
        join_escaped([&self.source, &self.rel_type, &self.target])
    }
}

impl ProvenanceKey for PathKey {
    fn encode(&self) -> String {
        join_escaped(&self.0)
    }
}

/// `|`-joined parts with `\` and `|` inside a part backslash-escaped.
fn join_escaped<'a>(parts: impl IntoIterator<Item = &'a String>) -> String {
    let mut out = String::new();
    for (i, part) in parts.into_iter().enumerate() {
        if i > 0 {
            out.push('|');
        }
        for c in part.chars() {
            if c == '\\' || c == '|' {
                out.push('\\');
            }
            out.push(c);
        }
    }
    out
}

/// Insertion-ordered set keyed by identity; first insert of a key wins.
struct Arena<K, T> {
    items: Vec<T>,
    tags: Vec<BTreeSet<StrategyKind>>,
    index: HashMap<K, usize>,
}

impl<K: Hash + Eq, T> Default for Arena<K, T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            tags: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K: Hash + Eq + ProvenanceKey, T> Arena<K, T> {
    fn insert(&mut self, key: K, item: T, from: StrategyKind) {
        match self.index.get(&key) {
            Some(&i) => {
                self.tags[i].insert(from);
            }
            None => {
                self.index.insert(key, self.items.len());
                self.items.push(item);
                self.tags.push(BTreeSet::from([from]));
            }
        }
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn into_parts(self) -> (Vec<T>, BTreeMap<String, BTreeSet<StrategyKind>>) {
        let mut keys: Vec<(usize, String)> = self
            .index
            .into_iter()
            .map(|(k, i)| (i, k.encode()))
            .collect();
        keys.sort_unstable();
        let provenance = keys
            .into_iter()
            .zip(self.tags)
            .map(|((_, key), tags)| (key, tags))
            .collect();
        (self.items, provenance)
    }
}

/// Accumulates partial results. Merge is commutative on membership and
/// idempotent on identity keys; output order is first-seen order.
#[derive(Default)]
pub struct ResultAggregator {
    nodes: Arena<String, Node>,
    relationships: Arena<RelationshipKey, Relationship>,
    paths: Arena<PathKey, Path>,
    communities: Arena<String, Community>,
    strategies: Vec<StrategyKind>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, partial: PartialResult) {
        let from = partial.strategy;
        if !self.strategies.contains(&from) {
            self.strategies.push(from);
        }
        for node in partial.nodes {
            self.nodes.insert(node.id.clone(), node, from);
        }
        for rel in partial.relationships {
            self.relationships.insert(rel.key(), rel, from);
        }
        for path in partial.paths {
            self.paths.insert(path.key(), path, from);
        }
        for community in partial.communities {
            self.communities.insert(community.id.clone(), community, from);
        }
    }

    /// `|nodes| + |relationships| + |paths|` merged so far.
    pub fn total_results(&self) -> usize {
        self.nodes.len() + self.relationships.len() + self.paths.len()
    }

    pub fn finish(self, strategy: StrategyKind, query: &str) -> RetrievalResult {
        let total_results = self.total_results();
        let (nodes, node_tags) = self.nodes.into_parts();
        let (relationships, relationship_tags) = self.relationships.into_parts();
        let (paths, path_tags) = self.paths.into_parts();
        let (communities, community_tags) = self.communities.into_parts();
        RetrievalResult {
            strategy,
            query: query.to_string(),
            nodes,
            relationships,
            paths,
            communities,
            execution_time: 0.0,
            total_results,
            metadata: ResultMetadata {
                strategies: self.strategies,
                provenance: Provenance {
                    nodes: node_tags,
                    relationships: relationship_tags,
                    paths: path_tags,
                    communities: community_tags,
                },
                ..Default::default()
            },
        }
    }

    /// Merge `partials` in order into a result labelled `strategy`.
    pub fn merge(
        strategy: StrategyKind,
        query: &str,
        partials: impl IntoIterator<Item = PartialResult>,
    ) -> RetrievalResult {
        let mut agg = Self::new();
        for partial in partials {
            agg.add(partial);
        }
        agg.finish(strategy, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, name: &str) -> Node {
        Node::new(id, "Character").with_property("name", name)
    }

    fn hop(a: &str, t: &str, b: &str) -> Path {
        Path::new(node(a, a)).then(Relationship::new(t, a, b), node(b, b))
    }

    #[test]
    fn merge_deduplicates_and_tracks_provenance() {
        let mut entity = PartialResult::empty(StrategyKind::EntityCentric);
        entity.nodes = vec![node("frodo", "Frodo"), node("ring", "Ring of Power")];

        let mut rel = PartialResult::empty(StrategyKind::RelationshipAware);
        let path = hop("frodo", "CARRIES", "ring");
        rel.nodes = vec![node("frodo", "Frodo (dup)"), node("ring", "Ring of Power")];
        rel.relationships = path.relationships().to_vec();
        rel.paths = vec![path.clone(), path];

        let result = ResultAggregator::merge(StrategyKind::Hybrid, "q", vec![entity, rel]);
        assert_eq!(result.nodes.len(), 2);
        assert_eq!(result.nodes[0].name(), "Frodo", "first seen wins");
        assert_eq!(result.relationships.len(), 1);
        assert_eq!(result.paths.len(), 1);
        assert_eq!(result.total_results, 4);
        assert_eq!(
            result.metadata.strategies,
            vec![StrategyKind::EntityCentric, StrategyKind::RelationshipAware]
        );

        let prov = &result.metadata.provenance;
        assert_eq!(prov.nodes["frodo"].len(), 2);
        assert_eq!(
            prov.paths["frodo|CARRIES|ring"],
            BTreeSet::from([StrategyKind::RelationshipAware])
        );
        assert!(prov.relationships.contains_key("frodo|CARRIES|ring"));
    }

    #[test]
    fn separator_characters_in_ids_keep_provenance_distinct() {
        let mut p = PartialResult::empty(StrategyKind::RelationshipAware);
        p.relationships = vec![
            Relationship::new("T", "a", "b-[U]->c"),
            Relationship::new("U", "a-[T]->b", "c"),
            Relationship::new("T", "a|T", "c"),
            Relationship::new("T|c", "a", "T"),
        ];
        p.paths = vec![
            Path::new(node("x|R|y", "x")),
            hop("x", "R", "y"),
            hop("x\\", "R", "y"),
        ];

        let result = ResultAggregator::merge(StrategyKind::RelationshipAware, "q", vec![p]);
        let prov = &result.metadata.provenance;
        assert_eq!(result.relationships.len(), 4);
        assert_eq!(prov.relationships.len(), 4);
        assert_eq!(result.paths.len(), 3);
        assert_eq!(prov.paths.len(), 3);
        assert!(prov.paths.contains_key("x\\|R\\|y"));
    }

    #[test]
    fn merge_order_is_first_seen() {
        let mut a = PartialResult::empty(StrategyKind::EntityCentric);
        a.nodes = vec![node("b", "B"), node("a", "A")];
        let mut b = PartialResult::empty(StrategyKind::EntityCentric);
        b.nodes = vec![node("c", "C"), node("a", "A")];

        let result = ResultAggregator::merge(StrategyKind::EntityCentric, "q", vec![a, b]);
        let ids: Vec<&str> = result.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn merging_nothing_is_empty() {
        let result = ResultAggregator::merge(
            StrategyKind::PathCommunity,
            "q",
            vec![PartialResult::empty(StrategyKind::PathCommunity)],
        );
        assert_eq!(result.total_results, 0);
        assert!(result.communities.is_empty());
        assert_eq!(result.metadata.strategies, vec![StrategyKind::PathCommunity]);
    }
}
