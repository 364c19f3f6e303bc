//! Retrieval strategies. Each one turns extracted entities into one or more
//! [`PartialResult`]s; the facade merges them.

mod entity;
mod hybrid;
mod path_community;
mod relationship;

pub use entity::EntityCentric;
pub use hybrid::Hybrid;
pub use path_community::PathCommunity;
pub use relationship::RelationshipAware;

use async_trait::async_trait;
use kg_types::{
    ExtractedEntity, GraphClient, GraphClientError, Node, PartialResult, Path, RetrievalParams,
    StrategyKind,
};
use std::collections::HashSet;

#[async_trait]
pub trait RetrievalStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// One partial per underlying strategy run. With no entities this must
    /// return without touching the graph.
    async fn retrieve(
        &self,
        entities: &[ExtractedEntity],
        params: &RetrievalParams,
        graph: &dyn GraphClient,
    ) -> Result<Vec<PartialResult>, GraphClientError>;
}

static ENTITY_CENTRIC: EntityCentric = EntityCentric;
static RELATIONSHIP_AWARE: RelationshipAware = RelationshipAware;
static PATH_COMMUNITY: PathCommunity = PathCommunity;
static HYBRID: Hybrid = Hybrid;

pub fn strategy_for(kind: StrategyKind) -> &'static dyn RetrievalStrategy {
    match kind {
        StrategyKind::EntityCentric => &ENTITY_CENTRIC,
        StrategyKind::RelationshipAware => &RELATIONSHIP_AWARE,
        StrategyKind::PathCommunity => &PATH_COMMUNITY,
        StrategyKind::Hybrid => &HYBRID,
    }
}

/// Best match per entity, deduplicated by node id, in entity order.
async fn resolve_best(
    entities: &[ExtractedEntity],
    graph: &dyn GraphClient,
) -> Result<Vec<Node>, GraphClientError> {
    let mut seen = HashSet::new();
    let mut best = Vec::new();
    for entity in entities {
        let found = graph
            .find_nodes_by_name(std::slice::from_ref(&entity.name), 1)
            .await?;
        if let Some(node) = found.into_iter().next() {
            if seen.insert(node.id.clone()) {
                best.push(node);
            }
        }
    }
    Ok(best)
}

/// Up to `per_pair` shortest paths for every unordered pair of `nodes`.
async fn pairwise_paths(
    nodes: &[Node],
    max_hops: usize,
    per_pair: usize,
    graph: &dyn GraphClient,
) -> Result<Vec<Path>, GraphClientError> {
    let mut paths = Vec::new();
    for (i, from) in nodes.iter().enumerate() {
        for to in &nodes[i + 1..] {
            let found = graph.shortest_paths(&from.id, &to.id, max_hops).await?;
            paths.extend(
                found
                    .into_iter()
                    .filter(|p| p.length() <= max_hops)
                    .take(per_pair),
            );
        }
    }
    Ok(paths)
}

/// One-hop paths out of `node`.
async fn neighbor_paths(
    node: &Node,
    limit: usize,
    graph: &dyn GraphClient,
) -> Result<Vec<Path>, GraphClientError> {
    Ok(graph
        .neighbors(&node.id, limit)
        .await?
        .into_iter()
        .map(|n| Path::new(node.clone()).then(n.relationship, n.node))
        .collect())
}

/// Resolved nodes, then every node and relationship along `paths`, then the paths.
fn partial_from_paths(kind: StrategyKind, resolved: Vec<Node>, paths: Vec<Path>) -> PartialResult {
    let mut partial = PartialResult::empty(kind);
    partial.nodes = resolved;
    for path in &paths {
        partial.nodes.extend(path.nodes().iter().cloned());
        partial
            .relationships
            .extend(path.relationships().iter().cloned());
    }
    partial.paths = paths;
    partial
}

#[cfg(test)]
mod tests {
    use super::*;
    use kg_extract::{EntityExtractor, HeuristicExtractor};
    use kg_graph::fixtures::{middle_earth, CountingGraphClient};
    use std::sync::Arc;

    fn entities(query: &str) -> Vec<ExtractedEntity> {
        HeuristicExtractor::new().extract(query)
    }

    fn ids(nodes: &[Node]) -> Vec<&str> {
        nodes.iter().map(|n| n.id.as_str()).collect()
    }

    #[tokio::test]
    async fn entity_centric_ranks_exact_match_first() {
        let graph = middle_earth();
        let partials = strategy_for(StrategyKind::EntityCentric)
            .retrieve(&entities("Who is Gandalf?"), &RetrievalParams::default(), &graph)
            .await
            .unwrap();
        assert_eq!(partials.len(), 1);
        let p = &partials[0];
        assert_eq!(p.strategy, StrategyKind::EntityCentric);
        assert_eq!(ids(&p.nodes), vec!["gandalf", "gandalf_white"]);
        assert!(p.relationships.is_empty() && p.paths.is_empty());
    }

    #[tokio::test]
    async fn relationship_aware_connects_resolved_pairs() {
        let graph = middle_earth();
        let partials = strategy_for(StrategyKind::RelationshipAware)
            .retrieve(
                &entities("How is Frodo tied to the Ring of Power?"),
                &RetrievalParams::default(),
                &graph,
            )
            .await
            .unwrap();
        let p = &partials[0];
        assert_eq!(p.paths.len(), 1);
        assert_eq!(p.paths[0].key().to_string(), "frodo|CARRIES|ring");
        assert_eq!(p.relationships.len(), 1);
        assert!(ids(&p.nodes).starts_with(&["frodo", "ring"]));
    }

    #[tokio::test]
    async fn relationship_aware_single_entity_expands_neighbors() {
        let graph = middle_earth();
        let params = RetrievalParams {
            max_results: 2,
            ..Default::default()
        };
        let partials = strategy_for(StrategyKind::RelationshipAware)
            .retrieve(&entities("Tell me about Sauron"), &params, &graph)
            .await
            .unwrap();
        let p = &partials[0];
        assert_eq!(p.paths.len(), 2);
        for path in &p.paths {
            assert_eq!(path.length(), 1);
            assert_eq!(path.start().id, "sauron");
        }
    }

    #[tokio::test]
    async fn paths_respect_max_path_length() {
        let graph = middle_earth();
        let query = entities("Did Sam ever meet Sauron?");
        for limit in 1..=4 {
            let params = RetrievalParams {
                max_path_length: limit,
                ..Default::default()
            };
            let partials = strategy_for(StrategyKind::RelationshipAware)
                .retrieve(&query, &params, &graph)
                .await
                .unwrap();
            let paths = &partials[0].paths;
            assert!(paths.iter().all(|p| p.length() <= limit));
            // sam - frodo - ring - sauron
            assert_eq!(paths.is_empty(), limit < 3, "limit {}", limit);
        }
    }

    #[tokio::test]
    async fn path_community_caps_communities_by_size_then_id() {
        let graph = middle_earth();
        let params = RetrievalParams {
            max_communities: 2,
            ..Default::default()
        };
        let partials = strategy_for(StrategyKind::PathCommunity)
            .retrieve(
                &entities("What is the relationship between Frodo and the Ring of Power?"),
                &params,
                &graph,
            )
            .await
            .unwrap();
        let ids: Vec<&str> = partials[0].communities.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c2", "c1"]);
    }

    #[tokio::test]
    async fn path_community_looks_each_entity_up_once() {
        let graph = CountingGraphClient::new(Arc::new(middle_earth()));
        let partials = strategy_for(StrategyKind::PathCommunity)
            .retrieve(&entities("Frodo and Gandalf"), &RetrievalParams::default(), &graph)
            .await
            .unwrap();
        // two name lookups, one community query, one pair of shortest paths
        assert_eq!(graph.calls(), 4);
        let p = &partials[0];
        assert!(ids(&p.nodes).starts_with(&["frodo", "gandalf"]));
        assert_eq!(p.paths[0].key().to_string(), "frodo|MENTOR_OF|gandalf");
    }

    #[tokio::test]
    async fn path_community_single_node_uses_neighbor_paths() {
        let graph = middle_earth();
        let params = RetrievalParams {
            max_paths_per_entity: 3,
            ..Default::default()
        };
        let partials = strategy_for(StrategyKind::PathCommunity)
            .retrieve(&entities("Who is Elrond?"), &params, &graph)
            .await
            .unwrap();
        let p = &partials[0];
        assert_eq!(p.paths.len(), 1);
        assert_eq!(p.paths[0].key().to_string(), "elrond|LIVES_IN|rivendell");
        assert_eq!(p.communities.len(), 1);
        assert_eq!(p.communities[0].id, "c6");
    }

    #[tokio::test]
    async fn hybrid_returns_one_partial_per_sub_strategy() {
        let graph = middle_earth();
        let query = entities("Frodo and Gandalf");
        let with_communities = strategy_for(StrategyKind::Hybrid)
            .retrieve(&query, &RetrievalParams::default(), &graph)
            .await
            .unwrap();
        assert_eq!(with_communities.len(), 3);
        assert_eq!(with_communities[2].strategy, StrategyKind::PathCommunity);
        assert!(!with_communities[2].communities.is_empty());

        let params = RetrievalParams {
            include_communities: false,
            ..Default::default()
        };
        let plain = strategy_for(StrategyKind::Hybrid)
            .retrieve(&query, &params, &graph)
            .await
            .unwrap();
        let kinds: Vec<StrategyKind> = plain.iter().map(|p| p.strategy).collect();
        assert_eq!(
            kinds,
            vec![StrategyKind::EntityCentric, StrategyKind::RelationshipAware]
        );
    }

    #[tokio::test]
    async fn no_entities_means_no_graph_calls() {
        let graph = CountingGraphClient::new(Arc::new(middle_earth()));
        for kind in [
            StrategyKind::EntityCentric,
            StrategyKind::RelationshipAware,
            StrategyKind::PathCommunity,
            StrategyKind::Hybrid,
        ] {
            let params = RetrievalParams {
                include_communities: true,
                ..Default::default()
            };
            let partials = strategy_for(kind).retrieve(&[], &params, &graph).await.unwrap();
            assert!(partials.iter().all(PartialResult::is_empty));
        }
        assert_eq!(graph.calls(), 0);
    }
}
