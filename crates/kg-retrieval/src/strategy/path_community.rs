use super::{neighbor_paths, pairwise_paths, partial_from_paths, RetrievalStrategy};
use async_trait::async_trait;
use kg_types::{
    ExtractedEntity, GraphClient, GraphClientError, PartialResult, RetrievalParams, StrategyKind,
};
use std::collections::{BTreeSet, HashSet};

/// PathRAG: communities around the matched nodes plus bounded paths between
/// the best matches.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathCommunity;

#[async_trait]
impl RetrievalStrategy for PathCommunity {
    fn kind(&self) -> StrategyKind {
        StrategyKind::PathCommunity
    }

    async fn retrieve(
        &self,
        entities: &[ExtractedEntity],
        params: &RetrievalParams,
        graph: &dyn GraphClient,
    ) -> Result<Vec<PartialResult>, GraphClientError> {
        if entities.is_empty() {
            return Ok(vec![PartialResult::empty(self.kind())]);
        }

        // One lookup per entity: its first hit is the best node, all hits feed communities.
        let mut matched = BTreeSet::new();
        let mut best = Vec::new();
        let mut best_ids = HashSet::new();
        for entity in entities {
            let found = graph
                .find_nodes_by_name(std::slice::from_ref(&entity.name), params.max_results)
                .await?;
            if let Some(first) = found.first() {
                if best_ids.insert(first.id.clone()) {
                    best.push(first.clone());
                }
            }
            matched.extend(found.into_iter().map(|n| n.id));
        }
        let mut communities = if matched.is_empty() {
            Vec::new()
        } else {
            graph.communities_for(&matched).await?
        };
        communities.sort_by(|a, b| b.size().cmp(&a.size()).then_with(|| a.id.cmp(&b.id)));
        communities.truncate(params.max_communities);

        let paths = match best.as_slice() {
            [] => Vec::new(),
            [only] => neighbor_paths(only, params.max_paths_per_entity, graph).await?,
            nodes => {
                pairwise_paths(
                    nodes,
                    params.max_path_length,
                    params.max_paths_per_entity,
                    graph,
                )
                .await?
            }
        };
        tracing::debug!(
            strategy = %self.kind(),
            communities = communities.len(),
            paths = paths.len(),
            "strategy finished"
        );
        let mut partial = partial_from_paths(self.kind(), best, paths);
        partial.communities = communities;
        Ok(vec![partial])
    }
}
