use super::{neighbor_paths, pairwise_paths, partial_from_paths, resolve_best, RetrievalStrategy};
use async_trait::async_trait;
use kg_types::{
    ExtractedEntity, GraphClient, GraphClientError, PartialResult, RetrievalParams, StrategyKind,
};

/// Connects the best node of each entity: shortest paths between every pair,
/// or the one-hop neighborhood when only one node resolves.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationshipAware;

#[async_trait]
impl RetrievalStrategy for RelationshipAware {
    fn kind(&self) -> StrategyKind {
        StrategyKind::RelationshipAware
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
        let best = resolve_best(entities, graph).await?;
        let paths = match best.as_slice() {
            [] => Vec::new(),
            [only] => neighbor_paths(only, params.max_results, graph).await?,
            nodes => pairwise_paths(nodes, params.max_path_length, params.max_results, graph).await?,
        };
        tracing::debug!(
            strategy = %self.kind(),
            resolved = best.len(),
            paths = paths.len(),
            "strategy finished"
        );
        Ok(vec![partial_from_paths(self.kind(), best, paths)])
    }
}
