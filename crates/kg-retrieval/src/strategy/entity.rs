use super::RetrievalStrategy;
use async_trait::async_trait;
use kg_types::{
    ExtractedEntity, GraphClient, GraphClientError, PartialResult, RetrievalParams, StrategyKind,
};
use std::collections::HashSet;

/// Name lookup per entity; nodes only.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityCentric;

#[async_trait]
impl RetrievalStrategy for EntityCentric {
    fn kind(&self) -> StrategyKind {
        StrategyKind::EntityCentric
    }

    async fn retrieve(
        &self,
        entities: &[ExtractedEntity],
        params: &RetrievalParams,
        graph: &dyn GraphClient,
    ) -> Result<Vec<PartialResult>, GraphClientError> {
        let mut partial = PartialResult::empty(self.kind());
        let mut seen = HashSet::new();
        for entity in entities {
            let found = graph
                .find_nodes_by_name(std::slice::from_ref(&entity.name), params.max_results)
                .await?;
            partial
                .nodes
                .extend(found.into_iter().filter(|n| seen.insert(n.id.clone())));
        }
        tracing::debug!(strategy = %self.kind(), nodes = partial.nodes.len(), "strategy finished");
        Ok(vec![partial])
    }
}
