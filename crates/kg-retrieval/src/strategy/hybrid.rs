use super::{strategy_for, RetrievalStrategy};
use async_trait::async_trait;
use kg_types::{
    ExtractedEntity, GraphClient, GraphClientError, PartialResult, RetrievalParams, StrategyKind,
};

/// Entity-centric, relationship-aware and path+community together; the last
/// is skipped when `include_communities` is off. Sub-strategies run concurrently.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hybrid;

#[async_trait]
impl RetrievalStrategy for Hybrid {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Hybrid
    }

    async fn retrieve(
        &self,
        entities: &[ExtractedEntity],
        params: &RetrievalParams,
        graph: &dyn GraphClient,
    ) -> Result<Vec<PartialResult>, GraphClientError> {
        let communities = async {
            if params.include_communities {
                strategy_for(StrategyKind::PathCommunity)
                    .retrieve(entities, params, graph)
                    .await
            } else {
                Ok(Vec::new())
            }
        };
        let (entity, relationship, community) = tokio::try_join!(
            strategy_for(StrategyKind::EntityCentric).retrieve(entities, params, graph),
            strategy_for(StrategyKind::RelationshipAware).retrieve(entities, params, graph),
            communities
        )?;
        Ok(entity
            .into_iter()
            .chain(relationship)
            .chain(community)
            .collect())
    }
}
