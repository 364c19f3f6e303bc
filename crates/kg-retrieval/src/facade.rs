//! Single entry point for retrieval: validate, consult cache, extract, run, merge, store.

use crate::{strategy_for, validate_params, ResultAggregator};
use kg_cache::{cache_key, CacheManager};
use kg_extract::EntityExtractor;
use kg_types::{
    GraphClient, ParamInput, Query, RetrievalError, RetrievalParams, RetrievalResult, StrategyKind,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// One retrieval call as received from the CLI or HTTP.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalRequest {
    pub query: String,
    /// Strategy name; hybrid when absent.
    #[serde(default)]
    pub strategy: Option<String>,
    #[serde(flatten)]
    pub params: ParamInput,
    /// Skip both cache lookup and cache store.
    #[serde(default)]
    pub no_cache: bool,
}

impl RetrievalRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn strategy(mut self, name: impl Into<String>) -> Self {
        self.strategy = Some(name.into());
        self
    }

    pub fn params(mut self, params: ParamInput) -> Self {
        self.params = params;
        self
    }

    pub fn no_cache(mut self, no_cache: bool) -> Self {
        self.no_cache = no_cache;
        self
    }
}

type Gate = Arc<tokio::sync::Mutex<()>>;

/// Retrieval facade. Collaborators are injected; the cache is optional.
pub struct Retriever {
    graph: Arc<dyn GraphClient>,
    extractor: Arc<dyn EntityExtractor>,
    cache: Option<Arc<CacheManager>>,
    /// cache key -> gate held by the task computing that key.
    inflight: Mutex<HashMap<String, Gate>>,
}

impl Retriever {
    pub fn new(graph: Arc<dyn GraphClient>, extractor: Arc<dyn EntityExtractor>) -> Self {
        Self {
            graph,
            extractor,
            cache: None,
            inflight: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_cache(mut self, cache: Arc<CacheManager>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn cache(&self) -> Option<&Arc<CacheManager>> {
        self.cache.as_ref()
    }

    pub async fn retrieve(&self, request: &RetrievalRequest) -> Result<RetrievalResult, RetrievalError> {
        let started = Instant::now();
        let strategy = match request.strategy.as_deref() {
            Some(name) => StrategyKind::from_name(name)?,
            None => StrategyKind::default(),
        };
        let params = validate_params(&request.params)?;
        let query = Query::new(&request.query);
        if query.is_blank() {
            return Err(RetrievalError::InvalidParameter(
                "query must not be blank".to_string(),
            ));
        }

        let mut result = match self.cache {
            Some(ref cache) if !request.no_cache => {
                self.retrieve_cached(cache, &query, strategy, params).await?
            }
            _ => self.compute(&query, strategy, params).await?,
        };
        result.execution_time = started.elapsed().as_secs_f64();
        tracing::info!(
            strategy = %strategy,
            cache_hit = result.metadata.cache_hit,
            total_results = result.total_results,
            execution_time = result.execution_time,
            "retrieval finished"
        );
        Ok(result)
    }

    /// Identical concurrent misses queue on a per-key gate; whoever gets it
    /// second finds the first caller's entry.
    async fn retrieve_cached(
        &self,
        cache: &CacheManager,
        query: &Query,
        strategy: StrategyKind,
        params: RetrievalParams,
    ) -> Result<RetrievalResult, RetrievalError> {
        let key = cache_key(query, strategy, &params);
        let gate = self.gate(key.clone());
        let _held = gate.gate.lock().await;
        let cached = cache.get_by_key(&key).await;
        match cached {
            Some(mut hit) => {
                hit.query = query.raw().to_string();
                hit.metadata.cache_hit = true;
                Ok(hit)
            }
            None => {
                let computed = self.compute(query, strategy, params).await;
                if let Ok(ref result) = computed {
                    if let Err(e) = cache.put_by_key(&key, result, None).await {
                        tracing::warn!(cache_key = %key, error = %e, "failed to store result");
                    }
                }
                computed
            }
        }
    }

    async fn compute(
        &self,
        query: &Query,
        strategy: StrategyKind,
        params: RetrievalParams,
    ) -> Result<RetrievalResult, RetrievalError> {
        let entities = self.extractor.extract(query.text());
        if entities.is_empty() {
            tracing::debug!(strategy = %strategy, "no entities extracted");
        }
        let partials = strategy_for(strategy)
            .retrieve(&entities, &params, self.graph.as_ref())
            .await
            .map_err(|e| {
                tracing::warn!(strategy = %strategy, error = %e, "graph call failed");
                RetrievalError::from(e)
            })?;
        let mut result = ResultAggregator::merge(strategy, query.raw(), partials);
        result.metadata.entities = entities;
        result.metadata.params = params;
        Ok(result)
    }

    fn gate(&self, key: String) -> InflightGuard<'_> {
        let mut inflight = self.inflight.lock().unwrap_or_else(|e| e.into_inner());
        let gate = inflight.entry(key.clone()).or_default().clone();
        InflightGuard {
            inflight: &self.inflight,
            key,
            gate,
        }
    }
}

/// A caller's share of a per-key gate. Dropping it, on completion or when the
/// call is cancelled, removes the map entry if no other caller still has one.
struct InflightGuard<'a> {
    inflight: &'a Mutex<HashMap<String, Gate>>,
    key: String,
    gate: Gate,
}

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        let mut inflight = self.inflight.lock().unwrap_or_else(|e| e.into_inner());
        // Clones are only taken under this lock: map + ours means we are the last.
        if Arc::strong_count(&self.gate) <= 2 {
            inflight.remove(&self.key);
        }
    }
}
