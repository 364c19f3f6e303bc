//! Retrieval core: parameter validation, the four strategies, result
//! aggregation, and the cached [`Retriever`] entry point.

mod aggregator;
mod facade;
mod params;
pub mod strategy;

pub use aggregator::ResultAggregator;
pub use facade::{RetrievalRequest, Retriever};
pub use kg_types::{
    ParamInput, RetrievalError, RetrievalParams, RetrievalResult, StrategyKind,
};
pub use params::validate_params;
pub use strategy::{strategy_for, RetrievalStrategy};
