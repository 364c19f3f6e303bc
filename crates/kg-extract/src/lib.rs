//! Entity extraction: pull candidate entity names out of a question.

mod heuristic;

pub use heuristic::{HeuristicExtractor, CONNECTORS, STOPWORDS};
pub use kg_types::ExtractedEntity;

/// Turns free text into an ordered list of candidate entity names.
///
/// Output is in first-occurrence order with exact duplicates collapsed.
/// Finding nothing is a normal outcome, not an error.
pub trait EntityExtractor: Send + Sync {
    fn extract(&self, text: &str) -> Vec<ExtractedEntity>;

    /// Get the name/identifier of this extractor.
    fn name(&self) -> &str;
}
