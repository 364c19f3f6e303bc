//! Strategy names and retrieval parameters.

use crate::RetrievalError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Retrieval strategy variants.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum StrategyKind {
    #[serde(rename = "entity")]
    EntityCentric,
    #[serde(rename = "relationship")]
    RelationshipAware,
    #[serde(rename = "pathrag")]
    PathCommunity,
    #[serde(rename = "hybrid")]
    #[default]
    Hybrid,
}

/// Accepted strategy names. Anything else is rejected; there is no fallback.
const STRATEGY_NAMES: &[(&str, StrategyKind)] = &[
    ("entity", StrategyKind::EntityCentric),
    ("entity_centric", StrategyKind::EntityCentric),
    ("relationship", StrategyKind::RelationshipAware),
    ("relationship_aware", StrategyKind::RelationshipAware),
    ("pathrag", StrategyKind::PathCommunity),
    ("path_community", StrategyKind::PathCommunity),
    ("hybrid", StrategyKind::Hybrid),
];

impl StrategyKind {
    /// Resolve a caller-supplied strategy name (case-insensitive).
    pub fn from_name(name: &str) -> Result<Self, RetrievalError> {
        let wanted = name.trim().to_ascii_lowercase();
        STRATEGY_NAMES
            .iter()
            .find(|(n, _)| *n == wanted)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| {
                RetrievalError::InvalidParameter(format!(
                    "unknown strategy '{}' (expected one of: entity, relationship, hybrid, pathrag)",
                    name
                ))
            })
    }

    /// Canonical short name, as used on the command line and in results.
    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::EntityCentric => "entity",
            StrategyKind::RelationshipAware => "relationship",
            StrategyKind::PathCommunity => "pathrag",
            StrategyKind::Hybrid => "hybrid",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive bounds and default for one numeric parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamBounds {
    pub name: &'static str,
    pub default: usize,
    pub min: usize,
    pub max: usize,
}

pub const MAX_RESULTS: ParamBounds = ParamBounds {
    name: "max_results",
    default: 10,
    min: 1,
    max: 100,
};

pub const MAX_PATH_LENGTH: ParamBounds = ParamBounds {
    name: "max_path_length",
    default: 3,
    min: 1,
    max: 6,
};

pub const MAX_COMMUNITIES: ParamBounds = ParamBounds {
    name: "max_communities",
    default: 5,
    min: 1,
    max: 50,
};

pub const MAX_PATHS_PER_ENTITY: ParamBounds = ParamBounds {
    name: "max_paths_per_entity",
    default: 5,
    min: 1,
    max: 50,
};

/// Unvalidated parameters as supplied by a caller (CLI flags or HTTP body).
/// Signed so that negative input reaches validation instead of failing to parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamInput {
    #[serde(default)]
    pub max_results: Option<i64>,
    #[serde(default)]
    pub max_path_length: Option<i64>,
    #[serde(default)]
    pub max_communities: Option<i64>,
    #[serde(default)]
    pub max_paths_per_entity: Option<i64>,
    #[serde(default)]
    pub include_communities: Option<bool>,
}

/// Validated, clamped parameters for one retrieval call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalParams {
    pub max_results: usize,
    pub max_path_length: usize,
    pub max_communities: usize,
    pub max_paths_per_entity: usize,
    /// Hybrid only: run the path+community strategy as well. On unless the
    /// caller opts out.
    #[serde(default = "include_communities_default")]
    pub include_communities: bool,
}

fn include_communities_default() -> bool {
    true
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            max_results: MAX_RESULTS.default,
            max_path_length: MAX_PATH_LENGTH.default,
            max_communities: MAX_COMMUNITIES.default,
            max_paths_per_entity: MAX_PATHS_PER_ENTITY.default,
            include_communities: true,
        }
    }
}

impl RetrievalParams {
    /// Parameters keyed and ordered by name, independent of construction order.
    pub fn sorted_pairs(&self) -> BTreeMap<&'static str, String> {
        let mut pairs = BTreeMap::new();
        pairs.insert("include_communities", self.include_communities.to_string());
        pairs.insert(MAX_COMMUNITIES.name, self.max_communities.to_string());
        pairs.insert(MAX_PATH_LENGTH.name, self.max_path_length.to_string());
        pairs.insert(
            MAX_PATHS_PER_ENTITY.name,
            self.max_paths_per_entity.to_string(),
        );
        pairs.insert(MAX_RESULTS.name, self.max_results.to_string());
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_names_resolve_through_table() {
        assert_eq!(
            StrategyKind::from_name("entity").unwrap(),
            StrategyKind::EntityCentric
        );
        assert_eq!(
            StrategyKind::from_name(" PathRAG ").unwrap(),
            StrategyKind::PathCommunity
        );
        assert_eq!(
            StrategyKind::from_name("relationship_aware").unwrap(),
            StrategyKind::RelationshipAware
        );
        assert!(matches!(
            StrategyKind::from_name("vector"),
            Err(RetrievalError::InvalidParameter(_))
        ));
    }

    #[test]
    fn strategy_serializes_to_short_name() {
        assert_eq!(
            serde_json::to_value(StrategyKind::PathCommunity).unwrap(),
            "pathrag"
        );
        assert_eq!(StrategyKind::default(), StrategyKind::Hybrid);
    }
}
