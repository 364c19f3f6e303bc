use kg_types::{Query, RetrievalParams, StrategyKind};

/// MD5 hex digest over the trimmed query, the strategy name, and the
/// parameters sorted by name. Stable across processes and releases.
///
/// The query keeps its case and inner spacing: extraction depends on both, so
/// folding them would let differently-extracted queries share an entry.
pub fn cache_key(query: &Query, strategy: StrategyKind, params: &RetrievalParams) -> String {
    let mut material = String::new();
    material.push_str(query.text());
    material.push('\n');
    material.push_str(strategy.as_str());
    for (name, value) in params.sorted_pairs() {
        material.push('\n');
        material.push_str(name);
        material.push('=');
        material.push_str(&value);
    }
    format!("{:x}", md5::compute(material.as_bytes()))
}
