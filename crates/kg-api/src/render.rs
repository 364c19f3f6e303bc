//! Human-readable rendering of a retrieval result.

use kg_types::{Direction, Path, RetrievalResult};
use std::collections::HashMap;
use std::fmt::Write;

fn path_line(path: &Path, names: &HashMap<&str, &str>) -> String {
    let name = |id: &str| names.get(id).copied().unwrap_or(id).to_string();
    let mut line = name(&path.start().id);
    for (rel, node) in path.relationships().iter().zip(path.nodes().iter().skip(1)) {
        let hop = match rel.direction {
            Direction::Outgoing => format!(" -[{}]-> ", rel.rel_type),
            Direction::Incoming => format!(" <-[{}]- ", rel.rel_type),
        };
        line.push_str(&hop);
        line.push_str(&name(&node.id));
    }
    line
}

pub fn render_text(result: &RetrievalResult) -> String {
    let names: HashMap<&str, &str> = result
        .nodes
        .iter()
        .map(|n| (n.id.as_str(), n.name()))
        .collect();
    let mut out = String::new();
    let _ = writeln!(out, "query:    {}", result.query);
    let _ = writeln!(
        out,
        "strategy: {}{}",
        result.strategy,
        if result.metadata.cache_hit { " (cached)" } else { "" }
    );
    let entities: Vec<&str> = result
        .metadata
        .entities
        .iter()
        .map(|e| e.name.as_str())
        .collect();
    let _ = writeln!(
        out,
        "entities: {}",
        if entities.is_empty() {
            "(none)".to_string()
        } else {
            entities.join(", ")
        }
    );
    let _ = writeln!(
        out,
        "results:  {} in {:.3}s",
        result.total_results, result.execution_time
    );

    if !result.nodes.is_empty() {
        let _ = writeln!(out, "\nnodes ({}):", result.nodes.len());
        for node in &result.nodes {
            let _ = writeln!(out, "  {} [{}] ({})", node.name(), node.label, node.id);
        }
    }
    if !result.relationships.is_empty() {
        let _ = writeln!(out, "\nrelationships ({}):", result.relationships.len());
        for rel in &result.relationships {
            let source = names.get(rel.source.as_str()).copied().unwrap_or(&rel.source);
            let target = names.get(rel.target.as_str()).copied().unwrap_or(&rel.target);
            let _ = writeln!(out, "  {} -[{}]-> {}", source, rel.rel_type, target);
        }
    }
    if !result.paths.is_empty() {
        let _ = writeln!(out, "\npaths ({}):", result.paths.len());
        for path in &result.paths {
            let _ = writeln!(out, "  ({}) {}", path.length(), path_line(path, &names));
        }
    }
    if !result.communities.is_empty() {
        let _ = writeln!(out, "\ncommunities ({}):", result.communities.len());
        for c in &result.communities {
            let label = c.label.as_deref().unwrap_or("unlabelled");
            let _ = writeln!(out, "  {} {} ({} members)", c.id, label, c.size());
        }
    }
    out
}
