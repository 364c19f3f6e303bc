//! Neo4j client over the HTTP transactional endpoint (`/db/{db}/tx/commit`).
//!
//! Communities are read from a `community` property on nodes (as written by a
//! Louvain/Leiden run), labelled by optional `(:Community {id, label})` nodes.

use crate::memory::MAX_SHORTEST_PATHS;
use kg_types::{Community, GraphClient, GraphClientError, Neighbor, Node, Path, Relationship};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeSet, HashSet};
use std::time::Duration;

const FIND_NODES: &str = "\
MATCH (n)
WHERE n.name IS NOT NULL AND toLower(n.name) CONTAINS toLower($name)
WITH n,
     CASE
       WHEN toLower(n.name) = toLower($name) THEN 0
       WHEN toLower(n.name) STARTS WITH toLower($name) THEN 1
       ELSE 2
     END AS rank,
     size([(n)--() | 1]) AS degree
RETURN {id: elementId(n), label: coalesce(labels(n)[0], ''), props: properties(n)} AS node
ORDER BY rank ASC, degree DESC, n.name ASC, elementId(n) ASC
LIMIT $limit";

const NEIGHBORS: &str = "\
MATCH (a)-[r]-(b)
WHERE elementId(a) = $id
RETURN {type: type(r), source: elementId(startNode(r)), target: elementId(endNode(r))} AS rel,
       {id: elementId(b), label: coalesce(labels(b)[0], ''), props: properties(b)} AS node
ORDER BY type(r), b.name, elementId(b)
LIMIT $limit";

const COMMUNITIES: &str = "\
MATCH (n)
WHERE elementId(n) IN $ids AND n.community IS NOT NULL
WITH DISTINCT n.community AS cid
MATCH (m) WHERE m.community = cid
WITH cid, collect(elementId(m)) AS members
OPTIONAL MATCH (c:Community {id: cid})
RETURN toString(cid) AS id, c.label AS label, members
ORDER BY id";

/// Variable-length bounds can't be parameters in Cypher, so the hop count is
/// formatted in (it is a validated integer).
fn shortest_paths_statement(max_hops: usize) -> String {
    format!(
        "\
MATCH (a), (b)
WHERE elementId(a) = $from AND elementId(b) = $to
MATCH p = allShortestPaths((a)-[*..{max_hops}]-(b))
RETURN [x IN nodes(p) | {{id: elementId(x), label: coalesce(labels(x)[0], ''), props: properties(x)}}] AS nodes,
       [r IN relationships(p) | {{type: type(r), source: elementId(startNode(r)), target: elementId(endNode(r))}}] AS rels
LIMIT $cap"
    )
}

#[derive(Serialize)]
struct TxRequest<'a> {
    statements: [Statement<'a>; 1],
}

#[derive(Serialize)]
struct Statement<'a> {
    statement: &'a str,
    parameters: Value,
}

#[derive(Debug, Deserialize)]
struct TxResponse {
    #[serde(default)]
    results: Vec<TxResult>,
    #[serde(default)]
    errors: Vec<TxError>,
}

#[derive(Debug, Deserialize)]
struct TxResult {
    #[serde(default)]
    data: Vec<TxRow>,
}

#[derive(Debug, Deserialize)]
struct TxRow {
    row: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct TxError {
    code: String,
    message: String,
}

/// Graph client for a Neo4j server. Holds one pooled `reqwest::Client`.
pub struct Neo4jGraphClient {
    client: reqwest::Client,
    tx_url: String,
    user: Option<String>,
    password: Option<String>,
}

impl Neo4jGraphClient {
    /// `uri` is the HTTP(S) base of the server, e.g. `http://localhost:7474`.
    pub fn new(
        uri: &str,
        database: &str,
        user: Option<String>,
        password: Option<String>,
        timeout: Duration,
    ) -> Result<Self, GraphClientError> {
        let base = uri.trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(GraphClientError::Unavailable(format!(
                "unsupported graph uri '{}': only http(s) endpoints are supported",
                uri
            )));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GraphClientError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            tx_url: format!("{}/db/{}/tx/commit", base, database),
            user,
            password,
        })
    }

    /// Round-trip a trivial statement to surface connection and auth failures early.
    pub async fn ping(&self) -> Result<(), GraphClientError> {
        self.run("RETURN 1", json!({})).await.map(|_| ())
    }

    async fn run(&self, statement: &str, parameters: Value) -> Result<Vec<Vec<Value>>, GraphClientError> {
        let body = TxRequest {
            statements: [Statement {
                statement,
                parameters,
            }],
        };
        let mut req = self.client.post(&self.tx_url).json(&body);
        if let Some(ref user) = self.user {
            req = req.basic_auth(user, self.password.as_deref());
        }
        let res = req
            .send()
            .await
            .map_err(|e| GraphClientError::Unavailable(e.to_string()))?;
        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| GraphClientError::Unavailable(e.to_string()))?;
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(GraphClientError::Unavailable(format!(
                "graph authentication failed ({})",
                status
            )));
        }
        if !status.is_success() {
            return Err(GraphClientError::Protocol(format!(
                "graph API error {}: {}",
                status, text
            )));
        }
        rows_from_response(&text)
    }
}

fn rows_from_response(text: &str) -> Result<Vec<Vec<Value>>, GraphClientError> {
    let parsed: TxResponse =
        serde_json::from_str(text).map_err(|e| GraphClientError::Protocol(e.to_string()))?;
    if let Some(err) = parsed.errors.first() {
        return Err(GraphClientError::Protocol(format!(
            "{}: {}",
            err.code, err.message
        )));
    }
    Ok(parsed
        .results
        .into_iter()
        .flat_map(|r| r.data.into_iter().map(|d| d.row))
        .collect())
}

fn protocol(msg: impl Into<String>) -> GraphClientError {
    GraphClientError::Protocol(msg.into())
}

fn str_field(v: &Value, field: &str) -> Result<String, GraphClientError> {
    v.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| protocol(format!("missing string field '{}'", field)))
}

/// `{id, label, props}` -> Node.
fn parse_node(v: &Value) -> Result<Node, GraphClientError> {
    let mut node = Node::new(str_field(v, "id")?, str_field(v, "label").unwrap_or_default());
    if let Some(props) = v.get("props").and_then(Value::as_object) {
        node.properties = props
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
    }
    Ok(node)
}

/// `{type, source, target}` -> Relationship.
fn parse_relationship(v: &Value) -> Result<Relationship, GraphClientError> {
    Ok(Relationship::new(
        str_field(v, "type")?,
        str_field(v, "source")?,
        str_field(v, "target")?,
    ))
}

/// Node list + relationship list -> Path, marking each hop's traversal direction.
fn parse_path(nodes: &Value, rels: &Value) -> Result<Path, GraphClientError> {
    let nodes = nodes
        .as_array()
        .ok_or_else(|| protocol("path nodes must be a list"))?
        .iter()
        .map(parse_node)
        .collect::<Result<Vec<_>, _>>()?;
    let rels = rels
        .as_array()
        .ok_or_else(|| protocol("path relationships must be a list"))?
        .iter()
        .map(parse_relationship)
        .collect::<Result<Vec<_>, _>>()?;
    let rels = rels
        .into_iter()
        .zip(nodes.iter())
        .map(|(rel, from)| rel.traversed_from(&from.id))
        .collect();
    Path::from_parts(nodes, rels).ok_or_else(|| protocol("path node/relationship counts differ"))
}

fn parse_community(row: &[Value]) -> Result<Community, GraphClientError> {
    let id = row
        .first()
        .and_then(Value::as_str)
        .ok_or_else(|| protocol("community id missing"))?
        .to_string();
    let label = row.get(1).and_then(Value::as_str).map(str::to_string);
    let members = row
        .get(2)
        .and_then(Value::as_array)
        .map(|m| {
            m.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    Ok(Community { id, label, members })
}

#[async_trait::async_trait]
impl GraphClient for Neo4jGraphClient {
    async fn find_nodes_by_name(
        &self,
        names: &[String],
        limit: usize,
    ) -> Result<Vec<Node>, GraphClientError> {
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        for name in names {
            if result.len() >= limit {
                break;
            }
            if name.trim().is_empty() {
                continue;
            }
            let rows = self
                .run(FIND_NODES, json!({ "name": name.trim(), "limit": limit }))
                .await?;
            for row in rows {
                let node = parse_node(row.first().ok_or_else(|| protocol("empty row"))?)?;
                if result.len() < limit && seen.insert(node.id.clone()) {
                    result.push(node);
                }
            }
        }
        Ok(result)
    }

    async fn shortest_paths(
        &self,
        from_id: &str,
        to_id: &str,
        max_hops: usize,
    ) -> Result<Vec<Path>, GraphClientError> {
        if max_hops == 0 || from_id == to_id {
            return Ok(Vec::new());
        }
        let rows = self
            .run(
                &shortest_paths_statement(max_hops),
                json!({ "from": from_id, "to": to_id, "cap": MAX_SHORTEST_PATHS }),
            )
            .await?;
        rows.iter()
            .map(|row| match row.as_slice() {
                [nodes, rels, ..] => parse_path(nodes, rels),
                _ => Err(protocol("path row must have nodes and rels")),
            })
            .collect()
    }

    async fn neighbors(
        &self,
        node_id: &str,
        max_results: usize,
    ) -> Result<Vec<Neighbor>, GraphClientError> {
        if max_results == 0 {
            return Ok(Vec::new());
        }
        let rows = self
            .run(NEIGHBORS, json!({ "id": node_id, "limit": max_results }))
            .await?;
        rows.iter()
            .map(|row| match row.as_slice() {
                [rel, node, ..] => Ok(Neighbor {
                    relationship: parse_relationship(rel)?.traversed_from(node_id),
                    node: parse_node(node)?,
                }),
                _ => Err(protocol("neighbor row must have rel and node")),
            })
            .collect()
    }

    async fn communities_for(
        &self,
        node_ids: &BTreeSet<String>,
    ) -> Result<Vec<Community>, GraphClientError> {
        if node_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self.run(COMMUNITIES, json!({ "ids": node_ids })).await?;
        rows.iter().map(|row| parse_community(row)).collect()
    }
}
