//! Neo4j HTTP transactional-API executor.
//!
//! One POST per query against `{base}/db/{database}/tx/commit`, asking for
//! both `row` and `graph` result contents. The reply is decoded here, once:
//! the `meta` section says what each column holds (scalar, node,
//! relationship, list, path), the `graph` section supplies labels,
//! properties, and relationship endpoints, and the `row` section covers
//! plain scalars. Everything downstream sees tagged [`CypherValue`]s with
//! canonical element ids.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::Semaphore;

use vulngraph_cypher::{
    canonical_element_id, CypherValue, NodeValue, PathSegment, PathValue, RelValue, ResultRow,
    ValueMap,
};

use crate::{ExecutorError, QueryExecutor};

// ============================================================================
// Configuration
// ============================================================================

const URL_ENV: &str = "NEO4J_URL";
const USER_ENV: &str = "NEO4J_USER";
const PASSWORD_ENV: &str = "NEO4J_PASSWORD";
const DATABASE_ENV: &str = "NEO4J_DATABASE";
const MAX_INFLIGHT_ENV: &str = "VULNGRAPH_MAX_INFLIGHT";

#[derive(Debug, Clone)]
pub struct Neo4jConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub database: String,
    pub timeout_secs: u64,
    /// Upper bound on concurrent queries through one executor.
    pub max_inflight: usize,
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:7474".to_string(),
            username: "neo4j".to_string(),
            password: "password".to_string(),
            database: "neo4j".to_string(),
            timeout_secs: 30,
            max_inflight: 4,
        }
    }
}

impl Neo4jConfig {
    /// All knobs from the environment, defaults where unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var(URL_ENV).unwrap_or(defaults.base_url),
            username: std::env::var(USER_ENV).unwrap_or(defaults.username),
            password: std::env::var(PASSWORD_ENV).unwrap_or(defaults.password),
            database: std::env::var(DATABASE_ENV).unwrap_or(defaults.database),
            timeout_secs: defaults.timeout_secs,
            max_inflight: env_usize(MAX_INFLIGHT_ENV, defaults.max_inflight, 1, 64),
        }
    }
}

fn env_usize(name: &str, default: usize, lo: usize, hi: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .map(|v| v.clamp(lo, hi))
        .unwrap_or(default)
}

// ============================================================================
// Executor
// ============================================================================

pub struct HttpExecutor {
    client: Client,
    config: Neo4jConfig,
    permits: Semaphore,
}

impl HttpExecutor {
    pub fn new(config: Neo4jConfig) -> Result<Self, ExecutorError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ExecutorError::Transport(e.to_string()))?;
        let permits = Semaphore::new(config.max_inflight.max(1));
        Ok(Self {
            client,
            config,
            permits,
        })
    }

    pub fn from_env() -> Result<Self, ExecutorError> {
        Self::new(Neo4jConfig::from_env())
    }

    /// Connectivity check: one trivial query, one expected row.
    pub async fn ping(&self) -> Result<(), ExecutorError> {
        let rows = self.run_query("RETURN 1 AS ok", &ValueMap::new()).await?;
        if rows.len() == 1 {
            Ok(())
        } else {
            Err(ExecutorError::Decode(format!(
                "ping returned {} rows",
                rows.len()
            )))
        }
    }
}

#[async_trait]
impl QueryExecutor for HttpExecutor {
    async fn run_query(
        &self,
        query: &str,
        params: &ValueMap,
    ) -> Result<Vec<ResultRow>, ExecutorError> {
        // Held for the whole call; dropped on every exit path.
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ExecutorError::Closed)?;

        let url = format!(
            "{}/db/{}/tx/commit",
            self.config.base_url.trim_end_matches('/'),
            self.config.database
        );
        let body = statement_body(query, params);

        tracing::debug!(%url, "running query");
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .json(&body)
            .send()
            .await
            .map_err(|e| ExecutorError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ExecutorError::Server {
                code: format!("Http.{}", status.as_u16()),
                message: text,
            });
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ExecutorError::Decode(e.to_string()))?;
        decode_commit_body(&data)
    }
}

fn statement_body(query: &str, params: &ValueMap) -> serde_json::Value {
    serde_json::json!({
        "statements": [{
            "statement": query,
            "parameters": map_to_plain_json(params),
            "resultDataContents": ["row", "graph"],
        }]
    })
}

/// Parameters go over the wire as plain JSON, not in tagged form. Entities
/// cannot be parameters; they reduce to their property maps.
fn value_to_plain_json(value: &CypherValue) -> serde_json::Value {
    match value {
        CypherValue::Null => serde_json::Value::Null,
        CypherValue::Bool(b) => serde_json::Value::from(*b),
        CypherValue::Int(i) => serde_json::Value::from(*i),
        CypherValue::Float(f) => serde_json::Value::from(*f),
        CypherValue::String(s) => serde_json::Value::from(s.as_str()),
        CypherValue::List(items) => {
            serde_json::Value::Array(items.iter().map(value_to_plain_json).collect())
        }
        CypherValue::Map(map) => map_to_plain_json(map),
        CypherValue::Node(n) => map_to_plain_json(&n.properties),
        CypherValue::Relationship(r) => map_to_plain_json(&r.properties),
        CypherValue::Path(_) => serde_json::Value::Null,
    }
}

fn map_to_plain_json(map: &ValueMap) -> serde_json::Value {
    let mut obj = serde_json::Map::new();
    for (key, value) in map.iter() {
        obj.insert(key.to_string(), value_to_plain_json(value));
    }
    serde_json::Value::Object(obj)
}

// ============================================================================
// Reply decoding
// ============================================================================

fn decode_commit_body(body: &serde_json::Value) -> Result<Vec<ResultRow>, ExecutorError> {
    if let Some(err) = body["errors"].get(0) {
        let code = err["code"]
            .as_str()
            .unwrap_or("Neo.UnknownError")
            .to_string();
        let message = err["message"].as_str().unwrap_or_default().to_string();
        return Err(ExecutorError::Server { code, message });
    }

    let result = match body["results"].get(0) {
        Some(result) => result,
        None => return Ok(Vec::new()),
    };
    let columns: Vec<String> = result["columns"]
        .as_array()
        .ok_or_else(|| ExecutorError::Decode("results[0].columns missing".to_string()))?
        .iter()
        .map(|c| c.as_str().unwrap_or_default().to_string())
        .collect();

    let empty = Vec::new();
    let data = result["data"].as_array().unwrap_or(&empty);

    let mut rows = Vec::with_capacity(data.len());
    for entry in data {
        let (nodes, rels) = index_graph_section(&entry["graph"]);
        let raw_row = entry["row"].as_array().cloned().unwrap_or_default();
        let metas = entry["meta"].as_array().cloned().unwrap_or_default();

        let mut row = ResultRow::new();
        for (i, name) in columns.iter().enumerate() {
            let raw = raw_row.get(i).cloned().unwrap_or(serde_json::Value::Null);
            let meta = metas.get(i).cloned().unwrap_or(serde_json::Value::Null);
            row.insert(name.clone(), decode_value(&raw, &meta, &nodes, &rels));
        }
        rows.push(row);
    }
    Ok(rows)
}

fn index_graph_section(
    graph: &serde_json::Value,
) -> (HashMap<String, NodeValue>, HashMap<String, RelValue>) {
    let mut nodes = HashMap::new();
    if let Some(items) = graph["nodes"].as_array() {
        for item in items {
            if let Some(node) = decode_graph_node(item) {
                nodes.insert(node.element_id.clone(), node);
            }
        }
    }
    let mut rels = HashMap::new();
    if let Some(items) = graph["relationships"].as_array() {
        for item in items {
            if let Some(rel) = decode_graph_rel(item) {
                rels.insert(rel.element_id.clone(), rel);
            }
        }
    }
    (nodes, rels)
}

fn decode_graph_node(item: &serde_json::Value) -> Option<NodeValue> {
    let element_id = canonical_element_id(&item["id"])?;
    let labels = item["labels"]
        .as_array()
        .map(|labels| {
            labels
                .iter()
                .filter_map(|l| l.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();
    Some(NodeValue {
        element_id,
        labels,
        properties: json_object_to_map(&item["properties"]),
    })
}

fn decode_graph_rel(item: &serde_json::Value) -> Option<RelValue> {
    let element_id = canonical_element_id(&item["id"])?;
    let start_id = canonical_element_id(&item["startNode"])?;
    let end_id = canonical_element_id(&item["endNode"])?;
    Some(RelValue {
        element_id,
        rel_type: item["type"].as_str().unwrap_or_default().to_string(),
        start_id,
        end_id,
        properties: json_object_to_map(&item["properties"]),
    })
}

fn decode_value(
    raw: &serde_json::Value,
    meta: &serde_json::Value,
    nodes: &HashMap<String, NodeValue>,
    rels: &HashMap<String, RelValue>,
) -> CypherValue {
    match meta {
        serde_json::Value::Object(_) => decode_entity(raw, meta, nodes, rels),
        serde_json::Value::Array(metas) => {
            // Paths arrive as a flat, odd-length alternation of node and
            // relationship metas. Anything else is an ordinary list.
            if let Some(path) = decode_path(metas, nodes, rels) {
                return CypherValue::Path(path);
            }
            let raws = raw.as_array().cloned().unwrap_or_default();
            let items = metas
                .iter()
                .enumerate()
                .map(|(i, item_meta)| {
                    let item_raw = raws.get(i).cloned().unwrap_or(serde_json::Value::Null);
                    decode_value(&item_raw, item_meta, nodes, rels)
                })
                .collect();
            CypherValue::List(items)
        }
        _ => json_to_scalar(raw),
    }
}

fn decode_entity(
    raw: &serde_json::Value,
    meta: &serde_json::Value,
    nodes: &HashMap<String, NodeValue>,
    rels: &HashMap<String, RelValue>,
) -> CypherValue {
    let id = canonical_element_id(&meta["id"]);
    match meta["type"].as_str() {
        Some("node") => {
            if let Some(found) = id.as_ref().and_then(|i| nodes.get(i)) {
                return CypherValue::Node(found.clone());
            }
            // No graph entry; salvage what the row carries.
            CypherValue::Node(NodeValue {
                element_id: id.unwrap_or_default(),
                labels: Vec::new(),
                properties: json_object_to_map(raw),
            })
        }
        Some("relationship") => {
            if let Some(found) = id.as_ref().and_then(|i| rels.get(i)) {
                return CypherValue::Relationship(found.clone());
            }
            tracing::warn!("relationship meta without graph entry; endpoints unknown");
            CypherValue::Relationship(RelValue {
                element_id: id.unwrap_or_default(),
                rel_type: String::new(),
                start_id: String::new(),
                end_id: String::new(),
                properties: json_object_to_map(raw),
            })
        }
        _ => json_to_scalar(raw),
    }
}

fn decode_path(
    metas: &[serde_json::Value],
    nodes: &HashMap<String, NodeValue>,
    rels: &HashMap<String, RelValue>,
) -> Option<PathValue> {
    if metas.len() < 3 || metas.len() % 2 == 0 {
        return None;
    }
    let mut path_nodes = Vec::new();
    let mut path_rels = Vec::new();
    for (i, meta) in metas.iter().enumerate() {
        let id = canonical_element_id(&meta["id"])?;
        match (i % 2, meta["type"].as_str()) {
            (0, Some("node")) => path_nodes.push(nodes.get(&id)?.clone()),
            (1, Some("relationship")) => path_rels.push(rels.get(&id)?.clone()),
            _ => return None,
        }
    }
    let segments = path_rels
        .iter()
        .enumerate()
        .map(|(k, rel)| PathSegment {
            start: path_nodes[k].clone(),
            relationship: rel.clone(),
            end: path_nodes[k + 1].clone(),
        })
        .collect();
    Some(PathValue { segments })
}

fn json_to_scalar(value: &serde_json::Value) -> CypherValue {
    match value {
        serde_json::Value::Null => CypherValue::Null,
        serde_json::Value::Bool(b) => CypherValue::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                CypherValue::Int(i)
            } else {
                CypherValue::Float(n.as_f64().unwrap_or(0.0))
            }
        }
        serde_json::Value::String(s) => CypherValue::String(s.clone()),
        serde_json::Value::Array(items) => {
            CypherValue::List(items.iter().map(json_to_scalar).collect())
        }
        serde_json::Value::Object(obj) => CypherValue::Map(
            obj.iter()
                .map(|(k, v)| (k.clone(), json_to_scalar(v)))
                .collect(),
        ),
    }
}

/// Property objects from the `graph` section (and row-salvaged entities)
/// become [`ValueMap`]s; anything that is not an object becomes an empty map.
fn json_object_to_map(value: &serde_json::Value) -> ValueMap {
    match value {
        serde_json::Value::Object(obj) => obj
            .iter()
            .map(|(k, v)| (k.clone(), json_to_scalar(v)))
            .collect(),
        _ => ValueMap::new(),
    }
}

// ============================================================================
// Tests
// ============================================================================
