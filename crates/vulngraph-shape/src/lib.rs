//! Result shaping: raw query rows in, a deduplicated node/edge graph and a
//! flattened table out.
//!
//! Design constraints:
//! - pure and synchronous over an in-memory row set; safe to call
//!   concurrently, holds nothing between calls
//! - identity and display-name resolution depend only on a node's own
//!   labels and properties (see `identity`)
//! - nodes are merged by resolved id, first registration wins
//! - an edge is emitted only when both endpoints resolve to nodes seen in
//!   the same batch; anything else is dropped with a debug log, never
//!   fabricated
//! - the table is always built, in parallel with the graph, never as a
//!   fallback

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use vulngraph_cypher::{CypherValue, NodeValue, RelValue, ResultRow, ValueMap};

pub mod identity;
pub mod sample;
pub mod style;
pub mod table;

pub use identity::{display_name, resolve_entity_id};
pub use sample::sample_rows;
pub use style::{label_color, label_size, Severity};
pub use table::{build_table, render_cell, TableRow, TableView};

// ============================================================================
// Shaped output
// ============================================================================

/// A deduplicated, display-ready node. `color` and `size` are derived
/// presentation hints, not authoritative data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEntity {
    pub id: String,
    pub display_name: String,
    pub type_label: String,
    pub properties: ValueMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    pub color: String,
    pub size: u32,
}

/// A typed edge between two resolved entity ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphRelation {
    pub source: String,
    pub target: String,
    pub rel_type: String,
    pub properties: ValueMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphView {
    pub nodes: Vec<GraphEntity>,
    pub edges: Vec<GraphRelation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapedResult {
    /// No input rows at all; distinct from a present-but-nodeless result.
    Empty,
    Graph { graph: GraphView, table: TableView },
    Table { table: TableView },
}

impl ShapedResult {
    pub fn table(&self) -> Option<&TableView> {
        match self {
            ShapedResult::Empty => None,
            ShapedResult::Graph { table, .. } => Some(table),
            ShapedResult::Table { table } => Some(table),
        }
    }

    pub fn graph(&self) -> Option<&GraphView> {
        match self {
            ShapedResult::Graph { graph, .. } => Some(graph),
            _ => None,
        }
    }
}

// ============================================================================
// Shaping
// ============================================================================

/// Shape a batch of rows into graph and table views.
///
/// Two passes: the first registers every node (anywhere in any value,
/// including inside lists and path segments) and collects relationship
/// values; the second resolves relationship endpoints through the identity
/// map built by the first. Edge output therefore does not depend on the
/// order nodes and relationships appear across rows.
pub fn shape(rows: &[ResultRow]) -> ShapedResult {
    if rows.is_empty() {
        return ShapedResult::Empty;
    }

    let mut builder = GraphBuilder::default();
    for row in rows {
        for (_, value) in row.iter() {
            builder.visit(value);
        }
    }
    let table = build_table(rows);

    match builder.finish() {
        Some(graph) => ShapedResult::Graph { graph, table },
        None => ShapedResult::Table { table },
    }
}

#[derive(Default)]
struct GraphBuilder {
    nodes: Vec<GraphEntity>,
    seen_ids: HashSet<String>,
    /// element id -> resolved domain id, for endpoint resolution.
    element_to_resolved: HashMap<String, String>,
    rels: Vec<RelValue>,
    seen_rel_ids: HashSet<String>,
}

impl GraphBuilder {
    fn visit(&mut self, value: &CypherValue) {
        match value {
            CypherValue::Node(node) => self.register_node(node),
            CypherValue::Relationship(rel) => self.collect_rel(rel),
            CypherValue::Path(path) => {
                for segment in &path.segments {
                    self.register_node(&segment.start);
                    self.register_node(&segment.end);
                    self.collect_rel(&segment.relationship);
                }
            }
            CypherValue::List(items) => {
                for item in items {
                    self.visit(item);
                }
            }
            _ => {}
        }
    }

    fn register_node(&mut self, node: &NodeValue) {
        let resolved = resolve_entity_id(node);
        if !node.element_id.is_empty() {
            self.element_to_resolved
                .insert(node.element_id.clone(), resolved.clone());
        }
        // First registration establishes the canonical record.
        if !self.seen_ids.insert(resolved.clone()) {
            return;
        }
        self.nodes.push(build_entity(node, resolved));
    }

    fn collect_rel(&mut self, rel: &RelValue) {
        // The same relationship projected in several rows yields one edge.
        if !rel.element_id.is_empty() && !self.seen_rel_ids.insert(rel.element_id.clone()) {
            return;
        }
        self.rels.push(rel.clone());
    }

    fn finish(self) -> Option<GraphView> {
        if self.nodes.is_empty() {
            return None;
        }

        let mut edges = Vec::with_capacity(self.rels.len());
        for rel in &self.rels {
            let source = self.element_to_resolved.get(&rel.start_id);
            let target = self.element_to_resolved.get(&rel.end_id);
            match (source, target) {
                (Some(source), Some(target)) => edges.push(GraphRelation {
                    source: source.clone(),
                    target: target.clone(),
                    rel_type: rel.rel_type.clone(),
                    properties: rel.properties.clone(),
                }),
                _ => {
                    tracing::debug!(
                        rel_type = %rel.rel_type,
                        start = %rel.start_id,
                        end = %rel.end_id,
                        "dropping edge with unresolved endpoint"
                    );
                }
            }
        }

        Some(GraphView {
            nodes: self.nodes,
            edges,
        })
    }
}

fn build_entity(node: &NodeValue, resolved_id: String) -> GraphEntity {
    let type_label = node
        .labels
        .first()
        .cloned()
        .unwrap_or_else(|| "Node".to_string());
    let name = display_name(node, &resolved_id);

    let severity = if node.labels.iter().any(|l| l == "Finding") {
        identity::property_string(&node.properties, "severity")
            .map(|raw| Severity::parse(&raw).unwrap_or(Severity::Info))
    } else {
        None
    };
    let color = severity
        .map(|s| s.color().to_string())
        .unwrap_or_else(|| label_color(&type_label).to_string());
    let size = severity
        .map(|s| s.size())
        .unwrap_or_else(|| label_size(&type_label));

    GraphEntity {
        id: resolved_id,
        display_name: name,
        type_label,
        properties: node.properties.clone(),
        severity,
        color,
        size,
    }
}

// ============================================================================
// Tests
// ============================================================================
