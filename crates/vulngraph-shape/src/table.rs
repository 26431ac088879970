//! Flattened tabular view.
//!
//! Built unconditionally, alongside the graph, never as a fallback: every
//! input row becomes one output row, and the column set is the union of
//! keys across all rows in order of first appearance.

use serde::{Deserialize, Serialize};

use vulngraph_cypher::{CypherValue, ResultRow, ValueMap};

use crate::identity::{display_name, resolve_entity_id};

/// Cells aligned to [`TableView::columns`]; a key missing from the source
/// row renders as an empty cell.
pub type TableRow = Vec<String>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableView {
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl TableView {
    /// Cell lookup by column name, for callers that want the mapping view.
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(idx).map(String::as_str)
    }
}

pub fn build_table(rows: &[ResultRow]) -> TableView {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.to_string());
            }
        }
    }

    let table_rows = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|column| row.get(column).map(render_cell).unwrap_or_default())
                .collect()
        })
        .collect();

    TableView {
        columns,
        rows: table_rows,
    }
}

/// Display-safe scalar for one cell: nodes become their display name,
/// relationships their type, lists comma-join, maps serialize to JSON,
/// paths summarize as a chain of endpoint names.
pub fn render_cell(value: &CypherValue) -> String {
    match value {
        CypherValue::Null => String::new(),
        CypherValue::Bool(b) => b.to_string(),
        CypherValue::Int(i) => i.to_string(),
        CypherValue::Float(f) => f.to_string(),
        CypherValue::String(s) => s.clone(),
        CypherValue::List(items) => items
            .iter()
            .map(render_cell)
            .collect::<Vec<_>>()
            .join(", "),
        CypherValue::Map(map) => serde_json::to_string(&plain_json(map)).unwrap_or_default(),
        CypherValue::Node(node) => display_name(node, &resolve_entity_id(node)),
        CypherValue::Relationship(rel) => rel.rel_type.clone(),
        CypherValue::Path(path) => {
            let mut names = Vec::with_capacity(path.segments.len() + 1);
            if let Some(first) = path.segments.first() {
                names.push(display_name(&first.start, &resolve_entity_id(&first.start)));
            }
            for segment in &path.segments {
                names.push(display_name(&segment.end, &resolve_entity_id(&segment.end)));
            }
            names.join(" -> ")
        }
    }
}

fn plain_json(map: &ValueMap) -> serde_json::Value {
    fn convert(value: &CypherValue) -> serde_json::Value {
        match value {
            CypherValue::Null => serde_json::Value::Null,
            CypherValue::Bool(b) => serde_json::Value::from(*b),
            CypherValue::Int(i) => serde_json::Value::from(*i),
            CypherValue::Float(f) => serde_json::Value::from(*f),
            CypherValue::String(s) => serde_json::Value::from(s.as_str()),
            CypherValue::List(items) => {
                serde_json::Value::Array(items.iter().map(convert).collect())
            }
            CypherValue::Map(inner) => plain_json(inner),
            // Entities inside generic maps reduce to their display text.
            other => serde_json::Value::from(render_cell(other)),
        }
    }
    let mut obj = serde_json::Map::new();
    for (key, value) in map.iter() {
        obj.insert(key.to_string(), convert(value));
    }
    serde_json::Value::Object(obj)
}

// ============================================================================
// Tests
// ============================================================================
