//! Built-in sample rows for offline demos and tests.
//!
//! Two rows shaped like a typical relationship query: a critical finding
//! affecting an asset, and that asset belonging to a service. The asset
//! appears in both rows, so shaping exercises node merging, and the rows
//! carry different column sets, so the table exercises the column union.

use vulngraph_cypher::{CypherValue, NodeValue, RelValue, ResultRow, ValueMap};

pub fn sample_rows() -> Vec<ResultRow> {
    let finding = NodeValue {
        element_id: "1".to_string(),
        labels: vec!["Finding".to_string()],
        properties: ValueMap::from_entries([
            ("finding_id", CypherValue::from("F-001")),
            ("title", CypherValue::from("SQL Injection in Login")),
            ("severity", CypherValue::from("CRITICAL")),
            ("scanner_type", CypherValue::from("DAST")),
        ]),
    };
    let asset = NodeValue {
        element_id: "2".to_string(),
        labels: vec!["Asset".to_string()],
        properties: ValueMap::from_entries([
            ("name", CypherValue::from("A-001")),
            ("url", CypherValue::from("/api/login")),
            ("type", CypherValue::from("endpoint")),
        ]),
    };
    let service = NodeValue {
        element_id: "3".to_string(),
        labels: vec!["Service".to_string()],
        properties: ValueMap::from_entries([
            ("name", CypherValue::from("auth-service")),
            ("service_id", CypherValue::from("S-001")),
        ]),
    };
    let affects = RelValue {
        element_id: "10".to_string(),
        rel_type: "AFFECTS".to_string(),
        start_id: "1".to_string(),
        end_id: "2".to_string(),
        properties: ValueMap::from_entries([("confidence", CypherValue::from("HIGH"))]),
    };
    let belongs = RelValue {
        element_id: "11".to_string(),
        rel_type: "BELONGS_TO_SERVICE".to_string(),
        start_id: "2".to_string(),
        end_id: "3".to_string(),
        properties: ValueMap::new(),
    };

    vec![
        ResultRow::from_entries([
            ("f", CypherValue::Node(finding)),
            ("r", CypherValue::Relationship(affects)),
            ("a", CypherValue::Node(asset.clone())),
        ]),
        ResultRow::from_entries([
            ("a", CypherValue::Node(asset)),
            ("r", CypherValue::Relationship(belongs)),
            ("s", CypherValue::Node(service)),
        ]),
    ]
}
