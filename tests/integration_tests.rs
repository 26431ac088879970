//! Integration tests for the complete question-answering pipeline
//!
//! These tests verify end-to-end functionality across crates:
//! - question → intent → Cypher → safety → execution → narration
//! - raw result rows → shaped graph and table views
//!
//! Run with: cargo test --test integration_tests

use std::io::Write as _;
use std::sync::Arc;

use tempfile::NamedTempFile;

use vulngraph_cypher::{CypherValue, NodeValue, RelValue, ResultRow, ValueMap};
use vulngraph_executor::{ExecutorError, StaticExecutor};
use vulngraph_llm::ScriptedClient;
use vulngraph_pipeline::{Pipeline, PipelineConfig, PipelineResult};
use vulngraph_shape::{sample_rows, shape, ShapedResult};

// ============================================================================
// Helpers
// ============================================================================

const INTENT_REPLY: &str = r#"{"intent": "list", "entities": {"severity": "CRITICAL"}}"#;

fn write_guide() -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp guide");
    writeln!(file, "NODE LABELS: Finding, Asset, Service, Scanner").expect("write guide");
    writeln!(file, "RELATIONSHIPS: AFFECTS, BELONGS_TO_SERVICE, DETECTED_BY").expect("write guide");
    file
}

fn config_for(guide: &NamedTempFile) -> PipelineConfig {
    PipelineConfig {
        guide_path: guide.path().to_path_buf(),
        ..PipelineConfig::default()
    }
}

fn finding_node(element: &str, finding_id: &str, title: &str, severity: &str) -> CypherValue {
    CypherValue::Node(NodeValue {
        element_id: element.to_string(),
        labels: vec!["Finding".to_string()],
        properties: ValueMap::from_entries([
            ("finding_id", CypherValue::from(finding_id)),
            ("title", CypherValue::from(title)),
            ("severity", CypherValue::from(severity)),
        ]),
    })
}

fn step_names(result: &PipelineResult) -> Vec<&str> {
    result.reasoning.iter().map(|s| s.step.as_str()).collect()
}

// ============================================================================
// Scenario: list critical findings, end to end
// ============================================================================

#[tokio::test]
async fn test_list_critical_findings_end_to_end() {
    let guide = write_guide();
    let llm = Arc::new(ScriptedClient::new([
        INTENT_REPLY,
        "MATCH (f:Finding) WHERE f.severity = 'CRITICAL' RETURN f",
        "There are 3 critical findings.\n\n## Reasoning\nDirect severity filter.\n\n## Cypher Query\n```cypher\nMATCH (f:Finding) WHERE f.severity = 'CRITICAL' RETURN f\n```",
    ]));
    let rows: Vec<ResultRow> = (1..=3)
        .map(|i| {
            ResultRow::from_entries([(
                "f",
                finding_node(
                    &i.to_string(),
                    &format!("F-00{i}"),
                    &format!("Critical issue {i}"),
                    "CRITICAL",
                ),
            )])
        })
        .collect();
    let executor = Arc::new(StaticExecutor::with_rows(rows));
    let pipeline = Pipeline::new(llm, executor.clone(), config_for(&guide));

    let result = pipeline.run("list critical findings").await.unwrap();

    assert_eq!(
        step_names(&result),
        [
            "Load Schema Guide",
            "Intent Extraction",
            "Cypher Generation",
            "Cypher Repair",
            "Cypher Validation",
            "Query Execution",
            "Answer Generation",
        ]
    );
    assert!(result.answer.starts_with("There are 3 critical findings."));
    assert_eq!(
        executor.queries(),
        vec!["MATCH (f:Finding) WHERE f.severity = 'CRITICAL' RETURN f"]
    );

    let raw = result.raw_results.expect("rows survive the pipeline");
    assert_eq!(raw.len(), 3);

    let shaped = shape(&raw);
    let graph = shaped.graph().expect("finding rows shape into a graph");
    assert_eq!(graph.nodes.len(), 3);
    assert_eq!(graph.edges.len(), 0);
    let table = shaped.table().expect("table is always built");
    assert_eq!(table.rows.len(), 3);
    assert_eq!(table.columns, vec!["f"]);

    let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, ["F-001", "F-002", "F-003"]);
}

// ============================================================================
// Scenario: generated mutation is rejected before execution
// ============================================================================

#[tokio::test]
async fn test_generated_delete_is_rejected() {
    let guide = write_guide();
    let llm = Arc::new(ScriptedClient::new([
        r#"{"intent": "delete", "entities": {}}"#,
        "MATCH (f:Finding) DELETE f",
    ]));
    let executor = Arc::new(StaticExecutor::default());
    let pipeline = Pipeline::new(llm, executor.clone(), config_for(&guide));

    let result = pipeline.run("delete all findings").await.unwrap();

    assert_eq!(result.answer, "Sorry, the generated query was not safe to run.");
    assert_eq!(result.query.as_deref(), Some("MATCH (f:Finding) DELETE f"));
    assert!(result.raw_results.is_none());
    assert!(executor.queries().is_empty(), "nothing may reach the executor");
    assert_eq!(
        result.reasoning.last().unwrap().details,
        "Rejected unsafe Cypher (mutation detected)."
    );
}

// ============================================================================
// Scenario: executor failure surfaces as an apology, not an error
// ============================================================================

#[tokio::test]
async fn test_executor_failure_is_recovered() {
    let guide = write_guide();
    let llm = Arc::new(ScriptedClient::new([
        INTENT_REPLY,
        "MATCH (f:Finding) RETURN f",
    ]));
    let executor = Arc::new(StaticExecutor::with_error(ExecutorError::Server {
        code: "Neo.ClientError.Statement.SyntaxError".to_string(),
        message: "Unknown function 'frobnicate'".to_string(),
    }));
    let pipeline = Pipeline::new(llm, executor, config_for(&guide));

    let result = pipeline.run("list findings").await.unwrap();

    assert_eq!(result.answer, "Sorry, there was an error running the query.");
    assert_eq!(result.query.as_deref(), Some("MATCH (f:Finding) RETURN f"));
    assert!(result.raw_results.is_none());

    let execution = result
        .reasoning
        .iter()
        .find(|s| s.step == "Query Execution")
        .expect("execution stage is traced");
    assert!(execution.details.starts_with("Cypher execution error:"));
    assert!(execution.details.contains("frobnicate"));
}

// ============================================================================
// Pipeline + shaper over the bundled sample graph
// ============================================================================

#[tokio::test]
async fn test_sample_graph_flows_through_pipeline_and_shaper() {
    let guide = write_guide();
    let llm = Arc::new(ScriptedClient::new([
        r#"{"intent": "map", "entities": {"finding": "F-001"}}"#,
        "MATCH (f:Finding)-[:AFFECTS]->(a:Asset) RETURN f, a",
        "F-001 affects /api/login, owned by auth-service.",
    ]));
    let executor = Arc::new(StaticExecutor::with_rows(sample_rows()));
    let pipeline = Pipeline::new(llm, executor.clone(), config_for(&guide));

    let result = pipeline
        .run("what does the SQL injection affect?")
        .await
        .unwrap();

    // The direct pattern gets repaired to bind and project `r`.
    assert_eq!(
        result.query.as_deref(),
        Some("MATCH (f:Finding)-[r:AFFECTS]->(a:Asset) RETURN r, f, a")
    );
    assert_eq!(
        executor.queries(),
        vec!["MATCH (f:Finding)-[r:AFFECTS]->(a:Asset) RETURN r, f, a"]
    );

    let shaped = shape(&result.raw_results.expect("rows survive"));
    let graph = shaped.graph().expect("sample rows carry nodes");
    assert_eq!(graph.nodes.len(), 3);
    assert_eq!(graph.edges.len(), 2);

    let affects = graph
        .edges
        .iter()
        .find(|e| e.rel_type == "AFFECTS")
        .expect("AFFECTS edge");
    assert_eq!(affects.source, "F-001");
    assert_eq!(affects.target, "A-001");

    let belongs = graph
        .edges
        .iter()
        .find(|e| e.rel_type == "BELONGS_TO_SERVICE")
        .expect("BELONGS_TO_SERVICE edge");
    assert_eq!(belongs.source, "A-001");
    assert_eq!(belongs.target, "auth-service");

    let table = shaped.table().expect("table is always built");
    assert_eq!(table.columns, vec!["f", "r", "a", "s"]);
    assert_eq!(table.rows.len(), 2);
}

// ============================================================================
// Identity merging across rows
// ============================================================================

#[test]
fn test_same_finding_id_merges_to_one_entity() {
    let rows = vec![
        ResultRow::from_entries([(
            "f",
            finding_node("10", "F-001", "SQL Injection in Login", "CRITICAL"),
        )]),
        ResultRow::from_entries([(
            "f",
            finding_node("99", "F-001", "Renamed later", "CRITICAL"),
        )]),
    ];

    let shaped = shape(&rows);
    let graph = shaped.graph().expect("graph result");
    assert_eq!(graph.nodes.len(), 1);
    // First registration wins.
    assert_eq!(graph.nodes[0].display_name, "SQL Injection in Login");
    // The table still reflects both input rows.
    assert_eq!(shaped.table().unwrap().rows.len(), 2);
}

// ============================================================================
// Edge cases
// ============================================================================

#[test]
fn test_dangling_relationship_is_dropped() {
    let rel = CypherValue::Relationship(RelValue {
        element_id: "50".to_string(),
        rel_type: "AFFECTS".to_string(),
        start_id: "1".to_string(),
        end_id: "404".to_string(),
        properties: ValueMap::new(),
    });
    let rows = vec![ResultRow::from_entries([
        ("f", finding_node("1", "F-001", "SQL Injection in Login", "HIGH")),
        ("r", rel),
    ])];

    let shaped = shape(&rows);
    let graph = shaped.graph().expect("graph result");
    assert_eq!(graph.nodes.len(), 1);
    assert!(graph.edges.is_empty(), "missing endpoint drops the edge");
}

#[test]
fn test_empty_row_set_is_classified_empty() {
    assert!(matches!(shape(&[]), ShapedResult::Empty));
}
