//! vulngraph CLI
//!
//! Unified command-line interface for:
//! - Asking natural-language questions against the vulnerability graph (`ask`)
//! - Checking candidate Cypher for safety and repair (`check`)
//! - Shaping raw result rows into graph/table views (`shape`)
//! - Inspecting the schema guide and Neo4j connectivity (`schema`, `ping`)
//! - A fully offline run over scripted replies and sample rows (`demo`)

use std::io::Read as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use vulngraph_cypher::{ensure_relationship_projection, is_read_only, ResultRow};
use vulngraph_executor::{HttpExecutor, StaticExecutor};
use vulngraph_llm::{OpenAiClient, ScriptedClient};
use vulngraph_pipeline::{Pipeline, PipelineConfig, PipelineResult};
use vulngraph_shape::{sample_rows, shape};

mod output;

#[derive(Parser)]
#[command(name = "vulngraph")]
#[command(
    author,
    version,
    about = "Natural-language questions over a Neo4j vulnerability graph"
)]
struct Cli {
    /// Log verbosity (-v info, -vv debug, -vvv trace); `RUST_LOG` wins when set.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a natural-language question against the live LLM and graph.
    Ask {
        /// The question to answer.
        question: String,
        /// Emit the pipeline result and shaped rows as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Run the safety filter and the repair preview over a candidate query.
    Check {
        /// Cypher text to inspect.
        query: String,
    },

    /// Shape raw result rows (a JSON array) into graph/table views.
    Shape {
        /// Rows file; stdin when omitted.
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Print the schema guide the pipeline sends to the model.
    Schema,

    /// Check connectivity to the configured Neo4j endpoint.
    Ping,

    /// Run the pipeline offline on scripted replies and built-in sample rows.
    Demo {
        /// Emit the pipeline result and shaped rows as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Ask { question, json } => cmd_ask(&question, json).await,
        Commands::Check { query } => cmd_check(&query),
        Commands::Shape { file } => cmd_shape(file.as_deref()),
        Commands::Schema => cmd_schema(),
        Commands::Ping => cmd_ping().await,
        Commands::Demo { json } => cmd_demo(json).await,
    }
}

/// Caller-boundary check: the pipeline itself never sees a blank question.
fn validate_question(question: &str) -> Result<&str> {
    let trimmed = question.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("question must not be empty"));
    }
    Ok(trimmed)
}

async fn cmd_ask(question: &str, json: bool) -> Result<()> {
    let question = validate_question(question)?;

    let config = PipelineConfig::from_env()?;
    let llm = Arc::new(OpenAiClient::from_env()?);
    let executor = Arc::new(HttpExecutor::from_env()?);
    let pipeline = Pipeline::new(llm, executor, config);

    let result = pipeline.run(question).await?;
    render_result(&result, json)
}

fn cmd_check(query: &str) -> Result<()> {
    if is_read_only(query) {
        println!("{} query is read-only", "ok".green().bold());
    } else {
        println!(
            "{} query would be rejected (mutation detected)",
            "unsafe".red().bold()
        );
    }
    match ensure_relationship_projection(query) {
        Some(repaired) => {
            println!(
                "{} repair would bind and project the relationship:",
                "note".yellow().bold()
            );
            println!("{repaired}");
        }
        None => println!("no repair rewrite applies"),
    }
    Ok(())
}

fn cmd_shape(file: Option<&Path>) -> Result<()> {
    let raw = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading rows from {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading rows from stdin")?;
            buf
        }
    };
    let rows: Vec<ResultRow> =
        serde_json::from_str(&raw).context("input must be a JSON array of result rows")?;
    let shaped = shape(&rows);
    println!("{}", serde_json::to_string_pretty(&shaped)?);
    Ok(())
}

fn cmd_schema() -> Result<()> {
    let config = PipelineConfig::from_env()?;
    let guide = std::fs::read_to_string(&config.guide_path)
        .with_context(|| format!("reading schema guide {}", config.guide_path.display()))?;
    print!("{guide}");
    if !guide.ends_with('\n') {
        println!();
    }
    Ok(())
}

async fn cmd_ping() -> Result<()> {
    let executor = HttpExecutor::from_env()?;
    executor.ping().await.context("Neo4j ping failed")?;
    println!("{} Neo4j endpoint is reachable", "ok".green().bold());
    Ok(())
}

// ============================================================================
// Offline demo
// ============================================================================

const DEMO_GUIDE: &str = include_str!("../../../DB_SCHEMA_AND_QUERY_GUIDE.md");

const DEMO_QUESTION: &str =
    "Which assets does the SQL injection finding affect, and which service owns them?";

const DEMO_ANSWER: &str = r#"The SQL injection finding (F-001, CRITICAL) affects the `/api/login` endpoint, which belongs to `auth-service`.

## Reasoning
The query followed the AFFECTS relationship from the finding to its asset; the returned rows also carry the BELONGS_TO_SERVICE relationship from that asset to its owning service.

## Cypher Query
```cypher
MATCH (f:Finding)-[r:AFFECTS]->(a:Asset) RETURN r, f, a
```"#;

/// Same stages, scripted collaborators: the LLM replies and the result rows
/// are canned, so this runs with no network and no credentials. The guide is
/// materialized to a temp file because the pipeline always reads it from
/// disk.
async fn cmd_demo(json: bool) -> Result<()> {
    let guide_path = std::env::temp_dir().join(format!(
        "vulngraph-demo-guide-{}.md",
        uuid::Uuid::new_v4()
    ));
    std::fs::write(&guide_path, DEMO_GUIDE)
        .with_context(|| format!("writing demo guide {}", guide_path.display()))?;

    let config = PipelineConfig {
        guide_path: guide_path.clone(),
        ..PipelineConfig::default()
    };
    let llm = Arc::new(ScriptedClient::new([
        r#"{"intent": "map", "entities": {"finding": "SQL Injection in Login"}}"#,
        "MATCH (f:Finding)-[:AFFECTS]->(a:Asset) RETURN f, a",
        DEMO_ANSWER,
    ]));
    let executor = Arc::new(StaticExecutor::with_rows(sample_rows()));
    let pipeline = Pipeline::new(llm, executor, config);

    let result = pipeline.run(DEMO_QUESTION).await;
    let _ = std::fs::remove_file(&guide_path);
    render_result(&result?, json)
}

fn render_result(result: &PipelineResult, json: bool) -> Result<()> {
    let shaped = result.raw_results.as_deref().map(shape);
    if json {
        let body = serde_json::json!({ "result": result, "shaped": shaped });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }
    output::print_pipeline_result(result);
    if let Some(shaped) = &shaped {
        output::print_shaped(shaped);
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_questions_are_rejected_at_the_boundary() {
        assert!(validate_question("").is_err());
        assert!(validate_question("   \n\t").is_err());
        assert_eq!(validate_question("  list findings  ").unwrap(), "list findings");
    }

    #[test]
    fn cli_parses_all_subcommands() {
        let cli = Cli::try_parse_from(["vulngraph", "ask", "list findings", "--json"]).unwrap();
        assert!(matches!(cli.command, Commands::Ask { json: true, .. }));

        let cli = Cli::try_parse_from(["vulngraph", "check", "MATCH (n) RETURN n"]).unwrap();
        assert!(matches!(cli.command, Commands::Check { .. }));

        let cli = Cli::try_parse_from(["vulngraph", "shape", "--file", "rows.json"]).unwrap();
        assert!(matches!(cli.command, Commands::Shape { .. }));

        let cli = Cli::try_parse_from(["vulngraph", "-vv", "demo"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Demo { json: false }));
    }

    #[test]
    fn demo_guide_matches_the_shipped_document() {
        assert!(DEMO_GUIDE.contains("Finding"));
        assert!(DEMO_GUIDE.contains("AFFECTS"));
    }
}
