//! Natural-language question answering over the vulnerability graph.
//!
//! One invocation walks seven strictly ordered stages: load the schema
//! guide, extract intent, generate Cypher, repair the relationship
//! projection, validate read-only safety, execute, and narrate the rows.
//! Each stage appends exactly one [`TraceStep`], including on early exit,
//! so the caller always gets a complete audit trail.
//!
//! Failure handling is two-tier:
//! - recoverable conditions (unparseable intent, unsafe query, execution
//!   error) terminate with a polite answer inside an `Ok` result
//! - infrastructure failures (unreadable guide, unreachable completion
//!   service) propagate as errors for the caller to surface

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vulngraph_cypher::{
    ensure_relationship_projection, extract_json_object, is_read_only, strip_code_fences,
    ResultRow, ValueMap,
};
use vulngraph_executor::QueryExecutor;
use vulngraph_llm::{ChatMessage, CompletionClient, CompletionRequest};

mod prompts;

pub const GUIDE_PATH_ENV: &str = "VULNGRAPH_GUIDE_PATH";
pub const QUERY_MODEL_ENV: &str = "VULNGRAPH_QUERY_MODEL";
pub const ANSWER_MODEL_ENV: &str = "VULNGRAPH_ANSWER_MODEL";
pub const PREVIEW_ROWS_ENV: &str = "VULNGRAPH_PREVIEW_ROWS";

pub const DEFAULT_GUIDE_PATH: &str = "DB_SCHEMA_AND_QUERY_GUIDE.md";
pub const DEFAULT_QUERY_MODEL: &str = "gpt-4.1";
pub const DEFAULT_ANSWER_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

const UNPARSEABLE_INTENT_ANSWER: &str = "Sorry, I could not understand your question.";
const UNSAFE_QUERY_ANSWER: &str = "Sorry, the generated query was not safe to run.";
const EXECUTION_ERROR_ANSWER: &str = "Sorry, there was an error running the query.";

// ============================================================================
// Trace and result types
// ============================================================================

/// One audit entry: the stage name plus what happened there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStep {
    pub step: String,
    pub details: String,
}

impl TraceStep {
    fn new(step: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            details: details.into(),
        }
    }
}

/// Ordered audit trail for one invocation; append-only while the run is in
/// flight, read-only once returned.
pub type PipelineTrace = Vec<TraceStep>;

/// Externally visible outcome of one pipeline run.
///
/// `query` is `None` only when synthesis failed before a query was
/// produced; `raw_results` is `None` on every terminal failure path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub answer: String,
    pub reasoning: PipelineTrace,
    pub query: Option<String>,
    pub raw_results: Option<Vec<ResultRow>>,
}

fn terminal(answer: &str, reasoning: PipelineTrace, query: Option<String>) -> PipelineResult {
    PipelineResult {
        answer: answer.to_string(),
        reasoning,
        query,
        raw_results: None,
    }
}

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Schema guide document, re-read on every invocation.
    pub guide_path: PathBuf,
    /// Model for intent extraction and Cypher generation.
    pub query_model: String,
    /// Model for answer narration.
    pub answer_model: String,
    /// Row cap for the result preview handed to the narration call.
    pub preview_rows: usize,
    pub query_temperature: f32,
    pub answer_temperature: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            guide_path: PathBuf::from(DEFAULT_GUIDE_PATH),
            query_model: DEFAULT_QUERY_MODEL.to_string(),
            answer_model: DEFAULT_ANSWER_MODEL.to_string(),
            preview_rows: DEFAULT_PREVIEW_ROWS,
            query_temperature: 0.0,
            answer_temperature: 0.2,
        }
    }
}

impl PipelineConfig {
    /// Reads overrides from `VULNGRAPH_*` env vars, falling back to the
    /// defaults above. Blank values count as unset.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(path) = env_string(GUIDE_PATH_ENV)? {
            config.guide_path = PathBuf::from(path);
        }
        if let Some(model) = env_string(QUERY_MODEL_ENV)? {
            config.query_model = model;
        }
        if let Some(model) = env_string(ANSWER_MODEL_ENV)? {
            config.answer_model = model;
        }
        config.preview_rows = env_usize(PREVIEW_ROWS_ENV, DEFAULT_PREVIEW_ROWS, 1, 50)?;
        Ok(config)
    }
}

fn env_string(name: &str) -> Result<Option<String>> {
    match std::env::var(name) {
        Ok(v) => {
            let v = v.trim();
            if v.is_empty() {
                Ok(None)
            } else {
                Ok(Some(v.to_string()))
            }
        }
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(anyhow!("invalid {name}: {e}")),
    }
}

fn env_usize(name: &str, default: usize, min: usize, max: usize) -> Result<usize> {
    match std::env::var(name) {
        Ok(v) => {
            let v = v.trim();
            if v.is_empty() {
                return Ok(default);
            }
            let parsed = v
                .parse::<usize>()
                .map_err(|_| anyhow!("invalid {name}={v:?} (expected integer)"))?;
            Ok(parsed.clamp(min, max))
        }
        Err(std::env::VarError::NotPresent) => Ok(default),
        Err(e) => Err(anyhow!("invalid {name}: {e}")),
    }
}

// ============================================================================
// Pipeline
// ============================================================================

pub struct Pipeline {
    llm: Arc<dyn CompletionClient>,
    executor: Arc<dyn QueryExecutor>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        llm: Arc<dyn CompletionClient>,
        executor: Arc<dyn QueryExecutor>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            llm,
            executor,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs the seven stages for one question.
    pub async fn run(&self, question: &str) -> Result<PipelineResult> {
        let invocation = Uuid::new_v4();
        let mut reasoning = PipelineTrace::new();

        // 1. Schema guide, fresh per invocation.
        let schema_guide = std::fs::read_to_string(&self.config.guide_path).with_context(|| {
            format!(
                "reading schema guide {} (set {GUIDE_PATH_ENV} to relocate it)",
                self.config.guide_path.display()
            )
        })?;
        reasoning.push(TraceStep::new(
            "Load Schema Guide",
            "Loaded DB schema and query guide for LLM context.",
        ));

        // 2. Intent classification and entity extraction.
        let intent_reply = self
            .complete(
                &self.config.query_model,
                self.config.query_temperature,
                prompts::INTENT_SYSTEM_PROMPT,
                question,
            )
            .await?;
        let Some(intent) = parse_intent(&intent_reply) else {
            reasoning.push(TraceStep::new(
                "Intent Extraction",
                format!("Failed to parse LLM response: {intent_reply}"),
            ));
            tracing::warn!(invocation = %invocation, "intent extraction returned unparseable JSON");
            return Ok(terminal(UNPARSEABLE_INTENT_ANSWER, reasoning, None));
        };
        reasoning.push(TraceStep::new(
            "Intent Extraction",
            format!("Intent: {}, Entities: {}", intent.intent, intent.entities),
        ));

        // 3. Cypher generation against the schema guide.
        let generation_system = prompts::render_generation_system_prompt(&schema_guide);
        let generation_user = prompts::render_generation_user_prompt(
            question,
            &intent.intent,
            &intent.entities.to_string(),
        );
        let raw_query = self
            .complete(
                &self.config.query_model,
                self.config.query_temperature,
                &generation_system,
                &generation_user,
            )
            .await?;
        let query = strip_code_fences(&raw_query);
        reasoning.push(TraceStep::new(
            "Cypher Generation",
            format!("Generated Cypher:\n{query}"),
        ));

        // 4. Best-effort projection repair. A miss keeps the query as-is.
        let query = match ensure_relationship_projection(&query) {
            Some(repaired) => {
                reasoning.push(TraceStep::new(
                    "Cypher Repair",
                    format!("Rewrote query to project the relationship:\n{repaired}"),
                ));
                repaired
            }
            None => {
                reasoning.push(TraceStep::new("Cypher Repair", "No rewrite needed."));
                query
            }
        };

        // 5. Read-only safety validation.
        if !is_read_only(&query) {
            reasoning.push(TraceStep::new(
                "Cypher Validation",
                "Rejected unsafe Cypher (mutation detected).",
            ));
            tracing::warn!(invocation = %invocation, query = %query, "rejected unsafe query");
            return Ok(terminal(UNSAFE_QUERY_ANSWER, reasoning, Some(query)));
        }
        reasoning.push(TraceStep::new(
            "Cypher Validation",
            "Cypher query validated as read-only.",
        ));

        // 6. Execution. Engine errors land in the trace, not in `Err`.
        let rows = match self.executor.run_query(&query, &ValueMap::new()).await {
            Ok(rows) => {
                reasoning.push(TraceStep::new(
                    "Query Execution",
                    format!("Query executed. Rows returned: {}", rows.len()),
                ));
                rows
            }
            Err(e) => {
                reasoning.push(TraceStep::new(
                    "Query Execution",
                    format!("Cypher execution error: {e}"),
                ));
                tracing::warn!(invocation = %invocation, error = %e, "query execution failed");
                return Ok(terminal(EXECUTION_ERROR_ANSWER, reasoning, Some(query)));
            }
        };

        // 7. Narration over a bounded preview of the rows.
        let preview = preview_json(&rows, self.config.preview_rows.clamp(1, 50));
        let answer_user = prompts::render_answer_user_prompt(question, &query, &preview);
        let answer = self
            .complete(
                &self.config.answer_model,
                self.config.answer_temperature,
                prompts::ANSWER_SYSTEM_PROMPT,
                &answer_user,
            )
            .await?;
        reasoning.push(TraceStep::new(
            "Answer Generation",
            "LLM generated the final answer and summary.",
        ));

        tracing::debug!(invocation = %invocation, rows = rows.len(), "pipeline completed");
        Ok(PipelineResult {
            answer: answer.trim().to_string(),
            reasoning,
            query: Some(query),
            raw_results: Some(rows),
        })
    }

    async fn complete(
        &self,
        model: &str,
        temperature: f32,
        system: &str,
        user: &str,
    ) -> Result<String> {
        let request = CompletionRequest {
            model: model.to_string(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature,
        };
        let response = self
            .llm
            .complete(request)
            .await
            .with_context(|| format!("completion call to model {model} failed"))?;
        Ok(response.content)
    }
}

// ============================================================================
// Stage helpers
// ============================================================================

struct ExtractedIntent {
    intent: String,
    entities: serde_json::Value,
}

/// Parses `{"intent": ..., "entities": ...}` out of an LLM reply. Fences and
/// surrounding prose are tolerated; a missing `entities` key defaults to an
/// empty object; a blank or missing `intent` fails the parse.
fn parse_intent(reply: &str) -> Option<ExtractedIntent> {
    let object = extract_json_object(reply)?;
    let intent = object.get("intent")?.as_str()?.trim().to_string();
    if intent.is_empty() {
        return None;
    }
    let entities = object
        .get("entities")
        .cloned()
        .unwrap_or_else(|| serde_json::json!({}));
    Some(ExtractedIntent { intent, entities })
}

/// Pretty JSON of the first `cap` rows, in the tagged wire form.
fn preview_json(rows: &[ResultRow], cap: usize) -> String {
    let take = rows.len().min(cap);
    serde_json::to_string_pretty(&rows[..take]).unwrap_or_else(|_| "[]".to_string())
}

// ============================================================================
// Tests
// ============================================================================
