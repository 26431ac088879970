//! Query-executor boundary.
//!
//! One trait, two implementations: [`HttpExecutor`] talks to Neo4j over the
//! HTTP transactional API and decodes replies into tagged values exactly
//! once, at this boundary; [`StaticExecutor`] replays canned responses for
//! tests and offline demos. In-flight queries are bounded by a permit pool
//! inside the executor, acquired per call and released on every exit path.

use std::sync::Mutex;

use async_trait::async_trait;

use vulngraph_cypher::{ResultRow, ValueMap};

pub mod http;

pub use http::{HttpExecutor, Neo4jConfig};

#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("query failed [{code}]: {message}")]
    Server { code: String, message: String },
    #[error("malformed engine reply: {0}")]
    Decode(String),
    #[error("executor is shut down")]
    Closed,
}

/// Runs a read-only query and returns rows as ordered column mappings.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn run_query(
        &self,
        query: &str,
        params: &ValueMap,
    ) -> Result<Vec<ResultRow>, ExecutorError>;
}

// ============================================================================
// Static executor (tests and demos)
// ============================================================================

/// Replays a fixed sequence of responses and records every query it saw.
/// Popping past the end fails loudly.
#[derive(Default)]
pub struct StaticExecutor {
    /// Stored reversed so `pop()` yields scripted order.
    responses: Mutex<Vec<Result<Vec<ResultRow>, ExecutorError>>>,
    queries: Mutex<Vec<String>>,
}

impl StaticExecutor {
    pub fn new(responses: Vec<Result<Vec<ResultRow>, ExecutorError>>) -> Self {
        let mut responses = responses;
        responses.reverse();
        Self {
            responses: Mutex::new(responses),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// One successful response.
    pub fn with_rows(rows: Vec<ResultRow>) -> Self {
        Self::new(vec![Ok(rows)])
    }

    /// One failing response.
    pub fn with_error(error: ExecutorError) -> Self {
        Self::new(vec![Err(error)])
    }

    /// Queries seen so far, in call order.
    pub fn queries(&self) -> Vec<String> {
        self.queries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl QueryExecutor for StaticExecutor {
    async fn run_query(
        &self,
        query: &str,
        _params: &ValueMap,
    ) -> Result<Vec<ResultRow>, ExecutorError> {
        self.queries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(query.to_string());
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop()
            .unwrap_or_else(|| {
                Err(ExecutorError::Decode(
                    "static executor responses exhausted".to_string(),
                ))
            })
    }
}

// ============================================================================
// Tests
// ============================================================================
