//! Cypher-side building blocks shared across the workspace:
//!
//! - a tagged value model for query results, decoded once at the executor
//!   boundary so downstream code matches on variants instead of duck-typing
//! - canonical element-id normalization (plain numbers, decimal strings, and
//!   split `{low, high}` pairs all compare equal)
//! - the read-only safety filter for candidate queries
//! - the best-effort relationship-projection repair
//! - markdown/JSON cleanup helpers for LLM replies

pub mod repair;
pub mod safety;
pub mod text;
pub mod value;

pub use repair::ensure_relationship_projection;
pub use safety::is_read_only;
pub use text::{extract_json_object, strip_code_fences};
pub use value::{
    canonical_element_id, CypherValue, NodeValue, PathSegment, PathValue, RelValue, ResultRow,
    ValueMap,
};
