//! Best-effort relationship-projection repair.
//!
//! Generated queries about relationships sometimes match a pattern like
//! `(f:Finding)-[:AFFECTS]->(a:Asset)` and then return only the endpoint
//! nodes, which leaves the graph view without edges. When the query is a
//! single plain `MATCH .. RETURN ..` over exactly that direct two-node
//! shape, we bind the relationship to `r` and project it first.
//!
//! This is a textual rewrite with deliberately narrow guards: any second
//! pattern, `WITH` stage, variable-length hop, bound relationship, taken
//! `r` name, or `DISTINCT`/`*` projection makes it a no-op. The generation
//! prompt carries the real contract ("project relationship variables");
//! this pass only recovers the most common miss.

use regex::Regex;

/// Direct two-node pattern with an unbound relationship. Property maps and
/// variable-length hops are intentionally not matched.
const DIRECT_PATTERN: &str =
    r"\(\s*\w+\s*(?::\s*\w+)?\s*\)\s*-\s*\[\s*:\s*\w+\s*\]\s*->\s*\(\s*\w+\s*(?::\s*\w+)?\s*\)";

/// Rewrite `query` so the matched relationship is bound and projected, or
/// return `None` when the heuristic does not apply.
pub fn ensure_relationship_projection(query: &str) -> Option<String> {
    let upper = query.to_ascii_uppercase();
    // One plain MATCH .. RETURN; anything staged or multi-pattern is left
    // alone.
    if upper.matches("MATCH").count() != 1 || upper.contains("WITH") {
        return None;
    }
    // Exactly one relationship bracket in the whole query.
    if query.matches('[').count() != 1 {
        return None;
    }

    let return_kw = Regex::new(r"(?i)\breturn\b").ok()?.find(query)?;
    let pattern = Regex::new(DIRECT_PATTERN).ok()?;
    let matched = pattern.find(query)?;
    if matched.end() > return_kw.start() {
        return None;
    }

    // `r` must be free for binding.
    if Regex::new(r"(?i)\br\b").ok()?.is_match(query) {
        return None;
    }
    let after_return = query[return_kw.end()..].trim_start().to_ascii_uppercase();
    if after_return.starts_with("DISTINCT") || after_return.starts_with('*') {
        return None;
    }

    let open = query.find('[')?;
    let mut rewritten = query.to_string();
    rewritten.insert(open + 1, 'r');
    // The bind insert sits before RETURN, so the keyword shifted by one.
    rewritten.insert_str(return_kw.end() + 1, " r,");
    Some(rewritten)
}

// ============================================================================
// Tests
// ============================================================================
