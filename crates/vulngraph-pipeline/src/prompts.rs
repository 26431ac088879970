//! Prompt text for the three completion calls.
//!
//! System prompts are fixed constants; the `render_*` functions splice the
//! per-call context (schema guide, question, intent, result preview) into
//! user prompts. Keeping them here, away from the stage logic, makes prompt
//! tweaks reviewable without touching control flow.

pub(crate) const INTENT_SYSTEM_PROMPT: &str = r#"You are a security knowledge graph assistant. Given a user question, classify the intent (e.g., list, aggregate, trace, map, etc.) and extract relevant entities (service, severity, vulnerability type, etc.).

Respond with strict JSON of shape { "intent": string, "entities": object } and nothing else: no prose, no markdown fences."#;

pub(crate) const ANSWER_SYSTEM_PROMPT: &str = r#"You are a security analyst assistant. Given the user's question, the Cypher query, and a preview of the query results, write a clear, concise answer for a security engineer. Highlight any important findings. If the results are empty, explain why that might be.

Format the answer as markdown with this structure:
1. The direct answer to the question, first.
2. A section headed ## Reasoning referencing the relationships and paths the query used.
3. A section headed ## Cypher Query containing the exact query in a ```cypher code fence."#;

pub(crate) fn render_generation_system_prompt(schema_guide: &str) -> String {
    format!(
        r#"You are an expert Cypher query generator for a Neo4j vulnerability knowledge graph. Use ONLY the node labels, relationship types, and query patterns in the schema guide below. Generate a single read-only Cypher query that answers the user's question. Only output the Cypher code, nothing else.

Rules:
- When the question concerns relationships, paths, or chains, ALWAYS bind relationship variables and project them in RETURN alongside the endpoint nodes, e.g. MATCH (f:Finding)-[r:AFFECTS]->(a:Asset) RETURN f, r, a.
- For multi-hop "chain" questions, use variable-length path syntax such as -[:EXPLOIT_CHAIN*1..4]-> and return the whole path.
- For broad questions, aggregate by severity or type with count(...) and cap the output with LIMIT 25.

SCHEMA GUIDE:
{schema_guide}"#
    )
}

pub(crate) fn render_generation_user_prompt(
    question: &str,
    intent: &str,
    entities_json: &str,
) -> String {
    format!("User question: {question}\nIntent: {intent}\nEntities: {entities_json}")
}

pub(crate) fn render_answer_user_prompt(question: &str, query: &str, preview: &str) -> String {
    format!("User question: {question}\nCypher: {query}\nResults (preview):\n{preview}")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_prompt_embeds_the_guide() {
        let prompt = render_generation_system_prompt("NODE LABELS: Finding, Asset");
        assert!(prompt.contains("NODE LABELS: Finding, Asset"));
        assert!(prompt.contains("LIMIT 25"));
        assert!(prompt.contains("variable-length path syntax"));
    }

    #[test]
    fn user_prompts_carry_all_fields() {
        let generation = render_generation_user_prompt("what affects auth?", "trace", r#"{"service":"auth"}"#);
        assert!(generation.contains("what affects auth?"));
        assert!(generation.contains("Intent: trace"));
        assert!(generation.contains(r#"{"service":"auth"}"#));

        let answer = render_answer_user_prompt("q", "MATCH (n) RETURN n", "[]");
        assert!(answer.contains("Cypher: MATCH (n) RETURN n"));
        assert!(answer.ends_with("Results (preview):\n[]"));
    }
}
