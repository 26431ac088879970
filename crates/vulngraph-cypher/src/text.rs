//! Cleanup helpers for LLM replies.
//!
//! Models are instructed to return bare Cypher or bare JSON, and wrap the
//! payload in markdown fences anyway often enough that both callers strip
//! them before parsing.

/// Remove markdown code-fence marker lines from a reply.
///
/// A fence marker line is ``` optionally followed by a language tag
/// (```cypher, ```json). Lines carrying actual content next to backticks
/// are kept as-is.
pub fn strip_code_fences(reply: &str) -> String {
    if !reply.contains("```") {
        return reply.trim().to_string();
    }
    let kept: Vec<&str> = reply
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            let is_marker = trimmed.starts_with("```")
                && trimmed
                    .trim_start_matches('`')
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric());
            !is_marker
        })
        .collect();
    kept.join("\n").trim().to_string()
}

/// Extract and parse the first balanced JSON object in a reply.
///
/// Tolerates fence wrapping and prose before or after the object. The
/// balance scan is string-aware so braces inside JSON strings do not
/// terminate it early. Returns `None` when nothing parses.
pub fn extract_json_object(reply: &str) -> Option<serde_json::Value> {
    let cleaned = strip_code_fences(reply);
    let start = cleaned.find('{')?;
    let tail = &cleaned[start..];

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in tail.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    let candidate = &tail[..i + c.len_utf8()];
                    return serde_json::from_str(candidate).ok();
                }
            }
            _ => {}
        }
    }
    None
}

// ============================================================================
// Tests
// ============================================================================
