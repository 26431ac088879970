//! Read-only classification for candidate Cypher.
//!
//! Deny-list filter over identifier tokens. The scanner skips comments and
//! string literals, so quoted text never triggers a false rejection while
//! clause keywords split by arbitrary whitespace or newlines are still
//! caught. This is a best-effort textual filter, not a parser: it blocks the
//! known mutating clauses and write-capable procedure prefixes and presumes
//! everything else safe. It must never panic, whatever the input.

/// Clause keywords that mutate the graph. `DELETE` also covers
/// `DETACH DELETE`.
const WRITE_CLAUSES: [&str; 6] = ["CREATE", "MERGE", "DELETE", "SET", "REMOVE", "DROP"];

/// Dotted-name prefixes of write-capable procedures reachable via `CALL`.
const WRITE_PROCEDURE_PREFIXES: [&str; 6] = [
    "db.ms",
    "db.write",
    "apoc.create",
    "apoc.load",
    "apoc.periodic",
    "apoc.refactor",
];

/// Classify a candidate query as read-only.
///
/// Returns `false` when any deny-listed clause keyword, the `LOAD CSV`
/// sequence, or a `CALL` of a write-capable procedure appears outside of
/// strings and comments; `true` otherwise.
pub fn is_read_only(query: &str) -> bool {
    let tokens = scan_tokens(query);
    for (i, token) in tokens.iter().enumerate() {
        let upper = token.to_ascii_uppercase();
        if WRITE_CLAUSES.contains(&upper.as_str()) {
            return false;
        }
        if upper == "LOAD"
            && tokens
                .get(i + 1)
                .is_some_and(|next| next.eq_ignore_ascii_case("CSV"))
        {
            return false;
        }
        if upper == "CALL" {
            if let Some(proc_name) = tokens.get(i + 1) {
                let lower = proc_name.to_ascii_lowercase();
                if WRITE_PROCEDURE_PREFIXES
                    .iter()
                    .any(|prefix| lower.starts_with(prefix))
                {
                    return false;
                }
            }
        }
    }
    true
}

/// Split a query into identifier-ish tokens (letters, digits, `_`, `.`),
/// skipping `//` and `/* */` comments and quoted strings. Dots are part of
/// a token so procedure names like `apoc.create.node` come out whole.
fn scan_tokens(query: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = query.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '/' if chars.peek() == Some(&'/') => {
                chars.next();
                for next in chars.by_ref() {
                    if next == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            '\'' | '"' | '`' => {
                let quote = c;
                let mut escaped = false;
                for next in chars.by_ref() {
                    if escaped {
                        escaped = false;
                    } else if next == '\\' {
                        escaped = true;
                    } else if next == quote {
                        break;
                    }
                }
            }
            c if c.is_ascii_alphanumeric() || c == '_' || c == '.' => {
                let mut token = String::new();
                token.push(c);
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' || next == '.' {
                        token.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(token);
            }
            _ => {}
        }
    }

    tokens
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_match_return_is_read_only() {
        assert!(is_read_only(
            "MATCH (f:Finding)-[r:AFFECTS]->(a:Asset) RETURN f, r, a LIMIT 25"
        ));
    }

    #[test]
    fn every_write_clause_is_rejected() {
        for query in [
            "CREATE (n:Finding {finding_id: 'F-9'})",
            "MATCH (n) DETACH DELETE n",
            "MERGE (n:Asset {url: '/x'})",
            "MATCH (n) SET n.severity = 'LOW'",
            "MATCH (n) REMOVE n.severity",
            "DROP INDEX finding_id_index",
            "delete from findings", // lowercase still caught
        ] {
            assert!(!is_read_only(query), "should reject: {query}");
        }
    }

    #[test]
    fn load_csv_is_rejected_across_whitespace() {
        assert!(!is_read_only(
            "LOAD CSV FROM 'file:///x.csv' AS row RETURN row"
        ));
        assert!(!is_read_only("LOAD\n   CSV FROM 'file:///x.csv' AS row"));
        // LOAD without CSV is not a Cypher write clause.
        assert!(is_read_only("MATCH (n {name: 'load'}) RETURN n.load"));
    }

    #[test]
    fn write_procedures_are_rejected_read_procedures_pass() {
        assert!(!is_read_only("CALL apoc.create.node(['Finding'], {})"));
        assert!(!is_read_only("CALL db.ms.queryLanguage('x')"));
        assert!(!is_read_only("CALL\n  apoc.periodic.iterate('...', '...', {})"));
        assert!(is_read_only("CALL db.labels() YIELD label RETURN label"));
        assert!(is_read_only("CALL apoc.meta.schema() YIELD value RETURN value"));
    }

    #[test]
    fn keywords_inside_strings_do_not_reject() {
        assert!(is_read_only(
            "MATCH (f:Finding) WHERE f.title = 'How to DELETE a user' RETURN f"
        ));
        assert!(is_read_only(
            "MATCH (f:Finding) WHERE f.title = \"CREATE TABLE exploit\" RETURN f"
        ));
        assert!(is_read_only("MATCH (n:`SET`) RETURN n"));
    }

    #[test]
    fn keywords_inside_comments_do_not_reject() {
        assert!(is_read_only(
            "MATCH (n) // do not DELETE anything here\nRETURN n"
        ));
        assert!(is_read_only("MATCH (n) /* CREATE is fine in prose */ RETURN n"));
    }

    #[test]
    fn identifiers_containing_keywords_pass() {
        assert!(is_read_only("MATCH (n:Settings) RETURN n.settings"));
        assert!(is_read_only("MATCH (n) RETURN n.created_at, n.dropped"));
        assert!(is_read_only("MATCH (n:Merger) RETURN n"));
    }

    #[test]
    fn empty_and_unterminated_input_is_harmless() {
        assert!(is_read_only(""));
        assert!(is_read_only("   \n\t"));
        // Unterminated string swallows the rest of the query.
        assert!(is_read_only("MATCH (n) WHERE n.x = 'oops RETURN n"));
        // But an unterminated string cannot hide a preceding write clause.
        assert!(!is_read_only("CREATE (n) WHERE n.x = 'oops"));
    }

    mod properties {
        use proptest::prelude::*;

        use super::super::{is_read_only, WRITE_CLAUSES};

        proptest! {
            // Never panics, whatever bytes come in.
            #[test]
            fn never_panics(query in "\\PC*") {
                let _ = is_read_only(&query);
            }

            // A deny keyword spliced between benign clauses is always caught.
            #[test]
            fn injected_clause_is_caught(idx in 0usize..6) {
                let keyword = WRITE_CLAUSES[idx];
                let query = format!("MATCH (n) {keyword} n RETURN n");
                prop_assert!(!is_read_only(&query));
            }
        }
    }
}
