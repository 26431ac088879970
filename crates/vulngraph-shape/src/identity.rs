//! Entity-identity and display-name resolution.
//!
//! Both are pure functions of a node's own labels and properties, so the
//! same node resolves identically wherever it appears in a batch. Domain
//! identifiers win over the engine's internal element id; the element id is
//! only the last resort (and is recorded separately by the shaper so
//! relationship endpoints can still be mapped back).

use vulngraph_cypher::{CypherValue, NodeValue, ValueMap};

/// Domain properties that carry identity, in preference order.
const ID_PROPERTIES: [&str; 4] = ["finding_id", "name", "owasp_id", "cwe_id"];

/// A property value usable as an identifier or display string.
pub fn property_string(properties: &ValueMap, key: &str) -> Option<String> {
    match properties.get(key)? {
        CypherValue::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                Some(s.to_string())
            }
        }
        CypherValue::Int(i) => Some(i.to_string()),
        CypherValue::Float(f) => Some(f.to_string()),
        _ => None,
    }
}

/// Stable id for a node within one shaping run.
pub fn resolve_entity_id(node: &NodeValue) -> String {
    for key in ID_PROPERTIES {
        if let Some(id) = property_string(&node.properties, key) {
            return id;
        }
    }
    node.element_id.clone()
}

/// Label-dependent display name; falls back to "label + id".
pub fn display_name(node: &NodeValue, resolved_id: &str) -> String {
    let get = |key: &str| property_string(&node.properties, key);
    let has = |label: &str| node.labels.iter().any(|l| l == label);

    let preferred = if has("Finding") {
        get("title").or_else(|| get("finding_id"))
    } else if has("Asset") {
        get("url")
            .or_else(|| get("path"))
            .or_else(|| get("image"))
            .or_else(|| get("type"))
    } else if has("Service") || has("Scanner") {
        get("name")
    } else if has("OwaspCategory") {
        get("name").or_else(|| get("owasp_id"))
    } else if has("CweCategory") {
        get("name").or_else(|| get("cwe_id"))
    } else {
        None
    };

    preferred.unwrap_or_else(|| {
        let label = node.labels.first().map(String::as_str).unwrap_or("Node");
        format!("{label} {resolved_id}").trim().to_string()
    })
}

// ============================================================================
// Tests
// ============================================================================
