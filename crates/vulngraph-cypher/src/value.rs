//! Typed result values.
//!
//! The graph engine hands back loosely-typed JSON; the executor decodes it
//! into `CypherValue` exactly once, at the wire boundary. Everything after
//! that point (shaping, previews, CLI output) matches on an explicit variant
//! tag and never re-derives shape from field presence.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ============================================================================
// Ordered maps
// ============================================================================

/// Ordered key/value mapping used for result-row columns and graph
/// properties.
///
/// Backed by a `Vec` so the column order declared by the query (and the
/// property order returned by the server) survives serde round-trips.
/// Lookup is linear; these maps hold a handful of entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueMap(Vec<(String, CypherValue)>);

impl ValueMap {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, CypherValue)>,
        K: Into<String>,
    {
        let mut map = Self::new();
        for (key, value) in entries {
            map.insert(key.into(), value);
        }
        map
    }

    /// Insert, replacing in place when the key already exists so the
    /// original position is kept.
    pub fn insert(&mut self, key: impl Into<String>, value: CypherValue) {
        let key = key.into();
        if let Some(slot) = self.0.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.0.push((key, value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&CypherValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CypherValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<(String, CypherValue)>> for ValueMap {
    fn from(entries: Vec<(String, CypherValue)>) -> Self {
        Self::from_entries(entries)
    }
}

impl<K: Into<String>> FromIterator<(K, CypherValue)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (K, CypherValue)>>(iter: I) -> Self {
        Self::from_entries(iter)
    }
}

impl IntoIterator for ValueMap {
    type Item = (String, CypherValue);
    type IntoIter = std::vec::IntoIter<(String, CypherValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Serialize for ValueMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ValueMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = ValueMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of column names to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ValueMap, A::Error> {
                let mut map = ValueMap(Vec::with_capacity(access.size_hint().unwrap_or(0)));
                while let Some((key, value)) = access.next_entry::<String, CypherValue>()? {
                    map.insert(key, value);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

/// One query result row: ordered mapping from result-column name to value.
pub type ResultRow = ValueMap;

// ============================================================================
// The value union
// ============================================================================

/// A node as returned by the graph engine. `element_id` is already in
/// canonical form (see [`canonical_element_id`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeValue {
    pub element_id: String,
    pub labels: Vec<String>,
    pub properties: ValueMap,
}

/// A relationship; `start_id` / `end_id` reference node `element_id`s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelValue {
    pub element_id: String,
    pub rel_type: String,
    pub start_id: String,
    pub end_id: String,
    pub properties: ValueMap,
}

/// An ordered traversal; each segment contributes its endpoints and the
/// relationship between them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathValue {
    pub segments: Vec<PathSegment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSegment {
    pub start: NodeValue,
    pub relationship: RelValue,
    pub end: NodeValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CypherValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<CypherValue>),
    /// A generic object that is not node-, relationship-, or path-shaped.
    Map(ValueMap),
    Node(NodeValue),
    Relationship(RelValue),
    Path(PathValue),
}

impl CypherValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CypherValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CypherValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for CypherValue {
    fn from(s: &str) -> Self {
        CypherValue::String(s.to_string())
    }
}

impl From<String> for CypherValue {
    fn from(s: String) -> Self {
        CypherValue::String(s)
    }
}

impl From<i64> for CypherValue {
    fn from(i: i64) -> Self {
        CypherValue::Int(i)
    }
}

impl From<f64> for CypherValue {
    fn from(f: f64) -> Self {
        CypherValue::Float(f)
    }
}

impl From<bool> for CypherValue {
    fn from(b: bool) -> Self {
        CypherValue::Bool(b)
    }
}

// ============================================================================
// Element-id canonicalization
// ============================================================================

/// Canonical string form of a graph-internal element id.
///
/// The HTTP API reports ids as integers or decimal strings; Bolt-derived
/// payloads split 64-bit ids into signed 32-bit `{low, high}` halves. All
/// three spellings of the same id must compare equal after
/// canonicalization, since relationship endpoints are matched against node
/// ids by string equality.
pub fn canonical_element_id(raw: &serde_json::Value) -> Option<String> {
    match raw {
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else {
                n.as_u64().map(|u| u.to_string())
            }
        }
        serde_json::Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                Some(s.to_string())
            }
        }
        serde_json::Value::Object(obj) => {
            let low = obj.get("low").and_then(serde_json::Value::as_i64)?;
            let high = obj.get("high").and_then(serde_json::Value::as_i64)?;
            // low carries the unsigned lower 32 bits.
            let id = (high as i128) * (1_i128 << 32) + (low as u32 as i128);
            Some(id.to_string())
        }
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn value_map_preserves_insertion_order() {
        let map = ValueMap::from_entries([
            ("zulu", CypherValue::from(1)),
            ("alpha", CypherValue::from(2)),
            ("mike", CypherValue::from(3)),
        ]);
        let keys: Vec<&str> = map.keys().collect();
        assert_eq!(keys, vec!["zulu", "alpha", "mike"]);
    }

    #[test]
    fn value_map_insert_replaces_in_place() {
        let mut map = ValueMap::new();
        map.insert("a", CypherValue::from(1));
        map.insert("b", CypherValue::from(2));
        map.insert("a", CypherValue::from(9));
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("a"), Some(&CypherValue::Int(9)));
        let keys: Vec<&str> = map.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn value_map_survives_serde_round_trip_in_order() {
        let map = ValueMap::from_entries([
            ("second", CypherValue::from("two")),
            ("first", CypherValue::from("one")),
        ]);
        let encoded = serde_json::to_string(&map).unwrap();
        let decoded: ValueMap = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, map);
        let keys: Vec<&str> = decoded.keys().collect();
        assert_eq!(keys, vec!["second", "first"]);
    }

    #[test]
    fn node_value_round_trips_through_tagged_form() {
        let node = CypherValue::Node(NodeValue {
            element_id: "42".to_string(),
            labels: vec!["Finding".to_string()],
            properties: ValueMap::from_entries([("finding_id", CypherValue::from("F-001"))]),
        });
        let encoded = serde_json::to_value(&node).unwrap();
        assert_eq!(encoded["kind"], "node");
        assert_eq!(encoded["value"]["element_id"], "42");
        let decoded: CypherValue = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, node);
    }

    #[test]
    fn canonical_id_accepts_numbers_and_strings() {
        assert_eq!(canonical_element_id(&json!(17)).as_deref(), Some("17"));
        assert_eq!(canonical_element_id(&json!("17")).as_deref(), Some("17"));
        assert_eq!(canonical_element_id(&json!("  17 ")).as_deref(), Some("17"));
        assert_eq!(canonical_element_id(&json!("")), None);
        assert_eq!(canonical_element_id(&json!(null)), None);
    }

    #[test]
    fn canonical_id_combines_low_high_pairs() {
        assert_eq!(
            canonical_element_id(&json!({"low": 17, "high": 0})).as_deref(),
            Some("17")
        );
        // 3 * 2^32 + 5
        assert_eq!(
            canonical_element_id(&json!({"low": 5, "high": 3})).as_deref(),
            Some("12884901893")
        );
        // Negative low is the unsigned bit pattern of the lower half.
        assert_eq!(
            canonical_element_id(&json!({"low": -1, "high": 0})).as_deref(),
            Some("4294967295")
        );
        assert_eq!(canonical_element_id(&json!({"low": 1})), None);
    }

    #[test]
    fn all_spellings_of_one_id_agree() {
        let as_number = canonical_element_id(&json!(4294967296_i64));
        let as_pair = canonical_element_id(&json!({"low": 0, "high": 1}));
        let as_string = canonical_element_id(&json!("4294967296"));
        assert_eq!(as_number, as_pair);
        assert_eq!(as_pair, as_string);
    }
}
