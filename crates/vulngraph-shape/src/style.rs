//! Presentation-derived node attributes.
//!
//! Colors and sizes are severity- and label-keyed lookups attached by the
//! shaper as non-authoritative hints for the rendering layer. Nothing here
//! feeds back into identity or classification.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    /// Exact known names only, case-insensitive. Unknown strings are the
    /// caller's problem (findings fall back to `Info` for styling while the
    /// raw string stays in the properties).
    pub fn parse(raw: &str) -> Option<Severity> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "CRITICAL" => Some(Severity::Critical),
            "HIGH" => Some(Severity::High),
            "MEDIUM" => Some(Severity::Medium),
            "LOW" => Some(Severity::Low),
            "INFO" => Some(Severity::Info),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
            Severity::Info => "INFO",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Severity::Critical => "#ff4444",
            Severity::High => "#ff8800",
            Severity::Medium => "#ffcc00",
            Severity::Low => "#88cc00",
            Severity::Info => "#00ccff",
        }
    }

    pub fn size(&self) -> u32 {
        match self {
            Severity::Critical => 30,
            Severity::High => 25,
            Severity::Medium => 20,
            Severity::Low => 16,
            Severity::Info => 12,
        }
    }
}

/// Color for non-finding node types.
pub fn label_color(label: &str) -> &'static str {
    match label {
        "Asset" => "#4488ff",
        "Service" => "#8844ff",
        "Scanner" => "#44cccc",
        "OwaspCategory" => "#cc44cc",
        "CweCategory" => "#cc8844",
        _ => "#888888",
    }
}

pub fn label_size(label: &str) -> u32 {
    match label {
        "Asset" => 18,
        "Service" => 22,
        "Scanner" => 16,
        "OwaspCategory" | "CweCategory" => 14,
        _ => 12,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Severity::parse("critical"), Some(Severity::Critical));
        assert_eq!(Severity::parse(" HIGH "), Some(Severity::High));
        assert_eq!(Severity::parse("weird"), None);
        assert_eq!(Severity::parse(""), None);
    }

    #[test]
    fn serializes_uppercase() {
        assert_eq!(
            serde_json::to_value(Severity::Critical).unwrap(),
            "CRITICAL"
        );
        let back: Severity = serde_json::from_str("\"LOW\"").unwrap();
        assert_eq!(back, Severity::Low);
    }

    #[test]
    fn severities_style_distinctly() {
        let all = [
            Severity::Critical,
            Severity::High,
            Severity::Medium,
            Severity::Low,
            Severity::Info,
        ];
        let mut colors: Vec<&str> = all.iter().map(Severity::color).collect();
        colors.dedup();
        assert_eq!(colors.len(), all.len());
        assert!(all.windows(2).all(|w| w[0].size() > w[1].size()));
    }

    #[test]
    fn unknown_labels_get_the_default_style() {
        assert_eq!(label_color("Mystery"), "#888888");
        assert_eq!(label_size("Mystery"), 12);
    }
}
