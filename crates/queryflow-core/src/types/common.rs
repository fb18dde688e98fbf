//! Common types shared between request and response.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How much attention a hint or node warning deserves.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Broad kind of an optimization hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum HintKind {
    Error,
    Warning,
    Info,
}

/// Area an optimization hint belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum HintCategory {
    Performance,
    Quality,
    BestPractice,
    Complexity,
    Other,
}

/// A suggestion produced by the complexity and hints engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationHint {
    /// Hint kind
    #[serde(rename = "type")]
    pub kind: HintKind,

    /// Hint category
    pub category: HintCategory,

    /// Hint severity
    pub severity: Severity,

    /// Human-readable description of the finding
    pub message: String,

    /// Optional remediation advice
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,

    /// Optional: the node this hint is about
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
}

impl OptimizationHint {
    pub fn error(category: HintCategory, severity: Severity, message: impl Into<String>) -> Self {
        Self::new(HintKind::Error, category, severity, message)
    }

    pub fn warning(category: HintCategory, severity: Severity, message: impl Into<String>) -> Self {
        Self::new(HintKind::Warning, category, severity, message)
    }

    pub fn info(category: HintCategory, severity: Severity, message: impl Into<String>) -> Self {
        Self::new(HintKind::Info, category, severity, message)
    }

    fn new(
        kind: HintKind,
        category: HintCategory,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            category,
            severity,
            message: message.into(),
            suggestion: None,
            node_id: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_node(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }
}

/// Best-effort source lines: first line and, when known, last line (1-indexed, inclusive).
pub type LineRange = (u32, Option<u32>);

/// A value that was either read directly from the AST or inferred heuristically.
///
/// Heuristic attributions are non-authoritative; consumers that need certainty should
/// check [`Attribution::is_guessed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "confidence", content = "value", rename_all = "lowercase")]
pub enum Attribution<T> {
    Resolved(T),
    Guessed(T),
}

impl<T> Attribution<T> {
    pub fn value(&self) -> &T {
        match self {
            Self::Resolved(value) | Self::Guessed(value) => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Self::Resolved(value) | Self::Guessed(value) => value,
        }
    }

    pub fn is_guessed(&self) -> bool {
        matches!(self, Self::Guessed(_))
    }
}

/// Summary statistics for a batch.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Total number of statements analyzed
    pub statement_count: usize,

    /// Number of statements whose result carries an error
    pub error_count: usize,

    /// Distinct physical tables referenced across all statements (case-insensitive)
    pub table_count: usize,

    /// Highest complexity score of any statement in the batch
    pub max_complexity_score: u32,

    /// Quick check: true if any statement failed
    pub has_errors: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hint_builder() {
        let hint = OptimizationHint::warning(HintCategory::Quality, Severity::Medium, "msg")
            .with_suggestion("fix it")
            .with_node("select_3");
        assert_eq!(hint.kind, HintKind::Warning);
        assert_eq!(hint.suggestion.as_deref(), Some("fix it"));
        assert_eq!(hint.node_id.as_deref(), Some("select_3"));
    }

    #[test]
    fn test_hint_serializes_kind_as_type() {
        let hint = OptimizationHint::info(HintCategory::BestPractice, Severity::Low, "add a limit");
        let json = serde_json::to_value(&hint).unwrap();
        assert_eq!(json["type"], "info");
        assert_eq!(json["category"], "bestPractice");
        assert!(json.get("suggestion").is_none());
    }

    #[test]
    fn test_attribution_serialization() {
        let guessed = Attribution::Guessed("rank".to_string());
        let json = serde_json::to_value(&guessed).unwrap();
        assert_eq!(json["confidence"], "guessed");
        assert_eq!(json["value"], "rank");
        assert!(guessed.is_guessed());
        assert_eq!(guessed.into_value(), "rank");
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }
}
