//! JSON output formatting.

use anyhow::{Context, Result};
use queryflow_core::BatchResult;
use serde::Serialize;

/// Format batch results as JSON.
///
/// A single input prints its batch object; several inputs print an array of batches in
/// input order. If `compact` is true, outputs minified JSON without whitespace.
pub fn format_json(results: &[BatchResult], compact: bool) -> Result<String> {
    match results {
        [single] => to_json(single, compact),
        many => to_json(many, compact),
    }
}

/// Serialize any value the same way results are printed.
pub fn to_json<T: Serialize + ?Sized>(value: &T, compact: bool) -> Result<String> {
    let text = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    };
    text.context("Failed to serialize output")
}

#[cfg(test)]
mod tests {
    use super::*;
    use queryflow_core::{analyze, AnalyzeRequest, Dialect};

    fn batch(sql: &str) -> BatchResult {
        analyze(&AnalyzeRequest::new(sql, Dialect::Generic))
    }

    #[test]
    fn test_json_pretty() {
        let json = format_json(&[batch("SELECT * FROM users")], false).unwrap();
        assert!(json.contains('\n'));
        assert!(json.contains("\"summary\""));
        assert!(json.contains("\"columnFlows\""));
    }

    #[test]
    fn test_json_compact() {
        let json = format_json(&[batch("SELECT * FROM users")], true).unwrap();
        assert!(!json.contains('\n'));
        assert!(json.starts_with('{'));
    }

    #[test]
    fn test_several_batches_print_an_array() {
        let json = format_json(&[batch("SELECT 1"), batch("SELECT 2")], true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(2));
    }
}
