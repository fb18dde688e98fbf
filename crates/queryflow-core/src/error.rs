//! Error types for SQL parsing and compilation.
//!
//! # Error Handling Strategy
//!
//! Three kinds of failure exist and each is handled at a different level:
//!
//! - [`ParseError`]: the external grammar rejected the statement. Returned as
//!   `Result<T, ParseError>` from the parser module and surfaced as the `error` of the
//!   affected statement's result, optionally with a dialect-mismatch suggestion.
//!
//! - [`CompileError`]: the statement parsed but could not be compiled, currently only when
//!   nesting exceeds the configured depth ceiling. Also surfaced as the result's `error`.
//!
//! - Shape mismatches while reading the AST never become errors. Extractors fall back to
//!   placeholder values (`"expr"`, `"table"`, `"?"`, empty lists) and processing continues.
//!
//! Callers therefore always receive a well-formed result object.

use crate::types::Dialect;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
#[cfg(feature = "tracing")]
use tracing::trace;

/// Error encountered during SQL parsing.
///
/// This error preserves structured information from the underlying parser
/// including position information when available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Human-readable error message.
    pub message: String,
    /// Where the error occurred, if available.
    pub position: Option<Position>,
    /// The SQL dialect being parsed when the error occurred.
    pub dialect: Option<Dialect>,
    /// The specific category of parse error.
    pub kind: ParseErrorKind,
    /// A dialect whose syntax the failing SQL appears to use.
    pub suggestion: Option<Dialect>,
}

/// Position information for a parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
}

/// Category of parse error for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseErrorKind {
    /// Unexpected token or character in input.
    #[default]
    SyntaxError,
    /// Missing required clause or keyword.
    MissingClause,
    /// Invalid or unexpected end of input.
    UnexpectedEof,
    /// Feature not supported by the current dialect.
    UnsupportedFeature,
    /// Lexer/tokenization error.
    LexerError,
}

impl ParseError {
    /// Creates a new parse error with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position: None,
            dialect: None,
            kind: ParseErrorKind::SyntaxError,
            suggestion: None,
        }
    }

    /// Creates a parse error with position information.
    pub fn with_position(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            position: Some(Position { line, column }),
            ..Self::new(message)
        }
    }

    /// Adds dialect context to the error.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Sets the error kind.
    pub fn with_kind(mut self, kind: ParseErrorKind) -> Self {
        self.kind = kind;
        self
    }

    /// Records a dialect the SQL seems to be written in.
    pub fn with_suggestion(mut self, suggestion: Option<Dialect>) -> Self {
        self.suggestion = suggestion;
        self
    }

    /// Shifts the reported line so it is relative to an enclosing batch
    /// whose statement started at `start_line` (1-indexed).
    pub fn offset_lines(mut self, start_line: usize) -> Self {
        if let Some(pos) = self.position.as_mut() {
            pos.line += start_line.saturating_sub(1);
        }
        self
    }

    /// Parses position from sqlparser error message format.
    ///
    /// sqlparser uses format like "Expected ..., found ... at Line: X, Column: Y".
    /// Gracefully returns `None` when the expected format is not found.
    fn parse_position_from_message(message: &str) -> Option<Position> {
        static POSITION_REGEX: OnceLock<Regex> = OnceLock::new();
        let re = POSITION_REGEX.get_or_init(|| {
            Regex::new(r"Line:\s*(\d+)\s*,\s*Column:\s*(\d+)").expect("Invalid regex pattern")
        });

        let result = re.captures(message).and_then(|caps| {
            let line: usize = caps.get(1)?.as_str().parse().ok()?;
            let column: usize = caps.get(2)?.as_str().parse().ok()?;
            Some(Position { line, column })
        });

        #[cfg(feature = "tracing")]
        if result.is_none() && (message.contains("Line") || message.contains("Column")) {
            trace!(
                "Failed to parse position from error message that appears to contain position info: {}",
                message
            );
        }

        result
    }

    /// Determines the error kind from the message content.
    fn infer_kind_from_message(message: &str) -> ParseErrorKind {
        let lower = message.to_lowercase();
        if lower.contains("unexpected end") || lower.contains("eof") {
            ParseErrorKind::UnexpectedEof
        } else if lower.contains("expected") {
            ParseErrorKind::MissingClause
        } else if lower.contains("not supported") || lower.contains("unsupported") {
            ParseErrorKind::UnsupportedFeature
        } else if lower.contains("lexer") || lower.contains("token") {
            ParseErrorKind::LexerError
        } else {
            ParseErrorKind::SyntaxError
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parse error")?;

        if let Some(dialect) = self.dialect {
            write!(f, " ({})", dialect.display_name())?;
        }

        if let Some(pos) = self.position {
            write!(f, " at line {}, column {}", pos.line, pos.column)?;
        }

        write!(f, ": {}", self.message)?;

        if let Some(suggested) = self.suggestion {
            write!(
                f,
                " (hint: this looks like {} syntax)",
                suggested.display_name()
            )?;
        }

        Ok(())
    }
}

impl std::error::Error for ParseError {}

impl From<sqlparser::parser::ParserError> for ParseError {
    fn from(err: sqlparser::parser::ParserError) -> Self {
        let message = err.to_string();
        let position = Self::parse_position_from_message(&message);
        let kind = Self::infer_kind_from_message(&message);

        Self {
            message,
            position,
            dialect: None,
            kind,
            suggestion: None,
        }
    }
}

/// A syntax marker that only some dialects accept.
struct DialectMarker {
    pattern: &'static str,
    suggested: Dialect,
    accepted_by: &'static [Dialect],
}

const DIALECT_MARKERS: &[DialectMarker] = &[
    DialectMarker {
        pattern: r"`[^`]+`",
        suggested: Dialect::Mysql,
        accepted_by: &[
            Dialect::Mysql,
            Dialect::Mariadb,
            Dialect::Bigquery,
            Dialect::Hive,
            Dialect::Sqlite,
            Dialect::Generic,
        ],
    },
    DialectMarker {
        pattern: r"(?i)\[[a-z_][a-z0-9_ ]*\]|\bselect\s+top\s*\(?\s*\d+",
        suggested: Dialect::Mssql,
        accepted_by: &[Dialect::Mssql, Dialect::Sqlite],
    },
    DialectMarker {
        pattern: r"(?i)::\s*[a-z]|\bilike\b",
        suggested: Dialect::Postgres,
        accepted_by: &[
            Dialect::Postgres,
            Dialect::Redshift,
            Dialect::Snowflake,
            Dialect::Generic,
        ],
    },
    DialectMarker {
        pattern: r"(?i)\bqualify\b|\blateral\s+flatten\b",
        suggested: Dialect::Snowflake,
        accepted_by: &[Dialect::Snowflake, Dialect::Bigquery],
    },
    DialectMarker {
        pattern: r"(?i)\blateral\s+view\b",
        suggested: Dialect::Hive,
        accepted_by: &[Dialect::Hive],
    },
];

/// Guesses which dialect failing SQL was written for, from dialect-specific syntax markers.
///
/// Returns `None` when no marker matches or the current dialect already accepts it.
pub fn suggest_dialect(sql: &str, current: Dialect) -> Option<Dialect> {
    static MARKER_REGEXES: OnceLock<Vec<Regex>> = OnceLock::new();
    let regexes = MARKER_REGEXES.get_or_init(|| {
        DIALECT_MARKERS
            .iter()
            .map(|marker| Regex::new(marker.pattern).expect("Invalid regex pattern"))
            .collect()
    });

    DIALECT_MARKERS
        .iter()
        .zip(regexes)
        .find(|(marker, re)| !marker.accepted_by.contains(&current) && re.is_match(sql))
        .map(|(marker, _)| marker.suggested)
}

/// Failure while compiling a parsed statement into a flow graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error("maximum nesting depth of {max} exceeded")]
    DepthExceeded { max: usize },

    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_position_from_message() {
        let msg = "Expected SELECT, found 'INSERT' at Line: 1, Column: 5";
        let pos = ParseError::parse_position_from_message(msg);
        assert_eq!(pos, Some(Position { line: 1, column: 5 }));
    }

    #[test]
    fn test_parse_position_no_position() {
        assert_eq!(ParseError::parse_position_from_message("Unexpected token"), None);
    }

    #[test]
    fn test_parse_position_no_whitespace() {
        let pos = ParseError::parse_position_from_message("Error at Line:1,Column:5");
        assert_eq!(pos, Some(Position { line: 1, column: 5 }));
    }

    #[test]
    fn test_parse_position_malformed_values() {
        assert_eq!(
            ParseError::parse_position_from_message("Error at Line: abc, Column: 5"),
            None
        );
        assert_eq!(
            ParseError::parse_position_from_message("Error at Column: 5, Line: 1"),
            None
        );
    }

    #[test]
    fn test_infer_kind() {
        assert_eq!(
            ParseError::infer_kind_from_message("Unexpected end of input"),
            ParseErrorKind::UnexpectedEof
        );
        assert_eq!(
            ParseError::infer_kind_from_message("Expected SELECT keyword"),
            ParseErrorKind::MissingClause
        );
        assert_eq!(
            ParseError::infer_kind_from_message("This is unsupported"),
            ParseErrorKind::UnsupportedFeature
        );
        assert_eq!(
            ParseError::infer_kind_from_message("Something odd"),
            ParseErrorKind::SyntaxError
        );
    }

    #[test]
    fn test_display_with_dialect_and_position() {
        let err = ParseError::with_position("Bad syntax", 1, 5).with_dialect(Dialect::Mssql);
        assert_eq!(
            err.to_string(),
            "Parse error (TransactSQL) at line 1, column 5: Bad syntax"
        );
    }

    #[test]
    fn test_display_with_suggestion() {
        let err = ParseError::new("Bad syntax").with_suggestion(Some(Dialect::Postgres));
        assert_eq!(
            err.to_string(),
            "Parse error: Bad syntax (hint: this looks like PostgreSQL syntax)"
        );
    }

    #[test]
    fn test_offset_lines() {
        let err = ParseError::with_position("x", 2, 3).offset_lines(10);
        assert_eq!(err.position, Some(Position { line: 11, column: 3 }));
        let err = ParseError::new("x").offset_lines(10);
        assert_eq!(err.position, None);
    }

    #[test]
    fn test_suggest_dialect_markers() {
        assert_eq!(
            suggest_dialect("SELECT `id` FROM `users`", Dialect::Postgres),
            Some(Dialect::Mysql)
        );
        assert_eq!(
            suggest_dialect("SELECT TOP 10 * FROM [orders]", Dialect::Mysql),
            Some(Dialect::Mssql)
        );
        assert_eq!(
            suggest_dialect("SELECT id::text FROM t", Dialect::Mysql),
            Some(Dialect::Postgres)
        );
        assert_eq!(
            suggest_dialect("SELECT * FROM t QUALIFY rn = 1", Dialect::Postgres),
            Some(Dialect::Snowflake)
        );
    }

    #[test]
    fn test_suggest_dialect_skips_accepting_dialect() {
        assert_eq!(suggest_dialect("SELECT `id` FROM t", Dialect::Mysql), None);
        assert_eq!(suggest_dialect("SELECT id FROM t", Dialect::Postgres), None);
    }

    #[test]
    fn test_compile_error_display() {
        let err = CompileError::DepthExceeded { max: 4 };
        assert_eq!(err.to_string(), "maximum nesting depth of 4 exceeded");
        let err: CompileError = ParseError::new("boom").into();
        assert_eq!(err.to_string(), "Parse error: boom");
    }
}
