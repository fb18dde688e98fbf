use crate::error::{suggest_dialect, ParseError};
use crate::types::Dialect;
use sqlparser::ast::Statement;
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
use sqlparser::tokenizer::{Token, Tokenizer, Whitespace};

/// Parse SQL using the specified dialect.
///
/// Errors carry the dialect and, when the text shows another dialect's syntax, a suggestion.
pub fn parse_sql_with_dialect(sql: &str, dialect: Dialect) -> Result<Vec<Statement>, ParseError> {
    let sqlparser_dialect = dialect.to_sqlparser_dialect();
    match Parser::parse_sql(sqlparser_dialect.as_ref(), sql) {
        Ok(statements) => Ok(statements),
        Err(primary_err) => {
            // Generic frequently fails on Postgres-specific operators (`?`, `->>`, `::`).
            if matches!(dialect, Dialect::Generic) && looks_like_postgres_syntax(sql) {
                let postgres = PostgreSqlDialect {};
                if let Ok(statements) = Parser::parse_sql(&postgres, sql) {
                    return Ok(statements);
                }
            }
            Err(ParseError::from(primary_err)
                .with_dialect(dialect)
                .with_suggestion(suggest_dialect(sql, dialect)))
        }
    }
}

fn looks_like_postgres_syntax(sql: &str) -> bool {
    sql.contains("::")
        || sql.contains("->")
        || sql.contains("?|")
        || sql.contains("?&")
        || sql.contains(" ? ")
        || sql.contains("? '")
}

/// Parse SQL using the generic dialect.
pub fn parse_sql(sql: &str) -> Result<Vec<Statement>, ParseError> {
    parse_sql_with_dialect(sql, Dialect::Generic)
}

/// One statement's text within a larger SQL input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementSlice {
    /// Zero-based position among non-empty statements
    pub index: usize,
    /// Statement text without the terminating semicolon
    pub text: String,
    /// Line (1-indexed) of the input on which the statement starts
    pub start_line: usize,
}

/// Splits SQL text into statements on top-level semicolons.
///
/// Uses the dialect's tokenizer so semicolons inside strings, quoted identifiers,
/// comments and dollar-quoted bodies do not split. If tokenization fails the whole
/// input becomes one slice so the parser can report the error against it.
pub fn split_statements(sql: &str, dialect: Dialect) -> Vec<StatementSlice> {
    let sqlparser_dialect = dialect.to_sqlparser_dialect();
    let tokens = match Tokenizer::new(sqlparser_dialect.as_ref(), sql).tokenize_with_location() {
        Ok(tokens) => tokens,
        Err(_) => return whole_input(sql),
    };

    let mut slices = Vec::new();
    // (byte offset, line) of the first significant token of the current statement
    let mut start: Option<(usize, usize)> = None;

    for token in &tokens {
        let line = token.span.start.line as usize;
        let column = token.span.start.column as usize;
        match &token.token {
            Token::SemiColon => {
                if let (Some((begin, first_line)), Some(end)) =
                    (start.take(), line_col_to_offset(sql, line, column))
                {
                    push_slice(&mut slices, &sql[begin..end], first_line);
                }
            }
            Token::Whitespace(Whitespace::Space | Whitespace::Newline | Whitespace::Tab) => {}
            Token::Whitespace(_) if start.is_none() => {}
            Token::EOF => {}
            _ => {
                if start.is_none() {
                    start = line_col_to_offset(sql, line, column).map(|offset| (offset, line));
                }
            }
        }
    }

    if let Some((begin, first_line)) = start {
        push_slice(&mut slices, &sql[begin..], first_line);
    }

    slices
}

fn whole_input(sql: &str) -> Vec<StatementSlice> {
    let mut slices = Vec::new();
    let leading_lines = sql.len() - sql.trim_start().len();
    let start_line = 1 + sql[..leading_lines].matches('\n').count();
    push_slice(&mut slices, sql, start_line);
    slices
}

fn push_slice(slices: &mut Vec<StatementSlice>, text: &str, start_line: usize) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    slices.push(StatementSlice {
        index: slices.len(),
        text: text.to_string(),
        start_line,
    });
}

/// Converts a 1-indexed line and character column into a byte offset.
pub(crate) fn line_col_to_offset(sql: &str, line: usize, column: usize) -> Option<usize> {
    if line == 0 || column == 0 {
        return None;
    }

    let bytes = sql.as_bytes();
    let mut current_line = 1;
    let mut offset = 0;

    while current_line < line {
        let remaining = bytes.get(offset..)?;
        let newline_pos = remaining.iter().position(|&b| b == b'\n')?;
        offset += newline_pos + 1;
        current_line += 1;
    }

    let line_start = offset;
    let remaining = bytes.get(line_start..)?;
    let line_len = remaining
        .iter()
        .position(|&b| b == b'\n')
        .unwrap_or(remaining.len());
    let line_end = line_start + line_len;

    // sqlparser reports columns in characters.
    let mut current_column = 1;
    for (rel_offset, _) in sql[line_start..line_end].char_indices() {
        if current_column == column {
            return Some(line_start + rel_offset);
        }
        current_column += 1;
    }

    (column == current_column).then_some(line_end)
}
