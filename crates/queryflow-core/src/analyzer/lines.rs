//! Best-effort source line lookup for nodes.
//!
//! sqlparser does not expose locations for every AST node we care about, so names and
//! clause keywords are located by text search over the statement. A cursor advances past
//! each match so repeated names resolve to successive occurrences.

use crate::types::LineRange;
use regex::Regex;
use std::collections::HashMap;

pub(crate) struct LineLocator {
    sql: String,
    start_line: usize,
    cursor: usize,
    // compiled once per needle; None when the needle yields no usable pattern
    patterns: HashMap<String, Option<Regex>>,
}

impl LineLocator {
    /// `start_line` is the 1-indexed line of the input on which `sql` begins.
    pub(crate) fn new(sql: &str, start_line: usize) -> Self {
        Self {
            sql: sql.to_string(),
            start_line: start_line.max(1),
            cursor: 0,
            patterns: HashMap::new(),
        }
    }

    /// Locates `needle` at or after the cursor, falling back to its first occurrence.
    ///
    /// Matching is case-insensitive on word boundaries. Multi-word keywords match across
    /// any whitespace and dotted names match with or without quoted parts.
    pub(crate) fn locate(&mut self, needle: &str) -> Option<LineRange> {
        let re = self
            .patterns
            .entry(needle.to_string())
            .or_insert_with(|| search_pattern(needle).and_then(|p| Regex::new(&p).ok()))
            .as_ref()?;
        let found = re
            .find_at(&self.sql, self.cursor.min(self.sql.len()))
            .or_else(|| re.find(&self.sql))?;
        self.cursor = found.end();
        Some((self.line_of(found.start()), None))
    }

    /// Last line of the statement.
    pub(crate) fn last_line(&self) -> u32 {
        self.line_of(self.sql.len())
    }

    fn line_of(&self, offset: usize) -> u32 {
        let newlines = self.sql[..offset.min(self.sql.len())].matches('\n').count();
        u32::try_from(self.start_line + newlines).unwrap_or(u32::MAX)
    }
}

fn search_pattern(needle: &str) -> Option<String> {
    let needle = needle.trim();
    if needle.is_empty() {
        return None;
    }
    let body = if needle.contains('.') && !needle.contains(char::is_whitespace) {
        // public.users also matches "public"."users" and `public`.`users`
        needle
            .split('.')
            .map(|part| {
                format!(
                    r#"["`\[]?{}["`\]]?"#,
                    regex::escape(part.trim_matches(|c| c == '"' || c == '`' || c == '[' || c == ']'))
                )
            })
            .collect::<Vec<_>>()
            .join(r"\.")
    } else {
        needle
            .split_whitespace()
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(r"\s+")
    };
    // \b only applies next to word characters
    let lead = if needle.starts_with(|c: char| c.is_alphanumeric() || c == '_') {
        r"\b"
    } else {
        ""
    };
    let trail = if needle.ends_with(|c: char| c.is_alphanumeric() || c == '_') {
        r"\b"
    } else {
        ""
    };
    Some(format!("(?i){lead}{body}{trail}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_offsets_by_start_line() {
        let mut locator = LineLocator::new("SELECT *\nFROM users\nWHERE id = 1", 10);
        assert_eq!(locator.locate("users"), Some((11, None)));
        assert_eq!(locator.locate("WHERE"), Some((12, None)));
        assert_eq!(locator.last_line(), 12);
    }

    #[test]
    fn test_locate_respects_word_boundaries() {
        let mut locator = LineLocator::new("SELECT * FROM users_archive\nJOIN users ON 1 = 1", 1);
        assert_eq!(locator.locate("users"), Some((2, None)));
    }

    #[test]
    fn test_repeated_names_advance() {
        let mut locator = LineLocator::new("SELECT * FROM t\nJOIN t AS t2 ON 1 = 1", 1);
        assert_eq!(locator.locate("t"), Some((1, None)));
        assert_eq!(locator.locate("t"), Some((2, None)));
    }

    #[test]
    fn test_falls_back_to_first_occurrence() {
        let mut locator = LineLocator::new("SELECT a\nFROM t", 1);
        assert_eq!(locator.locate("t"), Some((2, None)));
        assert_eq!(locator.locate("SELECT"), Some((1, None)));
    }

    #[test]
    fn test_multi_word_and_qualified() {
        let mut locator =
            LineLocator::new("SELECT region\nFROM \"sales\".\"orders\"\nGROUP   BY\n region", 1);
        assert_eq!(locator.locate("sales.orders"), Some((2, None)));
        assert_eq!(locator.locate("GROUP BY"), Some((3, None)));
        assert_eq!(locator.locate("missing"), None);
    }

    #[test]
    fn test_patterns_compile_once_per_needle() {
        let mut locator = LineLocator::new("SELECT * FROM t\nJOIN t AS t2 ON 1 = 1\nJOIN t AS t3 ON 1 = 1", 1);
        assert_eq!(locator.locate("t"), Some((1, None)));
        assert_eq!(locator.locate("JOIN"), Some((2, None)));
        assert_eq!(locator.locate("t"), Some((2, None)));
        assert_eq!(locator.locate("JOIN"), Some((3, None)));
        assert_eq!(locator.locate(""), None);
        assert_eq!(locator.patterns.len(), 3);
    }
}
