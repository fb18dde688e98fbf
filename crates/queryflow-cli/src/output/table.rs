//! Human-readable table output formatting.

use owo_colors::OwoColorize;
use queryflow_core::{
    BatchResult, ComplexityClass, HintCategory, HintKind, OptimizationHint, QueryResult,
    StatementKind,
};
use std::fmt;

/// Format batch results as human-readable text.
///
/// `quiet` keeps only the per-statement header lines. `colored` should be set only when
/// the text goes to a terminal.
pub fn format_table(results: &[BatchResult], quiet: bool, colored: bool) -> String {
    Report {
        results,
        quiet,
        colored,
    }
    .to_string()
}

struct Report<'a> {
    results: &'a [BatchResult],
    quiet: bool,
    colored: bool,
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_header(f)?;
        for batch in self.results {
            self.write_summary(f, batch)?;
            for query in &batch.queries {
                self.write_query(f, query)?;
            }
        }
        Ok(())
    }
}

impl Report<'_> {
    fn bold(&self, text: &str) -> String {
        if self.colored {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn write_header(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = "QueryFlow Analysis";
        let line = "═".repeat(50);

        if self.colored {
            writeln!(f, "{}", title.bold())?;
            writeln!(f, "{}", line.dimmed())
        } else {
            writeln!(f, "{title}")?;
            writeln!(f, "{line}")
        }
    }

    fn write_summary(&self, f: &mut fmt::Formatter<'_>, batch: &BatchResult) -> fmt::Result {
        if let Some(source) = batch.queries.iter().find_map(|q| q.source_name.as_deref()) {
            writeln!(f, "Source: {source}")?;
        }

        let summary = &batch.summary;
        let stats = format!(
            "Summary: {} statements | {} tables | {} errors | max complexity {}",
            summary.statement_count,
            summary.table_count,
            summary.error_count,
            summary.max_complexity_score
        );
        if self.colored {
            writeln!(f, "{}", stats.cyan())?;
        } else {
            writeln!(f, "{stats}")?;
        }
        writeln!(f)
    }

    fn write_query(&self, f: &mut fmt::Formatter<'_>, query: &QueryResult) -> fmt::Result {
        let number = format!("[{}]", query.statement_index + 1);

        if let Some(error) = &query.error {
            let label = if self.colored {
                "error".red().to_string()
            } else {
                "error".to_string()
            };
            return writeln!(f, "{} {label}: {error}", self.bold(&number));
        }

        writeln!(
            f,
            "{} {}  complexity {} ({})",
            self.bold(&number),
            statement_label(query.statement_type),
            query.stats.complexity_score,
            complexity_label(query.stats.complexity)
        )?;
        if self.quiet {
            return Ok(());
        }

        if !query.nodes.is_empty() {
            let arrow = if self.colored {
                " → ".green().to_string()
            } else {
                " → ".to_string()
            };
            let chain: Vec<&str> = query.nodes.iter().map(|node| node.label.as_str()).collect();
            writeln!(f, "    Flow: {}", chain.join(&arrow))?;
        }

        if !query.table_usage.is_empty() {
            let tables: Vec<String> = query
                .table_usage
                .iter()
                .map(|(table, count)| format!("{table} ({count})"))
                .collect();
            writeln!(f, "    Tables: {}", tables.join(", "))?;
        }

        if !query.hints.is_empty() {
            writeln!(f, "    {}", self.bold("Hints:"))?;
            for hint in &query.hints {
                self.write_hint(f, hint)?;
            }
        }
        writeln!(f)
    }

    fn write_hint(&self, f: &mut fmt::Formatter<'_>, hint: &OptimizationHint) -> fmt::Result {
        let kind = match hint.kind {
            HintKind::Error => {
                if self.colored {
                    "ERROR".red().to_string()
                } else {
                    "ERROR".to_string()
                }
            }
            HintKind::Warning => {
                if self.colored {
                    "WARN".yellow().to_string()
                } else {
                    "WARN".to_string()
                }
            }
            HintKind::Info => {
                if self.colored {
                    "INFO".blue().to_string()
                } else {
                    "INFO".to_string()
                }
            }
        };
        writeln!(
            f,
            "      [{kind}] {}: {}",
            category_label(hint.category),
            hint.message
        )?;
        if let Some(suggestion) = &hint.suggestion {
            writeln!(f, "        {suggestion}")?;
        }
        Ok(())
    }
}

fn statement_label(kind: StatementKind) -> &'static str {
    match kind {
        StatementKind::Select => "SELECT",
        StatementKind::Insert => "INSERT",
        StatementKind::Update => "UPDATE",
        StatementKind::Delete => "DELETE",
        StatementKind::Merge => "MERGE",
        StatementKind::CreateView => "CREATE VIEW",
        StatementKind::CreateTable => "CREATE TABLE",
        StatementKind::CreateTableAs => "CREATE TABLE AS",
        StatementKind::Other => "OTHER",
    }
}

fn complexity_label(class: ComplexityClass) -> &'static str {
    match class {
        ComplexityClass::Simple => "simple",
        ComplexityClass::Moderate => "moderate",
        ComplexityClass::Complex => "complex",
        ComplexityClass::VeryComplex => "very complex",
    }
}

fn category_label(category: HintCategory) -> &'static str {
    match category {
        HintCategory::Performance => "performance",
        HintCategory::Quality => "quality",
        HintCategory::BestPractice => "best practice",
        HintCategory::Complexity => "complexity",
        HintCategory::Other => "other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use queryflow_core::{analyze, AnalyzeRequest, Dialect};

    fn run(sql: &str) -> Vec<BatchResult> {
        vec![analyze(
            &AnalyzeRequest::new(sql, Dialect::Generic).with_source_name("query.sql"),
        )]
    }

    #[test]
    fn test_format_table_basic() {
        let output = format_table(&run("SELECT * FROM users"), false, false);
        assert!(output.starts_with("QueryFlow Analysis"));
        assert!(output.contains("Source: query.sql"));
        assert!(output.contains("Summary: 1 statements | 1 tables | 0 errors"));
        assert!(output.contains("[1] SELECT  complexity 1 (simple)"));
        assert!(output.contains("Flow: users → SELECT → Result"));
        assert!(output.contains("Tables: users (1)"));
        assert!(output.contains("[WARN] quality: SELECT *"));
    }

    #[test]
    fn test_format_table_quiet() {
        let results = run("SELECT * FROM users");
        let quiet = format_table(&results, true, false);
        assert!(quiet.contains("[1] SELECT"));
        assert!(!quiet.contains("Flow:"));
        assert!(!quiet.contains("Hints:"));
    }

    #[test]
    fn test_failed_statement_reports_error() {
        let output = format_table(&run("SELECT 1; SELECT (1 FROM t"), false, false);
        assert!(output.contains("[2] error:"));
        assert!(output.contains("1 errors"));
    }

    #[test]
    fn test_plain_output_has_no_escape_codes() {
        let output = format_table(&run("SELECT a FROM t"), false, false);
        assert!(!output.contains('\u{1b}'));
        let colored = format_table(&run("SELECT a FROM t"), false, true);
        assert!(colored.contains('\u{1b}'));
    }
}
