use crate::error::CompileError;
use crate::layout::apply_layout;
use crate::lineage::build_lineage;
use crate::parser::{parse_sql_with_dialect, split_statements, StatementSlice};
use crate::types::*;
use sqlparser::ast::Statement;
use std::collections::BTreeSet;
#[cfg(feature = "tracing")]
use tracing::{debug, info_span};

pub mod complexity;
mod context;
mod graph;
mod hints;
mod lines;
mod query;
mod select;
mod statements;

use context::ParseContext;
use graph::GraphBuilder;
use query::Processor;

/// Main entry point: compiles every statement of the request independently.
///
/// A statement that fails to parse or compile yields a result carrying only its `error`;
/// the remaining statements are unaffected.
pub fn analyze(request: &AnalyzeRequest) -> BatchResult {
    let options = request.options.clone().unwrap_or_default();
    let slices = split_statements(&request.sql, request.dialect);
    #[cfg(feature = "tracing")]
    let _span = info_span!("analyze_request", statement_count = slices.len()).entered();

    let mut queries = Vec::with_capacity(slices.len());
    for slice in &slices {
        for mut result in analyze_slice(slice, request.dialect, &options, queries.len()) {
            result.source_name = request.source_name.clone();
            queries.push(result);
        }
    }

    let summary = summarize(&queries);
    BatchResult { queries, summary }
}

/// Compiles one already-parsed statement.
///
/// `sql` of the result is the statement's canonical rendering and line ranges are relative
/// to that rendering.
pub fn compile_statement(
    statement: &Statement,
    dialect: Dialect,
    options: &AnalysisOptions,
) -> QueryResult {
    let sql = statement.to_string();
    compile(statement, &sql, 1, 0, dialect, options)
}

fn analyze_slice(
    slice: &StatementSlice,
    dialect: Dialect,
    options: &AnalysisOptions,
    first_index: usize,
) -> Vec<QueryResult> {
    match parse_sql_with_dialect(&slice.text, dialect) {
        Ok(statements) => statements
            .iter()
            .enumerate()
            .map(|(offset, statement)| {
                compile(
                    statement,
                    &slice.text,
                    slice.start_line,
                    first_index + offset,
                    dialect,
                    options,
                )
            })
            .collect(),
        Err(err) => {
            #[cfg(feature = "tracing")]
            debug!(index = first_index, "statement failed to parse");
            let err = err.offset_lines(slice.start_line);
            vec![QueryResult::failed(
                first_index,
                slice.text.clone(),
                CompileError::from(err).to_string(),
            )]
        }
    }
}

fn compile(
    statement: &Statement,
    sql: &str,
    start_line: usize,
    index: usize,
    dialect: Dialect,
    options: &AnalysisOptions,
) -> QueryResult {
    #[cfg(feature = "tracing")]
    let _span = info_span!("compile_statement", index, dialect = ?dialect).entered();

    match build(statement, sql, start_line, index, dialect, options) {
        Ok(result) => result,
        Err(err) => {
            #[cfg(feature = "tracing")]
            debug!(index, error = %err, "statement compilation failed");
            QueryResult::failed(index, sql, err.to_string())
        }
    }
}

fn build(
    statement: &Statement,
    sql: &str,
    start_line: usize,
    index: usize,
    dialect: Dialect,
    options: &AnalysisOptions,
) -> Result<QueryResult, CompileError> {
    let mut ctx = ParseContext::new(dialect, options, sql, start_line);
    let mut graph = GraphBuilder::new(ctx.next_scope());
    Processor::new(&mut ctx).process_statement(statement, &mut graph)?;
    let (mut nodes, edges) = graph.into_parts();

    complexity::finalize(&mut ctx.stats, &nodes, &edges);
    hints::emit_hints(&mut ctx, &mut nodes, &edges);

    let (column_lineage, column_flows) = if options.column_lineage_enabled() {
        build_lineage(&nodes, &edges, options.max_depth())
    } else {
        (Vec::new(), Vec::new())
    };

    if options.layout_enabled() {
        apply_layout(&mut nodes, &edges, &options.layout());
    }

    Ok(QueryResult {
        statement_index: index,
        statement_type: ctx.statement_type,
        source_name: None,
        sql: sql.to_string(),
        nodes,
        edges,
        stats: ctx.stats,
        hints: ctx.hints,
        error: None,
        column_lineage,
        column_flows,
        table_usage: ctx.table_usage,
        has_select_star: ctx.has_select_star,
        has_no_limit: ctx.has_no_limit,
    })
}

fn summarize(queries: &[QueryResult]) -> Summary {
    let error_count = queries.iter().filter(|q| q.error.is_some()).count();
    let tables: BTreeSet<&str> = queries.iter().flat_map(QueryResult::source_tables).collect();
    Summary {
        statement_count: queries.len(),
        error_count,
        table_count: tables.len(),
        max_complexity_score: queries
            .iter()
            .map(|q| q.stats.complexity_score)
            .max()
            .unwrap_or(0),
        has_errors: error_count > 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_sql;

    fn run(sql: &str) -> BatchResult {
        analyze(&AnalyzeRequest::new(sql, Dialect::Generic))
    }

    #[test]
    fn test_batch_isolates_failures() {
        let result = run("SELECT a FROM t;\nSELEC broken;\nSELECT b FROM u");
        assert_eq!(result.queries.len(), 3);
        assert!(result.queries[0].error.is_none());
        assert!(result.queries[1].error.is_some());
        assert!(result.queries[1].nodes.is_empty());
        assert!(result.queries[2].error.is_none());
        assert_eq!(result.queries[2].statement_index, 2);
        assert_eq!(result.summary.statement_count, 3);
        assert_eq!(result.summary.error_count, 1);
        assert_eq!(result.summary.table_count, 2);
        assert!(result.summary.has_errors);
    }

    #[test]
    fn test_parse_error_line_is_absolute() {
        let result = run("SELECT 1;\n\nSELECT (1 FROM t");
        let error = result.queries[1].error.as_deref().unwrap_or_default();
        assert!(error.contains("line 3"), "{error}");
    }

    #[test]
    fn test_source_name_is_copied_to_every_result() {
        let request = AnalyzeRequest::new("SELECT 1; SELECT 2", Dialect::Generic)
            .with_source_name("report.sql");
        let result = analyze(&request);
        assert!(result
            .queries
            .iter()
            .all(|q| q.source_name.as_deref() == Some("report.sql")));
    }

    #[test]
    fn test_depth_ceiling_becomes_result_error() {
        let options = AnalysisOptions {
            max_depth: Some(1),
            ..AnalysisOptions::default()
        };
        let request = AnalyzeRequest::new("SELECT * FROM (SELECT a FROM t) x", Dialect::Generic)
            .with_options(options);
        let result = analyze(&request);
        assert_eq!(
            result.queries[0].error.as_deref(),
            Some("maximum nesting depth of 1 exceeded")
        );
        assert!(result.queries[0].nodes.is_empty());
    }

    #[test]
    fn test_compile_statement_renders_sql() {
        let statements = parse_sql("select a from t").unwrap();
        let result = compile_statement(&statements[0], Dialect::Generic, &AnalysisOptions::default());
        assert_eq!(result.sql, "SELECT a FROM t");
        assert_eq!(result.statement_type, StatementKind::Select);
        assert!(result.error.is_none());
        assert_eq!(result.nodes.len(), 3);
    }

    #[test]
    fn test_disabled_stages_leave_defaults() {
        let options = AnalysisOptions {
            enable_column_lineage: Some(false),
            enable_layout: Some(false),
            ..AnalysisOptions::default()
        };
        let request = AnalyzeRequest::new("SELECT a FROM t", Dialect::Generic).with_options(options);
        let query = &analyze(&request).queries[0];
        assert!(query.column_flows.is_empty());
        assert!(query.nodes.iter().all(|n| n.width == 0.0 && n.x == 0.0));
    }

    #[test]
    fn test_empty_input() {
        let result = run("  \n ;; ");
        assert!(result.queries.is_empty());
        assert_eq!(result.summary, Summary::default());
    }
}
