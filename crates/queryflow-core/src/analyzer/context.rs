use super::lines::LineLocator;
use crate::error::CompileError;
use crate::types::{
    AnalysisOptions, Dialect, ExpressionFormat, NodeKind, OptimizationHint, QueryStats,
    StatementKind,
};
use std::collections::BTreeMap;

/// Statement counters feeding the complexity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Counter {
    Tables,
    Joins,
    Subqueries,
    Ctes,
    Aggregations,
    WindowFunctions,
    Unions,
    Conditions,
}

/// Node-scoped findings recorded during processing and turned into hints afterwards.
#[derive(Debug, Clone, Default)]
pub(crate) struct Findings {
    /// Join nodes without a join condition
    pub(crate) cross_joins: Vec<String>,
    /// UPDATE/DELETE targets written without a WHERE clause
    pub(crate) unfiltered_writes: Vec<(String, StatementKind)>,
    /// Sort nodes inside nested queries with no row limit
    pub(crate) unbounded_sorts: Vec<String>,
}

/// Mutable state for compiling one statement.
///
/// Created fresh per statement; never shared between statements or threads.
pub(crate) struct ParseContext {
    pub(crate) dialect: Dialect,
    pub(crate) expression_format: ExpressionFormat,
    pub(crate) statement_type: StatementKind,
    /// Counters only; derived metrics are filled in after the graph is built
    pub(crate) stats: QueryStats,
    pub(crate) hints: Vec<OptimizationHint>,
    /// Lowercased physical table name -> reference count
    pub(crate) table_usage: BTreeMap<String, u32>,
    pub(crate) has_select_star: bool,
    pub(crate) has_no_limit: bool,
    pub(crate) findings: Findings,
    /// Deepest expression/derived-table subquery nesting seen
    pub(crate) max_subquery_depth: u32,
    pub(crate) lines: LineLocator,
    id_counter: u64,
    scope_counter: usize,
    depth: usize,
    max_depth: usize,
    subquery_depth: u32,
}

impl ParseContext {
    pub(crate) fn new(
        dialect: Dialect,
        options: &AnalysisOptions,
        sql: &str,
        start_line: usize,
    ) -> Self {
        Self {
            dialect,
            expression_format: options.expression_format(),
            statement_type: StatementKind::Other,
            stats: QueryStats::default(),
            hints: Vec::new(),
            table_usage: BTreeMap::new(),
            has_select_star: false,
            has_no_limit: true,
            findings: Findings::default(),
            max_subquery_depth: 0,
            lines: LineLocator::new(sql, start_line),
            id_counter: 0,
            scope_counter: 0,
            depth: 0,
            max_depth: options.max_depth(),
            subquery_depth: 0,
        }
    }

    /// Issues the next id, `{prefix}_{n}` with `n` strictly increasing across prefixes.
    pub(crate) fn next_id(&mut self, prefix: &str) -> String {
        self.id_counter += 1;
        format!("{prefix}_{}", self.id_counter)
    }

    pub(crate) fn node_id(&mut self, kind: NodeKind) -> String {
        self.next_id(kind.id_prefix())
    }

    /// Issues a fresh identifier for a graph scope.
    pub(crate) fn next_scope(&mut self) -> usize {
        self.scope_counter += 1;
        self.scope_counter
    }

    pub(crate) fn track_table_usage(&mut self, name: &str) {
        *self
            .table_usage
            .entry(name.to_ascii_lowercase())
            .or_insert(0) += 1;
    }

    pub(crate) fn increment(&mut self, counter: Counter) {
        self.add(counter, 1);
    }

    pub(crate) fn add(&mut self, counter: Counter, amount: u32) {
        let stats = &mut self.stats;
        let slot = match counter {
            Counter::Tables => &mut stats.tables,
            Counter::Joins => &mut stats.joins,
            Counter::Subqueries => &mut stats.subqueries,
            Counter::Ctes => &mut stats.ctes,
            Counter::Aggregations => &mut stats.aggregations,
            Counter::WindowFunctions => &mut stats.window_functions,
            Counter::Unions => &mut stats.unions,
            Counter::Conditions => &mut stats.conditions,
        };
        *slot = slot.saturating_add(amount);
    }

    pub(crate) fn add_hint(&mut self, hint: OptimizationHint) {
        self.hints.push(hint);
    }

    pub(crate) fn mark_select_star(&mut self) {
        self.has_select_star = true;
    }

    pub(crate) fn mark_limited(&mut self) {
        self.has_no_limit = false;
    }

    /// Enters one level of query nesting, failing once the configured maximum is passed.
    pub(crate) fn descend(&mut self) -> Result<(), CompileError> {
        if self.depth >= self.max_depth {
            return Err(CompileError::DepthExceeded {
                max: self.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn ascend(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub(crate) fn enter_subquery(&mut self) {
        self.subquery_depth += 1;
        self.max_subquery_depth = self.max_subquery_depth.max(self.subquery_depth);
    }

    pub(crate) fn subquery_depth(&self) -> u32 {
        self.subquery_depth
    }

    pub(crate) fn exit_subquery(&mut self) {
        self.subquery_depth = self.subquery_depth.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(max_depth: usize) -> ParseContext {
        let options = AnalysisOptions {
            max_depth: Some(max_depth),
            ..AnalysisOptions::default()
        };
        ParseContext::new(Dialect::Generic, &options, "SELECT 1", 1)
    }

    #[test]
    fn test_ids_strictly_increase_across_prefixes() {
        let mut ctx = context(8);
        assert_eq!(ctx.next_id("table"), "table_1");
        assert_eq!(ctx.next_id("edge"), "edge_2");
        assert_eq!(ctx.next_id("table"), "table_3");
        assert_eq!(ctx.node_id(NodeKind::SetOp), "setop_4");
        assert_eq!(ctx.node_id(NodeKind::Subquery), "subquery_5");
    }

    #[test]
    fn test_table_usage_is_case_insensitive() {
        let mut ctx = context(8);
        ctx.track_table_usage("Users");
        ctx.track_table_usage("users");
        ctx.track_table_usage("orders");
        assert_eq!(ctx.table_usage.get("users"), Some(&2));
        assert_eq!(ctx.table_usage.len(), 2);
    }

    #[test]
    fn test_counters() {
        let mut ctx = context(8);
        ctx.increment(Counter::Joins);
        ctx.add(Counter::Conditions, 3);
        assert_eq!(ctx.stats.joins, 1);
        assert_eq!(ctx.stats.conditions, 3);
        assert!(ctx.has_no_limit);
        ctx.mark_limited();
        assert!(!ctx.has_no_limit);
    }

    #[test]
    fn test_depth_guard() {
        let mut ctx = context(2);
        assert!(ctx.descend().is_ok());
        assert!(ctx.descend().is_ok());
        let err = ctx.descend().unwrap_err();
        assert_eq!(err.to_string(), "maximum nesting depth of 2 exceeded");
        ctx.ascend();
        assert!(ctx.descend().is_ok());
    }

    #[test]
    fn test_subquery_depth_tracks_maximum() {
        let mut ctx = context(8);
        ctx.enter_subquery();
        ctx.enter_subquery();
        ctx.exit_subquery();
        ctx.enter_subquery();
        ctx.exit_subquery();
        ctx.exit_subquery();
        assert_eq!(ctx.max_subquery_depth, 2);
    }
}
