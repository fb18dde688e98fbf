//! The SELECT pipeline: FROM, WHERE, aggregation, HAVING, ordering and projection.
//!
//! Stages are appended in evaluation order. Each one consumes the running relation and
//! becomes the new running relation, so the projection node always ends the chain.

use super::context::Counter;
use super::graph::{GraphBuilder, Relation};
use super::query::{Processor, QueryTail, RelationScope};
use crate::error::CompileError;
use crate::extractors::{
    count_predicates, extract_aggregate_function_details, extract_case_statement_details,
    extract_column_infos, extract_conditions, extract_window_function_details, group_by_names,
    has_group_by,
};
use crate::types::{
    AggregateDetails, CaseDetails, ClauseType, FlowNode, LineRange, NodeKind, WindowDetails,
};
use sqlparser::ast::{Expr, Select, SelectItem};

impl Processor<'_> {
    /// Compiles one SELECT block and returns the id of its projection node.
    pub(crate) fn process_select(
        &mut self,
        select: &Select,
        graph: &mut GraphBuilder,
        tail: &QueryTail<'_>,
    ) -> Result<String, CompileError> {
        // SELECT precedes FROM in the text; locate it before the cursor moves on
        let select_line = self.ctx.lines.locate("SELECT");

        let mut scope = RelationScope::default();
        let mut running = self.process_from_list(&select.from, graph, &mut scope)?;

        if let Some(selection) = &select.selection {
            running = Some(self.add_filter(selection, "WHERE", ClauseType::Where, running, graph)?);
        }

        running = self.add_aggregate(select, running, graph);

        if let Some(having) = &select.having {
            running = Some(self.add_filter(having, "HAVING", ClauseType::Having, running, graph)?);
        }
        if let Some(qualify) = &select.qualify {
            running = Some(self.add_filter(qualify, "QUALIFY", ClauseType::Where, running, graph)?);
        }

        running = match (&select.top, &tail.limit) {
            // TOP n acts as the row limit when the query has no LIMIT of its own
            (Some(top), None) => {
                let with_top = QueryTail {
                    order_by: tail.order_by,
                    limit: Some(top.to_string()),
                    role: tail.role,
                };
                self.append_tail(running, graph, &with_top)
            }
            _ => self.append_tail(running, graph, tail),
        };

        self.add_projection(select, select_line, &scope, running, graph)
    }

    fn add_filter(
        &mut self,
        expr: &Expr,
        keyword: &str,
        clause_type: ClauseType,
        running: Option<Relation>,
        graph: &mut GraphBuilder,
    ) -> Result<Relation, CompileError> {
        let line_range = self.ctx.lines.locate(keyword);
        let containers = self.expression_containers(expr, graph)?;

        let clause = expr.to_string();
        let mut node = FlowNode::new(self.ctx.node_id(NodeKind::Filter), NodeKind::Filter, keyword)
            .with_description(clause.clone());
        node.conditions = extract_conditions(expr);
        node.line_range = line_range;
        let id = graph.add_node(node);
        self.ctx.add(Counter::Conditions, count_predicates(expr));

        if let Some(input) = &running {
            let edge = graph.connect(self.ctx, input, &id, clause_type);
            edge.sql_clause = Some(clause);
            edge.line_range = line_range;
        }
        for container in containers {
            graph.connect(self.ctx, &Relation::node(container), &id, ClauseType::Subquery);
        }
        Ok(Relation::node(id))
    }

    fn add_aggregate(
        &mut self,
        select: &Select,
        running: Option<Relation>,
        graph: &mut GraphBuilder,
    ) -> Option<Relation> {
        let functions = extract_aggregate_function_details(&select.projection, self.ctx.dialect);
        let grouped = has_group_by(&select.group_by);
        if !grouped && functions.is_empty() {
            return running;
        }

        let group_by = group_by_names(&select.group_by);
        let label = if group_by.is_empty() {
            "AGGREGATE".to_string()
        } else {
            format!("GROUP BY {}", group_by.join(", "))
        };
        let line_range = if grouped {
            self.ctx.lines.locate("GROUP BY")
        } else {
            None
        };

        let mut node = FlowNode::new(self.ctx.node_id(NodeKind::Aggregate), NodeKind::Aggregate, label);
        if !functions.is_empty() {
            node.description = Some(
                functions
                    .iter()
                    .map(|function| function.expression.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            );
        }
        node.line_range = line_range;
        // A bare GROUP BY still aggregates rows
        let count = u32::try_from(functions.len().max(1)).unwrap_or(u32::MAX);
        node.aggregate_details = Some(AggregateDetails {
            functions,
            group_by,
        });
        let id = graph.add_node(node);
        self.ctx.add(Counter::Aggregations, count);

        if let Some(input) = &running {
            graph
                .connect(self.ctx, input, &id, ClauseType::GroupBy)
                .line_range = line_range;
        }
        Some(Relation::node(id))
    }

    fn add_projection(
        &mut self,
        select: &Select,
        select_line: Option<LineRange>,
        scope: &RelationScope,
        running: Option<Relation>,
        graph: &mut GraphBuilder,
    ) -> Result<String, CompileError> {
        let mut containers = Vec::new();
        for item in &select.projection {
            if let SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } = item {
                containers.extend(self.expression_containers(expr, graph)?);
            }
        }

        let mut columns =
            extract_column_infos(&select.projection, self.ctx.dialect, self.ctx.expression_format);
        for column in &mut columns {
            if column.source_column.is_some() || column.source_table.is_some() {
                column.source_table = scope.resolve(column.source_table.as_deref());
            }
        }
        if select.projection.iter().any(|item| {
            matches!(
                item,
                SelectItem::Wildcard(_) | SelectItem::QualifiedWildcard(..)
            )
        }) {
            self.ctx.mark_select_star();
        }

        let windows = extract_window_function_details(&select.projection, self.ctx.dialect);
        let cases = extract_case_statement_details(&select.projection);
        self.ctx.add(
            Counter::WindowFunctions,
            u32::try_from(windows.len()).unwrap_or(u32::MAX),
        );

        // A projection becomes a Window node only when windowed columns dominate it
        let windowed = columns.iter().filter(|column| column.is_window_func).count();
        let (kind, label) = if windowed > 0 && windowed * 2 > columns.len() {
            (NodeKind::Window, "WINDOW")
        } else if select.distinct.is_some() {
            (NodeKind::Select, "SELECT DISTINCT")
        } else {
            (NodeKind::Select, "SELECT")
        };

        let description = select
            .projection
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let mut node =
            FlowNode::new(self.ctx.node_id(kind), kind, label).with_description(description);
        node.columns = columns;
        node.line_range = select_line;
        if !windows.is_empty() {
            node.window_details = Some(WindowDetails { functions: windows });
        }
        if !cases.is_empty() {
            node.case_details = Some(CaseDetails { cases });
        }
        let id = graph.add_node(node);

        if let Some(input) = &running {
            graph.connect(self.ctx, input, &id, ClauseType::Select);
        }
        for container in containers {
            graph.connect(self.ctx, &Relation::node(container), &id, ClauseType::Subquery);
        }
        Ok(id)
    }
}
