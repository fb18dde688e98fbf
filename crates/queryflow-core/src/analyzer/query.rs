//! Query-level processing: WITH clauses, set operations, FROM items and joins.

use super::context::{Counter, ParseContext};
use super::graph::{GraphBuilder, Relation};
use crate::error::CompileError;
use crate::extractors::walk::expression_subqueries;
use crate::extractors::{
    count_predicates, extract_conditions, get_table_name, table_alias,
    table_function_name,
};
use crate::functions::is_table_valued_function;
use crate::types::{AccessMode, ClauseType, FlowNode, NodeKind, OperationType, TableCategory};
use sqlparser::ast::{
    Expr, Join, JoinConstraint, JoinOperator, LimitClause, OrderBy, OrderByKind, Query, SetExpr,
    TableFactor, TableWithJoins, With,
};
use std::collections::HashMap;
#[cfg(feature = "tracing")]
use tracing::debug;

/// How a query's output is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QueryRole {
    /// The statement itself; ends in a Result node
    Root,
    /// Feeds a statement-level sink such as an INSERT target or a view
    Source,
    /// Body of a CTE or subquery; ends at its projection
    Nested,
}

/// ORDER BY and row-limit clauses that apply after a query body.
pub(crate) struct QueryTail<'q> {
    pub(crate) order_by: Option<&'q OrderBy>,
    pub(crate) limit: Option<String>,
    pub(crate) role: QueryRole,
}

impl<'q> QueryTail<'q> {
    fn from_query(query: &'q Query, role: QueryRole) -> Self {
        let order_by = query.order_by.as_ref().filter(|order_by| match &order_by.kind {
            OrderByKind::Expressions(exprs) => !exprs.is_empty(),
            OrderByKind::All(_) => true,
        });
        Self {
            order_by,
            limit: limit_label(query),
            role,
        }
    }

    fn empty(role: QueryRole) -> Self {
        Self {
            order_by: None,
            limit: None,
            role,
        }
    }
}

fn limit_label(query: &Query) -> Option<String> {
    let from_clause = match &query.limit_clause {
        Some(LimitClause::LimitOffset {
            limit: Some(limit),
            offset,
            ..
        }) => Some(match offset {
            Some(offset) => format!("LIMIT {limit} {offset}"),
            None => format!("LIMIT {limit}"),
        }),
        Some(LimitClause::LimitOffset {
            limit: None,
            offset: Some(offset),
            ..
        }) => Some(offset.to_string()),
        Some(LimitClause::OffsetCommaLimit { offset, limit }) => {
            Some(format!("LIMIT {offset}, {limit}"))
        }
        _ => None,
    };
    from_clause.or_else(|| query.fetch.as_ref().map(ToString::to_string))
}

fn order_by_text(order_by: &OrderBy) -> String {
    match &order_by.kind {
        OrderByKind::Expressions(exprs) => exprs
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
        OrderByKind::All(_) => "ALL".to_string(),
    }
}

#[derive(Debug, Clone)]
enum CteBinding {
    /// Recursive CTE whose body is still being compiled
    Pending,
    Bound { scope_id: usize, node_id: String },
}

/// Relations visible to one SELECT, for resolving column qualifiers.
#[derive(Debug, Default)]
pub(crate) struct RelationScope {
    entries: Vec<(String, Option<String>)>,
}

impl RelationScope {
    pub(crate) fn register(&mut self, name: &str, alias: Option<&str>) {
        self.entries
            .push((name.to_string(), alias.map(str::to_string)));
    }

    /// Table name a qualifier refers to; an unqualified column resolves only when one
    /// relation is in scope.
    pub(crate) fn resolve(&self, qualifier: Option<&str>) -> Option<String> {
        match qualifier {
            Some(qualifier) => Some(
                self.entries
                    .iter()
                    .find(|(name, alias)| {
                        alias
                            .as_deref()
                            .is_some_and(|alias| alias.eq_ignore_ascii_case(qualifier))
                            || name.eq_ignore_ascii_case(qualifier)
                            || name
                                .rsplit('.')
                                .next()
                                .is_some_and(|tail| tail.eq_ignore_ascii_case(qualifier))
                    })
                    .map(|(name, _)| name.clone())
                    .unwrap_or_else(|| qualifier.to_string()),
            ),
            None => match self.entries.as_slice() {
                [(name, _)] => Some(name.clone()),
                _ => None,
            },
        }
    }
}

/// Walks one statement's AST and emits its flow graph into [`GraphBuilder`]s.
pub(crate) struct Processor<'a> {
    pub(crate) ctx: &'a mut ParseContext,
    ctes: Vec<HashMap<String, CteBinding>>,
    cte_depth: u32,
}

impl<'a> Processor<'a> {
    pub(crate) fn new(ctx: &'a mut ParseContext) -> Self {
        Self {
            ctx,
            ctes: Vec::new(),
            cte_depth: 0,
        }
    }

    /// Compiles `query` into `graph` and returns the id of its terminal node.
    pub(crate) fn process_query(
        &mut self,
        query: &Query,
        graph: &mut GraphBuilder,
        role: QueryRole,
    ) -> Result<String, CompileError> {
        self.ctx.descend()?;
        let pushed_scope = query.with.is_some();
        if pushed_scope {
            self.ctes.push(HashMap::new());
        }
        let outcome = self.query_body(query, graph, role);
        if pushed_scope {
            self.ctes.pop();
        }
        self.ctx.ascend();
        outcome
    }

    fn query_body(
        &mut self,
        query: &Query,
        graph: &mut GraphBuilder,
        role: QueryRole,
    ) -> Result<String, CompileError> {
        if let Some(with) = &query.with {
            self.process_with(with, graph)?;
        }

        let tail = QueryTail::from_query(query, role);
        let terminal = self.process_set_expr(&query.body, graph, &tail)?;

        if role != QueryRole::Root {
            return Ok(terminal);
        }
        let line_range = Some((self.ctx.lines.last_line(), None));
        let mut node = FlowNode::new(self.ctx.node_id(NodeKind::Result), NodeKind::Result, "Result");
        node.line_range = line_range;
        let result = graph.add_node(node);
        graph.connect(self.ctx, &Relation::node(terminal), &result, ClauseType::Result);
        Ok(result)
    }

    fn process_with(&mut self, with: &With, graph: &mut GraphBuilder) -> Result<(), CompileError> {
        for cte in &with.cte_tables {
            let name = cte.alias.name.value.clone();
            let key = name.to_ascii_lowercase();
            let line_start = self.ctx.lines.locate(&name);
            if with.recursive {
                self.bind_cte(key.clone(), CteBinding::Pending);
            }

            let depth = self.cte_depth + 1;
            self.cte_depth = depth;
            let mut body = GraphBuilder::new(self.ctx.next_scope());
            let outcome = self.process_query(&cte.query, &mut body, QueryRole::Nested);
            self.cte_depth = depth - 1;
            let terminal = outcome?;

            let columns = body
                .node(&terminal)
                .map(|node| node.columns.clone())
                .unwrap_or_default();
            let (children, child_edges) = body.into_parts();
            let end_line = children
                .iter()
                .filter_map(|child| child.line_range)
                .map(|(start, end)| end.unwrap_or(start))
                .max();

            let description = if with.recursive {
                format!("WITH RECURSIVE {name}")
            } else {
                format!("WITH {name}")
            };
            let mut node = FlowNode::new(self.ctx.node_id(NodeKind::Cte), NodeKind::Cte, &name)
                .with_description(description);
            node.nesting_depth = Some(depth);
            node.columns = columns;
            node.line_range = line_start.map(|(start, _)| {
                (start, end_line.filter(|end| *end > start))
            });
            node.children = children;
            node.child_edges = child_edges;

            self.ctx.increment(Counter::Ctes);
            let node_id = graph.add_node(node);
            self.bind_cte(
                key,
                CteBinding::Bound {
                    scope_id: graph.scope_id,
                    node_id,
                },
            );
        }
        Ok(())
    }

    fn bind_cte(&mut self, key: String, binding: CteBinding) {
        if let Some(scope) = self.ctes.last_mut() {
            scope.insert(key, binding);
        }
    }

    fn lookup_cte(&self, name: &str) -> Option<&CteBinding> {
        // Only unqualified names can refer to a CTE
        if name.contains('.') {
            return None;
        }
        let key = name.trim_matches('"').to_ascii_lowercase();
        self.ctes.iter().rev().find_map(|scope| scope.get(&key))
    }

    pub(crate) fn process_set_expr(
        &mut self,
        body: &SetExpr,
        graph: &mut GraphBuilder,
        tail: &QueryTail<'_>,
    ) -> Result<String, CompileError> {
        match body {
            SetExpr::Select(select) => self.process_select(select, graph, tail),
            SetExpr::Query(query) => {
                let terminal = self.process_query(query, graph, QueryRole::Nested)?;
                self.finish_tail(terminal, graph, tail)
            }
            SetExpr::SetOperation { .. } => {
                let terminal = self.process_set_operation(body, graph)?;
                self.finish_tail(terminal, graph, tail)
            }
            SetExpr::Values(values) => {
                let mut node = FlowNode::new(self.ctx.node_id(NodeKind::Table), NodeKind::Table, "VALUES")
                    .with_description(format!("{} literal rows", values.rows.len()))
                    .with_access(AccessMode::Derived)
                    .with_category(TableCategory::Derived);
                node.line_range = self.ctx.lines.locate("VALUES");
                let id = graph.add_node(node);
                self.finish_tail(id, graph, tail)
            }
            SetExpr::Insert(statement)
            | SetExpr::Update(statement)
            | SetExpr::Delete(statement)
            | SetExpr::Merge(statement) => self.process_nested_statement(statement, graph),
            SetExpr::Table(table) => {
                let name = match (&table.schema_name, &table.table_name) {
                    (Some(schema), Some(name)) => format!("{schema}.{name}"),
                    (None, Some(name)) => name.clone(),
                    _ => crate::extractors::TABLE_PLACEHOLDER.to_string(),
                };
                let id = self.add_physical_table(&name, None, graph);
                self.finish_tail(id, graph, tail)
            }
            #[allow(unreachable_patterns)]
            _ => {
                #[cfg(feature = "tracing")]
                debug!("unsupported query body rendered as an opaque projection");
                let node = FlowNode::new(self.ctx.node_id(NodeKind::Select), NodeKind::Select, "SELECT")
                    .with_description(body.to_string());
                Ok(graph.add_node(node))
            }
        }
    }

    fn process_set_operation(
        &mut self,
        body: &SetExpr,
        graph: &mut GraphBuilder,
    ) -> Result<String, CompileError> {
        let SetExpr::SetOperation {
            op, set_quantifier, ..
        } = body
        else {
            return self.process_set_expr(body, graph, &QueryTail::empty(QueryRole::Nested));
        };

        // A UNION B UNION C becomes one node with three inputs
        let mut branches = Vec::new();
        collect_branches(body, op, set_quantifier, &mut branches);

        let mut inputs = Vec::with_capacity(branches.len());
        for branch in branches {
            inputs.push(self.process_set_expr(
                branch,
                graph,
                &QueryTail::empty(QueryRole::Nested),
            )?);
        }

        let quantifier = set_quantifier.to_string();
        let label = if quantifier.is_empty() {
            op.to_string()
        } else {
            format!("{op} {quantifier}")
        };
        let mut node = FlowNode::new(self.ctx.node_id(NodeKind::SetOp), NodeKind::SetOp, &label)
            .with_description(format!("{label} of {} inputs", inputs.len()));
        node.line_range = self.ctx.lines.locate(&op.to_string());
        let id = graph.add_node(node);

        let operations = u32::try_from(inputs.len().saturating_sub(1)).unwrap_or(u32::MAX);
        self.ctx.add(Counter::Unions, operations);
        for input in inputs {
            graph.connect(self.ctx, &Relation::node(input), &id, ClauseType::SetOp);
        }
        Ok(id)
    }

    /// Appends Sort and Limit nodes after `running` when the query carries them.
    pub(crate) fn append_tail(
        &mut self,
        running: Option<Relation>,
        graph: &mut GraphBuilder,
        tail: &QueryTail<'_>,
    ) -> Option<Relation> {
        let mut running = running;

        if let Some(order_by) = tail.order_by {
            let mut node = FlowNode::new(self.ctx.node_id(NodeKind::Sort), NodeKind::Sort, "ORDER BY")
                .with_description(order_by_text(order_by));
            node.line_range = self.ctx.lines.locate("ORDER BY");
            let id = graph.add_node(node);
            if let Some(input) = &running {
                graph.connect(self.ctx, input, &id, ClauseType::OrderBy);
            }
            if tail.limit.is_none() && tail.role == QueryRole::Nested {
                self.ctx.findings.unbounded_sorts.push(id.clone());
            }
            running = Some(Relation::node(id));
        }

        if let Some(limit) = &tail.limit {
            self.ctx.mark_limited();
            let keyword = limit.split_whitespace().next().unwrap_or("LIMIT").to_string();
            let mut node = FlowNode::new(self.ctx.node_id(NodeKind::Limit), NodeKind::Limit, limit);
            node.line_range = self.ctx.lines.locate(&keyword);
            let id = graph.add_node(node);
            if let Some(input) = &running {
                graph.connect(self.ctx, input, &id, ClauseType::Limit);
            }
            running = Some(Relation::node(id));
        }

        running
    }

    fn finish_tail(
        &mut self,
        terminal: String,
        graph: &mut GraphBuilder,
        tail: &QueryTail<'_>,
    ) -> Result<String, CompileError> {
        Ok(self
            .append_tail(Some(Relation::node(terminal.clone())), graph, tail)
            .map(|relation| relation.node_id)
            .unwrap_or(terminal))
    }

    /// Compiles a FROM item and its joins, returning the relation rows leave through.
    pub(crate) fn process_table_with_joins(
        &mut self,
        table: &TableWithJoins,
        graph: &mut GraphBuilder,
        scope: &mut RelationScope,
    ) -> Result<Relation, CompileError> {
        let mut current = self.process_table_factor(&table.relation, graph, scope)?;
        for join in &table.joins {
            current = self.process_join(current, join, graph, scope)?;
        }
        Ok(current)
    }

    /// Compiles a comma-separated FROM list, joining items with implicit cross joins.
    pub(crate) fn process_from_list(
        &mut self,
        from: &[TableWithJoins],
        graph: &mut GraphBuilder,
        scope: &mut RelationScope,
    ) -> Result<Option<Relation>, CompileError> {
        let mut running: Option<Relation> = None;
        for table in from {
            let relation = self.process_table_with_joins(table, graph, scope)?;
            running = Some(match running {
                None => relation,
                Some(left) => self.cross_join(left, relation, graph),
            });
        }
        Ok(running)
    }

    fn cross_join(&mut self, left: Relation, right: Relation, graph: &mut GraphBuilder) -> Relation {
        let node = FlowNode::new(self.ctx.node_id(NodeKind::Join), NodeKind::Join, "CROSS JOIN")
            .with_description("implicit cross join (comma-separated FROM)");
        let id = graph.add_node(node);
        for input in [&left, &right] {
            graph.connect(self.ctx, input, &id, ClauseType::Join);
        }
        self.ctx.increment(Counter::Joins);
        self.ctx.findings.cross_joins.push(id.clone());
        Relation::node(id)
    }

    fn process_join(
        &mut self,
        left: Relation,
        join: &Join,
        graph: &mut GraphBuilder,
        scope: &mut RelationScope,
    ) -> Result<Relation, CompileError> {
        let right = self.process_table_factor(&join.relation, graph, scope)?;
        let (label, constraint) = join_kind(&join.join_operator);

        let mut conditions = Vec::new();
        let mut clause = None;
        let mut subqueries = Vec::new();
        match constraint {
            Some(JoinConstraint::On(expr)) => {
                conditions = extract_conditions(expr);
                clause = Some(expr.to_string());
                self.ctx.add(Counter::Conditions, count_predicates(expr));
                subqueries = expression_subqueries(expr);
            }
            Some(JoinConstraint::Using(columns)) => {
                let columns: Vec<String> = columns.iter().map(ToString::to_string).collect();
                clause = Some(format!("USING ({})", columns.join(", ")));
            }
            Some(JoinConstraint::Natural) => clause = Some("NATURAL".to_string()),
            Some(JoinConstraint::None) | None => {}
        }
        // LATERAL APPLY carries no constraint but is not a cartesian product
        let is_cross = matches!(constraint, Some(JoinConstraint::None));

        let keyword = label.rsplit(' ').next().unwrap_or("JOIN").to_string();
        let line_range = self.ctx.lines.locate(&keyword);
        let mut node = FlowNode::new(self.ctx.node_id(NodeKind::Join), NodeKind::Join, label);
        node.conditions = conditions;
        node.description = match constraint {
            Some(JoinConstraint::On(_)) => clause.as_ref().map(|clause| format!("ON {clause}")),
            _ => clause.clone(),
        };
        node.line_range = line_range;
        let id = graph.add_node(node);

        for subquery in subqueries {
            self.add_expression_subquery(subquery, &id, graph)?;
        }
        for input in [&left, &right] {
            let edge = graph.connect(self.ctx, input, &id, ClauseType::Join);
            edge.sql_clause = clause.clone();
            edge.line_range = line_range;
        }

        self.ctx.increment(Counter::Joins);
        if is_cross {
            self.ctx.findings.cross_joins.push(id.clone());
        }
        Ok(Relation::node(id))
    }

    /// Compiles one FROM item into a node (or, for a same-scope CTE, a labelled reference).
    pub(crate) fn process_table_factor(
        &mut self,
        factor: &TableFactor,
        graph: &mut GraphBuilder,
        scope: &mut RelationScope,
    ) -> Result<Relation, CompileError> {
        let alias = table_alias(factor);

        if let Some(function) = table_function_name(factor) {
            let id = self.add_table_function(&function, alias.as_deref(), graph);
            scope.register(&function, alias.as_deref());
            return Ok(Relation::node(id));
        }

        match factor {
            TableFactor::Table { name, .. } => {
                let name = name.to_string();
                scope.register(&name, alias.as_deref());
                match self.lookup_cte(&name).cloned() {
                    Some(CteBinding::Bound { scope_id, node_id }) if scope_id == graph.scope_id => {
                        Ok(Relation {
                            node_id,
                            edge_label: alias,
                        })
                    }
                    Some(_) => Ok(Relation::node(self.add_cte_reference(
                        &name,
                        alias.as_deref(),
                        graph,
                    ))),
                    None => Ok(Relation::node(self.add_physical_table(
                        &name,
                        alias.as_deref(),
                        graph,
                    ))),
                }
            }
            TableFactor::Derived { subquery, .. } => {
                let label = alias.clone().unwrap_or_else(|| "subquery".to_string());
                scope.register(&label, None);
                let id = self.add_subquery_container(subquery, &label, alias, graph)?;
                Ok(Relation::node(id))
            }
            TableFactor::NestedJoin {
                table_with_joins, ..
            } => self.process_table_with_joins(table_with_joins, graph, scope),
            TableFactor::Pivot { table, .. }
            | TableFactor::Unpivot { table, .. }
            | TableFactor::MatchRecognize { table, .. } => {
                self.process_table_factor(table, graph, scope)
            }
            _ => {
                let name = get_table_name(factor);
                scope.register(&name, alias.as_deref());
                let node = FlowNode::new(self.ctx.node_id(NodeKind::Table), NodeKind::Table, &name)
                    .with_alias(alias)
                    .with_access(AccessMode::Derived)
                    .with_category(TableCategory::Derived);
                Ok(Relation::node(graph.add_node(node)))
            }
        }
    }

    /// Adds a stored table read by the statement.
    pub(crate) fn add_physical_table(
        &mut self,
        name: &str,
        alias: Option<&str>,
        graph: &mut GraphBuilder,
    ) -> String {
        let mut node = FlowNode::new(self.ctx.node_id(NodeKind::Table), NodeKind::Table, name)
            .with_alias(alias.map(str::to_string))
            .with_access(AccessMode::Read)
            .with_operation(OperationType::Select)
            .with_category(TableCategory::Physical);
        node.line_range = self.ctx.lines.locate(name);
        self.ctx.increment(Counter::Tables);
        self.ctx.track_table_usage(name);
        graph.add_node(node)
    }

    fn add_cte_reference(&mut self, name: &str, alias: Option<&str>, graph: &mut GraphBuilder) -> String {
        let mut node = FlowNode::new(self.ctx.node_id(NodeKind::Table), NodeKind::Table, name)
            .with_description(format!("reference to CTE {name}"))
            .with_alias(alias.map(str::to_string))
            .with_access(AccessMode::Read)
            .with_category(TableCategory::CteReference);
        node.line_range = self.ctx.lines.locate(name);
        graph.add_node(node)
    }

    fn add_table_function(&mut self, function: &str, alias: Option<&str>, graph: &mut GraphBuilder) -> String {
        let description = if is_table_valued_function(function, self.ctx.dialect) {
            format!("table-valued function {function}")
        } else {
            format!("function {function} in FROM")
        };
        let mut node = FlowNode::new(self.ctx.node_id(NodeKind::Table), NodeKind::Table, function)
            .with_description(description)
            .with_alias(alias.map(str::to_string))
            .with_access(AccessMode::Derived)
            .with_category(TableCategory::Derived);
        node.line_range = self.ctx.lines.locate(function);
        graph.add_node(node)
    }

    fn add_subquery_container(
        &mut self,
        subquery: &Query,
        label: &str,
        alias: Option<String>,
        graph: &mut GraphBuilder,
    ) -> Result<String, CompileError> {
        let line_start = alias
            .as_deref()
            .and_then(|alias| self.ctx.lines.locate(alias));
        self.ctx.enter_subquery();
        let depth = self.ctx.subquery_depth();
        let mut body = GraphBuilder::new(self.ctx.next_scope());
        let outcome = self.process_query(subquery, &mut body, QueryRole::Nested);
        self.ctx.exit_subquery();
        let terminal = outcome?;

        let columns = body
            .node(&terminal)
            .map(|node| node.columns.clone())
            .unwrap_or_default();
        let (children, child_edges) = body.into_parts();
        let mut node = FlowNode::new(self.ctx.node_id(NodeKind::Subquery), NodeKind::Subquery, label)
            .with_alias(alias);
        node.nesting_depth = Some(depth);
        node.columns = columns;
        node.line_range = line_start.or_else(|| {
            children
                .iter()
                .filter_map(|child| child.line_range)
                .map(|(start, _)| (start, None))
                .min()
        });
        node.children = children;
        node.child_edges = child_edges;
        self.ctx.increment(Counter::Subqueries);
        Ok(graph.add_node(node))
    }

    /// Compiles a subquery found inside an expression and connects it to `consumer`.
    pub(crate) fn add_expression_subquery(
        &mut self,
        subquery: &Query,
        consumer: &str,
        graph: &mut GraphBuilder,
    ) -> Result<(), CompileError> {
        let id = self.add_subquery_container(subquery, "subquery", None, graph)?;
        graph.connect(self.ctx, &Relation::node(id), consumer, ClauseType::Subquery);
        Ok(())
    }

    /// Compiles the subqueries inside `expr` and returns their container ids.
    pub(crate) fn expression_containers(
        &mut self,
        expr: &Expr,
        graph: &mut GraphBuilder,
    ) -> Result<Vec<String>, CompileError> {
        let mut ids = Vec::new();
        for subquery in expression_subqueries(expr) {
            ids.push(self.add_subquery_container(subquery, "subquery", None, graph)?);
        }
        Ok(ids)
    }
}

fn collect_branches<'q>(
    body: &'q SetExpr,
    op: &sqlparser::ast::SetOperator,
    quantifier: &sqlparser::ast::SetQuantifier,
    out: &mut Vec<&'q SetExpr>,
) {
    match body {
        SetExpr::SetOperation {
            op: branch_op,
            set_quantifier,
            left,
            right,
        } if branch_op == op && set_quantifier == quantifier => {
            collect_branches(left, op, quantifier, out);
            collect_branches(right, op, quantifier, out);
        }
        _ => out.push(body),
    }
}

fn join_kind(operator: &JoinOperator) -> (&'static str, Option<&JoinConstraint>) {
    match operator {
        JoinOperator::Join(c) => ("JOIN", Some(c)),
        JoinOperator::Inner(c) => ("INNER JOIN", Some(c)),
        JoinOperator::Left(c) | JoinOperator::LeftOuter(c) => ("LEFT JOIN", Some(c)),
        JoinOperator::Right(c) | JoinOperator::RightOuter(c) => ("RIGHT JOIN", Some(c)),
        JoinOperator::FullOuter(c) => ("FULL JOIN", Some(c)),
        JoinOperator::CrossJoin(c) => ("CROSS JOIN", Some(c)),
        JoinOperator::Semi(c) => ("SEMI JOIN", Some(c)),
        JoinOperator::LeftSemi(c) => ("LEFT SEMI JOIN", Some(c)),
        JoinOperator::RightSemi(c) => ("RIGHT SEMI JOIN", Some(c)),
        JoinOperator::Anti(c) => ("ANTI JOIN", Some(c)),
        JoinOperator::LeftAnti(c) => ("LEFT ANTI JOIN", Some(c)),
        JoinOperator::RightAnti(c) => ("RIGHT ANTI JOIN", Some(c)),
        JoinOperator::StraightJoin(c) => ("STRAIGHT_JOIN", Some(c)),
        JoinOperator::AsOf { constraint, .. } => ("ASOF JOIN", Some(constraint)),
        JoinOperator::CrossApply => ("CROSS APPLY", None),
        JoinOperator::OuterApply => ("OUTER APPLY", None),
    }
}
