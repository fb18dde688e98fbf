//! Statement-level dispatch: queries, DML writes and CREATE ... AS.
//!
//! Writes end in a `Write`-tagged table node fed by whatever the statement reads. A WHERE
//! on UPDATE or DELETE is attached to the target as conditions instead of a Filter stage.

use super::context::Counter;
use super::graph::{GraphBuilder, Relation};
use super::query::{Processor, QueryRole, RelationScope};
use crate::error::CompileError;
use crate::extractors::{
    count_predicates, extract_conditions, get_table_name, table_alias, TABLE_PLACEHOLDER,
};
use crate::types::{
    AccessMode, ClauseType, ColumnInfo, FlowNode, HintCategory, LineRange, NodeKind,
    OperationType, OptimizationHint, Severity, StatementKind, TableCategory, TransformationType,
};
use sqlparser::ast::{
    Assignment, ColumnDef, Delete, Expr, FromTable, Insert, MergeAction, MergeClause,
    ObjectName, Query, SetExpr, Statement, TableFactor, TableWithJoins, UpdateTableFromKind,
};
#[cfg(feature = "tracing")]
use tracing::debug;

impl Processor<'_> {
    /// Compiles a top-level statement into `graph` and records its kind on the context.
    pub(crate) fn process_statement(
        &mut self,
        statement: &Statement,
        graph: &mut GraphBuilder,
    ) -> Result<(), CompileError> {
        match statement {
            Statement::Query(query) => {
                self.ctx.statement_type = StatementKind::Select;
                self.process_query(query, graph, QueryRole::Root)?;
            }
            Statement::Insert(_)
            | Statement::Update { .. }
            | Statement::Delete(_)
            | Statement::Merge { .. } => {
                self.ctx.statement_type = dml_kind(statement);
                self.process_nested_statement(statement, graph)?;
            }
            Statement::CreateView { name, query, .. } => {
                self.ctx.statement_type = StatementKind::CreateView;
                self.process_create_as(name, query, OperationType::CreateView, graph)?;
            }
            Statement::CreateTable(create) => match &create.query {
                Some(query) => {
                    self.ctx.statement_type = StatementKind::CreateTableAs;
                    self.process_create_as(
                        &create.name,
                        query,
                        OperationType::CreateTableAs,
                        graph,
                    )?;
                }
                None => {
                    self.ctx.statement_type = StatementKind::CreateTable;
                    self.process_create_table(&create.name, &create.columns, graph);
                }
            },
            _ => {
                self.ctx.statement_type = StatementKind::Other;
                let keyword = statement_keyword(statement);
                #[cfg(feature = "tracing")]
                debug!(keyword = %keyword, "statement kind produces no flow graph");
                self.ctx.add_hint(
                    OptimizationHint::info(
                        HintCategory::Other,
                        Severity::Low,
                        format!("Statement type {keyword} is not analyzed"),
                    )
                    .with_suggestion(
                        "Only queries, DML writes and CREATE statements produce a flow graph",
                    ),
                );
            }
        }
        Ok(())
    }

    /// Compiles a DML statement and returns the id of its (first) write target.
    pub(crate) fn process_nested_statement(
        &mut self,
        statement: &Statement,
        graph: &mut GraphBuilder,
    ) -> Result<String, CompileError> {
        match statement {
            Statement::Insert(insert) => self.process_insert(insert, graph),
            Statement::Update {
                table,
                assignments,
                from,
                selection,
                ..
            } => self.process_update(table, assignments, from.as_ref(), selection.as_ref(), graph),
            Statement::Delete(delete) => self.process_delete(delete, graph),
            Statement::Merge {
                table,
                source,
                on,
                clauses,
                ..
            } => self.process_merge(table, source, on, clauses, graph),
            Statement::Query(query) => self.process_query(query, graph, QueryRole::Nested),
            _ => {
                let node = FlowNode::new(self.ctx.node_id(NodeKind::Select), NodeKind::Select, "SELECT")
                    .with_description(statement_keyword(statement));
                Ok(graph.add_node(node))
            }
        }
    }

    fn add_write_target(
        &mut self,
        name: &str,
        alias: Option<String>,
        operation: OperationType,
        line_range: Option<LineRange>,
        graph: &mut GraphBuilder,
    ) -> String {
        let mut node = FlowNode::new(self.ctx.node_id(NodeKind::Table), NodeKind::Table, name)
            .with_alias(alias)
            .with_access(AccessMode::Write)
            .with_operation(operation)
            .with_category(TableCategory::Physical);
        node.line_range = line_range;
        if name != TABLE_PLACEHOLDER {
            self.ctx.increment(Counter::Tables);
            self.ctx.track_table_usage(name);
        }
        graph.add_node(node)
    }

    fn process_insert(
        &mut self,
        insert: &Insert,
        graph: &mut GraphBuilder,
    ) -> Result<String, CompileError> {
        let name = insert.table.to_string();
        let line_range = self.ctx.lines.locate(&name);
        let columns: Vec<String> = insert.columns.iter().map(|c| c.value.clone()).collect();

        // INSERT ... VALUES writes literal rows; there is no relation to read from
        let literal_rows = insert.source.as_deref().and_then(|query| match query.body.as_ref() {
            SetExpr::Values(values) if query.with.is_none() => Some(values.rows.len()),
            _ => None,
        });
        let source = match (&insert.source, literal_rows) {
            (Some(query), None) => Some(self.process_query(query, graph, QueryRole::Source)?),
            _ => None,
        };

        let target = self.add_write_target(
            &name,
            insert.table_alias.as_ref().map(|alias| alias.value.clone()),
            OperationType::Insert,
            line_range,
            graph,
        );
        let header = if columns.is_empty() {
            format!("INSERT INTO {name}")
        } else {
            format!("INSERT INTO {name} ({})", columns.join(", "))
        };
        if let Some(node) = graph.node_mut(&target) {
            node.description = Some(match literal_rows {
                Some(rows) => format!("{header} VALUES ({rows} rows)"),
                None => header.clone(),
            });
        }
        if let Some(source) = source {
            let edge = graph.connect(self.ctx, &Relation::node(source), &target, ClauseType::Insert);
            edge.sql_clause = Some(header);
            edge.line_range = line_range;
        }
        Ok(target)
    }

    fn process_update(
        &mut self,
        table: &TableWithJoins,
        assignments: &[Assignment],
        from: Option<&UpdateTableFromKind>,
        selection: Option<&Expr>,
        graph: &mut GraphBuilder,
    ) -> Result<String, CompileError> {
        let name = get_table_name(&table.relation);
        let line_range = self.ctx.lines.locate(&name);
        let mut scope = RelationScope::default();

        // MySQL-style UPDATE a JOIN b and the FROM list both feed the target
        let mut sources = Vec::new();
        for join in &table.joins {
            sources.push(self.process_table_factor(&join.relation, graph, &mut scope)?);
        }
        let from_tables = match from {
            Some(UpdateTableFromKind::BeforeSet(tables) | UpdateTableFromKind::AfterSet(tables)) => {
                tables.as_slice()
            }
            None => &[],
        };
        for source in from_tables {
            sources.push(self.process_table_with_joins(source, graph, &mut scope)?);
        }

        let mut containers = Vec::new();
        for assignment in assignments {
            containers.extend(self.expression_containers(&assignment.value, graph)?);
        }

        let target = self.add_write_target(
            &name,
            table_alias(&table.relation),
            OperationType::Update,
            line_range,
            graph,
        );
        let set_clause = assignments
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        if let Some(node) = graph.node_mut(&target) {
            node.description = Some(format!("SET {set_clause}"));
        }

        for source in &sources {
            graph.connect(self.ctx, source, &target, ClauseType::From);
        }
        self.attach_write_filter(selection, &[target.clone()], containers, StatementKind::Update, graph)?;
        Ok(target)
    }

    fn process_delete(
        &mut self,
        delete: &Delete,
        graph: &mut GraphBuilder,
    ) -> Result<String, CompileError> {
        let from_tables = match &delete.from {
            FromTable::WithFromKeyword(tables) | FromTable::WithoutKeyword(tables) => tables,
        };
        let using = delete.using.as_deref().unwrap_or_default();

        let mut factors: Vec<&TableFactor> = Vec::new();
        for table in from_tables.iter().chain(using) {
            factors.push(&table.relation);
            factors.extend(table.joins.iter().map(|join| &join.relation));
        }

        // DELETE t1 FROM t1 JOIN t2 names its targets explicitly; otherwise the first
        // FROM item is the target
        let target_names: Vec<String> = if delete.tables.is_empty() {
            from_tables
                .first()
                .map(|table| vec![get_table_name(&table.relation)])
                .unwrap_or_else(|| vec![TABLE_PLACEHOLDER.to_string()])
        } else {
            delete
                .tables
                .iter()
                .map(|target| resolve_target(target, &factors))
                .collect()
        };

        let mut target_lines = Vec::with_capacity(target_names.len());
        for name in &target_names {
            target_lines.push(self.ctx.lines.locate(name));
        }

        let mut scope = RelationScope::default();
        let mut sources = Vec::new();
        for factor in factors {
            if is_target(factor, &target_names) {
                continue;
            }
            sources.push(self.process_table_factor(factor, graph, &mut scope)?);
        }

        let mut targets = Vec::with_capacity(target_names.len());
        for (name, line_range) in target_names.iter().zip(target_lines) {
            let alias = factors_alias(from_tables, name);
            let id = self.add_write_target(name, alias, OperationType::Delete, line_range, graph);
            if let Some(node) = graph.node_mut(&id) {
                node.description = Some(format!("DELETE FROM {name}"));
            }
            targets.push(id);
        }

        for target in &targets {
            for source in &sources {
                graph.connect(self.ctx, source, target, ClauseType::From);
            }
        }
        self.attach_write_filter(
            delete.selection.as_ref(),
            &targets,
            Vec::new(),
            StatementKind::Delete,
            graph,
        )?;
        Ok(targets.into_iter().next().unwrap_or_default())
    }

    /// Attaches a DML WHERE to its targets, or records that the write is unfiltered.
    fn attach_write_filter(
        &mut self,
        selection: Option<&Expr>,
        targets: &[String],
        mut containers: Vec<String>,
        kind: StatementKind,
        graph: &mut GraphBuilder,
    ) -> Result<(), CompileError> {
        let Some(selection) = selection else {
            for target in targets {
                self.ctx
                    .findings
                    .unfiltered_writes
                    .push((target.clone(), kind));
            }
            self.connect_containers(containers, targets, graph);
            return Ok(());
        };

        self.ctx.lines.locate("WHERE");
        containers.extend(self.expression_containers(selection, graph)?);
        let conditions = extract_conditions(selection);
        self.ctx.add(Counter::Conditions, count_predicates(selection));
        for target in targets {
            if let Some(node) = graph.node_mut(target) {
                node.conditions = conditions.clone();
            }
        }
        self.connect_containers(containers, targets, graph);
        Ok(())
    }

    fn connect_containers(&mut self, containers: Vec<String>, targets: &[String], graph: &mut GraphBuilder) {
        let Some(target) = targets.first() else {
            return;
        };
        for container in containers {
            graph.connect(self.ctx, &Relation::node(container), target, ClauseType::Subquery);
        }
    }

    fn process_merge(
        &mut self,
        table: &TableFactor,
        source: &TableFactor,
        on: &Expr,
        clauses: &[MergeClause],
        graph: &mut GraphBuilder,
    ) -> Result<String, CompileError> {
        let name = get_table_name(table);
        let line_range = self.ctx.lines.locate(&name);

        let mut scope = RelationScope::default();
        let source = self.process_table_factor(source, graph, &mut scope)?;
        self.ctx.lines.locate("ON");
        let containers = self.expression_containers(on, graph)?;

        let target = self.add_write_target(
            &name,
            table_alias(table),
            OperationType::Merge,
            line_range,
            graph,
        );
        let clause = on.to_string();
        if let Some(node) = graph.node_mut(&target) {
            node.conditions = extract_conditions(on);
            node.description = Some(merge_actions(clauses));
        }
        self.ctx.add(Counter::Conditions, count_predicates(on));

        let edge = graph.connect(self.ctx, &source, &target, ClauseType::Merge);
        edge.sql_clause = Some(clause);
        self.connect_containers(containers, &[target.clone()], graph);
        Ok(target)
    }

    /// CREATE VIEW / CREATE TABLE ... AS: the query feeds a terminal Write result.
    fn process_create_as(
        &mut self,
        name: &ObjectName,
        query: &Query,
        operation: OperationType,
        graph: &mut GraphBuilder,
    ) -> Result<String, CompileError> {
        let name = name.to_string();
        let line_range = self.ctx.lines.locate(&name);
        let terminal = self.process_query(query, graph, QueryRole::Source)?;

        let keyword = match operation {
            OperationType::CreateView => "CREATE VIEW",
            _ => "CREATE TABLE",
        };
        let mut node = FlowNode::new(self.ctx.node_id(NodeKind::Result), NodeKind::Result, &name)
            .with_description(format!("{keyword} {name} AS"))
            .with_access(AccessMode::Write)
            .with_operation(operation)
            .with_category(TableCategory::Physical);
        node.line_range = line_range;
        node.columns = graph
            .node(&terminal)
            .map(|terminal| terminal.columns.clone())
            .unwrap_or_default();
        let result = graph.add_node(node);
        self.ctx.track_table_usage(&name);

        let edge = graph.connect(self.ctx, &Relation::node(terminal), &result, ClauseType::Create);
        edge.sql_clause = Some(format!("{keyword} {name}"));
        edge.line_range = line_range;
        Ok(result)
    }

    fn process_create_table(&mut self, name: &ObjectName, columns: &[ColumnDef], graph: &mut GraphBuilder) {
        let name = name.to_string();
        let line_range = self.ctx.lines.locate(&name);
        let id = self.add_write_target(&name, None, OperationType::CreateTable, line_range, graph);
        if let Some(node) = graph.node_mut(&id) {
            node.description = Some(format!("CREATE TABLE {name} ({} columns)", columns.len()));
            node.columns = columns
                .iter()
                .map(|column| ColumnInfo {
                    name: column.name.value.clone(),
                    expression: column.data_type.to_string(),
                    source_column: None,
                    source_table: None,
                    is_aggregate: false,
                    is_window_func: false,
                    transformation_type: TransformationType::Passthrough,
                    references: Vec::new(),
                })
                .collect();
        }
    }
}

fn dml_kind(statement: &Statement) -> StatementKind {
    match statement {
        Statement::Insert(_) => StatementKind::Insert,
        Statement::Update { .. } => StatementKind::Update,
        Statement::Delete(_) => StatementKind::Delete,
        Statement::Merge { .. } => StatementKind::Merge,
        _ => StatementKind::Other,
    }
}

/// Leading keyword of a statement, used to name unsupported kinds.
fn statement_keyword(statement: &Statement) -> String {
    let text = statement.to_string();
    let mut words = text.split_whitespace();
    match (words.next(), words.next()) {
        (Some(first), Some(second)) if second.chars().all(|c| c.is_ascii_uppercase()) => {
            format!("{first} {second}")
        }
        (Some(first), _) => first.to_string(),
        _ => "UNKNOWN".to_string(),
    }
}

/// Resolves a DELETE target written as an alias to the table it names.
fn resolve_target(target: &ObjectName, factors: &[&TableFactor]) -> String {
    let written = target.to_string();
    factors
        .iter()
        .find(|factor| {
            table_alias(factor).is_some_and(|alias| alias.eq_ignore_ascii_case(&written))
        })
        .map(|factor| get_table_name(factor))
        .unwrap_or(written)
}

fn is_target(factor: &TableFactor, targets: &[String]) -> bool {
    match factor {
        TableFactor::Table { name, .. } => {
            let name = name.to_string();
            targets.iter().any(|target| target.eq_ignore_ascii_case(&name))
        }
        _ => false,
    }
}

fn factors_alias(tables: &[TableWithJoins], name: &str) -> Option<String> {
    tables
        .iter()
        .flat_map(|table| {
            std::iter::once(&table.relation).chain(table.joins.iter().map(|join| &join.relation))
        })
        .find(|factor| is_target(factor, &[name.to_string()]))
        .and_then(table_alias)
}

fn merge_actions(clauses: &[MergeClause]) -> String {
    let actions: Vec<String> = clauses
        .iter()
        .map(|clause| {
            let action = match &clause.action {
                MergeAction::Insert(_) => "INSERT",
                MergeAction::Update { .. } => "UPDATE",
                MergeAction::Delete => "DELETE",
                #[allow(unreachable_patterns)]
                _ => "ACTION",
            };
            format!("WHEN {} THEN {action}", clause.clause_kind)
        })
        .collect();
    if actions.is_empty() {
        "MERGE".to_string()
    } else {
        actions.join("; ")
    }
}
