//! Pure functions that pull structured facts out of sqlparser AST fragments.
//!
//! Nothing here touches the flow graph; the statement processor decides where the facts go.

pub mod conditions;
mod details;
pub(crate) mod walk;

pub use conditions::{count_predicates, extract_conditions, format_expr, MAX_CONDITIONS};
pub use details::{
    extract_aggregate_function_details, extract_case_statement_details,
    extract_window_function_details, resolve_window_function_name,
};

use crate::functions::{is_aggregate_function, is_unit_argument};
use crate::types::{ColumnInfo, ColumnReference, Dialect, ExpressionFormat, TransformationType};
use sqlparser::ast::{
    Expr, FromTable, GroupByExpr, ObjectName, Query, SelectItem, SelectItemQualifiedWildcardKind,
    SetExpr, Statement, TableFactor, TableWithJoins, UpdateTableFromKind, Value,
};
use std::collections::HashSet;
use walk::{expression_subqueries, function_arg_exprs, walk_expr, Descend};

/// Name used when a relation has neither an explicit name nor an alias.
pub const TABLE_PLACEHOLDER: &str = "table";

/// Describes every item of a projection.
///
/// A projection consisting solely of `*` yields an empty list; a wildcard mixed with
/// other items yields a `*` entry in its position.
pub fn extract_column_infos(
    projection: &[SelectItem],
    dialect: Dialect,
    format: ExpressionFormat,
) -> Vec<ColumnInfo> {
    if let [SelectItem::Wildcard(_)] = projection {
        return Vec::new();
    }
    projection
        .iter()
        .map(|item| column_info(item, dialect, format))
        .collect()
}

fn column_info(item: &SelectItem, dialect: Dialect, format: ExpressionFormat) -> ColumnInfo {
    match item {
        SelectItem::UnnamedExpr(expr) => expression_column(expr, None, dialect, format),
        SelectItem::ExprWithAlias { expr, alias } => {
            expression_column(expr, Some(alias.value.as_str()), dialect, format)
        }
        SelectItem::Wildcard(_) => wildcard_column("*".to_string(), None),
        SelectItem::QualifiedWildcard(kind, _) => {
            let qualifier = match kind {
                SelectItemQualifiedWildcardKind::ObjectName(name) => name.to_string(),
                SelectItemQualifiedWildcardKind::Expr(expr) => expr.to_string(),
            };
            wildcard_column(format!("{qualifier}.*"), Some(qualifier))
        }
    }
}

fn wildcard_column(name: String, qualifier: Option<String>) -> ColumnInfo {
    ColumnInfo {
        expression: name.clone(),
        name,
        source_column: None,
        source_table: qualifier,
        is_aggregate: false,
        is_window_func: false,
        transformation_type: TransformationType::Passthrough,
        references: Vec::new(),
    }
}

fn expression_column(
    expr: &Expr,
    alias: Option<&str>,
    dialect: Dialect,
    format: ExpressionFormat,
) -> ColumnInfo {
    let name = alias
        .map(str::to_string)
        .unwrap_or_else(|| derive_column_name(expr));
    let references = collect_column_refs(expr);
    let is_window_func = contains_window_function(expr);
    let is_aggregate = contains_aggregate(expr, dialect);
    let direct = column_ref(strip_cast(expr));

    let transformation_type = if is_window_func {
        TransformationType::Calculated
    } else if is_aggregate {
        TransformationType::Aggregated
    } else {
        match (column_ref(expr), alias) {
            (Some(_), Some(_)) => TransformationType::Renamed,
            _ => TransformationType::Passthrough,
        }
    };

    let source = direct.or_else(|| match references.as_slice() {
        [only] => Some(only.clone()),
        _ => None,
    });

    ColumnInfo {
        name,
        expression: render_expression(expr, format),
        source_column: source.as_ref().map(|r| r.column.clone()),
        source_table: source.and_then(|r| r.table),
        is_aggregate,
        is_window_func,
        transformation_type,
        references,
    }
}

/// Renders an expression as SQL text or as the JSON form of its AST.
pub fn render_expression(expr: &Expr, format: ExpressionFormat) -> String {
    match format {
        ExpressionFormat::Sql => expr.to_string(),
        ExpressionFormat::Json => {
            serde_json::to_string(expr).unwrap_or_else(|_| expr.to_string())
        }
    }
}

/// Output name of an unaliased projection item.
///
/// Column name (looking through one CAST), then function name, then literal value,
/// then `expr`.
pub fn derive_column_name(expr: &Expr) -> String {
    match strip_cast(expr) {
        Expr::Identifier(ident) => ident.value.clone(),
        Expr::CompoundIdentifier(parts) => parts
            .last()
            .map(|part| part.value.clone())
            .unwrap_or_else(|| "expr".to_string()),
        Expr::Function(func) => object_name_tail(&func.name),
        Expr::Value(value) => match &value.value {
            Value::SingleQuotedString(s) | Value::DoubleQuotedString(s) => s.clone(),
            Value::Number(n, _) => n.clone(),
            Value::Boolean(b) => b.to_string(),
            other => other.to_string(),
        },
        _ => "expr".to_string(),
    }
}

fn strip_cast(expr: &Expr) -> &Expr {
    match expr {
        Expr::Cast { expr: inner, .. } => inner,
        _ => expr,
    }
}

/// Last segment of a possibly qualified name, without quotes.
pub(crate) fn object_name_tail(name: &ObjectName) -> String {
    let text = name.to_string();
    let tail = text.rsplit('.').next().unwrap_or(&text);
    tail.trim_matches(|c| c == '"' || c == '`' || c == '[' || c == ']')
        .to_string()
}

/// The column an identifier expression names, if it is one.
pub fn column_ref(expr: &Expr) -> Option<ColumnReference> {
    match expr {
        Expr::Identifier(ident) => Some(ColumnReference {
            table: None,
            column: ident.value.clone(),
        }),
        Expr::CompoundIdentifier(parts) => {
            let (last, qualifier) = parts.split_last()?;
            let table = (!qualifier.is_empty()).then(|| {
                qualifier
                    .iter()
                    .map(|part| part.value.as_str())
                    .collect::<Vec<_>>()
                    .join(".")
            });
            Some(ColumnReference {
                table,
                column: last.value.clone(),
            })
        }
        _ => None,
    }
}

/// Every column `expr` reads in this scope, first-seen order, without duplicates.
///
/// Unit keywords such as the `day` in `DATEDIFF(day, a, b)` are not columns and are skipped.
pub fn collect_column_refs(expr: &Expr) -> Vec<ColumnReference> {
    let mut refs = Vec::new();
    collect_refs_into(expr, &mut refs);
    refs
}

fn collect_refs_into(expr: &Expr, refs: &mut Vec<ColumnReference>) {
    walk_expr(expr, &mut |e| match e {
        Expr::Identifier(_) | Expr::CompoundIdentifier(_) => {
            if let Some(reference) = column_ref(e) {
                if !refs.contains(&reference) {
                    refs.push(reference);
                }
            }
            Descend::No
        }
        Expr::Function(func) => {
            let name = func.name.to_string();
            let args = function_arg_exprs(&func.args);
            if (0..args.len()).any(|index| is_unit_argument(&name, index)) {
                for (index, arg) in args.into_iter().enumerate() {
                    if !is_unit_argument(&name, index) {
                        collect_refs_into(arg, refs);
                    }
                }
                Descend::No
            } else {
                Descend::Yes
            }
        }
        _ => Descend::Yes,
    });
}

/// Whether any function in `expr` carries an OVER clause.
pub fn contains_window_function(expr: &Expr) -> bool {
    let mut found = false;
    walk_expr(expr, &mut |e| {
        if matches!(e, Expr::Function(func) if func.over.is_some()) {
            found = true;
        }
        if found {
            Descend::No
        } else {
            Descend::Yes
        }
    });
    found
}

/// Whether `expr` calls a non-windowed aggregate function.
pub fn contains_aggregate(expr: &Expr, dialect: Dialect) -> bool {
    let mut found = false;
    walk_expr(expr, &mut |e| {
        if let Expr::Function(func) = e {
            if func.over.is_none() && is_aggregate_function(&func.name.to_string(), dialect) {
                found = true;
            }
        }
        if found {
            Descend::No
        } else {
            Descend::Yes
        }
    });
    found
}

/// Display names of GROUP BY keys; plain columns show only their final identifier.
pub fn group_by_names(group_by: &GroupByExpr) -> Vec<String> {
    match group_by {
        GroupByExpr::All(_) => vec!["ALL".to_string()],
        GroupByExpr::Expressions(exprs, _) => exprs
            .iter()
            .map(|expr| match column_ref(expr) {
                Some(reference) => reference.column,
                None => format_expr(expr),
            })
            .collect(),
    }
}

/// Whether a GROUP BY clause is present.
pub fn has_group_by(group_by: &GroupByExpr) -> bool {
    match group_by {
        GroupByExpr::All(_) => true,
        GroupByExpr::Expressions(exprs, _) => !exprs.is_empty(),
    }
}

/// Alias a FROM item was given, if any.
pub fn table_alias(factor: &TableFactor) -> Option<String> {
    match factor {
        TableFactor::Table { alias, .. }
        | TableFactor::Derived { alias, .. }
        | TableFactor::TableFunction { alias, .. }
        | TableFactor::Function { alias, .. }
        | TableFactor::UNNEST { alias, .. }
        | TableFactor::NestedJoin { alias, .. }
        | TableFactor::Pivot { alias, .. }
        | TableFactor::Unpivot { alias, .. }
        | TableFactor::MatchRecognize { alias, .. } => {
            alias.as_ref().map(|alias| alias.name.value.clone())
        }
        _ => None,
    }
}

/// Display name of a FROM item: explicit name, then alias, then [`TABLE_PLACEHOLDER`].
pub fn get_table_name(factor: &TableFactor) -> String {
    match factor {
        TableFactor::Table { name, .. } | TableFactor::Function { name, .. } => name.to_string(),
        TableFactor::TableFunction {
            expr: Expr::Function(func),
            ..
        } => func.name.to_string(),
        _ => table_alias(factor).unwrap_or_else(|| TABLE_PLACEHOLDER.to_string()),
    }
}

/// Name of the function a FROM item invokes, when it is a function call rather than
/// a stored relation.
pub fn table_function_name(factor: &TableFactor) -> Option<String> {
    match factor {
        TableFactor::Table {
            name,
            args: Some(_),
            ..
        }
        | TableFactor::Function { name, .. } => Some(name.to_string()),
        TableFactor::TableFunction { expr, .. } => Some(match expr {
            Expr::Function(func) => func.name.to_string(),
            _ => "TABLE".to_string(),
        }),
        TableFactor::UNNEST { .. } => Some("UNNEST".to_string()),
        _ => None,
    }
}

/// Stored tables a statement touches, first-seen order, deduplicated case-insensitively.
///
/// Table-valued functions, names bound by a WITH clause and the placeholder name are
/// left out.
pub fn extract_tables_from_statement(statement: &Statement) -> Vec<String> {
    let mut collector = TableCollector::default();
    collector.statement(statement);
    collector.finish()
}

#[derive(Default)]
struct TableCollector {
    tables: Vec<String>,
    ctes: HashSet<String>,
}

impl TableCollector {
    fn finish(self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.tables
            .into_iter()
            .filter(|name| name != TABLE_PLACEHOLDER)
            .filter(|name| !self.ctes.contains(&name.to_ascii_lowercase()))
            .filter(|name| seen.insert(name.to_ascii_lowercase()))
            .collect()
    }

    fn statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Query(query) => self.query(query),
            Statement::Insert(insert) => {
                self.tables.push(insert.table.to_string());
                if let Some(source) = &insert.source {
                    self.query(source);
                }
            }
            Statement::Update {
                table,
                from,
                selection,
                ..
            } => {
                self.table_with_joins(table);
                if let Some(UpdateTableFromKind::BeforeSet(from) | UpdateTableFromKind::AfterSet(from)) =
                    from
                {
                    from.iter().for_each(|t| self.table_with_joins(t));
                }
                if let Some(selection) = selection {
                    self.expr(selection);
                }
            }
            Statement::Delete(delete) => {
                for name in &delete.tables {
                    self.tables.push(name.to_string());
                }
                let (FromTable::WithFromKeyword(from) | FromTable::WithoutKeyword(from)) =
                    &delete.from;
                from.iter().for_each(|t| self.table_with_joins(t));
                if let Some(using) = &delete.using {
                    using.iter().for_each(|t| self.table_with_joins(t));
                }
                if let Some(selection) = &delete.selection {
                    self.expr(selection);
                }
            }
            Statement::Merge { table, source, .. } => {
                self.factor(table);
                self.factor(source);
            }
            Statement::CreateView { query, .. } => self.query(query),
            Statement::CreateTable(create) => {
                self.tables.push(create.name.to_string());
                if let Some(query) = &create.query {
                    self.query(query);
                }
            }
            _ => {}
        }
    }

    fn query(&mut self, query: &Query) {
        if let Some(with) = &query.with {
            for cte in &with.cte_tables {
                self.ctes.insert(cte.alias.name.value.to_ascii_lowercase());
                self.query(&cte.query);
            }
        }
        self.set_expr(&query.body);
    }

    fn set_expr(&mut self, body: &SetExpr) {
        match body {
            SetExpr::Select(select) => {
                select.from.iter().for_each(|t| self.table_with_joins(t));
                for item in &select.projection {
                    if let SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } =
                        item
                    {
                        self.expr(expr);
                    }
                }
                if let Some(selection) = &select.selection {
                    self.expr(selection);
                }
                if let Some(having) = &select.having {
                    self.expr(having);
                }
            }
            SetExpr::Query(query) => self.query(query),
            SetExpr::SetOperation { left, right, .. } => {
                self.set_expr(left);
                self.set_expr(right);
            }
            SetExpr::Insert(statement)
            | SetExpr::Update(statement)
            | SetExpr::Delete(statement)
            | SetExpr::Merge(statement) => self.statement(statement),
            SetExpr::Table(table) => {
                if let Some(name) = &table.table_name {
                    self.tables.push(name.clone());
                }
            }
            _ => {}
        }
    }

    fn table_with_joins(&mut self, table: &TableWithJoins) {
        self.factor(&table.relation);
        for join in &table.joins {
            self.factor(&join.relation);
        }
    }

    fn factor(&mut self, factor: &TableFactor) {
        if table_function_name(factor).is_some() {
            return;
        }
        match factor {
            TableFactor::Table { name, .. } => self.tables.push(name.to_string()),
            TableFactor::Derived { subquery, .. } => self.query(subquery),
            TableFactor::NestedJoin {
                table_with_joins, ..
            } => self.table_with_joins(table_with_joins),
            TableFactor::Pivot { table, .. }
            | TableFactor::Unpivot { table, .. }
            | TableFactor::MatchRecognize { table, .. } => self.factor(table),
            _ => {}
        }
    }

    fn expr(&mut self, expr: &Expr) {
        for subquery in expression_subqueries(expr) {
            self.query(subquery);
        }
    }
}
