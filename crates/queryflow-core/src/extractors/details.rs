//! Window, aggregate and CASE payloads attached to projection nodes.

use super::conditions::format_expr;
use super::walk::{function_arg_exprs, walk_expr, Descend};
use super::{collect_column_refs, object_name_tail};
use crate::functions::{is_aggregate_function, window_function_names};
use crate::types::{
    AggregateFunctionDetail, Attribution, CaseBranch, CaseDetail, Dialect, WindowFunctionDetail,
};
use sqlparser::ast::{
    DuplicateTreatment, Expr, FunctionArg, FunctionArgExpr, FunctionArguments, SelectItem,
    WindowFrame, WindowType,
};

/// Alias fragments that hint at the window function producing a column.
const ALIAS_HINTS: &[(&str, &str)] = &[
    ("row_num", "ROW_NUMBER"),
    ("dense_rank", "DENSE_RANK"),
    ("rank", "RANK"),
    ("ntile", "NTILE"),
    ("bucket", "NTILE"),
    ("lag", "LAG"),
    ("prev", "LAG"),
    ("lead", "LEAD"),
    ("next", "LEAD"),
    ("first", "FIRST_VALUE"),
    ("last", "LAST_VALUE"),
    ("running", "SUM"),
    ("cumulative", "SUM"),
];

fn item_parts(item: &SelectItem) -> Option<(&Expr, Option<&str>)> {
    match item {
        SelectItem::UnnamedExpr(expr) => Some((expr, None)),
        SelectItem::ExprWithAlias { expr, alias } => Some((expr, Some(alias.value.as_str()))),
        _ => None,
    }
}

/// Window function calls in a projection, in source order.
pub fn extract_window_function_details(
    projection: &[SelectItem],
    dialect: Dialect,
) -> Vec<WindowFunctionDetail> {
    let mut details = Vec::new();
    for (expr, alias) in projection.iter().filter_map(item_parts) {
        walk_expr(expr, &mut |e| {
            let Expr::Function(func) = e else {
                return Descend::Yes;
            };
            let Some(over) = &func.over else {
                return Descend::Yes;
            };
            let expression = e.to_string();
            let explicit = object_name_tail(&func.name);
            let (partition_by, order_by, frame) = match over {
                WindowType::WindowSpec(spec) => (
                    spec.partition_by.iter().map(format_expr).collect(),
                    spec.order_by.iter().map(ToString::to_string).collect(),
                    spec.window_frame.as_ref().map(frame_text),
                ),
                WindowType::NamedWindow(name) => (Vec::new(), Vec::new(), Some(name.to_string())),
            };
            details.push(WindowFunctionDetail {
                name: resolve_window_function_name(Some(&explicit), alias, &expression, dialect),
                expression,
                partition_by,
                order_by,
                frame,
                alias: alias.map(str::to_string),
            });
            Descend::No
        });
    }
    details
}

/// `ROWS BETWEEN <start> AND <end>`, or `ROWS <start>` for the shorthand form.
fn frame_text(frame: &WindowFrame) -> String {
    match &frame.end_bound {
        Some(end) => format!("{} BETWEEN {} AND {end}", frame.units, frame.start_bound),
        None => format!("{} {}", frame.units, frame.start_bound),
    }
}

/// Names the function behind a windowed expression.
///
/// An explicit name is authoritative. Without one, the alias is matched against common
/// naming patterns and then the expression text is scanned for a known window function
/// of the dialect; either fallback is marked [`Attribution::Guessed`].
pub fn resolve_window_function_name(
    explicit: Option<&str>,
    alias: Option<&str>,
    expression: &str,
    dialect: Dialect,
) -> Attribution<String> {
    if let Some(name) = explicit.map(str::trim).filter(|name| !name.is_empty()) {
        return Attribution::Resolved(name.to_ascii_uppercase());
    }

    if let Some(alias) = alias.map(str::to_ascii_lowercase) {
        if let Some((_, name)) = ALIAS_HINTS.iter().find(|(hint, _)| alias.contains(hint)) {
            return Attribution::Guessed((*name).to_string());
        }
    }

    let lowered = expression.to_ascii_lowercase();
    let mut candidates = window_function_names(dialect);
    // dense_rank( must win over rank(
    candidates.sort_by_key(|name| std::cmp::Reverse(name.len()));
    candidates
        .into_iter()
        .find(|name| lowered.contains(&format!("{name}(")))
        .map(|name| Attribution::Guessed(name.to_ascii_uppercase()))
        .unwrap_or_else(|| Attribution::Guessed("WINDOW".to_string()))
}

/// Non-windowed aggregate calls in a projection.
///
/// Calls are deduplicated on (name, expression, source column); the first occurrence
/// keeps its alias. The alias is only recorded when the call is the whole projected item.
pub fn extract_aggregate_function_details(
    projection: &[SelectItem],
    dialect: Dialect,
) -> Vec<AggregateFunctionDetail> {
    let mut details: Vec<AggregateFunctionDetail> = Vec::new();
    for (item_expr, alias) in projection.iter().filter_map(item_parts) {
        walk_expr(item_expr, &mut |e| {
            let Expr::Function(func) = e else {
                return Descend::Yes;
            };
            if func.over.is_some() || !is_aggregate_function(&func.name.to_string(), dialect) {
                return Descend::Yes;
            }

            let arg_exprs = function_arg_exprs(&func.args);
            let mut sources = arg_exprs.iter().flat_map(|arg| collect_column_refs(arg));
            let source_column = match (sources.next(), sources.next()) {
                (Some(only), None) => Some(only.column),
                _ => None,
            };
            let detail = AggregateFunctionDetail {
                name: object_name_tail(&func.name).to_ascii_uppercase(),
                expression: e.to_string(),
                arguments: function_arguments(&func.args),
                distinct: matches!(
                    &func.args,
                    FunctionArguments::List(list)
                        if list.duplicate_treatment == Some(DuplicateTreatment::Distinct)
                ),
                alias: std::ptr::eq(e, item_expr)
                    .then(|| alias.map(str::to_string))
                    .flatten(),
                source_column,
            };

            let duplicate = details.iter().any(|seen| {
                seen.name == detail.name
                    && seen.expression == detail.expression
                    && seen.source_column == detail.source_column
            });
            if !duplicate {
                details.push(detail);
            }
            Descend::No
        });
    }
    details
}

fn function_arguments(args: &FunctionArguments) -> Vec<String> {
    match args {
        FunctionArguments::List(list) => list
            .args
            .iter()
            .map(|arg| match arg {
                FunctionArg::Unnamed(FunctionArgExpr::Expr(expr)) => format_expr(expr),
                FunctionArg::Unnamed(FunctionArgExpr::Wildcard) => "*".to_string(),
                other => other.to_string(),
            })
            .collect(),
        FunctionArguments::None | FunctionArguments::Subquery(_) => Vec::new(),
    }
}

/// CASE expressions in a projection, outermost first.
pub fn extract_case_statement_details(projection: &[SelectItem]) -> Vec<CaseDetail> {
    let mut details = Vec::new();
    for (item_expr, alias) in projection.iter().filter_map(item_parts) {
        walk_expr(item_expr, &mut |e| {
            if let Expr::Case {
                operand,
                conditions,
                else_result,
                ..
            } = e
            {
                details.push(CaseDetail {
                    operand: operand.as_ref().map(|op| op.to_string()),
                    branches: conditions
                        .iter()
                        .map(|when| CaseBranch {
                            condition: when.condition.to_string(),
                            result: when.result.to_string(),
                        })
                        .collect(),
                    else_result: else_result.as_ref().map(|el| el.to_string()),
                    alias: std::ptr::eq(e, item_expr)
                        .then(|| alias.map(str::to_string))
                        .flatten(),
                });
            }
            Descend::Yes
        });
    }
    details
}
