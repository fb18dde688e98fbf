//! Readable predicate rendering for Filter and Join nodes.

use sqlparser::ast::{
    BinaryOperator, DuplicateTreatment, Expr, FunctionArg, FunctionArgExpr, FunctionArguments,
    UnaryOperator,
};

/// At most this many predicates are listed on a node.
pub const MAX_CONDITIONS: usize = 5;

/// AND/OR chains are split this many levels deep; deeper chains render as one predicate.
/// Parentheses do not count as a level.
const MAX_SPLIT_DEPTH: usize = 3;

/// Operands nested deeper than this render as `?`.
const MAX_FORMAT_DEPTH: usize = 6;

/// Splits a predicate on AND/OR and renders each leaf, up to [`MAX_CONDITIONS`] entries.
pub fn extract_conditions(expr: &Expr) -> Vec<String> {
    let mut out = Vec::new();
    split_conditions(expr, 0, &mut out);
    out
}

fn split_conditions(expr: &Expr, depth: usize, out: &mut Vec<String>) {
    if out.len() >= MAX_CONDITIONS {
        return;
    }
    match expr {
        Expr::BinaryOp {
            left,
            op: BinaryOperator::And | BinaryOperator::Or,
            right,
        } if depth < MAX_SPLIT_DEPTH => {
            split_conditions(left, depth + 1, out);
            split_conditions(right, depth + 1, out);
        }
        Expr::Nested(inner) if depth < MAX_SPLIT_DEPTH && is_logical(inner) => {
            split_conditions(inner, depth, out);
        }
        _ => out.push(format_expr(expr)),
    }
}

fn is_logical(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::BinaryOp {
            op: BinaryOperator::And | BinaryOperator::Or,
            ..
        }
    )
}

/// Number of leaf predicates in `expr`, without the display cap.
pub fn count_predicates(expr: &Expr) -> u32 {
    match expr {
        Expr::BinaryOp {
            left,
            op: BinaryOperator::And | BinaryOperator::Or,
            right,
        } => count_predicates(left) + count_predicates(right),
        Expr::Nested(inner) if is_logical(inner) => count_predicates(inner),
        _ => 1,
    }
}

/// Renders an expression in a compact readable form.
///
/// Binary comparisons print as `left op right`; unknown shapes and anything past the
/// depth limit print as `?`.
pub fn format_expr(expr: &Expr) -> String {
    format_operand(expr, 0)
}

fn format_operand(expr: &Expr, depth: usize) -> String {
    if depth > MAX_FORMAT_DEPTH {
        return "?".to_string();
    }
    let next = depth + 1;
    let not = |negated: &bool| if *negated { "NOT " } else { "" };
    match expr {
        Expr::Identifier(ident) => ident.value.clone(),
        Expr::CompoundIdentifier(parts) => parts
            .iter()
            .map(|part| part.value.as_str())
            .collect::<Vec<_>>()
            .join("."),
        Expr::Value(value) => value.value.to_string(),
        Expr::BinaryOp { left, op, right } => format!(
            "{} {op} {}",
            format_operand(left, next),
            format_operand(right, next)
        ),
        Expr::UnaryOp { op, expr } => match op {
            UnaryOperator::Minus | UnaryOperator::Plus => {
                format!("{op}{}", format_operand(expr, next))
            }
            _ => format!("{op} {}", format_operand(expr, next)),
        },
        Expr::Nested(inner) => format!("({})", format_operand(inner, next)),
        Expr::Function(func) => {
            let name = func.name.to_string();
            match &func.args {
                FunctionArguments::None => name,
                FunctionArguments::Subquery(_) => format!("{name}(subquery)"),
                FunctionArguments::List(list) => {
                    let distinct = match list.duplicate_treatment {
                        Some(DuplicateTreatment::Distinct) => "DISTINCT ",
                        _ => "",
                    };
                    let args = list
                        .args
                        .iter()
                        .map(|arg| format_function_arg(arg, next))
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("{name}({distinct}{args})")
                }
            }
        }
        Expr::InList {
            expr,
            list,
            negated,
        } => {
            let items = list
                .iter()
                .map(|item| format_operand(item, next))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{} {}IN ({items})", format_operand(expr, next), not(negated))
        }
        Expr::InSubquery { expr, negated, .. } => {
            format!("{} {}IN (subquery)", format_operand(expr, next), not(negated))
        }
        Expr::Exists { negated, .. } => format!("{}EXISTS (subquery)", not(negated)),
        Expr::Subquery(_) => "(subquery)".to_string(),
        Expr::Between {
            expr,
            negated,
            low,
            high,
        } => format!(
            "{} {}BETWEEN {} AND {}",
            format_operand(expr, next),
            not(negated),
            format_operand(low, next),
            format_operand(high, next)
        ),
        Expr::IsNull(inner) => format!("{} IS NULL", format_operand(inner, next)),
        Expr::IsNotNull(inner) => format!("{} IS NOT NULL", format_operand(inner, next)),
        Expr::IsTrue(inner) => format!("{} IS TRUE", format_operand(inner, next)),
        Expr::IsFalse(inner) => format!("{} IS FALSE", format_operand(inner, next)),
        Expr::Like {
            negated,
            expr,
            pattern,
            ..
        } => format!(
            "{} {}LIKE {}",
            format_operand(expr, next),
            not(negated),
            format_operand(pattern, next)
        ),
        Expr::ILike {
            negated,
            expr,
            pattern,
            ..
        } => format!(
            "{} {}ILIKE {}",
            format_operand(expr, next),
            not(negated),
            format_operand(pattern, next)
        ),
        Expr::Cast {
            expr, data_type, ..
        } => format!("CAST({} AS {data_type})", format_operand(expr, next)),
        Expr::Tuple(items) => format!(
            "({})",
            items
                .iter()
                .map(|item| format_operand(item, next))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        Expr::Case { .. } => "CASE ... END".to_string(),
        _ => "?".to_string(),
    }
}

fn format_function_arg(arg: &FunctionArg, depth: usize) -> String {
    let arg_expr = |arg: &FunctionArgExpr| match arg {
        FunctionArgExpr::Expr(expr) => format_operand(expr, depth),
        FunctionArgExpr::Wildcard => "*".to_string(),
        FunctionArgExpr::QualifiedWildcard(name) => format!("{name}.*"),
    };
    match arg {
        FunctionArg::Unnamed(inner) => arg_expr(inner),
        FunctionArg::Named { name, arg, .. } => format!("{name} => {}", arg_expr(arg)),
        FunctionArg::ExprNamed { name, arg, .. } => {
            format!("{} => {}", format_operand(name, depth), arg_expr(arg))
        }
    }
}
