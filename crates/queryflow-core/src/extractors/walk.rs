//! Scope-local expression traversal.
//!
//! Walks an expression tree and invokes a callback on every node, without entering
//! subqueries: their contents belong to a nested scope and are compiled separately.

use sqlparser::ast::{
    AccessExpr, Expr, FunctionArg, FunctionArgExpr, FunctionArgumentClause, FunctionArguments,
    Query, Subscript, WindowType,
};

/// Whether the walker should visit the children of the expression just seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Descend {
    Yes,
    No,
}

/// Recursively visits `expr` and its children in source order.
pub(crate) fn walk_expr<'a, F>(expr: &'a Expr, visitor: &mut F)
where
    F: FnMut(&'a Expr) -> Descend,
{
    if visitor(expr) == Descend::No {
        return;
    }
    match expr {
        Expr::BinaryOp { left, right, .. } => {
            walk_expr(left, visitor);
            walk_expr(right, visitor);
        }
        Expr::AnyOp { left, right, .. } | Expr::AllOp { left, right, .. } => {
            walk_expr(left, visitor);
            walk_expr(right, visitor);
        }
        Expr::UnaryOp { expr: inner, .. }
        | Expr::Nested(inner)
        | Expr::Cast { expr: inner, .. }
        | Expr::IsNull(inner)
        | Expr::IsNotNull(inner)
        | Expr::IsTrue(inner)
        | Expr::IsFalse(inner)
        | Expr::IsNotTrue(inner)
        | Expr::IsNotFalse(inner)
        | Expr::IsUnknown(inner)
        | Expr::IsNotUnknown(inner)
        | Expr::IsNormalized { expr: inner, .. }
        | Expr::Collate { expr: inner, .. }
        | Expr::Extract { expr: inner, .. }
        | Expr::Ceil { expr: inner, .. }
        | Expr::Floor { expr: inner, .. }
        | Expr::JsonAccess { value: inner, .. }
        | Expr::Prefixed { value: inner, .. }
        | Expr::Named { expr: inner, .. }
        | Expr::OuterJoin(inner)
        | Expr::Prior(inner) => walk_expr(inner, visitor),
        Expr::Interval(interval) => walk_expr(&interval.value, visitor),
        Expr::IsDistinctFrom(left, right)
        | Expr::IsNotDistinctFrom(left, right)
        | Expr::Position {
            expr: left,
            r#in: right,
        }
        | Expr::AtTimeZone {
            timestamp: left,
            time_zone: right,
        }
        | Expr::InUnnest {
            expr: left,
            array_expr: right,
            ..
        }
        | Expr::RLike {
            expr: left,
            pattern: right,
            ..
        } => {
            walk_expr(left, visitor);
            walk_expr(right, visitor);
        }
        Expr::MemberOf(member) => {
            walk_expr(&member.value, visitor);
            walk_expr(&member.array, visitor);
        }
        Expr::Substring {
            expr,
            substring_from,
            substring_for,
            ..
        } => {
            walk_expr(expr, visitor);
            for part in [substring_from, substring_for].into_iter().flatten() {
                walk_expr(part, visitor);
            }
        }
        Expr::Trim {
            expr,
            trim_what,
            trim_characters,
            ..
        } => {
            if let Some(what) = trim_what {
                walk_expr(what, visitor);
            }
            walk_expr(expr, visitor);
            for item in trim_characters.iter().flatten() {
                walk_expr(item, visitor);
            }
        }
        Expr::Overlay {
            expr,
            overlay_what,
            overlay_from,
            overlay_for,
        } => {
            walk_expr(expr, visitor);
            walk_expr(overlay_what, visitor);
            walk_expr(overlay_from, visitor);
            if let Some(len) = overlay_for {
                walk_expr(len, visitor);
            }
        }
        Expr::Convert { expr, styles, .. } => {
            walk_expr(expr, visitor);
            for style in styles {
                walk_expr(style, visitor);
            }
        }
        // Dot segments name fields of the root, not columns of the scope.
        Expr::CompoundFieldAccess { root, access_chain } => {
            walk_expr(root, visitor);
            for access in access_chain {
                match access {
                    AccessExpr::Subscript(Subscript::Index { index }) => walk_expr(index, visitor),
                    AccessExpr::Subscript(Subscript::Slice {
                        lower_bound,
                        upper_bound,
                        stride,
                    }) => {
                        for bound in [lower_bound, upper_bound, stride].into_iter().flatten() {
                            walk_expr(bound, visitor);
                        }
                    }
                    AccessExpr::Dot(_) => {}
                }
            }
        }
        Expr::Array(array) => {
            for item in &array.elem {
                walk_expr(item, visitor);
            }
        }
        Expr::Struct { values, .. } => {
            for item in values {
                walk_expr(item, visitor);
            }
        }
        Expr::Map(map) => {
            for entry in &map.entries {
                walk_expr(&entry.key, visitor);
                walk_expr(&entry.value, visitor);
            }
        }
        Expr::Dictionary(fields) => {
            for field in fields {
                walk_expr(&field.value, visitor);
            }
        }
        Expr::GroupingSets(sets) | Expr::Cube(sets) | Expr::Rollup(sets) => {
            for item in sets.iter().flatten() {
                walk_expr(item, visitor);
            }
        }
        Expr::Case {
            operand,
            conditions,
            else_result,
            ..
        } => {
            if let Some(op) = operand {
                walk_expr(op, visitor);
            }
            for case_when in conditions {
                walk_expr(&case_when.condition, visitor);
                walk_expr(&case_when.result, visitor);
            }
            if let Some(el) = else_result {
                walk_expr(el, visitor);
            }
        }
        Expr::Function(func) => {
            for arg in function_arg_exprs(&func.args) {
                walk_expr(arg, visitor);
            }
            if let FunctionArguments::List(list) = &func.args {
                for clause in &list.clauses {
                    if let FunctionArgumentClause::OrderBy(order_by) = clause {
                        for item in order_by {
                            walk_expr(&item.expr, visitor);
                        }
                    }
                }
            }
            if let Some(WindowType::WindowSpec(spec)) = &func.over {
                for partition in &spec.partition_by {
                    walk_expr(partition, visitor);
                }
                for order in &spec.order_by {
                    walk_expr(&order.expr, visitor);
                }
            }
        }
        Expr::InSubquery { expr: inner, .. } => walk_expr(inner, visitor),
        Expr::Between {
            expr, low, high, ..
        } => {
            walk_expr(expr, visitor);
            walk_expr(low, visitor);
            walk_expr(high, visitor);
        }
        Expr::InList { expr, list, .. } => {
            walk_expr(expr, visitor);
            for item in list {
                walk_expr(item, visitor);
            }
        }
        Expr::Like { expr, pattern, .. }
        | Expr::ILike { expr, pattern, .. }
        | Expr::SimilarTo { expr, pattern, .. } => {
            walk_expr(expr, visitor);
            walk_expr(pattern, visitor);
        }
        Expr::Tuple(items) => {
            for item in items {
                walk_expr(item, visitor);
            }
        }
        _ => {}
    }
}

/// Plain expression arguments of a function call, in order.
pub(crate) fn function_arg_exprs(args: &FunctionArguments) -> Vec<&Expr> {
    match args {
        FunctionArguments::List(list) => list
            .args
            .iter()
            .filter_map(|arg| match arg {
                FunctionArg::Unnamed(FunctionArgExpr::Expr(expr))
                | FunctionArg::Named {
                    arg: FunctionArgExpr::Expr(expr),
                    ..
                }
                | FunctionArg::ExprNamed {
                    arg: FunctionArgExpr::Expr(expr),
                    ..
                } => Some(expr),
                _ => None,
            })
            .collect(),
        FunctionArguments::None | FunctionArguments::Subquery(_) => Vec::new(),
    }
}

/// Subqueries appearing directly in `expr` (IN, EXISTS, scalar), in source order.
pub(crate) fn expression_subqueries(expr: &Expr) -> Vec<&Query> {
    let mut found = Vec::new();
    walk_expr(expr, &mut |e| {
        match e {
            Expr::InSubquery { subquery, .. } => found.push(subquery.as_ref()),
            Expr::Exists { subquery, .. } | Expr::Subquery(subquery) => {
                found.push(subquery.as_ref())
            }
            _ => {}
        }
        Descend::Yes
    });
    found
}
