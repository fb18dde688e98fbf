//! Optimization hints derived from a finished statement.
//!
//! Rules run in a fixed order and each appends independently; nothing is deduplicated
//! across rules. Node-scoped hints are mirrored onto the node as warnings.

use super::context::ParseContext;
use crate::topology::Topology;
use crate::types::{
    ComplexityClass, ComplexityLevel, FlowEdge, FlowNode, HintCategory, NodeKind, NodeWarning,
    OptimizationHint, Severity, StatementKind, WarningKind,
};

const FAN_OUT_THRESHOLD: usize = 3;
const HIGH_FAN_OUT_THRESHOLD: usize = 5;
const MAX_JOINS: u32 = 3;
const MAX_AGGREGATES_PER_NODE: usize = 3;
const MAX_SUBQUERY_DEPTH: u32 = 3;

pub(crate) fn emit_hints(ctx: &mut ParseContext, nodes: &mut [FlowNode], edges: &[FlowEdge]) {
    if ctx.has_select_star {
        ctx.add_hint(
            OptimizationHint::warning(
                HintCategory::Quality,
                Severity::Medium,
                "SELECT * returns every column, including ones the caller may not need",
            )
            .with_suggestion("List the required columns explicitly"),
        );
    }

    if ctx.has_no_limit
        && ctx.statement_type == StatementKind::Select
        && ctx.stats.complexity >= ComplexityClass::Moderate
    {
        ctx.add_hint(
            OptimizationHint::info(
                HintCategory::BestPractice,
                Severity::Low,
                "Query has no LIMIT and may return a large result set",
            )
            .with_suggestion("Add a LIMIT while exploring the data"),
        );
    }

    flag_fan_out(ctx, nodes, edges);

    if ctx.stats.joins > MAX_JOINS {
        let message = format!(
            "Query joins {} times; consider breaking it into CTEs",
            ctx.stats.joins
        );
        if let Some(join) = last_of_kind(nodes, NodeKind::Join) {
            flag(ctx, nodes, &join, WarningKind::Complex, OptimizationHint::warning(
                HintCategory::Complexity,
                Severity::Medium,
                message,
            ));
        }
    }
    for aggregate in busy_aggregates(nodes) {
        flag(ctx, nodes, &aggregate.0, WarningKind::Complex, OptimizationHint::warning(
            HintCategory::Complexity,
            Severity::Medium,
            format!("Aggregation computes {} functions in one step", aggregate.1),
        ));
    }

    for join in std::mem::take(&mut ctx.findings.cross_joins) {
        flag(
            ctx,
            nodes,
            &join,
            WarningKind::CrossJoin,
            OptimizationHint::warning(
                HintCategory::Performance,
                Severity::High,
                "Cross join produces the cartesian product of its inputs",
            )
            .with_suggestion("Add a join condition or confirm the cartesian product is intended"),
        );
    }

    for (target, kind) in std::mem::take(&mut ctx.findings.unfiltered_writes) {
        let verb = match kind {
            StatementKind::Delete => "DELETE",
            _ => "UPDATE",
        };
        flag(
            ctx,
            nodes,
            &target,
            WarningKind::MissingWhere,
            OptimizationHint::warning(
                HintCategory::BestPractice,
                Severity::High,
                format!("{verb} without WHERE affects every row of the table"),
            )
            .with_suggestion("Add a WHERE clause to limit the affected rows"),
        );
    }

    for sort in std::mem::take(&mut ctx.findings.unbounded_sorts) {
        flag(
            ctx,
            nodes,
            &sort,
            WarningKind::UnboundedSort,
            OptimizationHint::info(
                HintCategory::BestPractice,
                Severity::Low,
                "ORDER BY inside a subquery or CTE without LIMIT has no effect on the result",
            )
            .with_suggestion("Remove the ORDER BY or move it to the outer query"),
        );
    }

    if ctx.max_subquery_depth > MAX_SUBQUERY_DEPTH {
        ctx.add_hint(
            OptimizationHint::warning(
                HintCategory::Complexity,
                Severity::Medium,
                format!(
                    "Subqueries are nested {} levels deep",
                    ctx.max_subquery_depth
                ),
            )
            .with_suggestion("Flatten nested subqueries into CTEs or joins"),
        );
    }

    assign_complexity_levels(nodes);
}

/// Appends `hint` for `node_id` and mirrors it onto the node.
fn flag(
    ctx: &mut ParseContext,
    nodes: &mut [FlowNode],
    node_id: &str,
    kind: WarningKind,
    hint: OptimizationHint,
) {
    if let Some(node) = find_node_mut(nodes, node_id) {
        node.warnings.push(NodeWarning {
            kind,
            severity: hint.severity,
            message: hint.message.clone(),
        });
    }
    ctx.add_hint(hint.with_node(node_id));
}

fn flag_fan_out(ctx: &mut ParseContext, nodes: &mut [FlowNode], edges: &[FlowEdge]) {
    let topology = Topology::new(nodes, edges);
    for position in 0..topology.len() {
        let fan_out = topology.out_degree(position);
        if fan_out < FAN_OUT_THRESHOLD {
            continue;
        }
        let severity = if fan_out >= HIGH_FAN_OUT_THRESHOLD {
            Severity::High
        } else {
            Severity::Medium
        };
        let id = nodes[position].id.clone();
        let label = nodes[position].label.clone();
        flag(
            ctx,
            nodes,
            &id,
            WarningKind::FanOut,
            OptimizationHint::warning(
                HintCategory::Performance,
                severity,
                format!("{label} feeds {fan_out} downstream operations"),
            )
            .with_suggestion("Materialize the shared result once if it is expensive"),
        );
    }
    for node in nodes.iter_mut() {
        if !node.children.is_empty() {
            let edges = std::mem::take(&mut node.child_edges);
            flag_fan_out(ctx, &mut node.children, &edges);
            node.child_edges = edges;
        }
    }
}

fn last_of_kind(nodes: &[FlowNode], kind: NodeKind) -> Option<String> {
    let mut last = None;
    for node in nodes {
        if let Some(nested) = last_of_kind(&node.children, kind) {
            last = Some(nested);
        }
        if node.kind == kind {
            last = Some(node.id.clone());
        }
    }
    last
}

fn busy_aggregates(nodes: &[FlowNode]) -> Vec<(String, usize)> {
    let mut found = Vec::new();
    for node in nodes {
        found.extend(busy_aggregates(&node.children));
        if let Some(details) = &node.aggregate_details {
            if details.functions.len() > MAX_AGGREGATES_PER_NODE {
                found.push((node.id.clone(), details.functions.len()));
            }
        }
    }
    found
}

fn find_node_mut<'n>(nodes: &'n mut [FlowNode], id: &str) -> Option<&'n mut FlowNode> {
    for node in nodes {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find_node_mut(&mut node.children, id) {
            return Some(found);
        }
    }
    None
}

fn assign_complexity_levels(nodes: &mut [FlowNode]) {
    for node in nodes {
        node.complexity_level = node
            .warnings
            .iter()
            .map(|warning| ComplexityLevel::from(warning.severity))
            .max()
            .unwrap_or_default();
        assign_complexity_levels(&mut node.children);
    }
}
