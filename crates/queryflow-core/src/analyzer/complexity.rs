//! Complexity score calculation for compiled statements.

use crate::topology::Topology;
use crate::types::{ComplexityClass, FlowEdge, FlowNode, NodeKind, QueryStats};
use std::collections::BTreeMap;

/// Weights for complexity calculation.
const TABLE_WEIGHT: f64 = 1.0;
const JOIN_WEIGHT: f64 = 3.0;
const SUBQUERY_WEIGHT: f64 = 5.0;
const CTE_WEIGHT: f64 = 4.0;
const AGGREGATION_WEIGHT: f64 = 2.0;
const WINDOW_FUNCTION_WEIGHT: f64 = 4.0;
const UNION_WEIGHT: f64 = 3.0;
const CONDITION_WEIGHT: f64 = 0.5;

/// Upper bounds (exclusive) of the Simple, Moderate and Complex classes.
const MODERATE_THRESHOLD: u32 = 5;
const COMPLEX_THRESHOLD: u32 = 15;
const VERY_COMPLEX_THRESHOLD: u32 = 30;

fn weighted(stats: &QueryStats) -> [(&'static str, f64); 8] {
    [
        ("tables", f64::from(stats.tables) * TABLE_WEIGHT),
        ("joins", f64::from(stats.joins) * JOIN_WEIGHT),
        ("subqueries", f64::from(stats.subqueries) * SUBQUERY_WEIGHT),
        ("ctes", f64::from(stats.ctes) * CTE_WEIGHT),
        ("aggregations", f64::from(stats.aggregations) * AGGREGATION_WEIGHT),
        (
            "windowFunctions",
            f64::from(stats.window_functions) * WINDOW_FUNCTION_WEIGHT,
        ),
        ("unions", f64::from(stats.unions) * UNION_WEIGHT),
        ("conditions", f64::from(stats.conditions) * CONDITION_WEIGHT),
    ]
}

/// Calculate the complexity score from the statement counters.
///
/// `tables + 3·joins + 5·subqueries + 4·ctes + 2·aggregations + 4·window functions
/// + 3·unions + 0.5·conditions`, rounded half away from zero. Non-decreasing in every
/// counter.
pub fn complexity_score(stats: &QueryStats) -> u32 {
    let raw: f64 = weighted(stats).iter().map(|(_, value)| value).sum();
    // Saturates at u32::MAX for absurd counters
    raw.round() as u32
}

/// Classify a complexity score.
pub fn classify(score: u32) -> ComplexityClass {
    match score {
        s if s < MODERATE_THRESHOLD => ComplexityClass::Simple,
        s if s < COMPLEX_THRESHOLD => ComplexityClass::Moderate,
        s if s < VERY_COMPLEX_THRESHOLD => ComplexityClass::Complex,
        _ => ComplexityClass::VeryComplex,
    }
}

/// Weighted contribution of each non-zero counter.
pub fn complexity_breakdown(stats: &QueryStats) -> BTreeMap<String, f64> {
    weighted(stats)
        .into_iter()
        .filter(|(_, value)| *value > 0.0)
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

/// Fills in the derived score, class and deep graph metrics.
pub(crate) fn finalize(stats: &mut QueryStats, nodes: &[FlowNode], edges: &[FlowEdge]) {
    stats.complexity_score = complexity_score(stats);
    stats.complexity = classify(stats.complexity_score);
    stats.complexity_breakdown = Some(complexity_breakdown(stats));
    if nodes.is_empty() {
        return;
    }
    stats.max_cte_depth = max_cte_depth(nodes);
    stats.max_fan_out = Some(max_fan_out(nodes, edges));
    stats.critical_path_length = critical_path_length(nodes, edges);
}

/// Deepest CTE nesting recorded on any CTE node, at any level.
fn max_cte_depth(nodes: &[FlowNode]) -> Option<u32> {
    nodes
        .iter()
        .flat_map(|node| {
            let own = (node.kind == NodeKind::Cte)
                .then_some(node.nesting_depth)
                .flatten();
            own.into_iter().chain(max_cte_depth(&node.children))
        })
        .max()
}

/// Largest out-degree over every graph scope.
fn max_fan_out(nodes: &[FlowNode], edges: &[FlowEdge]) -> u32 {
    let topology = Topology::new(nodes, edges);
    let own = (0..topology.len())
        .map(|position| topology.out_degree(position))
        .max()
        .unwrap_or(0);
    let nested = nodes
        .iter()
        .filter(|node| !node.children.is_empty())
        .map(|node| max_fan_out(&node.children, &node.child_edges))
        .max()
        .unwrap_or(0);
    u32::try_from(own).unwrap_or(u32::MAX).max(nested)
}

/// Longest path, in edges, from a source node to a Result node of the top-level graph.
///
/// Statements without a Result node (plain DML) measure to their sink nodes instead.
fn critical_path_length(nodes: &[FlowNode], edges: &[FlowEdge]) -> Option<u32> {
    let topology = Topology::new(nodes, edges);
    let depths = topology.depths()?;
    let has_result = nodes.iter().any(|node| node.kind == NodeKind::Result);
    let longest = nodes
        .iter()
        .enumerate()
        .filter(|(position, node)| {
            if has_result {
                node.kind == NodeKind::Result
            } else {
                topology.out_degree(*position) == 0
            }
        })
        .map(|(position, _)| depths[position])
        .max()?;
    Some(u32::try_from(longest).unwrap_or(u32::MAX))
}
