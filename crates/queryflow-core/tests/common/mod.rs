#![allow(dead_code)]

use queryflow_core::{analyze, AnalyzeRequest, Dialect, FlowEdge, FlowNode, NodeKind, QueryResult};
use std::collections::HashSet;

/// Compiles a single statement with the generic dialect and default options.
pub fn compile(sql: &str) -> QueryResult {
    compile_with(sql, Dialect::Generic)
}

pub fn compile_with(sql: &str, dialect: Dialect) -> QueryResult {
    let mut batch = analyze(&AnalyzeRequest::new(sql, dialect));
    assert_eq!(batch.queries.len(), 1, "expected exactly one statement in {sql:?}");
    let result = batch.queries.remove(0);
    assert!(result.error.is_none(), "{sql:?} failed: {:?}", result.error);
    result
}

pub fn kinds(nodes: &[FlowNode]) -> Vec<NodeKind> {
    nodes.iter().map(|node| node.kind).collect()
}

pub fn nodes_of(result: &QueryResult, kind: NodeKind) -> Vec<&FlowNode> {
    result.nodes.iter().filter(|node| node.kind == kind).collect()
}

/// Asserts every edge of every scope joins two nodes of that same scope.
pub fn assert_edges_resolve(nodes: &[FlowNode], edges: &[FlowEdge]) {
    let ids: HashSet<&str> = nodes.iter().map(|node| node.id.as_str()).collect();
    for edge in edges {
        assert!(ids.contains(edge.source.as_str()), "dangling source in {edge:?}");
        assert!(ids.contains(edge.target.as_str()), "dangling target in {edge:?}");
    }
    for node in nodes {
        assert_edges_resolve(&node.children, &node.child_edges);
    }
}

/// Every id in the result, containers' children included.
pub fn all_ids(result: &QueryResult) -> Vec<String> {
    fn collect(nodes: &[FlowNode], edges: &[FlowEdge], out: &mut Vec<String>) {
        for node in nodes {
            out.push(node.id.clone());
            collect(&node.children, &node.child_edges, out);
        }
        out.extend(edges.iter().map(|edge| edge.id.clone()));
    }
    let mut ids = Vec::new();
    collect(&result.nodes, &result.edges, &mut ids);
    ids
}

/// Numeric suffix of an issued id (`select_7` -> 7).
pub fn id_number(id: &str) -> u64 {
    id.rsplit('_')
        .next()
        .and_then(|n| n.parse().ok())
        .unwrap_or_else(|| panic!("malformed id {id}"))
}

/// Structure of a result with ids and geometry removed, for comparing two runs.
pub fn shape(result: &QueryResult) -> Vec<String> {
    fn walk(nodes: &[FlowNode], depth: usize, out: &mut Vec<String>) {
        for node in nodes {
            out.push(format!(
                "{}{:?} {} {:?}",
                "  ".repeat(depth),
                node.kind,
                node.label,
                node.columns.iter().map(|c| &c.name).collect::<Vec<_>>()
            ));
            walk(&node.children, depth + 1, out);
        }
    }
    let mut out = Vec::new();
    walk(&result.nodes, 0, &mut out);
    out
}
