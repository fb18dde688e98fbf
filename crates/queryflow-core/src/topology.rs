//! petgraph view over one graph scope, shared by the metrics and the layout.

use crate::types::{FlowEdge, FlowNode};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;

/// Directed graph whose node `i` is `nodes[i]` of the scope it was built from.
///
/// Edges whose endpoints are not in the scope are ignored.
#[derive(Debug)]
pub(crate) struct Topology {
    graph: DiGraph<usize, ()>,
}

impl Topology {
    pub(crate) fn new(nodes: &[FlowNode], edges: &[FlowEdge]) -> Self {
        let mut graph = DiGraph::with_capacity(nodes.len(), edges.len());
        let mut index = HashMap::with_capacity(nodes.len());
        for (position, node) in nodes.iter().enumerate() {
            index.insert(node.id.as_str(), graph.add_node(position));
        }
        for edge in edges {
            if let (Some(&from), Some(&to)) = (
                index.get(edge.source.as_str()),
                index.get(edge.target.as_str()),
            ) {
                graph.add_edge(from, to, ());
            }
        }
        Self { graph }
    }

    pub(crate) fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub(crate) fn out_degree(&self, position: usize) -> usize {
        self.graph
            .edges_directed(NodeIndex::new(position), Direction::Outgoing)
            .count()
    }

    pub(crate) fn predecessors(&self, position: usize) -> impl Iterator<Item = usize> + '_ {
        self.graph
            .neighbors_directed(NodeIndex::new(position), Direction::Incoming)
            .map(|idx| idx.index())
    }

    pub(crate) fn successors(&self, position: usize) -> impl Iterator<Item = usize> + '_ {
        self.graph
            .neighbors_directed(NodeIndex::new(position), Direction::Outgoing)
            .map(|idx| idx.index())
    }

    /// Node positions in topological order, or `None` when the scope has a cycle.
    pub(crate) fn order(&self) -> Option<Vec<usize>> {
        toposort(&self.graph, None)
            .ok()
            .map(|order| order.into_iter().map(|idx| idx.index()).collect())
    }

    /// Longest distance, in edges, from any source node to each node.
    pub(crate) fn depths(&self) -> Option<Vec<usize>> {
        let order = self.order()?;
        let mut depth = vec![0usize; self.len()];
        for position in order {
            depth[position] = self
                .predecessors(position)
                .map(|pred| depth[pred] + 1)
                .max()
                .unwrap_or(0);
        }
        Some(depth)
    }
}
