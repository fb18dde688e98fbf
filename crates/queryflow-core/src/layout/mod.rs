//! Geometry for flow graphs, independent of any rendering surface.
//!
//! Coordinates are the top-left corner of each node. Containers are sized to hold their
//! laid-out children, and the children are then moved inside the container's box, so
//! every coordinate in a result is absolute.

mod force;
mod hierarchical;
mod radial;

use crate::topology::Topology;
use crate::types::{FlowEdge, FlowNode, LayoutAlgorithm, LayoutOptions, NodeKind};

const MIN_NODE_WIDTH: f64 = 120.0;
const MAX_NODE_WIDTH: f64 = 280.0;
const CHAR_WIDTH: f64 = 7.0;
const LABEL_PADDING: f64 = 32.0;
const NODE_HEIGHT: f64 = 48.0;
const COLUMN_ROW_HEIGHT: f64 = 14.0;
const MAX_COLUMN_ROWS: usize = 6;
const CONTAINER_PADDING: f64 = 16.0;
const CONTAINER_HEADER: f64 = 32.0;

/// Assigns `x`, `y`, `width` and `height` to every node, containers' children included.
pub fn apply_layout(nodes: &mut [FlowNode], edges: &[FlowEdge], options: &LayoutOptions) {
    for node in nodes.iter_mut() {
        if node.children.is_empty() {
            size_leaf(node);
        } else {
            let child_edges = std::mem::take(&mut node.child_edges);
            apply_layout(&mut node.children, &child_edges, options);
            node.child_edges = child_edges;
            let (width, height) = extent(&node.children);
            node.width = (width + 2.0 * CONTAINER_PADDING).max(MIN_NODE_WIDTH);
            node.height = height + CONTAINER_HEADER + CONTAINER_PADDING;
        }
    }
    if nodes.is_empty() {
        return;
    }

    let topology = Topology::new(nodes, edges);
    let sizes: Vec<(f64, f64)> = nodes.iter().map(|node| (node.width, node.height)).collect();
    let mut positions = match options.algorithm {
        LayoutAlgorithm::Hierarchical => hierarchical::place(&topology, &sizes, options),
        LayoutAlgorithm::Force => force::place(&topology, &sizes, options),
        LayoutAlgorithm::Radial => {
            radial::place(&topology, &sizes, radial_root(nodes, &topology), options)
        }
    };
    normalize(&mut positions);

    for (node, (x, y)) in nodes.iter_mut().zip(positions) {
        node.x = x;
        node.y = y;
        translate(&mut node.children, x + CONTAINER_PADDING, y + CONTAINER_HEADER);
    }
}

fn size_leaf(node: &mut FlowNode) {
    let chars = node.label.chars().count() as f64;
    node.width = (chars * CHAR_WIDTH + LABEL_PADDING).clamp(MIN_NODE_WIDTH, MAX_NODE_WIDTH);
    let rows = node.columns.len().min(MAX_COLUMN_ROWS) as f64;
    node.height = NODE_HEIGHT + rows * COLUMN_ROW_HEIGHT;
}

/// Bounding size of nodes already placed with their minimum corner at the origin.
fn extent(nodes: &[FlowNode]) -> (f64, f64) {
    nodes.iter().fold((0.0, 0.0), |(width, height), node| {
        (
            f64::max(width, node.x + node.width),
            f64::max(height, node.y + node.height),
        )
    })
}

fn translate(nodes: &mut [FlowNode], dx: f64, dy: f64) {
    for node in nodes {
        node.x += dx;
        node.y += dy;
        translate(&mut node.children, dx, dy);
    }
}

/// Shifts positions so the smallest coordinates are zero.
fn normalize(positions: &mut [(f64, f64)]) {
    let min_x = positions.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let min_y = positions.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    if !min_x.is_finite() || !min_y.is_finite() {
        return;
    }
    for position in positions {
        position.0 -= min_x;
        position.1 -= min_y;
    }
}

/// The Result node, else the last sink, else the last node.
fn radial_root(nodes: &[FlowNode], topology: &Topology) -> usize {
    nodes
        .iter()
        .position(|node| node.kind == NodeKind::Result)
        .or_else(|| (0..nodes.len()).rev().find(|&i| topology.out_degree(i) == 0))
        .unwrap_or(nodes.len().saturating_sub(1))
}
