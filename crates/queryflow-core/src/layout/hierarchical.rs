//! Layered placement: rank by longest distance from a source node.

use crate::topology::Topology;
use crate::types::{LayoutDirection, LayoutOptions};

pub(super) fn place(
    topology: &Topology,
    sizes: &[(f64, f64)],
    options: &LayoutOptions,
) -> Vec<(f64, f64)> {
    // A cycle cannot be ranked; give every node its own rank in input order
    let ranks = topology
        .depths()
        .unwrap_or_else(|| (0..topology.len()).collect());
    let layers = order_layers(topology, &ranks);

    let horizontal = options.direction == LayoutDirection::LeftToRight;
    let along = |i: usize| if horizontal { sizes[i].0 } else { sizes[i].1 };
    let across = |i: usize| if horizontal { sizes[i].1 } else { sizes[i].0 };

    let breadths: Vec<f64> = layers
        .iter()
        .map(|layer| {
            let gaps = layer.len().saturating_sub(1) as f64;
            layer.iter().map(|&i| across(i)).sum::<f64>() + gaps * options.node_spacing
        })
        .collect();
    let widest = breadths.iter().copied().fold(0.0, f64::max);

    let mut positions = vec![(0.0, 0.0); sizes.len()];
    let mut offset = 0.0;
    for (layer, breadth) in layers.iter().zip(&breadths) {
        let depth = layer.iter().map(|&i| along(i)).fold(0.0, f64::max);
        // Ranks are centred on the widest one
        let mut cursor = (widest - breadth) / 2.0;
        for &i in layer {
            let rank_position = offset + (depth - along(i)) / 2.0;
            positions[i] = if horizontal {
                (rank_position, cursor)
            } else {
                (cursor, rank_position)
            };
            cursor += across(i) + options.node_spacing;
        }
        offset += depth + options.rank_spacing;
    }
    positions
}

/// Groups nodes by rank and orders each rank by the mean slot of its predecessors.
fn order_layers(topology: &Topology, ranks: &[usize]) -> Vec<Vec<usize>> {
    let count = ranks.iter().max().map_or(0, |max| max + 1);
    let mut layers = vec![Vec::new(); count];
    for (position, &rank) in ranks.iter().enumerate() {
        layers[rank].push(position);
    }

    let mut slot = vec![0.0; ranks.len()];
    for layer in &mut layers {
        let mut keyed: Vec<(f64, usize)> = layer
            .iter()
            .map(|&position| {
                let anchors: Vec<f64> = topology.predecessors(position).map(|p| slot[p]).collect();
                let key = if anchors.is_empty() {
                    position as f64
                } else {
                    anchors.iter().sum::<f64>() / anchors.len() as f64
                };
                (key, position)
            })
            .collect();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        *layer = keyed.into_iter().map(|(_, position)| position).collect();
        for (index, &position) in layer.iter().enumerate() {
            slot[position] = index as f64;
        }
    }
    layers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ClauseType, FlowEdge, FlowNode, NodeKind};

    #[test]
    fn test_join_inputs_share_a_rank() {
        let nodes = vec![
            FlowNode::new("a", NodeKind::Table, "a"),
            FlowNode::new("b", NodeKind::Table, "b"),
            FlowNode::new("j", NodeKind::Join, "JOIN"),
        ];
        let edges: Vec<FlowEdge> = [("e1", "a"), ("e2", "b")]
            .into_iter()
            .map(|(id, source)| FlowEdge {
                id: id.to_string(),
                source: source.to_string(),
                target: "j".to_string(),
                label: None,
                sql_clause: None,
                clause_type: ClauseType::Join,
                line_range: None,
            })
            .collect();
        let topology = Topology::new(&nodes, &edges);
        let sizes = vec![(100.0, 40.0); 3];
        let positions = place(&topology, &sizes, &LayoutOptions::default());

        assert_eq!(positions[0].1, positions[1].1);
        assert_eq!(positions[1].0 - positions[0].0, 140.0);
        assert_eq!(positions[2].1, 120.0);
        // The join is centred under its two inputs
        assert_eq!(positions[2].0, 70.0);
    }
}
