//! Concentric rings around a root, by undirected hop distance.

use crate::topology::Topology;
use crate::types::LayoutOptions;
use std::collections::VecDeque;
use std::f64::consts::TAU;

pub(super) fn place(
    topology: &Topology,
    sizes: &[(f64, f64)],
    root: usize,
    options: &LayoutOptions,
) -> Vec<(f64, f64)> {
    let count = sizes.len();
    let mut ring = vec![usize::MAX; count];
    let mut queue = VecDeque::from([root]);
    ring[root] = 0;
    while let Some(position) = queue.pop_front() {
        let next = ring[position] + 1;
        for neighbour in topology
            .predecessors(position)
            .chain(topology.successors(position))
        {
            if ring[neighbour] == usize::MAX {
                ring[neighbour] = next;
                queue.push_back(neighbour);
            }
        }
    }
    // Disconnected nodes go on one outer ring
    let outer = ring.iter().filter(|&&r| r != usize::MAX).max().map_or(0, |r| r + 1);
    for r in ring.iter_mut().filter(|r| **r == usize::MAX) {
        *r = outer;
    }

    let largest = sizes
        .iter()
        .map(|&(w, h)| w.max(h))
        .fold(0.0, f64::max);
    let spacing = largest + options.rank_spacing;

    let mut members: Vec<Vec<usize>> = vec![Vec::new(); outer + 1];
    for (position, &r) in ring.iter().enumerate() {
        members[r].push(position);
    }

    let mut positions = vec![(0.0, 0.0); count];
    for (r, group) in members.iter().enumerate() {
        let radius = r as f64 * spacing;
        for (slot, &position) in group.iter().enumerate() {
            let angle = TAU * slot as f64 / group.len() as f64;
            let (w, h) = sizes[position];
            positions[position] = (
                radius * angle.cos() - w / 2.0,
                radius * angle.sin() - h / 2.0,
            );
        }
    }
    positions
}
