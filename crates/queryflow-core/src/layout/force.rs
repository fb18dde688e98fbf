//! Deterministic force-directed placement (Fruchterman-Reingold).
//!
//! The simulation starts from the layered placement so identical graphs always settle
//! into identical positions.

use super::hierarchical;
use crate::topology::Topology;
use crate::types::LayoutOptions;

const ITERATIONS: usize = 120;
const COOLING: f64 = 0.95;
const MIN_DISTANCE: f64 = 0.01;

pub(super) fn place(
    topology: &Topology,
    sizes: &[(f64, f64)],
    options: &LayoutOptions,
) -> Vec<(f64, f64)> {
    let count = sizes.len();
    let seed = hierarchical::place(topology, sizes, options);
    let mut centers: Vec<(f64, f64)> = seed
        .iter()
        .zip(sizes)
        .map(|(&(x, y), &(w, h))| (x + w / 2.0, y + h / 2.0))
        .collect();
    if count < 2 {
        return seed;
    }

    let mean_size = sizes.iter().map(|&(w, h)| (w + h) / 2.0).sum::<f64>() / count as f64;
    let ideal = mean_size + options.node_spacing;
    let links: Vec<(usize, usize)> = (0..count)
        .flat_map(|from| topology.successors(from).map(move |to| (from, to)))
        .filter(|(from, to)| from != to)
        .collect();

    let mut temperature = ideal * 2.0;
    for _ in 0..ITERATIONS {
        let mut shift = vec![(0.0, 0.0); count];

        for i in 0..count {
            for j in (i + 1)..count {
                let (dx, dy, distance) = separation(centers[i], centers[j], i, j);
                let force = ideal * ideal / distance;
                let (fx, fy) = (dx / distance * force, dy / distance * force);
                shift[i].0 += fx;
                shift[i].1 += fy;
                shift[j].0 -= fx;
                shift[j].1 -= fy;
            }
        }

        for &(from, to) in &links {
            let (dx, dy, distance) = separation(centers[from], centers[to], from, to);
            let force = distance * distance / ideal;
            let (fx, fy) = (dx / distance * force, dy / distance * force);
            shift[from].0 -= fx;
            shift[from].1 -= fy;
            shift[to].0 += fx;
            shift[to].1 += fy;
        }

        for (center, (sx, sy)) in centers.iter_mut().zip(shift) {
            let length = (sx * sx + sy * sy).sqrt();
            if length > MIN_DISTANCE {
                let step = length.min(temperature);
                center.0 += sx / length * step;
                center.1 += sy / length * step;
            }
        }
        temperature *= COOLING;
    }

    centers
        .into_iter()
        .zip(sizes)
        .map(|((cx, cy), &(w, h))| (cx - w / 2.0, cy - h / 2.0))
        .collect()
}

/// Vector from `b` to `a` and its length, nudged apart when the points coincide.
fn separation(a: (f64, f64), b: (f64, f64), i: usize, j: usize) -> (f64, f64, f64) {
    let (mut dx, mut dy) = (a.0 - b.0, a.1 - b.1);
    if dx.abs() < MIN_DISTANCE && dy.abs() < MIN_DISTANCE {
        // Index-derived direction keeps the run reproducible
        let angle = (i * 31 + j * 17) as f64;
        dx = angle.cos() * MIN_DISTANCE;
        dy = angle.sin() * MIN_DISTANCE;
    }
    let distance = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE);
    (dx, dy, distance)
}
