use crate::model::graph::{Edge, EdgeKind};
use crate::model::topology::AssignedTopology;
use crate::util::spatial::SpatialGrid;
use std::collections::HashSet;

/// Non-bonded edges for every unbonded pair within `cutoff` (inclusive),
/// in canonical `(i, j)` order.
pub fn nonbonded_edges(
    topology: &AssignedTopology,
    positions: &[[f64; 3]],
    cutoff: f64,
) -> Vec<Edge> {
    let bonded: HashSet<(usize, usize)> = topology.bonds.iter().map(|b| (b.i, b.j)).collect();

    SpatialGrid::from_positions(positions, cutoff)
        .pairs_within(positions, cutoff)
        .into_iter()
        .filter(|&(i, j, _)| !bonded.contains(&(i, j)))
        .map(|(i, j, d)| Edge {
            i,
            j,
            kind: EdgeKind::NonBonded { distance: d },
        })
        .collect()
}
