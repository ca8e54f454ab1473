//! Cell-grid index for distance cutoffs.
//!
//! Space is cut into cubic cells at least as wide as the cutoff, so every
//! pair within range sits in the same or an adjacent cell.

use crate::model::conformation::distance;
use std::collections::HashMap;

/// Cells narrower than this only add hashing overhead.
const MIN_CELL_SIZE: f64 = 1.0;

type Cell = (i32, i32, i32);

#[derive(Debug)]
pub struct SpatialGrid {
    inv_cell_size: f64,
    cells: HashMap<Cell, Vec<usize>>,
}

impl SpatialGrid {
    /// Creates an empty grid whose cells are at least `cutoff` wide.
    ///
    /// An infinite cutoff puts every point in a single cell.
    pub fn new(cutoff: f64) -> Self {
        let inv_cell_size = if cutoff.is_finite() {
            1.0 / cutoff.max(MIN_CELL_SIZE)
        } else if cutoff == f64::INFINITY {
            0.0
        } else {
            1.0 / MIN_CELL_SIZE
        };
        Self {
            inv_cell_size,
            cells: HashMap::new(),
        }
    }

    /// Indexes every finite position; non-finite ones are never in range.
    pub fn from_positions(positions: &[[f64; 3]], cutoff: f64) -> Self {
        let mut grid = Self::new(cutoff);
        for (idx, pos) in positions.iter().enumerate() {
            grid.insert(idx, *pos);
        }
        grid
    }

    fn cell_coords(&self, pos: [f64; 3]) -> Cell {
        (
            (pos[0] * self.inv_cell_size).floor() as i32,
            (pos[1] * self.inv_cell_size).floor() as i32,
            (pos[2] * self.inv_cell_size).floor() as i32,
        )
    }

    pub fn insert(&mut self, idx: usize, pos: [f64; 3]) {
        if pos.iter().all(|c| c.is_finite()) {
            let cell = self.cell_coords(pos);
            self.cells.entry(cell).or_default().push(idx);
        }
    }

    /// Every pair `(i, j, d)` with `i < j` and `d <= cutoff`, sorted by
    /// `(i, j)`.
    ///
    /// `cutoff` must not exceed the one the grid was built for.
    pub fn pairs_within(&self, positions: &[[f64; 3]], cutoff: f64) -> Vec<(usize, usize, f64)> {
        let mut pairs = Vec::new();
        for (cell, members) in &self.cells {
            for dx in -1..=1 {
                for dy in -1..=1 {
                    for dz in -1..=1 {
                        let neighbor = (
                            cell.0.saturating_add(dx),
                            cell.1.saturating_add(dy),
                            cell.2.saturating_add(dz),
                        );
                        let Some(others) = self.cells.get(&neighbor) else {
                            continue;
                        };
                        for &i in members {
                            for &j in others.iter().filter(|&&j| j > i) {
                                let d = distance(&positions[i], &positions[j]);
                                if d <= cutoff {
                                    pairs.push((i, j, d));
                                }
                            }
                        }
                    }
                }
            }
        }
        // Saturated cell coordinates can visit a neighbour twice.
        pairs.sort_unstable_by_key(|&(i, j, _)| (i, j));
        pairs.dedup_by_key(|&mut (i, j, _)| (i, j));
        pairs
    }
}
