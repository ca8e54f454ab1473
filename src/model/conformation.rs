/// One coordinate snapshot of a molecule with its reference labels.
///
/// Positions are in Ångströms, the energy in kcal/mol and forces in
/// kcal/mol/Å once loaded from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Conformation {
    pub positions: Vec<[f64; 3]>,
    pub energy: f64,
    pub forces: Vec<[f64; 3]>,
}

impl Conformation {
    pub fn new(positions: Vec<[f64; 3]>, energy: f64, forces: Vec<[f64; 3]>) -> Self {
        Self {
            positions,
            energy,
            forces,
        }
    }

    /// Builds a conformation from a gradient label (`gradient = -force`).
    pub fn from_gradient(positions: Vec<[f64; 3]>, energy: f64, gradients: &[[f64; 3]]) -> Self {
        let forces = gradients.iter().map(|g| [-g[0], -g[1], -g[2]]).collect();
        Self::new(positions, energy, forces)
    }

    #[inline]
    pub fn atom_count(&self) -> usize {
        self.positions.len()
    }

    /// Largest per-atom force magnitude, or `0.0` for an atom-less snapshot.
    pub fn max_force_magnitude(&self) -> f64 {
        self.forces.iter().map(norm).fold(0.0, f64::max)
    }
}

#[inline]
pub(crate) fn norm(v: &[f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

#[inline]
pub(crate) fn distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    norm(&[a[0] - b[0], a[1] - b[1], a[2] - b[2]])
}
