use super::types::Element;
use serde::{Deserialize, Serialize};

/// Number of Fourier terms stored per proper torsion (periodicities 1..=6).
pub const N_PERIODICITY: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hybridization {
    #[serde(rename = "sp")]
    SP,
    #[serde(rename = "sp2")]
    SP2,
    #[serde(rename = "sp3")]
    SP3,
    #[serde(rename = "resonant")]
    Resonant,
    /// Terminal monovalent atoms (hydrogen, halogens).
    #[serde(rename = "none")]
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomParam {
    pub type_index: usize,
    pub hybridization: Hybridization,
    pub charge: f64,
    pub mass: f64,
    pub vdw_r0: f64,
    pub vdw_d0: f64,
}

/// Harmonic bond stretch, `E = ½ k (r − r0)²`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondTerm {
    pub i: usize,
    pub j: usize,
    /// Physical bond order (1, 2, 3, or 1.5 for resonant bonds).
    pub order: f64,
    pub k: f64,
    pub r0: f64,
}

/// Harmonic angle bend around the central atom `j`, `θ0` in radians.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AngleTerm {
    pub i: usize,
    pub j: usize,
    pub k: usize,
    pub k_force: f64,
    pub theta0: f64,
}

/// Proper torsion `i-j-k-l` as a Fourier series
/// `E = Σₙ ksₙ (1 + cos(n φ − phasesₙ))`, with `ks[n-1]` belonging to periodicity `n`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProperTerm {
    pub atoms: [usize; 4],
    pub ks: [f64; N_PERIODICITY],
    pub phases: [f64; N_PERIODICITY],
}

/// Out-of-plane term; the central atom sits at `atoms[2]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImproperTerm {
    pub atoms: [usize; 4],
    pub k_force: f64,
    pub psi0: f64,
}

impl ImproperTerm {
    #[inline]
    pub fn center(&self) -> usize {
        self.atoms[2]
    }
}

/// Force-field parameterization of one molecule.
///
/// Atom indices in every term refer to the owning molecule's atom ordering;
/// `atoms[i]` describes atom `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignedTopology {
    pub molecule_id: String,
    pub elements: Vec<Element>,
    /// Sorted unique atom type names, indexed by [`AtomParam::type_index`].
    pub atom_types: Vec<String>,
    pub atoms: Vec<AtomParam>,
    pub bonds: Vec<BondTerm>,
    pub angles: Vec<AngleTerm>,
    pub propers: Vec<ProperTerm>,
    pub impropers: Vec<ImproperTerm>,
}

impl AssignedTopology {
    #[inline]
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    /// Type name of atom `idx`.
    pub fn type_name(&self, idx: usize) -> Option<&str> {
        let param = self.atoms.get(idx)?;
        self.atom_types.get(param.type_index).map(String::as_str)
    }

    pub fn is_bonded(&self, i: usize, j: usize) -> bool {
        let (a, b) = (i.min(j), i.max(j));
        self.bonds.iter().any(|bond| bond.i == a && bond.j == b)
    }
}
