use super::topology::{AngleTerm, Hybridization, ImproperTerm, ProperTerm};
use super::types::Element;
use serde::{Deserialize, Serialize};

/// Where a record came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Provenance {
    /// Position of the molecule in the structure store's iteration order.
    pub molecule_index: usize,
    /// Position of the conformation within its molecule's source order.
    pub conformation_index: usize,
    pub molecule_id: String,
}

/// Per-atom node features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub element: Element,
    pub atomic_number: u8,
    pub atom_type: String,
    pub type_index: usize,
    pub hybridization: Hybridization,
    pub charge: f64,
    pub mass: f64,
    pub vdw_r0: f64,
    pub vdw_d0: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EdgeKind {
    Bonded { order: f64, k: f64, r0: f64 },
    NonBonded { distance: f64 },
}

/// Undirected pairwise edge, stored once with `i < j`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub i: usize,
    pub j: usize,
    #[serde(flatten)]
    pub kind: EdgeKind,
}

impl Edge {
    pub fn is_bonded(&self) -> bool {
        matches!(self.kind, EdgeKind::Bonded { .. })
    }
}

/// Graph representation of one accepted (molecule, conformation) pair.
///
/// `nodes`, `positions` and `forces` share the molecule's atom ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphRecord {
    pub provenance: Provenance,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub angles: Vec<AngleTerm>,
    pub propers: Vec<ProperTerm>,
    pub impropers: Vec<ImproperTerm>,
    pub positions: Vec<[f64; 3]>,
    /// Reference energy as loaded, kcal/mol.
    pub energy: f64,
    /// Energy relative to the molecule's reference, kcal/mol.
    pub relative_energy: f64,
    /// Reference forces, kcal/mol/Å.
    pub forces: Vec<[f64; 3]>,
}

impl GraphRecord {
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn bonded_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(|e| e.is_bonded())
    }

    /// Symmetric edge list with both directions of every undirected edge.
    pub fn edge_index(&self) -> Vec<(usize, usize)> {
        self.edges
            .iter()
            .flat_map(|e| [(e.i, e.j), (e.j, e.i)])
            .collect()
    }

    /// Largest per-atom force magnitude carried by the record.
    pub fn max_force_magnitude(&self) -> f64 {
        self.forces
            .iter()
            .map(super::conformation::norm)
            .fold(0.0, f64::max)
    }
}
