//! Graph building.
//!
//! [`build`] combines one molecule's [`AssignedTopology`] with one of its
//! conformations into a [`GraphRecord`]. The function is pure, so records of
//! the same molecule may be built concurrently from a shared topology.

mod neighbors;

use crate::model::conformation::Conformation;
use crate::model::graph::{Edge, EdgeKind, GraphRecord, Node, Provenance};
use crate::model::topology::AssignedTopology;
use thiserror::Error;

/// Errors that can occur while building a graph record.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// The conformation does not line up with the topology's atoms.
    #[error(
        "shape mismatch: topology has {expected} atoms, conformation has {positions} positions and {forces} forces"
    )]
    ShapeMismatch {
        expected: usize,
        positions: usize,
        forces: usize,
    },
}

/// Which interaction lists and edges go into each record.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphConfig {
    /// Add non-bonded edges between unbonded atoms at most this far apart (Å).
    pub nonbonded_cutoff: Option<f64>,
    pub include_angles: bool,
    pub include_propers: bool,
    pub include_impropers: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            nonbonded_cutoff: None,
            include_angles: true,
            include_propers: true,
            include_impropers: true,
        }
    }
}

/// Builds the graph record for one conformation.
///
/// The record's `relative_energy` starts equal to the absolute energy; the
/// filter overwrites it once the molecule's reference energy is known.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] when the position or force count differs
/// from the topology's atom count.
pub fn build(
    topology: &AssignedTopology,
    conformation: &Conformation,
    provenance: &Provenance,
    config: &GraphConfig,
) -> Result<GraphRecord, Error> {
    let expected = topology.atom_count();
    if conformation.positions.len() != expected || conformation.forces.len() != expected {
        return Err(Error::ShapeMismatch {
            expected,
            positions: conformation.positions.len(),
            forces: conformation.forces.len(),
        });
    }

    let nodes = topology
        .atoms
        .iter()
        .zip(&topology.elements)
        .map(|(atom, &element)| Node {
            element,
            atomic_number: element.atomic_number(),
            atom_type: topology.atom_types[atom.type_index].clone(),
            type_index: atom.type_index,
            hybridization: atom.hybridization,
            charge: atom.charge,
            mass: atom.mass,
            vdw_r0: atom.vdw_r0,
            vdw_d0: atom.vdw_d0,
        })
        .collect();

    let mut edges: Vec<Edge> = topology
        .bonds
        .iter()
        .map(|b| Edge {
            i: b.i,
            j: b.j,
            kind: EdgeKind::Bonded {
                order: b.order,
                k: b.k,
                r0: b.r0,
            },
        })
        .collect();
    if let Some(cutoff) = config.nonbonded_cutoff {
        edges.extend(neighbors::nonbonded_edges(
            topology,
            &conformation.positions,
            cutoff,
        ));
    }

    Ok(GraphRecord {
        provenance: provenance.clone(),
        nodes,
        edges,
        angles: if config.include_angles {
            topology.angles.clone()
        } else {
            Vec::new()
        },
        propers: if config.include_propers {
            topology.propers.clone()
        } else {
            Vec::new()
        },
        impropers: if config.include_impropers {
            topology.impropers.clone()
        } else {
            Vec::new()
        },
        positions: conformation.positions.clone(),
        energy: conformation.energy,
        relative_energy: conformation.energy,
        forces: conformation.forces.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forge::{ForgeConfig, assign};
    use crate::model::molecule::{Bond, Molecule};
    use crate::model::types::{BondOrder, Element};

    fn water() -> (AssignedTopology, Conformation) {
        let mut mol = Molecule::new("water");
        mol.elements = vec![Element::O, Element::H, Element::H];
        mol.bonds = vec![
            Bond::new(0, 1, BondOrder::Single),
            Bond::new(0, 2, BondOrder::Single),
        ];
        let conf = Conformation::new(
            vec![[0.0, 0.0, 0.0], [0.9572, 0.0, 0.0], [-0.2400, 0.9266, 0.0]],
            -47_000.0,
            vec![[0.1, 0.0, 0.0], [-0.05, 0.0, 0.0], [-0.05, 0.0, 0.0]],
        );
        (assign(&mol, &ForgeConfig::default()).unwrap(), conf)
    }

    fn provenance() -> Provenance {
        Provenance {
            molecule_index: 3,
            conformation_index: 1,
            molecule_id: "water".into(),
        }
    }

    #[test]
    fn nodes_follow_atom_order() {
        let (top, conf) = water();
        let record = build(&top, &conf, &provenance(), &GraphConfig::default()).unwrap();
        assert_eq!(record.node_count(), 3);
        assert_eq!(record.nodes[0].element, Element::O);
        assert_eq!(record.nodes[0].atomic_number, 8);
        assert_eq!(record.nodes[1].atom_type, "H_HB");
        assert_eq!(record.positions, conf.positions);
        assert_eq!(record.forces, conf.forces);
        assert_eq!(record.provenance, provenance());
        assert_eq!(record.relative_energy, record.energy);
    }

    #[test]
    fn bonded_edges_only_by_default() {
        let (top, conf) = water();
        let record = build(&top, &conf, &provenance(), &GraphConfig::default()).unwrap();
        assert_eq!(record.edge_count(), 2);
        assert!(record.edges.iter().all(|e| e.is_bonded() && e.i < e.j));
        assert_eq!(record.edge_index().len(), 4);
        assert_eq!(record.angles.len(), 1);
    }

    #[test]
    fn cutoff_adds_nonbonded_pairs() {
        let (top, conf) = water();
        let config = GraphConfig {
            nonbonded_cutoff: Some(2.0),
            ..GraphConfig::default()
        };
        let record = build(&top, &conf, &provenance(), &config).unwrap();
        let nonbonded: Vec<_> = record.edges.iter().filter(|e| !e.is_bonded()).collect();
        assert_eq!(nonbonded.len(), 1);
        assert_eq!((nonbonded[0].i, nonbonded[0].j), (1, 2));
        match nonbonded[0].kind {
            EdgeKind::NonBonded { distance } => assert!((distance - 1.514).abs() < 1e-3),
            _ => unreachable!(),
        }

        let tight = GraphConfig {
            nonbonded_cutoff: Some(1.0),
            ..GraphConfig::default()
        };
        let record = build(&top, &conf, &provenance(), &tight).unwrap();
        assert_eq!(record.bonded_edges().count(), record.edge_count());
    }

    #[test]
    fn interaction_lists_can_be_dropped() {
        let (top, conf) = water();
        let config = GraphConfig {
            include_angles: false,
            ..GraphConfig::default()
        };
        let record = build(&top, &conf, &provenance(), &config).unwrap();
        assert!(record.angles.is_empty());
    }

    #[test]
    fn shape_mismatch_is_reported() {
        let (top, mut conf) = water();
        conf.forces.pop();
        let err = build(&top, &conf, &provenance(), &GraphConfig::default()).unwrap_err();
        assert_eq!(
            err,
            Error::ShapeMismatch {
                expected: 3,
                positions: 3,
                forces: 2
            }
        );
    }

    #[test]
    fn nonbonded_edges_follow_each_conformation() {
        let mut mol = Molecule::new("peroxide");
        mol.elements = vec![Element::O, Element::O, Element::H, Element::H];
        mol.bonds = vec![
            Bond::new(0, 1, BondOrder::Single),
            Bond::new(0, 2, BondOrder::Single),
            Bond::new(1, 3, BondOrder::Single),
        ];
        let top = assign(&mol, &ForgeConfig::default()).unwrap();
        let conformation = |h3_y: f64| {
            Conformation::new(
                vec![[0.0, 0.0, 0.0], [1.47, 0.0, 0.0], [-0.3, 0.92, 0.0], [1.77, h3_y, 0.0]],
                0.0,
                vec![[0.0; 3]; 4],
            )
        };
        let config = GraphConfig {
            nonbonded_cutoff: Some(2.5),
            ..GraphConfig::default()
        };
        let pairs = |conf: &Conformation| -> Vec<(usize, usize)> {
            build(&top, conf, &provenance(), &config)
                .unwrap()
                .edges
                .iter()
                .filter(|e| !e.is_bonded())
                .map(|e| (e.i, e.j))
                .collect()
        };

        let cis = pairs(&conformation(0.92));
        let trans = pairs(&conformation(-0.92));
        assert_eq!(cis, vec![(0, 3), (1, 2), (2, 3)]);
        assert_eq!(trans, vec![(0, 3), (1, 2)]);
    }
}
