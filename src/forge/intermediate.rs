//! Working representation shared by the assignment stages.
//!
//! An [`IntermediateMolecule`] starts from validated elements and bonds and
//! is filled in stage by stage. The typer sets types, hybridizations and
//! physical bond orders and copies in the interaction lists; the charge
//! stage sets charges. None of it leaves the `forge` module.

use crate::model::molecule::Bond;
use crate::model::topology::Hybridization;
use crate::model::types::{BondOrder, Element};

pub use dreid_typer::TopologyBondOrder as PhysicalBondOrder;

#[derive(Debug, Clone)]
pub struct IntermediateAtom {
    pub element: Element,
    /// DREIDING atom type (e.g., "C_3", "O_2"); empty until typed.
    pub atom_type: String,
    pub hybridization: Hybridization,
    pub charge: f64,
    /// Bonded neighbours, ascending.
    pub neighbors: Vec<usize>,
}

impl IntermediateAtom {
    pub fn new(element: Element) -> Self {
        Self {
            element,
            atom_type: String::new(),
            hybridization: Hybridization::None,
            charge: 0.0,
            neighbors: Vec::new(),
        }
    }
}

/// Force-constant scaling of a physical bond order.
pub trait PhysicalBondOrderExt {
    /// Single 1, double 2, triple 3, resonant 1.5.
    fn multiplier(&self) -> f64;
}

impl PhysicalBondOrderExt for PhysicalBondOrder {
    fn multiplier(&self) -> f64 {
        match self {
            PhysicalBondOrder::Single => 1.0,
            PhysicalBondOrder::Double => 2.0,
            PhysicalBondOrder::Triple => 3.0,
            PhysicalBondOrder::Resonant => 1.5,
        }
    }
}

/// Physical order implied by the declared order alone, before perception.
pub fn declared_physical_order(order: BondOrder) -> PhysicalBondOrder {
    match order {
        BondOrder::Single => PhysicalBondOrder::Single,
        BondOrder::Double => PhysicalBondOrder::Double,
        BondOrder::Triple => PhysicalBondOrder::Triple,
        BondOrder::Aromatic => PhysicalBondOrder::Resonant,
    }
}

#[derive(Debug, Clone)]
pub struct IntermediateBond {
    pub i: usize,
    pub j: usize,
    pub order: BondOrder,
    /// Declared order until the typer replaces it with the perceived one.
    pub physical_order: PhysicalBondOrder,
}

/// Angle `i-j-k` around centre `j`, stored with `i < k`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntermediateAngle {
    pub i: usize,
    pub j: usize,
    pub k: usize,
}

/// Torsion `i-j-k-l` about bond `j-k`, stored with `i < l`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct IntermediateDihedral {
    pub i: usize,
    pub j: usize,
    pub k: usize,
    pub l: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntermediateImproper {
    pub center: usize,
    pub p1: usize,
    pub p2: usize,
    pub p3: usize,
}

#[derive(Debug, Clone)]
pub struct IntermediateMolecule {
    pub atoms: Vec<IntermediateAtom>,
    pub bonds: Vec<IntermediateBond>,
    pub angles: Vec<IntermediateAngle>,
    pub dihedrals: Vec<IntermediateDihedral>,
    pub impropers: Vec<IntermediateImproper>,
}

impl IntermediateMolecule {
    /// Builds neighbour lists from already validated bonds.
    ///
    /// Bonds are expected in range, without self-bonds or duplicates, which
    /// `perceive::resolve_bonds` guarantees.
    pub fn new(elements: &[Element], bonds: &[Bond]) -> Self {
        let mut atoms: Vec<IntermediateAtom> =
            elements.iter().copied().map(IntermediateAtom::new).collect();

        let mut int_bonds: Vec<IntermediateBond> = bonds
            .iter()
            .map(|b| IntermediateBond {
                i: b.i.min(b.j),
                j: b.i.max(b.j),
                order: b.order,
                physical_order: declared_physical_order(b.order),
            })
            .collect();
        int_bonds.sort_by_key(|b| (b.i, b.j));

        for bond in &int_bonds {
            atoms[bond.i].neighbors.push(bond.j);
            atoms[bond.j].neighbors.push(bond.i);
        }
        for atom in &mut atoms {
            atom.neighbors.sort_unstable();
        }

        Self {
            atoms,
            bonds: int_bonds,
            angles: Vec::new(),
            dihedrals: Vec::new(),
            impropers: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbours_are_symmetric_and_sorted() {
        let elements = [Element::C, Element::O, Element::H, Element::H];
        let bonds = [
            Bond::new(0, 3, BondOrder::Single),
            Bond::new(1, 0, BondOrder::Double),
            Bond::new(2, 0, BondOrder::Single),
        ];
        let int = IntermediateMolecule::new(&elements, &bonds);
        assert_eq!(int.atoms[0].neighbors, vec![1, 2, 3]);
        assert_eq!(int.atoms[1].neighbors, vec![0]);
        assert_eq!(int.bonds[0].physical_order, PhysicalBondOrder::Double);
        assert!(int.angles.is_empty());
    }

    #[test]
    fn aromatic_maps_to_resonant() {
        let order = declared_physical_order(BondOrder::Aromatic);
        assert_eq!(order, PhysicalBondOrder::Resonant);
        assert_eq!(order.multiplier(), 1.5);
        assert_eq!(declared_physical_order(BondOrder::Triple).multiplier(), 3.0);
    }
}
