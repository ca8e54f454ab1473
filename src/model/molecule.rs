use super::conformation::Conformation;
use super::types::{BondOrder, Element};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bond {
    pub i: usize,
    pub j: usize,
    pub order: BondOrder,
}

impl Bond {
    pub fn new(idx1: usize, idx2: usize, order: BondOrder) -> Self {
        if idx1 <= idx2 {
            Self { i: idx1, j: idx2, order }
        } else {
            Self { i: idx2, j: idx1, order }
        }
    }
}

/// A molecule as held by the structure store.
///
/// The atom ordering of `elements` is the reference ordering for every
/// conformation, every per-atom label and every derived graph node.
#[derive(Debug, Clone, Default)]
pub struct Molecule {
    pub id: String,
    pub elements: Vec<Element>,
    /// Declared connectivity; empty when it has to be perceived from geometry.
    pub bonds: Vec<Bond>,
    pub partial_charges: Option<Vec<f64>>,
    pub conformations: Vec<Conformation>,
}

impl Molecule {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    #[inline]
    pub fn atom_count(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    #[inline]
    pub fn conformation_count(&self) -> usize {
        self.conformations.len()
    }

    #[inline]
    pub fn has_declared_bonds(&self) -> bool {
        !self.bonds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bond_new_orders_indices() {
        let bond = Bond::new(5, 2, BondOrder::Double);
        assert_eq!((bond.i, bond.j), (2, 5));
        assert_eq!(bond.order, BondOrder::Double);
    }

    #[test]
    fn molecule_counts() {
        let mut mol = Molecule::new("water");
        mol.elements = vec![Element::O, Element::H, Element::H];
        mol.bonds.push(Bond::new(0, 1, BondOrder::Single));
        assert_eq!(mol.id, "water");
        assert_eq!(mol.atom_count(), 3);
        assert_eq!(mol.bond_count(), 1);
        assert_eq!(mol.conformation_count(), 0);
        assert!(mol.has_declared_bonds());
    }
}
