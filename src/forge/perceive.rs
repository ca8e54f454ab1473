//! Connectivity checks run before atom typing.
//!
//! Declared bonds are validated as given. A molecule without declared bonds
//! gets its connectivity from the first conformation's geometry, using the
//! covalent-radius criterion in [`BondPerception`]; perceived bonds are all
//! single.

use super::config::BondPerception;
use super::error::Error;
use crate::model::molecule::{Bond, Molecule};
use crate::model::types::{BondOrder, Element};
use crate::util::spatial::SpatialGrid;
use std::collections::HashSet;

/// Returns the bonds used for typing, canonicalized to `i < j`.
pub fn resolve_bonds(molecule: &Molecule, perception: &BondPerception) -> Result<Vec<Bond>, Error> {
    let n_atoms = molecule.atom_count();

    if molecule.has_declared_bonds() {
        let mut seen = HashSet::with_capacity(molecule.bond_count());
        let mut bonds = Vec::with_capacity(molecule.bond_count());
        for bond in &molecule.bonds {
            if bond.i >= n_atoms || bond.j >= n_atoms {
                return Err(Error::invalid_bond(
                    bond.i,
                    bond.j,
                    format!("atom index out of bounds (n_atoms = {})", n_atoms),
                ));
            }
            if bond.i == bond.j {
                return Err(Error::invalid_bond(bond.i, bond.j, "self-bond"));
            }
            let bond = Bond::new(bond.i, bond.j, bond.order);
            if !seen.insert((bond.i, bond.j)) {
                return Err(Error::invalid_bond(bond.i, bond.j, "duplicate bond"));
            }
            bonds.push(bond);
        }
        return Ok(bonds);
    }

    if n_atoms < 2 {
        return Ok(Vec::new());
    }

    let conformation = molecule.conformations.first().ok_or_else(|| {
        Error::MissingGeometry("no declared bonds and no conformation to perceive them from".into())
    })?;
    if conformation.atom_count() != n_atoms {
        return Err(Error::MissingGeometry(format!(
            "first conformation has {} positions for {} atoms",
            conformation.atom_count(),
            n_atoms
        )));
    }
    if conformation
        .positions
        .iter()
        .flatten()
        .any(|c| !c.is_finite())
    {
        return Err(Error::MissingGeometry(
            "first conformation has non-finite coordinates".into(),
        ));
    }

    Ok(perceive_bonds(
        &molecule.elements,
        &conformation.positions,
        perception,
    ))
}

/// Bonds every pair closer than the sum of covalent radii plus tolerance,
/// but farther apart than `perception.min_distance`.
pub fn perceive_bonds(
    elements: &[Element],
    positions: &[[f64; 3]],
    perception: &BondPerception,
) -> Vec<Bond> {
    let max_radius = elements
        .iter()
        .map(Element::covalent_radius)
        .fold(0.0_f64, f64::max);
    let reach = 2.0 * max_radius + perception.tolerance;

    SpatialGrid::from_positions(positions, reach)
        .pairs_within(positions, reach)
        .into_iter()
        .filter(|&(i, j, d)| {
            let threshold =
                elements[i].covalent_radius() + elements[j].covalent_radius() + perception.tolerance;
            d > perception.min_distance && d <= threshold
        })
        .map(|(i, j, _)| Bond::new(i, j, BondOrder::Single))
        .collect()
}

/// Number of connected components of the bond graph (isolated atoms count).
pub fn count_fragments(n_atoms: usize, bonds: &[Bond]) -> usize {
    let mut parent: Vec<usize> = (0..n_atoms).collect();

    fn find(parent: &mut [usize], mut x: usize) -> usize {
        while parent[x] != x {
            parent[x] = parent[parent[x]];
            x = parent[x];
        }
        x
    }

    let mut components = n_atoms;
    for bond in bonds {
        let a = find(&mut parent, bond.i);
        let b = find(&mut parent, bond.j);
        if a != b {
            parent[a] = b;
            components -= 1;
        }
    }
    components
}

/// Rejects atoms whose bond-order sum or neighbour count exceeds the
/// element's maximum valence. Elements without a known maximum pass.
pub fn check_valence(elements: &[Element], bonds: &[Bond]) -> Result<(), Error> {
    let mut order_sum = vec![0.0_f64; elements.len()];
    let mut degree = vec![0_usize; elements.len()];
    for bond in bonds {
        for idx in [bond.i, bond.j] {
            order_sum[idx] += bond.order.value();
            degree[idx] += 1;
        }
    }

    for (atom, &element) in elements.iter().enumerate() {
        let Some(max) = element.max_valence() else {
            continue;
        };
        let valence = order_sum[atom].max(degree[atom] as f64);
        if valence > max + 1e-9 {
            return Err(Error::ValenceInconsistency {
                atom,
                element,
                valence,
                max,
            });
        }
    }
    Ok(())
}
