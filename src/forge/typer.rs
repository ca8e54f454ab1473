//! DREIDING atom typing through `dreid-typer`.
//!
//! The working molecule goes to the typer as a bare graph of elements and
//! declared bond orders. Ring, aromaticity and resonance perception happen
//! there, so a Kekulé ring comes back resonant. Types, hybridizations,
//! physical bond orders and the angle, torsion and inversion lists are then
//! copied back, sorted so the result does not depend on hash order.

use super::error::Error;
use super::intermediate::{
    IntermediateAngle, IntermediateDihedral, IntermediateImproper, IntermediateMolecule,
    PhysicalBondOrder,
};
use crate::model::topology::Hybridization;
use crate::model::types::{BondOrder, Element};
use dreid_typer::{
    Element as TyperElement, GraphBondOrder, Hybridization as TyperHybridization,
    MolecularGraph, MolecularTopology, assign_topology, assign_topology_with_rules, rules,
};
use std::collections::HashMap;

/// Types every atom and fills in the interaction lists.
///
/// `rules` replaces the typer's built-in DREIDING rule set when given.
pub fn assign_atom_types(
    molecule: &mut IntermediateMolecule,
    rules: Option<&str>,
) -> Result<(), Error> {
    let graph = build_molecular_graph(molecule)?;

    let topology = match rules {
        Some(rules_toml) => {
            let rules = parse_typing_rules(rules_toml)?;
            assign_topology_with_rules(&graph, &rules)?
        }
        None => assign_topology(&graph)?,
    };

    apply_topology(molecule, &topology)
}

/// Parses a custom typing rule set.
pub fn parse_typing_rules(rules_toml: &str) -> Result<Vec<rules::Rule>, Error> {
    rules::parse_rules(rules_toml).map_err(|e| Error::RuleParse(e.to_string()))
}

fn apply_topology(
    molecule: &mut IntermediateMolecule,
    topology: &MolecularTopology,
) -> Result<(), Error> {
    if topology.atoms.len() != molecule.atoms.len() {
        return Err(Error::UnresolvableTyping(format!(
            "typer returned {} atoms for {}",
            topology.atoms.len(),
            molecule.atoms.len()
        )));
    }
    for (int_atom, topo_atom) in molecule.atoms.iter_mut().zip(&topology.atoms) {
        int_atom.atom_type = topo_atom.atom_type.clone();
        int_atom.hybridization = convert_hybridization(topo_atom.hybridization);
    }

    let orders: HashMap<(usize, usize), PhysicalBondOrder> = topology
        .bonds
        .iter()
        .map(|b| (b.atom_ids, b.order))
        .collect();
    for bond in &mut molecule.bonds {
        if let Some(&order) = orders.get(&(bond.i, bond.j)) {
            bond.physical_order = order;
        }
    }

    molecule.angles = topology
        .angles
        .iter()
        .map(|a| IntermediateAngle {
            i: a.atom_ids.0,
            j: a.atom_ids.1,
            k: a.atom_ids.2,
        })
        .collect();
    molecule.angles.sort_by_key(|a| (a.j, a.i, a.k));

    molecule.dihedrals = topology
        .propers
        .iter()
        .map(|d| IntermediateDihedral {
            i: d.atom_ids.0,
            j: d.atom_ids.1,
            k: d.atom_ids.2,
            l: d.atom_ids.3,
        })
        .collect();
    molecule.dihedrals.sort_unstable();

    molecule.impropers = topology
        .impropers
        .iter()
        .map(|imp| IntermediateImproper {
            p1: imp.atom_ids.0,
            p2: imp.atom_ids.1,
            center: imp.atom_ids.2,
            p3: imp.atom_ids.3,
        })
        .collect();
    molecule.impropers.sort_by_key(|imp| imp.center);

    Ok(())
}

fn build_molecular_graph(molecule: &IntermediateMolecule) -> Result<MolecularGraph, Error> {
    let mut graph = MolecularGraph::new();

    for atom in &molecule.atoms {
        graph.add_atom(convert_element(atom.element)?);
    }

    for bond in &molecule.bonds {
        graph
            .add_bond(bond.i, bond.j, bond_order_to_graph_order(bond.order))
            .map_err(|e| Error::UnresolvableTyping(e.to_string()))?;
    }

    Ok(graph)
}

fn convert_element(element: Element) -> Result<TyperElement, Error> {
    let symbol = element.symbol();
    symbol.parse::<TyperElement>().map_err(|_| {
        Error::UnresolvableTyping(format!("element {symbol} is unknown to the typer"))
    })
}

fn convert_hybridization(hybridization: TyperHybridization) -> Hybridization {
    match hybridization {
        TyperHybridization::SP => Hybridization::SP,
        TyperHybridization::SP2 => Hybridization::SP2,
        TyperHybridization::SP3 => Hybridization::SP3,
        TyperHybridization::Resonant => Hybridization::Resonant,
        _ => Hybridization::None,
    }
}

fn bond_order_to_graph_order(order: BondOrder) -> GraphBondOrder {
    match order {
        BondOrder::Single => GraphBondOrder::Single,
        BondOrder::Double => GraphBondOrder::Double,
        BondOrder::Triple => GraphBondOrder::Triple,
        BondOrder::Aromatic => GraphBondOrder::Aromatic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::molecule::Bond;

    fn typed(elements: &[Element], bonds: &[(usize, usize, BondOrder)]) -> IntermediateMolecule {
        let bonds: Vec<Bond> = bonds.iter().map(|&(i, j, o)| Bond::new(i, j, o)).collect();
        let mut int = IntermediateMolecule::new(elements, &bonds);
        assign_atom_types(&mut int, None).unwrap();
        int
    }

    fn types(int: &IntermediateMolecule) -> Vec<&str> {
        int.atoms.iter().map(|a| a.atom_type.as_str()).collect()
    }

    fn benzene(ring: impl Fn(usize) -> BondOrder) -> IntermediateMolecule {
        let mut elements = vec![Element::C; 6];
        elements.extend([Element::H; 6]);
        let mut bonds: Vec<_> = (0..6).map(|i| (i, (i + 1) % 6, ring(i))).collect();
        bonds.extend((0..6).map(|i| (i, i + 6, BondOrder::Single)));
        typed(&elements, &bonds)
    }

    #[test]
    fn water_types() {
        use Element::{H, O};
        let int = typed(
            &[O, H, H],
            &[(0, 1, BondOrder::Single), (0, 2, BondOrder::Single)],
        );
        assert_eq!(types(&int), vec!["O_3", "H_HB", "H_HB"]);
        assert_eq!(int.atoms[0].hybridization, Hybridization::SP3);
        assert_eq!(int.angles, vec![IntermediateAngle { i: 1, j: 0, k: 2 }]);
        assert!(int.dihedrals.is_empty());
        assert!(int.impropers.is_empty());
    }

    #[test]
    fn ethane_interactions() {
        use Element::{C, H};
        let mut bonds = vec![(0, 1, BondOrder::Single)];
        bonds.extend((2..5).map(|h| (0, h, BondOrder::Single)));
        bonds.extend((5..8).map(|h| (1, h, BondOrder::Single)));
        let int = typed(&[C, C, H, H, H, H, H, H], &bonds);

        assert_eq!(&types(&int)[..3], &["C_3", "C_3", "H_"]);
        assert_eq!(int.angles.len(), 12);
        assert_eq!(int.dihedrals.len(), 9);
        assert!(int.impropers.is_empty());
        assert!(int.dihedrals.iter().all(|d| d.i < d.l));
        assert!(int.dihedrals.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn aromatic_benzene_is_resonant_and_planar() {
        let int = benzene(|_| BondOrder::Aromatic);
        assert!(int.atoms[..6].iter().all(|a| a.atom_type == "C_R"));
        assert!(int.atoms[6..].iter().all(|a| a.atom_type == "H_"));
        assert_eq!(int.impropers.len(), 6);
        let centers: Vec<_> = int.impropers.iter().map(|imp| imp.center).collect();
        assert_eq!(centers, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn kekule_benzene_is_perceived_as_resonant() {
        let int = benzene(|i| {
            if i % 2 == 0 {
                BondOrder::Double
            } else {
                BondOrder::Single
            }
        });
        assert_eq!(types(&int)[..6], ["C_R"; 6]);
        assert!(int.atoms[..6]
            .iter()
            .all(|a| a.hybridization == Hybridization::Resonant));
        for bond in int.bonds.iter().filter(|b| b.j < 6) {
            assert_eq!(bond.physical_order, PhysicalBondOrder::Resonant);
        }
    }

    #[test]
    fn unsaturated_carbons() {
        use Element::{C, H};
        let acetylene = typed(
            &[C, C, H, H],
            &[
                (0, 1, BondOrder::Triple),
                (0, 2, BondOrder::Single),
                (1, 3, BondOrder::Single),
            ],
        );
        assert_eq!(types(&acetylene)[..2], ["C_1", "C_1"]);
        assert_eq!(acetylene.bonds[0].physical_order, PhysicalBondOrder::Triple);

        let ethylene = typed(
            &[C, C, H, H, H, H],
            &[
                (0, 1, BondOrder::Double),
                (0, 2, BondOrder::Single),
                (0, 3, BondOrder::Single),
                (1, 4, BondOrder::Single),
                (1, 5, BondOrder::Single),
            ],
        );
        assert_eq!(types(&ethylene)[..2], ["C_2", "C_2"]);
        assert_eq!(ethylene.impropers.len(), 2);
    }

    #[test]
    fn invalid_custom_rules_fail() {
        let bonds = [Bond::new(0, 1, BondOrder::Single)];
        let mut int = IntermediateMolecule::new(&[Element::H, Element::Cl], &bonds);
        let err = assign_atom_types(&mut int, Some("not valid [[[ toml rules")).unwrap_err();
        assert!(matches!(err, Error::RuleParse(_)));
    }

    #[test]
    fn atoms_without_a_rule_fail_typing() {
        let mut int = IntermediateMolecule::new(&[Element::He], &[]);
        let err = assign_atom_types(&mut int, None).unwrap_err();
        assert_eq!(err.kind(), "unresolvable_typing");
    }

    #[test]
    fn element_and_order_conversion() {
        assert_eq!(convert_element(Element::C).unwrap(), TyperElement::C);
        assert_eq!(convert_element(Element::Cl).unwrap(), TyperElement::Cl);
        assert_eq!(
            bond_order_to_graph_order(BondOrder::Aromatic),
            GraphBondOrder::Aromatic
        );
        assert_eq!(
            convert_hybridization(TyperHybridization::Unknown),
            Hybridization::None
        );
    }
}
