use super::error::Error;
use super::intermediate::{IntermediateMolecule, PhysicalBondOrderExt};
use super::params::{ForceFieldParams, get_torsion_params, is_oxygen_column};
use crate::model::topology::{
    AngleTerm, AssignedTopology, AtomParam, BondTerm, Hybridization, ImproperTerm,
    N_PERIODICITY, ProperTerm,
};
use std::collections::{BTreeSet, HashMap};
use std::f64::consts::{PI, TAU};

/// Fails on the first atom type that has no row in `params`.
pub fn check_coverage(molecule: &IntermediateMolecule, params: &ForceFieldParams) -> Result<(), Error> {
    for atom in &molecule.atoms {
        params.atom(&atom.atom_type, "atom type parameters")?;
    }
    Ok(())
}

pub fn generate_parameters(
    molecule_id: &str,
    molecule: &IntermediateMolecule,
    params: &ForceFieldParams,
) -> Result<AssignedTopology, Error> {
    let (atom_types, type_indices) = collect_atom_types(molecule);

    Ok(AssignedTopology {
        molecule_id: molecule_id.to_string(),
        elements: molecule.atoms.iter().map(|a| a.element).collect(),
        atoms: generate_atom_params(molecule, &type_indices, params)?,
        bonds: generate_bonds(molecule, params)?,
        angles: generate_angles(molecule, params)?,
        propers: generate_propers(molecule)?,
        impropers: generate_impropers(molecule, params),
        atom_types,
    })
}

fn collect_atom_types(molecule: &IntermediateMolecule) -> (Vec<String>, HashMap<String, usize>) {
    let atom_types: Vec<String> = molecule
        .atoms
        .iter()
        .map(|a| a.atom_type.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let type_indices = atom_types
        .iter()
        .enumerate()
        .map(|(idx, t)| (t.clone(), idx))
        .collect();

    (atom_types, type_indices)
}

fn generate_atom_params(
    molecule: &IntermediateMolecule,
    type_indices: &HashMap<String, usize>,
    params: &ForceFieldParams,
) -> Result<Vec<AtomParam>, Error> {
    molecule
        .atoms
        .iter()
        .map(|atom| {
            let row = params.atom(&atom.atom_type, "van der Waals parameters")?;
            Ok(AtomParam {
                type_index: type_indices[&atom.atom_type],
                hybridization: atom.hybridization,
                charge: atom.charge,
                mass: atom.element.atomic_mass(),
                vdw_r0: row.vdw_r0,
                vdw_d0: row.vdw_d0,
            })
        })
        .collect()
}

fn generate_bonds(
    molecule: &IntermediateMolecule,
    params: &ForceFieldParams,
) -> Result<Vec<BondTerm>, Error> {
    molecule
        .bonds
        .iter()
        .map(|bond| {
            let r_i = params.atom(&molecule.atoms[bond.i].atom_type, "bond radius")?;
            let r_j = params.atom(&molecule.atoms[bond.j].atom_type, "bond radius")?;
            let multiplier = bond.physical_order.multiplier();
            Ok(BondTerm {
                i: bond.i,
                j: bond.j,
                order: multiplier,
                k: params.global.bond_k * multiplier,
                r0: r_i.bond_radius + r_j.bond_radius - params.global.bond_delta,
            })
        })
        .collect()
}

fn generate_angles(
    molecule: &IntermediateMolecule,
    params: &ForceFieldParams,
) -> Result<Vec<AngleTerm>, Error> {
    molecule
        .angles
        .iter()
        .map(|angle| {
            let center = params.atom(&molecule.atoms[angle.j].atom_type, "bond angle")?;
            Ok(AngleTerm {
                i: angle.i,
                j: angle.j,
                k: angle.k,
                k_force: params.global.angle_k,
                theta0: center.bond_angle.to_radians(),
            })
        })
        .collect()
}

fn generate_propers(molecule: &IntermediateMolecule) -> Result<Vec<ProperTerm>, Error> {
    let mut per_bond: HashMap<(usize, usize), usize> = HashMap::new();
    for d in &molecule.dihedrals {
        *per_bond.entry((d.j.min(d.k), d.j.max(d.k))).or_default() += 1;
    }

    molecule
        .dihedrals
        .iter()
        .map(|d| {
            let mut term = ProperTerm {
                atoms: [d.i, d.j, d.k, d.l],
                ks: [0.0; N_PERIODICITY],
                phases: [0.0; N_PERIODICITY],
            };

            let atoms = &molecule.atoms;
            let (hj, hk) = (atoms[d.j].hybridization, atoms[d.k].hybridization);
            let outer = if is_unsaturated(hj) {
                atoms[d.i].hybridization
            } else {
                atoms[d.l].hybridization
            };
            let rule = get_torsion_params(
                hj,
                hk,
                is_oxygen_column(atoms[d.j].element),
                is_oxygen_column(atoms[d.k].element),
                outer,
            );

            if let Some(rule) = rule {
                let shared = per_bond[&(d.j.min(d.k), d.j.max(d.k))] as f64;
                let v = rule.v_barrier / shared;
                let n = rule.periodicity;
                // ½V[1 − cos(n(φ − φ0))] == ½V[1 + cos(nφ − (nφ0 − π))]
                let phase = n as f64 * rule.phase_offset.to_radians() - PI;
                add_fourier_term(&mut term, n, 0.5 * v, phase)?;
            }
            Ok(term)
        })
        .collect()
}

fn is_unsaturated(hybridization: Hybridization) -> bool {
    matches!(hybridization, Hybridization::SP2 | Hybridization::Resonant)
}

/// Adds `k (1 + cos(nφ − phase))` to `term`.
///
/// A negative `k` is stored as a positive one shifted by π. Terms landing
/// on an occupied periodicity add up when their phases agree.
pub(crate) fn add_fourier_term(
    term: &mut ProperTerm,
    periodicity: usize,
    k: f64,
    phase: f64,
) -> Result<(), Error> {
    if periodicity == 0 || periodicity > N_PERIODICITY {
        return Err(Error::missing_parameter(
            "torsion",
            format!("periodicity {periodicity} outside 1..={N_PERIODICITY}"),
        ));
    }
    let (k, phase) = if k < 0.0 { (-k, phase + PI) } else { (k, phase) };
    let phase = phase.rem_euclid(TAU);

    let slot = periodicity - 1;
    if term.ks[slot] != 0.0 && !same_angle(term.phases[slot], phase) {
        return Err(Error::ConflictingTorsion {
            atoms: term.atoms,
            periodicity,
        });
    }
    term.ks[slot] += k;
    term.phases[slot] = phase;
    Ok(())
}

fn same_angle(a: f64, b: f64) -> bool {
    let diff = (a - b).rem_euclid(TAU);
    diff < 1e-8 || TAU - diff < 1e-8
}

pub fn improper_permutations(center: usize, p: [usize; 3]) -> [[usize; 4]; 3] {
    let [a, b, d] = p;
    [[a, b, center, d], [b, d, center, a], [d, a, center, b]]
}

fn generate_impropers(
    molecule: &IntermediateMolecule,
    params: &ForceFieldParams,
) -> Vec<ImproperTerm> {
    let k_force = params.global.inversion_k / 3.0;
    molecule
        .impropers
        .iter()
        .flat_map(|imp| improper_permutations(imp.center, [imp.p1, imp.p2, imp.p3]))
        .map(|atoms| ImproperTerm {
            atoms,
            k_force,
            psi0: 0.0,
        })
        .collect()
}
