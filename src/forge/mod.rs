//! Topology assignment.
//!
//! [`assign`] turns a [`Molecule`] into an [`AssignedTopology`] in fixed
//! stages: connectivity, fragment and valence checks, atom typing, parameter
//! lookup, charges, and parameter generation. Each stage fails with its own
//! [`Error`] variant so the dataset summary can count failures by reason.

mod charge;
mod config;
mod error;
mod intermediate;
mod paramgen;
mod params;
mod perceive;
mod typer;

pub use config::{BondPerception, ChargeMethod, ForgeConfig, QeqConfig, SolverOptions};
pub use error::Error;
pub use params::{ForceFieldParams, load_parameters};

use crate::model::molecule::Molecule;
use crate::model::topology::AssignedTopology;

/// Checks that a custom typing rule set parses.
pub fn validate_typing_rules(rules_toml: &str) -> Result<(), Error> {
    typer::parse_typing_rules(rules_toml).map(|_| ())
}

/// Alias naming the error by its role in the pipeline.
pub type AssignmentFailure = Error;

/// Assigns a topology using parameters parsed from `config`.
///
/// Parses custom parameters on every call; callers handling many molecules
/// should load them once and use [`assign_with_params`].
pub fn assign(molecule: &Molecule, config: &ForgeConfig) -> Result<AssignedTopology, Error> {
    let params = load_parameters(config.params.as_deref())?;
    assign_with_params(molecule, config, &params)
}

/// Assigns a topology against an already loaded parameter table.
pub fn assign_with_params(
    molecule: &Molecule,
    config: &ForgeConfig,
    params: &ForceFieldParams,
) -> Result<AssignedTopology, Error> {
    if molecule.atom_count() == 0 {
        return Err(Error::EmptyMolecule);
    }

    let bonds = perceive::resolve_bonds(molecule, &config.bond_perception)?;
    if !molecule.has_declared_bonds() {
        log::debug!(
            "{}: perceived {} bonds from geometry",
            molecule.id,
            bonds.len()
        );
    }

    let fragments = perceive::count_fragments(molecule.atom_count(), &bonds);
    if fragments > 1 && !config.allow_fragments {
        return Err(Error::DisconnectedFragments { count: fragments });
    }

    perceive::check_valence(&molecule.elements, &bonds)?;

    let mut intermediate = intermediate::IntermediateMolecule::new(&molecule.elements, &bonds);

    typer::assign_atom_types(&mut intermediate, config.typing_rules.as_deref())?;

    paramgen::check_coverage(&intermediate, params)?;

    charge::assign_charges(
        &mut intermediate,
        config.charge_method,
        molecule.partial_charges.as_deref(),
        reference_geometry(molecule),
    )?;

    paramgen::generate_parameters(&molecule.id, &intermediate, params)
}

/// First conformation whose coordinates match the atom list and are finite.
fn reference_geometry(molecule: &Molecule) -> Option<&[[f64; 3]]> {
    molecule
        .conformations
        .iter()
        .map(|c| c.positions.as_slice())
        .find(|positions| {
            positions.len() == molecule.atom_count()
                && positions.iter().flatten().all(|x| x.is_finite())
        })
}
