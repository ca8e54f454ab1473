//! Generic JSON layout: one `<id>.json` object per molecule.
//!
//! ```json
//! {
//!   "elements": ["O", "H", "H"],
//!   "bonds": [[0, 1, "single"], [0, 2, "single"]],
//!   "partial_charges": [-0.8, 0.4, 0.4],
//!   "conformations": [
//!     { "positions": [[0, 0, 0], [0.96, 0, 0], [-0.24, 0.93, 0]],
//!       "energy": -47900.1,
//!       "forces": [[0, 0, 0], [0, 0, 0], [0, 0, 0]] }
//!   ]
//! }
//! ```
//!
//! A conformation carries either `forces` or `gradients`, never both.

use super::error::Error;
use super::units::Units;
use crate::model::conformation::Conformation;
use crate::model::molecule::{Bond, Molecule};
use crate::model::types::{BondOrder, Element};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
struct RawEntry {
    elements: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    bonds: Vec<(usize, usize, BondOrder)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    partial_charges: Option<Vec<f64>>,
    #[serde(default)]
    conformations: Vec<RawConformation>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawConformation {
    positions: Vec<[f64; 3]>,
    energy: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    forces: Option<Vec<[f64; 3]>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    gradients: Option<Vec<[f64; 3]>>,
}

pub fn read<R: BufRead>(reader: R, path: &Path, id: &str, units: Units) -> Result<Molecule, Error> {
    let raw: RawEntry = serde_json::from_reader(reader).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let mut molecule = Molecule::new(id);
    molecule.elements = raw
        .elements
        .iter()
        .map(|symbol| {
            Element::from_symbol_lenient(symbol)
                .ok_or_else(|| Error::invalid(path, format!("unknown element symbol '{symbol}'")))
        })
        .collect::<Result<_, _>>()?;
    molecule.bonds = raw
        .bonds
        .into_iter()
        .map(|(i, j, order)| Bond::new(i, j, order))
        .collect();
    molecule.partial_charges = raw.partial_charges;

    let (e, l, f) = (units.energy_factor(), units.length_factor(), units.force_factor());
    for (idx, conf) in raw.conformations.into_iter().enumerate() {
        let mut positions = conf.positions;
        Units::scale_vectors(l, &mut positions);
        let energy = conf.energy * e;
        let conformation = match (conf.forces, conf.gradients) {
            (Some(mut forces), None) => {
                Units::scale_vectors(f, &mut forces);
                Conformation::new(positions, energy, forces)
            }
            (None, Some(mut gradients)) => {
                Units::scale_vectors(f, &mut gradients);
                Conformation::from_gradient(positions, energy, &gradients)
            }
            (Some(_), Some(_)) => {
                return Err(Error::invalid(
                    path,
                    format!("conformation {idx} has both forces and gradients"),
                ));
            }
            (None, None) => {
                return Err(Error::invalid(
                    path,
                    format!("conformation {idx} has neither forces nor gradients"),
                ));
            }
        };
        molecule.conformations.push(conformation);
    }

    Ok(molecule)
}

/// Writes `molecule` in kcal/mol and Å.
pub fn write<W: Write>(writer: W, molecule: &Molecule) -> Result<(), serde_json::Error> {
    let raw = RawEntry {
        elements: molecule.elements.iter().map(|e| e.symbol().to_string()).collect(),
        bonds: molecule.bonds.iter().map(|b| (b.i, b.j, b.order)).collect(),
        partial_charges: molecule.partial_charges.clone(),
        conformations: molecule
            .conformations
            .iter()
            .map(|c| RawConformation {
                positions: c.positions.clone(),
                energy: c.energy,
                forces: Some(c.forces.clone()),
                gradients: None,
            })
            .collect(),
    };
    serde_json::to_writer(writer, &raw)
}
