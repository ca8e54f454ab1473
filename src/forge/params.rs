//! Force-field parameter tables.
//!
//! The embedded table (`resources/default.params.toml`) holds global force
//! constants and per-type radii, equilibrium angles and van der Waals terms.
//! A caller may replace it wholesale with a custom TOML document.

use super::error::Error;
use crate::model::topology::Hybridization;
use crate::model::types::Element;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;

const DEFAULT_PARAMS_TOML: &str = include_str!("../../resources/default.params.toml");

static DEFAULT_PARAMS: OnceLock<ForceFieldParams> = OnceLock::new();

#[derive(Debug, Clone, Deserialize)]
pub struct ForceFieldParams {
    #[serde(default)]
    pub global: GlobalParams,
    #[serde(default)]
    pub atoms: HashMap<String, AtomTypeParams>,
}

impl ForceFieldParams {
    /// Looks up the row for `atom_type`, naming `what` in the failure.
    pub fn atom(&self, atom_type: &str, what: &str) -> Result<&AtomTypeParams, Error> {
        self.atoms
            .get(atom_type)
            .ok_or_else(|| Error::missing_parameter(atom_type, format!("no {what} in table")))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GlobalParams {
    #[serde(default = "default_bond_k")]
    pub bond_k: f64,
    #[serde(default = "default_angle_k")]
    pub angle_k: f64,
    #[serde(default = "default_inversion_k")]
    pub inversion_k: f64,
    #[serde(default = "default_bond_delta")]
    pub bond_delta: f64,
}

fn default_bond_k() -> f64 {
    700.0
}
fn default_angle_k() -> f64 {
    100.0
}
fn default_inversion_k() -> f64 {
    40.0
}
fn default_bond_delta() -> f64 {
    0.01
}

impl Default for GlobalParams {
    fn default() -> Self {
        Self {
            bond_k: default_bond_k(),
            angle_k: default_angle_k(),
            inversion_k: default_inversion_k(),
            bond_delta: default_bond_delta(),
        }
    }
}

/// Per-type parameters. Angles are in degrees, lengths in Å, `vdw_d0` in kcal/mol.
#[derive(Debug, Clone, Deserialize)]
pub struct AtomTypeParams {
    pub bond_radius: f64,
    pub bond_angle: f64,
    pub vdw_r0: f64,
    pub vdw_d0: f64,
}

/// Parses `custom_toml`, or hands out a copy of the embedded table.
pub fn load_parameters(custom_toml: Option<&str>) -> Result<ForceFieldParams, Error> {
    match custom_toml {
        Some(toml) => Ok(toml::from_str(toml)?),
        None => Ok(get_default_parameters().clone()),
    }
}

pub fn get_default_parameters() -> &'static ForceFieldParams {
    DEFAULT_PARAMS.get_or_init(|| {
        toml::from_str(DEFAULT_PARAMS_TOML)
            .expect("Failed to parse embedded default parameters. This is a library bug.")
    })
}

/// DREIDING torsion barrier for one central bond.
///
/// `v_barrier` is the total barrier in kcal/mol before it is shared among
/// the torsions about the bond; `phase_offset` is in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TorsionParams {
    pub v_barrier: f64,
    pub periodicity: usize,
    pub phase_offset: f64,
}

impl TorsionParams {
    const fn new(v_barrier: f64, periodicity: usize, phase_offset: f64) -> Self {
        Self {
            v_barrier,
            periodicity,
            phase_offset,
        }
    }
}

/// Picks the torsion rule for the central bond `j-k`.
///
/// `i_hyb` is the hybridization of the outer atom attached to the
/// unsaturated end; it only matters for sp3–sp2 bonds next to another
/// unsaturated centre.
/// Returns `None` when the central pair carries no torsion (linear centres,
/// terminal atoms).
pub fn get_torsion_params(
    j_hyb: Hybridization,
    k_hyb: Hybridization,
    j_is_oxygen_column: bool,
    k_is_oxygen_column: bool,
    i_hyb: Hybridization,
) -> Option<TorsionParams> {
    use Hybridization::{Resonant, SP2, SP3};

    let params = match (j_hyb, k_hyb) {
        (SP3, SP3) if j_is_oxygen_column && k_is_oxygen_column => {
            TorsionParams::new(2.0, 2, 90.0)
        }
        (SP3, SP3) => TorsionParams::new(2.0, 3, 180.0),
        (SP2, SP2) => TorsionParams::new(45.0, 2, 180.0),
        (Resonant, Resonant) => TorsionParams::new(25.0, 2, 180.0),
        (SP2, Resonant) | (Resonant, SP2) => TorsionParams::new(5.0, 2, 180.0),
        (SP2 | Resonant, SP3) | (SP3, SP2 | Resonant) => {
            let sp3_is_oxygen = if j_hyb == SP3 {
                j_is_oxygen_column
            } else {
                k_is_oxygen_column
            };
            if sp3_is_oxygen {
                TorsionParams::new(2.0, 2, 180.0)
            } else if matches!(i_hyb, SP2 | Resonant) {
                TorsionParams::new(1.0, 6, 0.0)
            } else {
                TorsionParams::new(2.0, 3, 180.0)
            }
        }
        _ => return None,
    };
    Some(params)
}

/// Group 16 elements get the softer two-fold torsion about sp3–sp3 bonds.
pub fn is_oxygen_column(element: Element) -> bool {
    matches!(element, Element::O | Element::S | Element::Se | Element::Te)
}
