//! Failure reasons of the topology assigner.
//!
//! Every variant is a distinct reason a molecule is excluded from the dataset.
//! [`Error::kind`] gives a stable short name used to tally failures in the
//! dataset summary.

use crate::model::types::Element;
use thiserror::Error;

/// Errors that can occur while assigning a topology to a molecule.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to parse force field parameters TOML.
    #[error("failed to parse force field parameters: {0}")]
    ParameterParse(#[from] toml::de::Error),

    /// The molecule contains no atoms.
    #[error("molecule is empty: at least one atom is required")]
    EmptyMolecule,

    /// Invalid bond definition in the input molecule.
    #[error("invalid bond between atoms {i} and {j}: {detail}")]
    InvalidBond {
        /// First atom index.
        i: usize,
        /// Second atom index.
        j: usize,
        /// Description of the problem.
        detail: String,
    },

    /// Connectivity has to be perceived but no usable geometry exists.
    #[error("cannot perceive connectivity: {0}")]
    MissingGeometry(String),

    /// The bond graph splits into unconnected pieces.
    #[error("molecule splits into {count} disconnected fragments")]
    DisconnectedFragments {
        /// Number of connected components.
        count: usize,
    },

    /// An atom carries more bonds than its element allows.
    #[error(
        "valence inconsistency at atom {atom} ({element}): bond order sum {valence} exceeds maximum {max}"
    )]
    ValenceInconsistency {
        /// Offending atom index.
        atom: usize,
        /// Element of the offending atom.
        element: Element,
        /// Sum of bond orders on the atom.
        valence: f64,
        /// Maximum allowed for the element.
        max: f64,
    },

    /// Custom atom typing rules could not be parsed.
    #[error("failed to parse custom typing rules: {0}")]
    RuleParse(String),

    /// No atom type could be deduced for some atom.
    ///
    /// Covers graph validation, chemical perception and rule matching
    /// failures reported by the typer.
    #[error("atom typing failed: {0}")]
    UnresolvableTyping(String),

    /// Required force field parameter not found.
    #[error("missing force field parameter for atom type '{atom_type}': {detail}")]
    MissingParameter {
        /// The atom type that is missing parameters.
        atom_type: String,
        /// Description of which parameter is missing.
        detail: String,
    },

    /// The same torsion and periodicity received two different phases.
    #[error("torsion {atoms:?} has conflicting phases at periodicity {periodicity}")]
    ConflictingTorsion {
        /// Atom indices of the torsion.
        atoms: [usize; 4],
        /// Periodicity with the conflict.
        periodicity: usize,
    },

    /// Stored partial charges were requested but are unusable.
    #[error("partial charges unavailable: {0}")]
    MissingCharges(String),

    /// The QEq solver failed or had no geometry to work on.
    #[error("charge calculation failed: {0}")]
    ChargeCalculation(String),
}

impl From<dreid_typer::TyperError> for Error {
    fn from(e: dreid_typer::TyperError) -> Self {
        match e {
            dreid_typer::TyperError::AssignmentFailed(inner) => {
                Error::UnresolvableTyping(format!(
                    "no rule matched atoms {:?} after {} rounds",
                    inner.untyped_atom_ids, inner.rounds_completed
                ))
            }
            other => {
                let detail = match std::error::Error::source(&other) {
                    Some(source) => format!("{other}: {source}"),
                    None => other.to_string(),
                };
                Error::UnresolvableTyping(detail)
            }
        }
    }
}

impl From<cheq::CheqError> for Error {
    fn from(e: cheq::CheqError) -> Self {
        Error::ChargeCalculation(e.to_string())
    }
}

impl Error {
    /// Short, stable name of the failure category.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::ParameterParse(_) => "parameter_parse",
            Error::EmptyMolecule => "empty_molecule",
            Error::InvalidBond { .. } => "invalid_bond",
            Error::MissingGeometry(_) => "missing_geometry",
            Error::DisconnectedFragments { .. } => "disconnected_fragments",
            Error::ValenceInconsistency { .. } => "valence_inconsistency",
            Error::RuleParse(_) => "typing_rules",
            Error::UnresolvableTyping(_) => "unresolvable_typing",
            Error::MissingParameter { .. } => "missing_parameter",
            Error::ConflictingTorsion { .. } => "conflicting_torsion",
            Error::MissingCharges(_) => "missing_charges",
            Error::ChargeCalculation(_) => "charge_calculation",
        }
    }

    /// Creates a [`MissingParameter`](Error::MissingParameter) error.
    pub fn missing_parameter(atom_type: &str, details: impl Into<String>) -> Self {
        Self::MissingParameter {
            atom_type: atom_type.to_string(),
            detail: details.into(),
        }
    }

    /// Creates an [`InvalidBond`](Error::InvalidBond) error.
    pub fn invalid_bond(i: usize, j: usize, details: impl Into<String>) -> Self {
        Self::InvalidBond {
            i,
            j,
            detail: details.into(),
        }
    }
}
