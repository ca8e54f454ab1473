//! Graph datasets for training machine-learned force fields from quantum
//! chemistry reference calculations.
//!
//! Each molecule in a structure store receives a DREIDING topology once
//! (atom types, charges and bonded interaction terms). Every conformation of
//! the molecule is then turned into a graph record carrying that topology
//! alongside the conformation's coordinates, energy and forces. Records are
//! screened by per-molecule energy, force and duplicate rules, and the
//! survivors are collected into a deterministically ordered dataset.
//!
//! # Features
//!
//! - **Topology assignment**: Connectivity validation or perception from
//!   geometry, DREIDING atom typing, optional stored partial charges and
//!   bond, angle, torsion and inversion parameters
//! - **Graph building**: Per-atom node features, bonded and optional
//!   distance-cutoff non-bonded edges, and angle, proper and improper lists
//! - **Filtering**: Energy normalization against a per-molecule reference,
//!   inclusive energy and force thresholds, and duplicate removal
//! - **Dataset assembly**: Parallel-safe accumulation, store-ordered output,
//!   run statistics and atomic persistence
//!
//! # Quick Start
//!
//! ```
//! use graph_forge::{Bond, BondOrder, Conformation, Element, Molecule};
//! use graph_forge::{NoopObserver, Pipeline, PipelineConfig, PipelineError};
//!
//! let mut water = Molecule::new("water");
//! water.elements = vec![Element::O, Element::H, Element::H];
//! water.bonds = vec![
//!     Bond::new(0, 1, BondOrder::Single),
//!     Bond::new(0, 2, BondOrder::Single),
//! ];
//! for (stretch, energy) in [(0.957, -76.40), (0.990, -76.35)] {
//!     water.conformations.push(Conformation::new(
//!         vec![[0.0, 0.0, 0.0], [stretch, 0.0, 0.0], [-0.240, 0.927, 0.0]],
//!         energy,
//!         vec![[0.0; 3]; 3],
//!     ));
//! }
//!
//! let pipeline = Pipeline::new(PipelineConfig::default())?;
//! let dataset = pipeline.run_molecules("demo", &[water], &NoopObserver)?;
//!
//! // One record per accepted conformation, one node per atom.
//! assert_eq!(dataset.records().len(), 2);
//! assert_eq!(dataset.records()[0].node_count(), 3);
//! assert_eq!(dataset.records()[0].nodes[0].atom_type, "O_3");
//!
//! // Energies are relative to the molecule's lowest conformation.
//! assert_eq!(dataset.records()[0].relative_energy, 0.0);
//! assert_eq!(dataset.summary().conformations_accepted, 2);
//! # Ok::<(), PipelineError>(())
//! ```
//!
//! # Module Organization
//!
//! - [`io`]: Structure store access (JSON entries and multi-block SDF)
//! - [`forge`]: Topology assignment ([`assign`])
//! - [`graph`]: Graph record construction
//! - [`filter`]: Energy normalization and conformation screening
//! - [`dataset`]: Dataset assembly, statistics and persistence
//! - [`pipeline`]: The parallel driver tying the stages together
//!
//! # Units
//!
//! Lengths are in Å, energies in kcal/mol, forces in kcal/mol/Å and
//! equilibrium angles in radians. The store converts other input units on
//! load.

mod model;
mod util;

pub mod dataset;
pub mod filter;
pub mod forge;
pub mod graph;
pub mod io;
pub mod pipeline;

pub use model::conformation::Conformation;
pub use model::molecule::{Bond, Molecule};
pub use model::types::{BondOrder, Element, ParseBondOrderError, ParseElementError};

pub use model::topology::{
    AngleTerm, AssignedTopology, AtomParam, BondTerm, Hybridization, ImproperTerm,
    N_PERIODICITY, ProperTerm,
};

pub use model::graph::{Edge, EdgeKind, GraphRecord, Node, Provenance};

pub use model::report::{MoleculeReport, MoleculeStatus, RejectionCounts, RejectionReason};

pub use forge::{
    BondPerception, ChargeMethod, ForceFieldParams, ForgeConfig, QeqConfig, SolverOptions, assign,
};

pub use graph::GraphConfig;

pub use filter::{EnergyReference, FilterConfig, FilterThresholds};

pub use dataset::{Dataset, DatasetAssembler, DatasetSummary, RunMetadata};

pub use pipeline::{
    AbortHandle, NoopObserver, OutputTarget, Pipeline, PipelineConfig, PipelineObserver,
};

pub use forge::AssignmentFailure;
pub use pipeline::Error as PipelineError;
