//! Core data structures flowing through the dataset pipeline.
//!
//! - [`types`] – Periodic table elements and bond order classifications.
//! - [`molecule`] – Raw molecules as held by the structure store.
//! - [`conformation`] – Coordinate snapshots with reference energy and forces.
//! - [`topology`] – Force-field parameterization assigned to a molecule.
//! - [`graph`] – Per-conformation graph records emitted into datasets.
//! - [`report`] – Per-molecule outcomes and rejection tallies.
//!
//! Raw input ([`Molecule`]) is kept apart from its parameterization
//! ([`AssignedTopology`]) so that one assignment can be reused for every
//! conformation of the molecule without shared mutable state.
//!
//! [`Molecule`]: molecule::Molecule
//! [`AssignedTopology`]: topology::AssignedTopology

pub mod conformation;
pub mod graph;
pub mod molecule;
pub mod report;
pub mod topology;
pub mod types;
