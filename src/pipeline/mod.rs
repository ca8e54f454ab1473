//! The dataset pipeline.
//!
//! A [`Pipeline`] runs every molecule through assignment, graph building and
//! filtering, and collects the survivors in a [`DatasetAssembler`].
//! Molecules are independent and run in parallel; within a molecule,
//! conformations are built in parallel, and filtering waits until the whole
//! molecule is built.
//!
//! Failures are split by scope. Assignment failures and shape mismatches
//! are tallied and the run goes on; store and dataset errors end the run.

mod control;

pub use control::{AbortHandle, NoopObserver, PipelineObserver};

use crate::dataset::{self, Dataset, DatasetAssembler, DatasetWriter, RunMetadata};
use crate::filter::{self, EnergyReference, FilterConfig};
use crate::forge::{self, ForceFieldParams, ForgeConfig};
use crate::graph::{self, GraphConfig};
use crate::io::{self, StructureStore};
use crate::model::graph::{GraphRecord, Provenance};
use crate::model::molecule::Molecule;
use crate::model::report::{MoleculeReport, MoleculeStatus, RejectionCounts, RejectionReason};
use crate::util::parallel::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

/// Fatal pipeline errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error("structure store error: {0}")]
    Store(#[from] io::Error),

    #[error("dataset error: {0}")]
    Dataset(#[from] dataset::Error),

    #[error("invalid pipeline configuration: {0}")]
    Config(#[source] forge::Error),

    #[error("no molecule survived topology assignment ({processed} processed)")]
    NoMoleculesAssigned { processed: usize },

    #[error("pipeline run was aborted")]
    Aborted,
}

/// Where the finalized dataset goes.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTarget {
    pub path: PathBuf,
    pub overwrite: bool,
}

/// Everything a run needs; fixed for the run's lifetime.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub forge: ForgeConfig,
    pub graph: GraphConfig,
    pub filter: FilterConfig,
    /// Persist the dataset here; `None` keeps it in memory only.
    pub output: Option<OutputTarget>,
}

pub struct Pipeline {
    config: PipelineConfig,
    params: ForceFieldParams,
    abort: AbortHandle,
}

impl Pipeline {
    /// Validates the configuration and loads the force-field table once.
    pub fn new(config: PipelineConfig) -> Result<Self, Error> {
        let params = forge::load_parameters(config.forge.params.as_deref()).map_err(Error::Config)?;
        if let Some(rules) = config.forge.typing_rules.as_deref() {
            forge::validate_typing_rules(rules).map_err(Error::Config)?;
        }
        Ok(Self {
            config,
            params,
            abort: AbortHandle::new(),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Handle that stops this pipeline between molecules.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Run metadata recorded in the dataset manifest.
    pub fn metadata(&self, name: &str) -> RunMetadata {
        let thresholds = &self.config.filter.thresholds;
        let mut metadata = RunMetadata::new(name);
        metadata.max_energy = thresholds.max_energy;
        metadata.max_force = thresholds.max_force;
        metadata.duplicate_tolerance = thresholds.duplicate_tolerance;
        metadata.energy_reference = match self.config.filter.reference {
            EnergyReference::Minimum => "minimum".to_string(),
            EnergyReference::Conformation(idx) => format!("conformation {idx}"),
        };
        metadata.nonbonded_cutoff = self.config.graph.nonbonded_cutoff;
        metadata.charge_method = self.config.forge.charge_method.name().to_string();
        metadata
    }

    /// Runs every entry of `store`, loading each molecule inside its worker.
    pub fn run_store(
        &self,
        name: &str,
        store: &StructureStore,
        observer: &dyn PipelineObserver,
    ) -> Result<Dataset, Error> {
        let mut metadata = self.metadata(name);
        metadata.source = Some(store.root().display().to_string());
        self.run(metadata, store.len(), observer, |index| Ok(store.load(index)?))
    }

    /// Runs molecules already in memory; their slice order is the store order.
    pub fn run_molecules(
        &self,
        name: &str,
        molecules: &[Molecule],
        observer: &dyn PipelineObserver,
    ) -> Result<Dataset, Error> {
        self.run(self.metadata(name), molecules.len(), observer, |index| {
            Ok(molecules[index].clone())
        })
    }

    fn run<F>(
        &self,
        metadata: RunMetadata,
        count: usize,
        observer: &dyn PipelineObserver,
        load: F,
    ) -> Result<Dataset, Error>
    where
        F: Fn(usize) -> Result<Molecule, Error> + Sync,
    {
        let mut assembler = DatasetAssembler::new(metadata);
        if let Some(output) = &self.config.output {
            let writer = DatasetWriter::new(&output.path, output.overwrite);
            writer.check_target()?;
            assembler = assembler.with_writer(writer);
        }

        log::info!("processing {} molecules", count);
        observer.run_started(count);
        let assigned = AtomicUsize::new(0);

        (0..count).into_par_iter().try_for_each(|index| {
            if self.abort.is_aborted() {
                return Err(Error::Aborted);
            }
            let molecule = load(index)?;
            let report = self.process_molecule(index, &molecule, &assembler)?;
            if report.is_assigned() {
                assigned.fetch_add(1, Ordering::Relaxed);
            }
            observer.molecule_done(&report);
            assembler.record_molecule(report)?;
            Ok(())
        })?;

        if self.abort.is_aborted() {
            return Err(Error::Aborted);
        }
        if assigned.load(Ordering::Relaxed) == 0 {
            return Err(Error::NoMoleculesAssigned { processed: count });
        }

        Ok(assembler.finalize()?)
    }

    /// Processes one molecule and hands its accepted records to `assembler`.
    ///
    /// Assignment failures and shape mismatches end up in the returned
    /// report; only assembler errors are returned as `Err`.
    pub fn process_molecule(
        &self,
        index: usize,
        molecule: &Molecule,
        assembler: &DatasetAssembler,
    ) -> Result<MoleculeReport, dataset::Error> {
        let topology = match forge::assign_with_params(molecule, &self.config.forge, &self.params) {
            Ok(topology) => topology,
            Err(err) => {
                log::warn!("{}: topology assignment failed: {}", molecule.id, err);
                return Ok(MoleculeReport::assignment_failed(
                    &molecule.id,
                    index,
                    molecule.atom_count(),
                    molecule.conformation_count(),
                    err.kind(),
                    err.to_string(),
                ));
            }
        };

        let built: Vec<Result<GraphRecord, graph::Error>> = molecule
            .conformations
            .par_iter()
            .enumerate()
            .map(|(conformation_index, conformation)| {
                let provenance = Provenance {
                    molecule_index: index,
                    conformation_index,
                    molecule_id: molecule.id.clone(),
                };
                graph::build(&topology, conformation, &provenance, &self.config.graph)
            })
            .collect();

        let mut rejected = RejectionCounts::default();
        let mut records = Vec::with_capacity(built.len());
        for (conformation_index, result) in built.into_iter().enumerate() {
            match result {
                Ok(record) => records.push(record),
                Err(err) => {
                    log::debug!(
                        "{} conformation {}: {}",
                        molecule.id,
                        conformation_index,
                        err
                    );
                    rejected.add(RejectionReason::ShapeMismatch);
                }
            }
        }

        let reference = filter::reference_energy(&records, self.config.filter.reference);
        let screening = filter::screen(records, reference, &self.config.filter);
        rejected.merge(&screening.rejected);

        let accepted = screening.accepted.len();
        for record in screening.accepted {
            assembler.add(record)?;
        }

        log::debug!(
            "{}: {} of {} conformations accepted",
            molecule.id,
            accepted,
            molecule.conformation_count()
        );
        Ok(MoleculeReport {
            molecule_id: molecule.id.clone(),
            molecule_index: index,
            atom_count: molecule.atom_count(),
            conformations: molecule.conformation_count(),
            status: MoleculeStatus::Assigned,
            accepted,
            rejected,
            reference_energy: screening.reference_energy,
        })
    }
}
