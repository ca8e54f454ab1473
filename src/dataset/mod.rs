//! Dataset assembly.
//!
//! A [`DatasetAssembler`] is the single accumulation point shared by all
//! workers of a run. Records are keyed by molecule and conformation index,
//! so the finalized dataset lists molecules in store order and each
//! molecule's conformations in source order, whatever order workers
//! finished in. [`DatasetAssembler::finalize`] seals the assembler exactly
//! once.

mod persist;
mod stats;

pub use persist::{
    DatasetWriter, MANIFEST_FILE, Manifest, RECORDS_FILE, SUMMARY_FILE, read_manifest,
    read_records, render_report,
};
pub use stats::{DatasetSummary, ValueRange};

use crate::model::graph::GraphRecord;
use crate::model::report::MoleculeReport;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

/// Errors that can occur while assembling or persisting a dataset.
#[derive(Debug, Error)]
pub enum Error {
    #[error("dataset has already been finalized")]
    AlreadyFinalized,

    #[error("dataset assembler state is poisoned by a panicked worker")]
    LockPoisoned,

    #[error("duplicate record for molecule {molecule_index}, conformation {conformation_index}")]
    DuplicateRecord {
        molecule_index: usize,
        conformation_index: usize,
    },

    #[error("dataset '{}' already exists (use overwrite to replace it)", .0.display())]
    Exists(PathBuf),

    #[error("dataset target '{}' has no directory name", .0.display())]
    InvalidTarget(PathBuf),

    #[error("dataset '{}' was never finalized", .0.display())]
    NotFinalized(PathBuf),

    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to (de)serialize dataset content: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Settings a dataset was produced with, stored in its manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub name: String,
    pub generator: String,
    pub source: Option<String>,
    pub max_energy: Option<f64>,
    pub max_force: Option<f64>,
    pub duplicate_tolerance: Option<f64>,
    /// `"minimum"` or `"conformation <index>"`.
    pub energy_reference: String,
    pub nonbonded_cutoff: Option<f64>,
    pub charge_method: String,
    pub energy_unit: String,
    pub length_unit: String,
}

impl RunMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            generator: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            source: None,
            max_energy: None,
            max_force: None,
            duplicate_tolerance: None,
            energy_reference: "minimum".to_string(),
            nonbonded_cutoff: None,
            charge_method: "none".to_string(),
            energy_unit: "kcal/mol".to_string(),
            length_unit: "angstrom".to_string(),
        }
    }

    /// Threshold lines for the human-readable report.
    pub fn describe(&self) -> String {
        let show = |v: Option<f64>| v.map_or_else(|| "off".to_string(), |v| v.to_string());
        let mut out = String::from("Settings\n");
        if let Some(source) = &self.source {
            let _ = writeln!(out, "  source: {source}");
        }
        let _ = writeln!(
            out,
            "  max energy ({}): {}",
            self.energy_unit,
            show(self.max_energy)
        );
        let _ = writeln!(
            out,
            "  max force ({}/{}): {}",
            self.energy_unit,
            self.length_unit,
            show(self.max_force)
        );
        let _ = writeln!(
            out,
            "  duplicate tolerance ({}): {}",
            self.length_unit,
            show(self.duplicate_tolerance)
        );
        let _ = writeln!(out, "  energy reference: {}", self.energy_reference);
        let _ = writeln!(
            out,
            "  non-bonded cutoff ({}): {}",
            self.length_unit,
            show(self.nonbonded_cutoff)
        );
        let _ = writeln!(out, "  charges: {}", self.charge_method);
        out
    }
}

/// A sealed dataset; read-only once returned by [`DatasetAssembler::finalize`].
#[derive(Debug, Clone)]
pub struct Dataset {
    metadata: RunMetadata,
    summary: DatasetSummary,
    records: Vec<GraphRecord>,
    location: Option<PathBuf>,
}

impl Dataset {
    pub fn metadata(&self) -> &RunMetadata {
        &self.metadata
    }

    pub fn summary(&self) -> &DatasetSummary {
        &self.summary
    }

    pub fn records(&self) -> &[GraphRecord] {
        &self.records
    }

    /// Directory the dataset was persisted to, if a writer was attached.
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    pub fn into_records(self) -> Vec<GraphRecord> {
        self.records
    }
}

#[derive(Debug, Default)]
struct State {
    records: BTreeMap<(usize, usize), GraphRecord>,
    reports: BTreeMap<usize, MoleculeReport>,
    finalized: bool,
}

/// Thread-safe accumulator for graph records and per-molecule reports.
#[derive(Debug)]
pub struct DatasetAssembler {
    metadata: RunMetadata,
    writer: Option<DatasetWriter>,
    state: Mutex<State>,
}

impl DatasetAssembler {
    pub fn new(metadata: RunMetadata) -> Self {
        Self {
            metadata,
            writer: None,
            state: Mutex::new(State::default()),
        }
    }

    /// Persists the dataset through `writer` on finalize.
    pub fn with_writer(mut self, writer: DatasetWriter) -> Self {
        self.writer = Some(writer);
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, Error> {
        self.state.lock().map_err(|_| Error::LockPoisoned)
    }

    /// Adds one accepted record.
    pub fn add(&self, record: GraphRecord) -> Result<(), Error> {
        let mut state = self.lock()?;
        if state.finalized {
            return Err(Error::AlreadyFinalized);
        }
        let key = (
            record.provenance.molecule_index,
            record.provenance.conformation_index,
        );
        if state.records.contains_key(&key) {
            return Err(Error::DuplicateRecord {
                molecule_index: key.0,
                conformation_index: key.1,
            });
        }
        state.records.insert(key, record);
        Ok(())
    }

    /// Records the outcome of one molecule; a later report for the same
    /// molecule index replaces the earlier one.
    pub fn record_molecule(&self, report: MoleculeReport) -> Result<(), Error> {
        let mut state = self.lock()?;
        if state.finalized {
            return Err(Error::AlreadyFinalized);
        }
        state.reports.insert(report.molecule_index, report);
        Ok(())
    }

    pub fn record_count(&self) -> Result<usize, Error> {
        Ok(self.lock()?.records.len())
    }

    pub fn is_finalized(&self) -> Result<bool, Error> {
        Ok(self.lock()?.finalized)
    }

    /// Seals the assembler, computes the summary and persists the dataset.
    ///
    /// A failed write leaves the assembler open, so nothing claims to be
    /// finalized.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyFinalized`] on every call after the first successful
    /// one; persistence errors from the attached writer.
    pub fn finalize(&self) -> Result<Dataset, Error> {
        let mut state = self.lock()?;
        if state.finalized {
            return Err(Error::AlreadyFinalized);
        }

        let records: Vec<GraphRecord> = state.records.values().cloned().collect();
        let reports: Vec<MoleculeReport> = state.reports.values().cloned().collect();
        let summary = DatasetSummary::from_parts(reports, &records);

        let location = match &self.writer {
            Some(writer) => Some(writer.write(&self.metadata, &summary, &records)?),
            None => None,
        };

        state.finalized = true;
        state.records.clear();
        log::info!(
            "finalized dataset '{}' with {} records from {} molecules",
            self.metadata.name,
            records.len(),
            summary.molecules_processed
        );

        Ok(Dataset {
            metadata: self.metadata.clone(),
            summary,
            records,
            location,
        })
    }
}
