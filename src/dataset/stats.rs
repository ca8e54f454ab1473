use crate::model::conformation::norm;
use crate::model::graph::GraphRecord;
use crate::model::report::{MoleculeReport, MoleculeStatus, RejectionCounts, RejectionReason};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Observed span of a quantity across the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct RangeAccumulator {
    min: f64,
    max: f64,
    sum: f64,
    count: usize,
}

impl RangeAccumulator {
    pub fn push(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.sum += value;
        self.count += 1;
    }

    pub fn finish(&self) -> Option<ValueRange> {
        (self.count > 0).then(|| ValueRange {
            min: self.min,
            max: self.max,
            mean: self.sum / self.count as f64,
            count: self.count,
        })
    }
}

/// Run-level statistics of a finalized dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub molecules_processed: usize,
    pub molecules_assigned: usize,
    pub molecules_failed: usize,
    /// Assigned molecules that kept no conformation.
    pub molecules_all_rejected: usize,
    /// Failed molecules keyed by failure kind.
    pub assignment_failures: BTreeMap<String, usize>,
    pub conformations_total: usize,
    pub conformations_accepted: usize,
    pub rejected: RejectionCounts,
    /// Relative energies of accepted records, kcal/mol.
    pub relative_energy: Option<ValueRange>,
    /// Per-atom force magnitudes of accepted records, kcal/mol/Å.
    pub force_magnitude: Option<ValueRange>,
    /// Per-molecule tallies in store order.
    pub molecules: Vec<MoleculeReport>,
}

impl DatasetSummary {
    pub fn from_parts(reports: Vec<MoleculeReport>, records: &[GraphRecord]) -> Self {
        let mut summary = Self {
            molecules_processed: reports.len(),
            molecules_assigned: 0,
            molecules_failed: 0,
            molecules_all_rejected: 0,
            assignment_failures: BTreeMap::new(),
            conformations_total: 0,
            conformations_accepted: 0,
            rejected: RejectionCounts::default(),
            relative_energy: None,
            force_magnitude: None,
            molecules: Vec::new(),
        };

        for report in &reports {
            summary.conformations_total += report.conformations;
            match &report.status {
                MoleculeStatus::Assigned => {
                    summary.molecules_assigned += 1;
                    if report.all_rejected() {
                        summary.molecules_all_rejected += 1;
                    }
                }
                MoleculeStatus::AssignmentFailed { reason, .. } => {
                    summary.molecules_failed += 1;
                    *summary
                        .assignment_failures
                        .entry(reason.clone())
                        .or_default() += 1;
                }
            }
            summary.conformations_accepted += report.accepted;
            summary.rejected.merge(&report.rejected);
        }

        let mut energy = RangeAccumulator::default();
        let mut force = RangeAccumulator::default();
        for record in records {
            energy.push(record.relative_energy);
            for f in &record.forces {
                force.push(norm(f));
            }
        }
        summary.relative_energy = energy.finish();
        summary.force_magnitude = force.finish();
        summary.molecules = reports;
        summary
    }

    /// Conformations of failed molecules, which were never screened.
    pub fn conformations_skipped(&self) -> usize {
        self.conformations_total - self.conformations_accepted - self.rejected.total()
    }
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Molecules")?;
        writeln!(f, "  {} molecules processed", self.molecules_processed)?;
        writeln!(f, "  {} molecules assigned", self.molecules_assigned)?;
        writeln!(f, "  {} molecules failed assignment", self.molecules_failed)?;
        for (reason, count) in &self.assignment_failures {
            writeln!(f, "    {count} {reason}")?;
        }
        writeln!(
            f,
            "  {} molecules with all conformations rejected",
            self.molecules_all_rejected
        )?;

        writeln!(f, "Conformations")?;
        writeln!(f, "  {} conformations read", self.conformations_total)?;
        writeln!(f, "  {} conformations accepted", self.conformations_accepted)?;
        for reason in RejectionReason::ALL {
            writeln!(
                f,
                "  {} conformations {}",
                self.rejected.get(reason),
                reason.describe()
            )?;
        }
        let skipped = self.conformations_skipped();
        if skipped > 0 {
            writeln!(f, "  {skipped} conformations skipped with their molecule")?;
        }

        writeln!(f, "Labels")?;
        write_range(f, "relative energy (kcal/mol)", self.relative_energy)?;
        write_range(f, "force magnitude (kcal/mol/Å)", self.force_magnitude)
    }
}

fn write_range(f: &mut fmt::Formatter<'_>, label: &str, range: Option<ValueRange>) -> fmt::Result {
    match range {
        Some(r) => writeln!(
            f,
            "  {label}: min {:.4}, max {:.4}, mean {:.4}",
            r.min, r.max, r.mean
        ),
        None => writeln!(f, "  {label}: n/a"),
    }
}
