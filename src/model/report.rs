use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a conformation did not make it into the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    Energy,
    Force,
    Duplicate,
    NonFinite,
    ShapeMismatch,
}

impl RejectionReason {
    pub const ALL: [RejectionReason; 5] = [
        RejectionReason::Energy,
        RejectionReason::Force,
        RejectionReason::Duplicate,
        RejectionReason::NonFinite,
        RejectionReason::ShapeMismatch,
    ];

    pub fn describe(&self) -> &'static str {
        match self {
            RejectionReason::Energy => "rejected by energy threshold",
            RejectionReason::Force => "rejected by force threshold",
            RejectionReason::Duplicate => "rejected as duplicates",
            RejectionReason::NonFinite => "rejected for non-finite values",
            RejectionReason::ShapeMismatch => "skipped for atom-count mismatch",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RejectionReason::Energy => "energy",
            RejectionReason::Force => "force",
            RejectionReason::Duplicate => "duplicate",
            RejectionReason::NonFinite => "non-finite",
            RejectionReason::ShapeMismatch => "shape mismatch",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionCounts {
    pub energy: usize,
    pub force: usize,
    pub duplicate: usize,
    pub non_finite: usize,
    pub shape_mismatch: usize,
}

impl RejectionCounts {
    pub fn add(&mut self, reason: RejectionReason) {
        *self.slot(reason) += 1;
    }

    pub fn get(&self, reason: RejectionReason) -> usize {
        match reason {
            RejectionReason::Energy => self.energy,
            RejectionReason::Force => self.force,
            RejectionReason::Duplicate => self.duplicate,
            RejectionReason::NonFinite => self.non_finite,
            RejectionReason::ShapeMismatch => self.shape_mismatch,
        }
    }

    pub fn total(&self) -> usize {
        RejectionReason::ALL.iter().map(|r| self.get(*r)).sum()
    }

    pub fn merge(&mut self, other: &RejectionCounts) {
        for reason in RejectionReason::ALL {
            *self.slot(reason) += other.get(reason);
        }
    }

    fn slot(&mut self, reason: RejectionReason) -> &mut usize {
        match reason {
            RejectionReason::Energy => &mut self.energy,
            RejectionReason::Force => &mut self.force,
            RejectionReason::Duplicate => &mut self.duplicate,
            RejectionReason::NonFinite => &mut self.non_finite,
            RejectionReason::ShapeMismatch => &mut self.shape_mismatch,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MoleculeStatus {
    Assigned,
    AssignmentFailed { reason: String, message: String },
}

/// Outcome of processing one molecule, as tallied by the dataset assembler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoleculeReport {
    pub molecule_id: String,
    pub molecule_index: usize,
    pub atom_count: usize,
    pub conformations: usize,
    #[serde(flatten)]
    pub status: MoleculeStatus,
    pub accepted: usize,
    pub rejected: RejectionCounts,
    /// Energy subtracted from every conformation during normalization.
    pub reference_energy: Option<f64>,
}

impl MoleculeReport {
    pub fn assignment_failed(
        molecule_id: impl Into<String>,
        molecule_index: usize,
        atom_count: usize,
        conformations: usize,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            molecule_id: molecule_id.into(),
            molecule_index,
            atom_count,
            conformations,
            status: MoleculeStatus::AssignmentFailed {
                reason: reason.into(),
                message: message.into(),
            },
            accepted: 0,
            rejected: RejectionCounts::default(),
            reference_energy: None,
        }
    }

    pub fn is_assigned(&self) -> bool {
        matches!(self.status, MoleculeStatus::Assigned)
    }

    /// Assigned, but no conformation survived filtering.
    pub fn all_rejected(&self) -> bool {
        self.is_assigned() && self.accepted == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_add_and_total() {
        let mut counts = RejectionCounts::default();
        counts.add(RejectionReason::Energy);
        counts.add(RejectionReason::Energy);
        counts.add(RejectionReason::ShapeMismatch);
        assert_eq!(counts.get(RejectionReason::Energy), 2);
        assert_eq!(counts.get(RejectionReason::Force), 0);
        assert_eq!(counts.total(), 3);

        let mut other = RejectionCounts::default();
        other.add(RejectionReason::Force);
        other.merge(&counts);
        assert_eq!(other.total(), 4);
        assert_eq!(other.force, 1);
    }

    #[test]
    fn failed_report_is_not_all_rejected() {
        let report =
            MoleculeReport::assignment_failed("m", 0, 3, 2, "valence", "too many bonds");
        assert!(!report.is_assigned());
        assert!(!report.all_rejected());
    }

    #[test]
    fn report_status_serializes_inline() {
        let report = MoleculeReport::assignment_failed("m", 4, 3, 2, "empty", "no atoms");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "assignment_failed");
        assert_eq!(json["reason"], "empty");
        let back: MoleculeReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, report);
    }
}
