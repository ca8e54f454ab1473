//! Conformation filtering.
//!
//! Filtering a molecule happens in two phases. [`reference_energy`] picks
//! the reference once every conformation of the molecule is built; only
//! then does [`screen`] decide on each record. Conformations that never
//! became records play no part in either phase.
//!
//! Thresholds are inclusive: a value equal to its threshold passes.
//! Duplicate detection does not depend on the energy or force thresholds,
//! so tightening a threshold can only turn accepts into rejects.

mod dedup;

pub use dedup::find_duplicates;

use crate::model::graph::GraphRecord;
use crate::model::report::{RejectionCounts, RejectionReason};

/// Per-molecule rejection rules; `None` disables a rule.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FilterThresholds {
    /// Largest admissible |relative energy|, kcal/mol.
    pub max_energy: Option<f64>,
    /// Largest admissible per-atom force magnitude, kcal/mol/Å.
    pub max_force: Option<f64>,
    /// Coordinate tolerance (Å) under which two conformations are the same.
    pub duplicate_tolerance: Option<f64>,
}

/// Which energy of the molecule becomes zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EnergyReference {
    /// The lowest finite energy among the molecule's conformations.
    #[default]
    Minimum,
    /// The energy of the conformation at this source index.
    Conformation(usize),
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FilterConfig {
    pub thresholds: FilterThresholds,
    pub reference: EnergyReference,
}

/// Outcome of the per-record rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject(RejectionReason),
}

/// Result of screening one molecule.
#[derive(Debug, Clone, Default)]
pub struct Screening {
    /// Accepted records in input order, with relative energies filled in.
    pub accepted: Vec<GraphRecord>,
    pub rejected: RejectionCounts,
    /// Energy subtracted from every accepted record.
    pub reference_energy: Option<f64>,
}

/// Chooses the molecule's reference energy from its raw energies.
///
/// Non-finite energies never serve as reference. A designated conformation
/// that is out of range or non-finite falls back to the minimum. Returns
/// `None` when no energy is finite.
pub fn normalize(energies: &[f64], reference: EnergyReference) -> Option<f64> {
    let minimum = || {
        energies
            .iter()
            .copied()
            .filter(|e| e.is_finite())
            .reduce(f64::min)
    };
    match reference {
        EnergyReference::Minimum => minimum(),
        EnergyReference::Conformation(idx) => match energies.get(idx) {
            Some(&e) if e.is_finite() => Some(e),
            _ => {
                log::warn!(
                    "reference conformation {} unusable, falling back to the minimum",
                    idx
                );
                minimum()
            }
        },
    }
}

/// Reference energy over the built records of one molecule.
///
/// [`EnergyReference::Conformation`] names a source index, which is looked
/// up through each record's provenance. A conformation that was not built
/// is unusable and falls back to the minimum, as in [`normalize`].
pub fn reference_energy(records: &[GraphRecord], reference: EnergyReference) -> Option<f64> {
    let energies: Vec<f64> = records.iter().map(|r| r.energy).collect();
    let reference = match reference {
        EnergyReference::Minimum => EnergyReference::Minimum,
        EnergyReference::Conformation(idx) => {
            match records
                .iter()
                .position(|r| r.provenance.conformation_index == idx)
            {
                Some(pos) => EnergyReference::Conformation(pos),
                None => {
                    log::warn!(
                        "reference conformation {} was not built, falling back to the minimum",
                        idx
                    );
                    EnergyReference::Minimum
                }
            }
        }
    };
    normalize(&energies, reference)
}

/// Whether `record` passes the energy and force rules.
///
/// Uses the record's relative energy, so it must already be normalized.
pub fn accept(record: &GraphRecord, thresholds: &FilterThresholds) -> bool {
    decide(record, thresholds) == Decision::Accept
}

/// Applies the non-finite, energy and force rules, in that order.
pub fn decide(record: &GraphRecord, thresholds: &FilterThresholds) -> Decision {
    if !is_finite(record) {
        return Decision::Reject(RejectionReason::NonFinite);
    }
    if thresholds
        .max_energy
        .is_some_and(|max| record.relative_energy.abs() > max)
    {
        return Decision::Reject(RejectionReason::Energy);
    }
    if thresholds
        .max_force
        .is_some_and(|max| record.max_force_magnitude() > max)
    {
        return Decision::Reject(RejectionReason::Force);
    }
    Decision::Accept
}

fn is_finite(record: &GraphRecord) -> bool {
    record.relative_energy.is_finite()
        && record.positions.iter().flatten().all(|c| c.is_finite())
        && record.forces.iter().flatten().all(|c| c.is_finite())
}

/// Screens every record of one molecule.
///
/// `reference_energy` comes from [`reference_energy`] over the same records. With [`EnergyReference::Minimum`] the accepted records are
/// shifted once more so the lowest kept relative energy is exactly zero;
/// decisions are taken before that shift.
pub fn screen(
    mut records: Vec<GraphRecord>,
    reference_energy: Option<f64>,
    config: &FilterConfig,
) -> Screening {
    let Some(reference) = reference_energy else {
        let mut rejected = RejectionCounts::default();
        for _ in &records {
            rejected.add(RejectionReason::NonFinite);
        }
        return Screening {
            accepted: Vec::new(),
            rejected,
            reference_energy: None,
        };
    };

    for record in &mut records {
        record.relative_energy = record.energy - reference;
    }

    let non_finite: Vec<bool> = records.iter().map(|r| !is_finite(r)).collect();
    let duplicate = match config.thresholds.duplicate_tolerance {
        Some(tol) => find_duplicates(&records, &non_finite, tol),
        None => vec![false; records.len()],
    };

    let mut screening = Screening::default();
    for (idx, record) in records.into_iter().enumerate() {
        let decision = if duplicate[idx] {
            Decision::Reject(RejectionReason::Duplicate)
        } else {
            decide(&record, &config.thresholds)
        };
        match decision {
            Decision::Accept => screening.accepted.push(record),
            Decision::Reject(reason) => {
                log::trace!(
                    "{} conformation {}: {}",
                    record.provenance.molecule_id,
                    record.provenance.conformation_index,
                    reason
                );
                screening.rejected.add(reason);
            }
        }
    }

    let mut applied = reference;
    if config.reference == EnergyReference::Minimum {
        let shift = screening
            .accepted
            .iter()
            .map(|r| r.relative_energy)
            .reduce(f64::min)
            .unwrap_or(0.0);
        for record in &mut screening.accepted {
            record.relative_energy -= shift;
        }
        applied += shift;
    }
    screening.reference_energy = Some(applied);
    screening
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::graph::Provenance;

    fn record(idx: usize, energy: f64, force: f64, x: f64) -> GraphRecord {
        GraphRecord {
            provenance: Provenance {
                molecule_index: 0,
                conformation_index: idx,
                molecule_id: "m".into(),
            },
            nodes: Vec::new(),
            edges: Vec::new(),
            angles: Vec::new(),
            propers: Vec::new(),
            impropers: Vec::new(),
            positions: vec![[x, 0.0, 0.0], [x + 1.0, 0.0, 0.0]],
            energy,
            relative_energy: energy,
            forces: vec![[force, 0.0, 0.0], [0.0, 0.0, 0.0]],
        }
    }

    fn energies(records: &[GraphRecord]) -> Vec<f64> {
        records.iter().map(|r| r.energy).collect()
    }

    fn config(max_energy: Option<f64>, max_force: Option<f64>) -> FilterConfig {
        FilterConfig {
            thresholds: FilterThresholds {
                max_energy,
                max_force,
                duplicate_tolerance: None,
            },
            reference: EnergyReference::Minimum,
        }
    }

    #[test]
    fn normalize_picks_minimum_or_designated() {
        let e = [5.0, f64::NAN, 2.0, 9.0];
        assert_eq!(normalize(&e, EnergyReference::Minimum), Some(2.0));
        assert_eq!(normalize(&e, EnergyReference::Conformation(3)), Some(9.0));
        assert_eq!(normalize(&e, EnergyReference::Conformation(1)), Some(2.0));
        assert_eq!(normalize(&e, EnergyReference::Conformation(10)), Some(2.0));
        assert_eq!(normalize(&[f64::NAN], EnergyReference::Minimum), None);
        assert_eq!(normalize(&[], EnergyReference::Minimum), None);
    }

    #[test]
    fn reference_follows_provenance_of_built_records() {
        // source conformation 0 never became a record
        let records = vec![record(1, 0.0, 0.0, 0.0), record(2, 10.0, 0.0, 1.0)];
        assert_eq!(reference_energy(&records, EnergyReference::Minimum), Some(0.0));
        assert_eq!(
            reference_energy(&records, EnergyReference::Conformation(2)),
            Some(10.0)
        );
        assert_eq!(
            reference_energy(&records, EnergyReference::Conformation(0)),
            Some(0.0)
        );
        assert_eq!(reference_energy(&[], EnergyReference::Minimum), None);
    }

    #[test]
    fn energy_threshold_scenario() {
        let records = vec![
            record(0, -100.0, 1.0, 0.0),
            record(1, -90.0, 1.0, 1.0),
            record(2, -20.0, 1.0, 2.0),
        ];
        let reference = normalize(&energies(&records), EnergyReference::Minimum);
        let out = screen(records, reference, &config(Some(65.0), None));

        let kept: Vec<f64> = out.accepted.iter().map(|r| r.relative_energy).collect();
        assert_eq!(kept, vec![0.0, 10.0]);
        assert_eq!(out.rejected.energy, 1);
        assert_eq!(out.rejected.total(), 1);
        assert_eq!(out.reference_energy, Some(-100.0));
    }

    #[test]
    fn force_threshold_scenario() {
        let rec = record(0, 0.0, 250.0, 0.0);
        let strict = FilterThresholds {
            max_force: Some(200.0),
            ..FilterThresholds::default()
        };
        let loose = FilterThresholds {
            max_force: Some(260.0),
            ..FilterThresholds::default()
        };
        assert_eq!(decide(&rec, &strict), Decision::Reject(RejectionReason::Force));
        assert!(accept(&rec, &loose));
    }

    #[test]
    fn boundaries_are_inclusive() {
        let rec = record(0, 0.0, 200.0, 0.0);
        let mut at_boundary = rec.clone();
        at_boundary.relative_energy = 65.0;
        let thresholds = FilterThresholds {
            max_energy: Some(65.0),
            max_force: Some(200.0),
            duplicate_tolerance: None,
        };
        assert!(accept(&at_boundary, &thresholds));
    }

    #[test]
    fn designated_reference_compares_absolute_value() {
        let records = vec![record(0, 0.0, 0.0, 0.0), record(1, 100.0, 0.0, 1.0)];
        let cfg = FilterConfig {
            reference: EnergyReference::Conformation(1),
            ..config(Some(65.0), None)
        };
        let reference = normalize(&energies(&records), cfg.reference);
        let out = screen(records, reference, &cfg);
        assert_eq!(out.accepted.len(), 1);
        assert_eq!(out.accepted[0].relative_energy, 0.0);
        assert_eq!(out.accepted[0].provenance.conformation_index, 1);
        assert_eq!(out.rejected.energy, 1);
    }

    #[test]
    fn kept_minimum_is_rezeroed() {
        let records = vec![record(0, 0.0, 500.0, 0.0), record(1, 3.0, 1.0, 1.0)];
        let reference = normalize(&energies(&records), EnergyReference::Minimum);
        let out = screen(records, reference, &config(None, Some(100.0)));
        assert_eq!(out.accepted.len(), 1);
        assert_eq!(out.accepted[0].relative_energy, 0.0);
        assert_eq!(out.reference_energy, Some(3.0));
        assert_eq!(out.rejected.force, 1);
    }

    #[test]
    fn duplicates_are_rejected_in_source_order() {
        let records = vec![
            record(0, 1.0, 0.0, 0.0),
            record(1, 0.0, 0.0, 0.005),
            record(2, 2.0, 0.0, 3.0),
        ];
        let mut cfg = config(None, None);
        cfg.thresholds.duplicate_tolerance = Some(0.01);
        let reference = normalize(&energies(&records), cfg.reference);
        let out = screen(records, reference, &cfg);

        let kept: Vec<usize> = out
            .accepted
            .iter()
            .map(|r| r.provenance.conformation_index)
            .collect();
        assert_eq!(kept, vec![0, 2]);
        assert_eq!(out.rejected.duplicate, 1);
    }

    #[test]
    fn non_finite_records_are_rejected() {
        let mut bad = record(1, 1.0, 0.0, 1.0);
        bad.forces[1][2] = f64::INFINITY;
        let records = vec![record(0, 0.0, 0.0, 0.0), bad, record(2, f64::NAN, 0.0, 2.0)];
        let reference = normalize(&energies(&records), EnergyReference::Minimum);
        let out = screen(records, reference, &config(None, None));
        assert_eq!(out.accepted.len(), 1);
        assert_eq!(out.rejected.non_finite, 2);
    }

    #[test]
    fn missing_reference_rejects_everything() {
        let records = vec![record(0, f64::NAN, 0.0, 0.0)];
        let out = screen(records, None, &config(None, None));
        assert!(out.accepted.is_empty());
        assert_eq!(out.rejected.non_finite, 1);
        assert_eq!(out.reference_energy, None);
    }

    #[test]
    fn tightening_never_accepts_more() {
        let records: Vec<_> = (0..20)
            .map(|i| record(i, (i * 7 % 13) as f64 * 10.0, (i * 5 % 11) as f64 * 30.0, i as f64))
            .collect();
        let reference = normalize(&energies(&records), EnergyReference::Minimum);
        let mut previous = usize::MAX;
        for max in [1000.0, 300.0, 120.0, 60.0, 10.0, 0.0] {
            let out = screen(records.clone(), reference, &config(Some(max), Some(max * 2.0)));
            assert!(out.accepted.len() <= previous);
            previous = out.accepted.len();
        }
    }
}
