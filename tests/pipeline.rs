mod common;

use std::fs;
use std::path::Path;

use graph_forge::dataset::{self, SUMMARY_FILE, read_manifest, read_records};
use graph_forge::io::{SourceMode, StoreOptions, StructureStore};
use graph_forge::{
    Dataset, FilterConfig, FilterThresholds, NoopObserver, OutputTarget, Pipeline,
    PipelineConfig, PipelineError, RejectionReason,
};
use tempfile::TempDir;

fn config(thresholds: FilterThresholds, output: Option<&Path>, overwrite: bool) -> PipelineConfig {
    PipelineConfig {
        filter: FilterConfig {
            thresholds,
            ..FilterConfig::default()
        },
        output: output.map(|path| OutputTarget {
            path: path.to_path_buf(),
            overwrite,
        }),
        ..PipelineConfig::default()
    }
}

fn energy_limit(max_energy: f64) -> FilterThresholds {
    FilterThresholds {
        max_energy: Some(max_energy),
        ..FilterThresholds::default()
    }
}

fn run(store_dir: &Path, config: PipelineConfig) -> Result<Dataset, PipelineError> {
    let store = StructureStore::open(store_dir, StoreOptions::default())?;
    Pipeline::new(config)?.run_store("demo", &store, &NoopObserver)
}

#[test]
fn mixed_store_is_filtered_and_persisted() {
    let tmp = TempDir::new().unwrap();
    let store_dir = tmp.path().join("structures/demo");
    let out = tmp.path().join("datasets/demo");
    common::mixed_store(&store_dir);

    let dataset = run(&store_dir, config(energy_limit(10.0), Some(&out), false)).unwrap();

    // hcl keeps both conformations, water loses the 26 kcal/mol one.
    let keys: Vec<(usize, usize)> = dataset
        .records()
        .iter()
        .map(|r| (r.provenance.molecule_index, r.provenance.conformation_index))
        .collect();
    assert_eq!(keys, vec![(1, 0), (1, 1), (2, 0), (2, 1)]);

    let summary = dataset.summary();
    assert_eq!(summary.molecules_processed, 3);
    assert_eq!(summary.molecules_assigned, 2);
    assert_eq!(summary.molecules_failed, 1);
    assert_eq!(summary.assignment_failures.get("disconnected_fragments"), Some(&1));
    assert_eq!(summary.conformations_total, 6);
    assert_eq!(summary.conformations_accepted, 4);
    assert_eq!(summary.rejected.get(RejectionReason::Energy), 1);
    assert_eq!(summary.conformations_skipped(), 1);

    assert_eq!(dataset.location(), Some(out.as_path()));
    let manifest = read_manifest(&out).unwrap();
    assert!(manifest.finalized);
    assert_eq!(manifest.record_count, 4);
    assert_eq!(&manifest.summary, summary);
    let stored = read_records(&out).unwrap();
    assert_eq!(stored.len(), dataset.records().len());
    for (back, record) in stored.iter().zip(dataset.records()) {
        assert_eq!(back.provenance, record.provenance);
        assert_eq!(back.nodes.len(), record.nodes.len());
        assert_eq!(back.edges.len(), record.edges.len());
    }

    let report = fs::read_to_string(out.join(SUMMARY_FILE)).unwrap();
    assert!(report.contains("1 molecules failed assignment"));
    assert!(report.contains("1 conformations rejected by energy threshold"));
    assert!(report.contains("max energy (kcal/mol): 10"));
}

#[test]
fn every_record_has_one_node_per_atom() {
    let tmp = TempDir::new().unwrap();
    common::mixed_store(tmp.path());

    let dataset = run(tmp.path(), PipelineConfig::default()).unwrap();
    assert_eq!(dataset.records().len(), 5);
    for record in dataset.records() {
        let atoms = if record.provenance.molecule_id == "water" { 3 } else { 2 };
        assert_eq!(record.node_count(), atoms);
        assert_eq!(record.positions.len(), atoms);
        assert_eq!(record.forces.len(), atoms);
    }
}

#[test]
fn gradients_become_forces() {
    let tmp = TempDir::new().unwrap();
    common::write_json(tmp.path(), "hcl", &common::hcl_entry());

    let dataset = run(tmp.path(), PipelineConfig::default()).unwrap();
    assert_eq!(dataset.records()[0].forces[0], [2.0, 0.0, 0.0]);
    assert_eq!(dataset.records()[0].bonded_edges().count(), 1);
}

#[test]
fn minimum_reference_puts_lowest_kept_energy_at_zero() {
    let tmp = TempDir::new().unwrap();
    common::mixed_store(tmp.path());

    let dataset = run(tmp.path(), PipelineConfig::default()).unwrap();
    for id in ["hcl", "water"] {
        let lowest = dataset
            .records()
            .iter()
            .filter(|r| r.provenance.molecule_id == id)
            .map(|r| r.relative_energy)
            .fold(f64::INFINITY, f64::min);
        assert_eq!(lowest, 0.0, "{id}");
    }
}

#[test]
fn tightening_thresholds_never_adds_records() {
    let tmp = TempDir::new().unwrap();
    common::mixed_store(tmp.path());

    let mut previous = usize::MAX;
    for max_force in [10.0, 2.0, 1.0, 0.5, 0.0] {
        let thresholds = FilterThresholds {
            max_force: Some(max_force),
            ..FilterThresholds::default()
        };
        let kept = run(tmp.path(), config(thresholds, None, false))
            .unwrap()
            .records()
            .len();
        assert!(kept <= previous, "max_force {max_force}: {kept} > {previous}");
        previous = kept;
    }

    let mut previous = usize::MAX;
    for max_energy in [100.0, 10.0, 0.1, 0.0] {
        let kept = run(tmp.path(), config(energy_limit(max_energy), None, false))
            .unwrap()
            .records()
            .len();
        assert!(kept <= previous);
        previous = kept;
    }
}

#[test]
fn repeated_runs_are_identical() {
    let tmp = TempDir::new().unwrap();
    common::mixed_store(tmp.path());

    let a = run(tmp.path(), PipelineConfig::default()).unwrap();
    let b = run(tmp.path(), PipelineConfig::default()).unwrap();
    assert_eq!(a.records(), b.records());
    assert_eq!(a.summary(), b.summary());
}

#[test]
fn existing_dataset_needs_overwrite() {
    let tmp = TempDir::new().unwrap();
    let store_dir = tmp.path().join("store");
    let out = tmp.path().join("out");
    common::mixed_store(&store_dir);

    run(&store_dir, config(energy_limit(10.0), Some(&out), false)).unwrap();

    let err = run(&store_dir, config(energy_limit(1.0), Some(&out), false)).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Dataset(dataset::Error::Exists(_))
    ));
    assert_eq!(read_manifest(&out).unwrap().record_count, 4);

    let replaced = run(&store_dir, config(energy_limit(0.01), Some(&out), true)).unwrap();
    assert_eq!(
        read_manifest(&out).unwrap().record_count,
        replaced.records().len()
    );
}

#[test]
fn store_without_assignable_molecules_fails_and_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let store_dir = tmp.path().join("store");
    let out = tmp.path().join("out");
    common::write_json(&store_dir, "split", &common::split_entry());

    let err = run(&store_dir, config(FilterThresholds::default(), Some(&out), false)).unwrap_err();
    assert!(matches!(err, PipelineError::NoMoleculesAssigned { processed: 1 }));
    assert!(!out.exists());
}

#[test]
fn malformed_entry_aborts_the_run() {
    let tmp = TempDir::new().unwrap();
    common::mixed_store(tmp.path());
    fs::write(tmp.path().join("broken.json"), "{ \"elements\": [\"O\"").unwrap();

    let err = run(tmp.path(), PipelineConfig::default()).unwrap_err();
    assert!(matches!(err, PipelineError::Store(_)));
}

#[test]
fn aborted_run_is_not_finalized() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("out");
    common::mixed_store(&tmp.path().join("store"));

    let store = StructureStore::open(tmp.path().join("store"), StoreOptions::default()).unwrap();
    let pipeline =
        Pipeline::new(config(FilterThresholds::default(), Some(&out), false)).unwrap();
    pipeline.abort_handle().abort();

    let err = pipeline.run_store("demo", &store, &NoopObserver).unwrap_err();
    assert!(matches!(err, PipelineError::Aborted));
    assert!(!out.exists());
}

#[test]
fn sdf_store_runs_end_to_end() {
    let tmp = TempDir::new().unwrap();
    let sdf = "\
HCl
  test

  2  1  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 Cl  0  0  0  0  0  0  0  0  0  0  0  0
    1.2700    0.0000    0.0000 H   0  0  0  0  0  0  0  0  0  0  0  0
  1  2  1  0
M  END
> <energy>
-0.5

> <forces>
0.1 0.0 0.0
-0.1 0.0 0.0

$$$$
";
    fs::write(tmp.path().join("hcl.sdf"), sdf).unwrap();

    let options = StoreOptions {
        mode: SourceMode::Sdf,
        ..StoreOptions::default()
    };
    let store = StructureStore::open(tmp.path(), options).unwrap();
    assert_eq!(store.ids(), vec!["hcl".to_string()]);

    let dataset = Pipeline::new(PipelineConfig::default())
        .unwrap()
        .run_store("sdf", &store, &NoopObserver)
        .unwrap();
    assert_eq!(dataset.records().len(), 1);
    assert_eq!(dataset.records()[0].nodes[0].atom_type, "Cl");
}
