use std::sync::Arc;
use std::thread;

use graph_forge::dataset::{self, DatasetWriter, read_manifest};
use graph_forge::{
    DatasetAssembler, GraphRecord, MoleculeReport, MoleculeStatus, Provenance, RejectionCounts,
    RunMetadata,
};
use tempfile::TempDir;

fn record(molecule_index: usize, conformation_index: usize) -> GraphRecord {
    GraphRecord {
        provenance: Provenance {
            molecule_index,
            conformation_index,
            molecule_id: format!("m{molecule_index}"),
        },
        nodes: Vec::new(),
        edges: Vec::new(),
        angles: Vec::new(),
        propers: Vec::new(),
        impropers: Vec::new(),
        positions: Vec::new(),
        energy: -1.0,
        relative_energy: 0.0,
        forces: Vec::new(),
    }
}

fn report(molecule_index: usize, accepted: usize) -> MoleculeReport {
    MoleculeReport {
        molecule_id: format!("m{molecule_index}"),
        molecule_index,
        atom_count: 0,
        conformations: accepted,
        status: MoleculeStatus::Assigned,
        accepted,
        rejected: RejectionCounts::default(),
        reference_energy: Some(-1.0),
    }
}

#[test]
fn workers_finishing_out_of_order_still_yield_store_order() {
    let assembler = Arc::new(DatasetAssembler::new(RunMetadata::new("order")));

    let handles: Vec<_> = (0..4)
        .rev()
        .map(|molecule| {
            let assembler = Arc::clone(&assembler);
            thread::spawn(move || {
                for conformation in (0..5).rev() {
                    assembler.add(record(molecule, conformation)).unwrap();
                }
                assembler.record_molecule(report(molecule, 5)).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let dataset = assembler.finalize().unwrap();
    let keys: Vec<(usize, usize)> = dataset
        .records()
        .iter()
        .map(|r| (r.provenance.molecule_index, r.provenance.conformation_index))
        .collect();
    let expected: Vec<(usize, usize)> = (0..4).flat_map(|m| (0..5).map(move |c| (m, c))).collect();
    assert_eq!(keys, expected);

    let molecules: Vec<usize> = dataset
        .summary()
        .molecules
        .iter()
        .map(|r| r.molecule_index)
        .collect();
    assert_eq!(molecules, vec![0, 1, 2, 3]);
}

#[test]
fn second_finalize_fails_without_touching_the_dataset() {
    let tmp = TempDir::new().unwrap();
    let target = tmp.path().join("sealed");
    let assembler = DatasetAssembler::new(RunMetadata::new("sealed"))
        .with_writer(DatasetWriter::new(&target, false));
    assembler.add(record(0, 0)).unwrap();
    assembler.record_molecule(report(0, 1)).unwrap();

    let first = assembler.finalize().unwrap();
    assert_eq!(first.records().len(), 1);

    assert!(matches!(
        assembler.finalize(),
        Err(dataset::Error::AlreadyFinalized)
    ));
    assert!(matches!(
        assembler.add(record(0, 1)),
        Err(dataset::Error::AlreadyFinalized)
    ));
    assert_eq!(read_manifest(&target).unwrap().record_count, 1);
}

#[test]
fn unfinished_dataset_directory_is_not_accepted() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("partial");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(dataset::RECORDS_FILE), "").unwrap();

    assert!(read_manifest(&dir).is_err());
}
