use std::error::Error as StdError;
use std::io::{self, Write};

use anyhow::Error;
use graph_forge::dataset::Error as DatasetError;
use graph_forge::io::Error as StoreError;
use graph_forge::{AssignmentFailure, PipelineError};

use crate::util::text::wrap;

#[rustfmt::skip]
pub fn print_error(err: &Error) {
    let mut stderr = io::stderr().lock();

    let _ = writeln!(stderr);
    let _ = writeln!(stderr, "   ╔══════════════════════════════════════════════════════════════╗");
    let _ = writeln!(stderr, "   ║  ✗ Error                                                     ║");
    let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");

    for line in wrap(&err.to_string(), 59) {
        let _ = writeln!(stderr, "   ║  {:<59} ║", line);
    }

    for cause in err.chain().skip(1) {
        let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");
        let _ = writeln!(stderr, "   ║  Caused by:                                                  ║");
        for line in wrap(&cause.to_string(), 57) {
            let _ = writeln!(stderr, "   ║    {:<57} ║", line);
        }
    }

    let hints = HintCollector::collect(err);
    if !hints.is_empty() {
        let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");
        let _ = writeln!(stderr, "   ║  Hints:                                                      ║");
        for hint in hints {
            let wrapped = wrap(&hint, 55);
            if let Some((first, rest)) = wrapped.split_first() {
                let _ = writeln!(stderr, "   ║    • {:<55} ║", first);
                for line in rest {
                    let _ = writeln!(stderr, "   ║      {:<55} ║", line);
                }
            }
        }
    }

    let _ = writeln!(stderr, "   ╚══════════════════════════════════════════════════════════════╝");
    let _ = writeln!(stderr);
}

#[derive(Default)]
struct HintCollector {
    hints: Vec<String>,
}

impl HintCollector {
    /// Hints for the outermost library error found in the chain.
    fn collect(err: &Error) -> Vec<String> {
        let mut collector = Self::default();

        for cause in err.chain() {
            let typed = collector.pipeline_hints(cause)
                || collector.store_hints(cause)
                || collector.dataset_hints(cause)
                || collector.assignment_hints(cause);
            if typed {
                return collector.hints;
            }
        }

        collector.fallback_hints(err);
        collector.hints
    }

    fn add(&mut self, hint: impl Into<String>) {
        self.hints.push(hint.into());
    }

    fn pipeline_hints(&mut self, cause: &(dyn StdError + 'static)) -> bool {
        let Some(err) = cause.downcast_ref::<PipelineError>() else {
            return false;
        };

        match err {
            PipelineError::Store(inner) => self.collect_store(inner),
            PipelineError::Dataset(inner) => self.collect_dataset(inner),
            PipelineError::Config(inner) => self.collect_assignment(inner),
            PipelineError::NoMoleculesAssigned { processed } => {
                self.add(format!(
                    "All {} molecules failed topology assignment; nothing was written",
                    processed
                ));
                self.add("Run with -v to log the failure reason of each molecule");
                self.add("Use --allow-fragments if entries hold several molecules");
                self.add("Check that the store holds entries of the selected --source layout");
            }
            PipelineError::Aborted => {
                self.add("The run was stopped before completion; no dataset was written");
            }
        }
        true
    }

    fn store_hints(&mut self, cause: &(dyn StdError + 'static)) -> bool {
        match cause.downcast_ref::<StoreError>() {
            Some(err) => {
                self.collect_store(err);
                true
            }
            None => false,
        }
    }

    fn dataset_hints(&mut self, cause: &(dyn StdError + 'static)) -> bool {
        match cause.downcast_ref::<DatasetError>() {
            Some(err) => {
                self.collect_dataset(err);
                true
            }
            None => false,
        }
    }

    fn assignment_hints(&mut self, cause: &(dyn StdError + 'static)) -> bool {
        match cause.downcast_ref::<AssignmentFailure>() {
            Some(err) => {
                self.collect_assignment(err);
                true
            }
            None => false,
        }
    }

    fn collect_store(&mut self, err: &StoreError) {
        match err {
            StoreError::Io { source, .. } => self.collect_std_io(source),
            StoreError::Parse { line, .. } => {
                self.add(format!("Inspect the entry around line {}", line));
                self.add("SDF entries need a V2000 counts line and <energy> data items");
            }
            StoreError::Json { .. } => {
                self.add("JSON entries need 'elements' and 'conformations' fields");
                self.add("Each conformation needs 'positions', 'energy' and 'forces' or 'gradients'");
            }
            StoreError::Invalid { .. } => {
                self.add("Per-atom arrays must have one entry per element");
                self.add("Check that --source matches the layout of the entry files");
            }
        }
    }

    fn collect_dataset(&mut self, err: &DatasetError) {
        match err {
            DatasetError::Exists(_) => {
                self.add("Pass --overwrite to replace the existing dataset");
                self.add("Or pick a different NAME");
            }
            DatasetError::NotFinalized(_) => {
                self.add("The directory holds an interrupted or foreign dataset");
                self.add("Rebuild it with `gforge build <NAME> --overwrite`");
            }
            DatasetError::Io { source, .. } => self.collect_std_io(source),
            DatasetError::Serialization(_) => {
                self.add("Dataset files are corrupt or from an incompatible version");
            }
            DatasetError::InvalidTarget(_) => {
                self.add("Choose a NAME that is a plain directory name");
            }
            DatasetError::AlreadyFinalized
            | DatasetError::LockPoisoned
            | DatasetError::DuplicateRecord { .. } => {
                self.add("This is an internal error; please report it with the command used");
            }
        }
    }

    fn collect_assignment(&mut self, err: &AssignmentFailure) {
        match err {
            AssignmentFailure::ParameterParse(_) => {
                self.add("The --params file is not valid TOML");
                self.add("Expected a [global] table and one [atoms.<TYPE>] table per atom type");
            }
            AssignmentFailure::MissingParameter { atom_type, .. } => {
                self.add(format!("Add an [atoms.{}] table to the --params file", atom_type));
            }
            _ => {
                self.add("Run with -v to see per-molecule assignment details");
            }
        }
    }

    fn collect_std_io(&mut self, source: &io::Error) {
        use io::ErrorKind;

        match source.kind() {
            ErrorKind::NotFound => {
                self.add("File or directory not found");
                self.add("Check --store-dir / GFORGE_STORE_DIR and the NAME argument");
            }
            ErrorKind::PermissionDenied => {
                self.add("Permission denied; check directory permissions with `ls -la`");
            }
            ErrorKind::WriteZero | ErrorKind::StorageFull => {
                self.add("Check available disk space under --dataset-dir");
            }
            _ => {
                self.add("Check paths, permissions and disk space");
            }
        }
    }

    fn fallback_hints(&mut self, err: &Error) {
        let text = err
            .chain()
            .map(|c| c.to_string().to_lowercase())
            .collect::<Vec<_>>()
            .join("\n");

        if text.contains("no such file") || text.contains("not found") {
            self.add("Check that the path is correct and readable");
        } else if text.contains("permission denied") {
            self.add("Check file permissions with `ls -la`");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn existing_dataset_suggests_overwrite() {
        let err = Error::new(DatasetError::Exists(PathBuf::from("datasets/x")))
            .context("Failed to build dataset 'x'");
        let hints = HintCollector::collect(&err);
        assert!(hints.iter().any(|h| h.contains("--overwrite")));
    }

    #[test]
    fn wrapped_store_error_is_found() {
        let store = StoreError::io(
            std::path::Path::new("structures/x"),
            io::Error::from(io::ErrorKind::NotFound),
        );
        let err = Error::new(PipelineError::Store(store));
        let hints = HintCollector::collect(&err);
        assert!(hints.iter().any(|h| h.contains("GFORGE_STORE_DIR")));
    }

    #[test]
    fn untyped_errors_fall_back_to_text() {
        let err = anyhow::anyhow!("permission denied while listing");
        let hints = HintCollector::collect(&err);
        assert_eq!(hints.len(), 1);
    }
}
