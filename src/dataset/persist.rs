//! On-disk dataset layout.
//!
//! A dataset directory holds `manifest.json`, `graphs.jsonl` (one record per
//! line) and `summary.txt`. All three are written into a hidden staging
//! directory beside the target and moved into place by a single rename, so a
//! directory under the final name always carries a complete manifest with
//! `finalized: true`.

use super::Error;
use super::RunMetadata;
use super::stats::DatasetSummary;
use crate::model::graph::GraphRecord;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const RECORDS_FILE: &str = "graphs.jsonl";
pub const SUMMARY_FILE: &str = "summary.txt";

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: u32,
    pub finalized: bool,
    pub record_count: usize,
    pub metadata: RunMetadata,
    pub summary: DatasetSummary,
}

/// Writes a finalized dataset to `target`.
#[derive(Debug, Clone)]
pub struct DatasetWriter {
    target: PathBuf,
    overwrite: bool,
}

impl DatasetWriter {
    pub fn new(target: impl Into<PathBuf>, overwrite: bool) -> Self {
        Self {
            target: target.into(),
            overwrite,
        }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Fails early when the target exists and overwriting is off.
    pub fn check_target(&self) -> Result<(), Error> {
        if self.target.exists() && !self.overwrite {
            return Err(Error::Exists(self.target.clone()));
        }
        Ok(())
    }

    /// Writes everything into staging, then renames it onto the target.
    pub fn write(
        &self,
        metadata: &RunMetadata,
        summary: &DatasetSummary,
        records: &[GraphRecord],
    ) -> Result<PathBuf, Error> {
        self.check_target()?;
        let staging = self.staging_path()?;
        if staging.exists() {
            fs::remove_dir_all(&staging).map_err(|e| Error::io(&staging, e))?;
        }

        let written = write_contents(&staging, metadata, summary, records).and_then(|()| {
            if self.target.exists() {
                fs::remove_dir_all(&self.target).map_err(|e| Error::io(&self.target, e))?;
            }
            fs::rename(&staging, &self.target).map_err(|e| Error::io(&self.target, e))
        });

        if let Err(err) = written {
            let _ = fs::remove_dir_all(&staging);
            return Err(err);
        }
        log::info!(
            "wrote {} records to {}",
            records.len(),
            self.target.display()
        );
        Ok(self.target.clone())
    }

    fn staging_path(&self) -> Result<PathBuf, Error> {
        let name = self
            .target
            .file_name()
            .ok_or_else(|| Error::InvalidTarget(self.target.clone()))?;
        let staging_name = format!(
            ".{}.partial-{}",
            name.to_string_lossy(),
            std::process::id()
        );
        Ok(self.target.with_file_name(staging_name))
    }
}

fn write_contents(
    dir: &Path,
    metadata: &RunMetadata,
    summary: &DatasetSummary,
    records: &[GraphRecord],
) -> Result<(), Error> {
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

    let records_path = dir.join(RECORDS_FILE);
    let file = File::create(&records_path).map_err(|e| Error::io(&records_path, e))?;
    let mut writer = BufWriter::new(file);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer
            .write_all(b"\n")
            .map_err(|e| Error::io(&records_path, e))?;
    }
    writer.flush().map_err(|e| Error::io(&records_path, e))?;

    let summary_path = dir.join(SUMMARY_FILE);
    fs::write(&summary_path, render_report(metadata, summary)).map_err(|e| Error::io(&summary_path, e))?;

    let manifest = Manifest {
        format_version: FORMAT_VERSION,
        finalized: true,
        record_count: records.len(),
        metadata: metadata.clone(),
        summary: summary.clone(),
    };
    let manifest_path = dir.join(MANIFEST_FILE);
    let file = File::create(&manifest_path).map_err(|e| Error::io(&manifest_path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &manifest)?;
    writer.flush().map_err(|e| Error::io(&manifest_path, e))?;
    Ok(())
}

/// Human-readable report stored next to the records as `summary.txt`.
pub fn render_report(metadata: &RunMetadata, summary: &DatasetSummary) -> String {
    let mut text = format!("Dataset '{}'\n", metadata.name);
    text.push_str(&metadata.describe());
    text.push_str(&summary.to_string());
    text
}

/// Reads the manifest of a dataset directory, refusing unfinalized ones.
pub fn read_manifest(dir: &Path) -> Result<Manifest, Error> {
    let path = dir.join(MANIFEST_FILE);
    let file = File::open(&path).map_err(|e| Error::io(&path, e))?;
    let manifest: Manifest = serde_json::from_reader(BufReader::new(file))?;
    if !manifest.finalized {
        return Err(Error::NotFinalized(dir.to_path_buf()));
    }
    Ok(manifest)
}

/// Loads every record of a dataset directory in stored order.
pub fn read_records(dir: &Path) -> Result<Vec<GraphRecord>, Error> {
    let path = dir.join(RECORDS_FILE);
    let file = File::open(&path).map_err(|e| Error::io(&path, e))?;
    let mut records = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| Error::io(&path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }
    Ok(records)
}
