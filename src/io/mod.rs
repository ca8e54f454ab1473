//! Structure store access.
//!
//! A store is a directory with one entry file per molecule. The entry's file
//! stem is the molecule id, and entries are visited in file-name order, which
//! fixes the molecule index of every record. Raw labels are converted to
//! kcal/mol and Å as they are loaded.
//!
//! # Layouts
//!
//! - [`SourceMode::Generic`]: `<id>.json` entries (see [`write_entry`]).
//! - [`SourceMode::Sdf`]: `<id>.sdf` multi-conformer V2000 files.
//!
//! Any unreadable directory or malformed entry is an [`Error`]; callers treat
//! it as fatal for the whole run.

pub mod error;
mod json;
mod sdf;
mod units;

pub use error::Error;
pub use units::{EnergyUnit, LengthUnit, ParseUnitError, Units};

use crate::model::molecule::Molecule;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// On-disk layout of store entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SourceMode {
    #[default]
    Generic,
    Sdf,
}

impl SourceMode {
    pub fn extension(&self) -> &'static str {
        match self {
            SourceMode::Generic => "json",
            SourceMode::Sdf => "sdf",
        }
    }
}

impl fmt::Display for SourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SourceMode::Generic => "generic",
            SourceMode::Sdf => "sdf",
        })
    }
}

impl FromStr for SourceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "generic" | "json" => Ok(SourceMode::Generic),
            "sdf" | "sd" => Ok(SourceMode::Sdf),
            _ => Err(format!("unknown source mode '{s}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreOptions {
    pub mode: SourceMode,
    pub units: Units,
}

/// A directory of molecule entries.
#[derive(Debug, Clone)]
pub struct StructureStore {
    root: PathBuf,
    options: StoreOptions,
    entries: Vec<PathBuf>,
}

impl StructureStore {
    /// Lists the entries under `root` matching the layout's extension.
    pub fn open(root: impl Into<PathBuf>, options: StoreOptions) -> Result<Self, Error> {
        let root = root.into();
        let extension = options.mode.extension();

        let mut entries = Vec::new();
        for entry in fs::read_dir(&root).map_err(|e| Error::io(&root, e))? {
            let path = entry.map_err(|e| Error::io(&root, e))?.path();
            let matches = path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
            if matches {
                entries.push(path);
            }
        }
        entries.sort();

        log::debug!(
            "opened {} store at {} with {} entries",
            options.mode,
            root.display(),
            entries.len()
        );
        Ok(Self {
            root,
            options,
            entries,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn options(&self) -> StoreOptions {
        self.options
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Molecule ids in iteration order.
    pub fn ids(&self) -> Vec<String> {
        self.entries.iter().map(|p| entry_id(p)).collect()
    }

    /// Loads the molecule at `index` in iteration order.
    pub fn load(&self, index: usize) -> Result<Molecule, Error> {
        let path = self.entries.get(index).ok_or_else(|| {
            Error::invalid(&self.root, format!("no entry at index {index}"))
        })?;
        read_entry(path, self.options)
    }

    pub fn iter(&self) -> impl Iterator<Item = Result<Molecule, Error>> + '_ {
        self.entries.iter().map(|p| read_entry(p, self.options))
    }

    /// Loads every entry, failing on the first malformed one.
    pub fn load_all(&self) -> Result<Vec<Molecule>, Error> {
        self.iter().collect()
    }
}

fn entry_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Reads a single entry file; the id is the file stem.
pub fn read_entry(path: &Path, options: StoreOptions) -> Result<Molecule, Error> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let reader = BufReader::new(file);
    let id = entry_id(path);
    match options.mode {
        SourceMode::Generic => json::read(reader, path, &id, options.units),
        SourceMode::Sdf => sdf::read(reader, path, &id, options.units),
    }
}

/// Writes `molecule` as `<dir>/<id>.json` in the generic layout.
///
/// Labels are written as held, i.e. in kcal/mol and Å.
pub fn write_entry(dir: &Path, molecule: &Molecule) -> Result<PathBuf, Error> {
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    let path = dir.join(format!("{}.json", molecule.id));
    let file = File::create(&path).map_err(|e| Error::io(&path, e))?;
    let mut writer = BufWriter::new(file);
    json::write(&mut writer, molecule).map_err(|source| Error::Json {
        path: path.clone(),
        source,
    })?;
    writer.flush().map_err(|e| Error::io(&path, e))?;
    Ok(path)
}
