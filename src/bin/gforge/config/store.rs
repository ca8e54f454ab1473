use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use graph_forge::io::{StoreOptions, Units};

use crate::cli::SourceOptions;

pub fn build_store_options(opts: &SourceOptions) -> StoreOptions {
    StoreOptions {
        mode: opts.source.into(),
        units: Units {
            energy: opts.energy_unit.into(),
            length: opts.length_unit.into(),
        },
    }
}

/// `<store-dir>/<name>`.
pub fn store_path(store_dir: &Path, name: &str) -> Result<PathBuf> {
    Ok(store_dir.join(checked_name(name)?))
}

/// `<dataset-dir>/<name>`.
pub fn dataset_path(dataset_dir: &Path, name: &str) -> Result<PathBuf> {
    Ok(dataset_dir.join(checked_name(name)?))
}

fn checked_name(name: &str) -> Result<&str> {
    let bad = name.is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\'])
        || name.chars().any(char::is_control);
    if bad {
        bail!("Invalid name '{}': expected a plain directory name", name);
    }
    Ok(name)
}
