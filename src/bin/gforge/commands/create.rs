use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use graph_forge::Molecule;
use graph_forge::io::{StructureStore, write_entry};

use crate::cli::{CreateArgs, GlobalOptions};
use crate::config::{build_store_options, store_path};
use crate::display::{Context as DisplayContext, Progress, print_store_info};
use crate::util::convert::source_display_name;

const TOTAL_STEPS: u8 = 2;

pub fn run_create(args: CreateArgs, global: &GlobalOptions, ctx: DisplayContext) -> Result<()> {
    let target = store_path(&global.store_dir, &args.name)?;
    if target.exists() && !args.overwrite {
        bail!(
            "Structure set '{}' already exists at '{}'.\n\nUse --overwrite to replace it.",
            args.name,
            target.display()
        );
    }

    let options = build_store_options(&args.source);
    let mut progress = Progress::new(ctx.interactive, TOTAL_STEPS);

    progress.step("Reading raw entries");
    let source = StructureStore::open(&args.input, options).with_context(|| {
        format!("Failed to open input directory '{}'", args.input.display())
    })?;
    if source.is_empty() {
        bail!(
            "No .{} entries found in '{}'",
            options.mode.extension(),
            args.input.display()
        );
    }
    let molecules = source
        .load_all()
        .context("Failed to load raw entries")?;
    let conformations: usize = molecules.iter().map(Molecule::conformation_count).sum();

    let read_substeps = [
        format!("Parse {} files", source_display_name(options.mode)),
        format!(
            "Convert labels from {} and {}",
            options.units.energy, options.units.length
        ),
    ];
    let read_substeps_ref: Vec<&str> = read_substeps.iter().map(String::as_str).collect();
    progress.complete_step("Reading raw entries", &read_substeps_ref);

    if ctx.interactive {
        print_store_info(
            &args.name,
            &target,
            options.mode,
            options.units,
            molecules.len(),
            Some(conformations),
        );
    }

    progress.step("Writing structure set");
    write_structure_set(&target, &molecules)
        .with_context(|| format!("Failed to write structure set '{}'", args.name))?;
    let written = format!("{} JSON entries", molecules.len());
    progress.complete_step("Writing structure set", &[written.as_str()]);

    log::info!(
        "created structure set '{}' with {} molecules and {} conformations",
        args.name,
        molecules.len(),
        conformations
    );
    progress.finish("Structure set ready");

    Ok(())
}

/// Writes every entry into a staging directory, then swaps it in.
fn write_structure_set(target: &Path, molecules: &[Molecule]) -> Result<()> {
    let staging = staging_path(target)?;
    if staging.exists() {
        fs::remove_dir_all(&staging)
            .with_context(|| format!("Failed to clear '{}'", staging.display()))?;
    }

    let written = molecules
        .iter()
        .try_for_each(|molecule| write_entry(&staging, molecule).map(|_| ()))
        .map_err(anyhow::Error::from)
        .and_then(|()| {
            if target.exists() {
                fs::remove_dir_all(target)
                    .with_context(|| format!("Failed to remove '{}'", target.display()))?;
            }
            fs::rename(&staging, target)
                .with_context(|| format!("Failed to move entries to '{}'", target.display()))
        });

    if written.is_err() {
        let _ = fs::remove_dir_all(&staging);
    }
    written
}

fn staging_path(target: &Path) -> Result<PathBuf> {
    let Some(name) = target.file_name() else {
        bail!("'{}' has no directory name", target.display());
    };
    Ok(target.with_file_name(format!(
        ".{}.partial-{}",
        name.to_string_lossy(),
        std::process::id()
    )))
}
