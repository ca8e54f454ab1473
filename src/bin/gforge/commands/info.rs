use std::io::{self, Write};

use anyhow::{Context, Result};

use graph_forge::dataset::{read_manifest, render_report};

use crate::cli::{GlobalOptions, InfoArgs};
use crate::config::dataset_path;
use crate::display::{Context as DisplayContext, print_rejections, print_settings, print_summary};

pub fn run_info(args: InfoArgs, global: &GlobalOptions, ctx: DisplayContext) -> Result<()> {
    let dir = dataset_path(&global.dataset_dir, &args.name)?;
    let manifest = read_manifest(&dir)
        .with_context(|| format!("Failed to read dataset '{}'", dir.display()))?;

    if args.json {
        let mut stdout = io::stdout().lock();
        serde_json::to_writer_pretty(&mut stdout, &manifest)
            .context("Failed to print manifest")?;
        writeln!(stdout)?;
        return Ok(());
    }

    if ctx.interactive {
        eprintln!(
            "      Dataset '{}': {} records, {}",
            manifest.metadata.name, manifest.record_count, manifest.metadata.generator
        );
        eprintln!();
        print_settings(&manifest.metadata);
        print_summary(&manifest.summary);
        print_rejections(&manifest.summary);
    } else {
        print!("{}", render_report(&manifest.metadata, &manifest.summary));
    }

    Ok(())
}
