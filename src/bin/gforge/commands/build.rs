use anyhow::{Context, Result, bail};

use graph_forge::dataset::render_report;
use graph_forge::io::StructureStore;
use graph_forge::{ChargeMethod, Pipeline, PipelineConfig};

use crate::cli::{BuildArgs, GlobalOptions};
use crate::config::{build_pipeline_config, build_store_options, dataset_path, store_path};
use crate::display::{
    Context as DisplayContext, Progress, print_rejections, print_settings, print_store_info,
    print_summary,
};
use crate::util::convert::source_display_name;
use crate::util::text::threshold;

const TOTAL_STEPS: u8 = 3;

pub fn run_build(args: BuildArgs, global: &GlobalOptions, ctx: DisplayContext) -> Result<()> {
    let store_root = store_path(&global.store_dir, &args.name)?;
    let output = dataset_path(&global.dataset_dir, &args.name)?;
    let options = build_store_options(&args.source);
    let config = build_pipeline_config(&args, output)?;

    let mut progress = Progress::new(ctx.interactive, TOTAL_STEPS);

    progress.step("Opening structure store");
    let store = StructureStore::open(&store_root, options).with_context(|| {
        format!("Failed to open structure set '{}'", store_root.display())
    })?;
    if store.is_empty() {
        bail!(
            "Structure set '{}' holds no .{} entries",
            store_root.display(),
            options.mode.extension()
        );
    }
    let store_substeps = [
        format!("{} molecule entries", store.len()),
        format!("Layout: {}", source_display_name(options.mode)),
    ];
    let store_substeps_ref: Vec<&str> = store_substeps.iter().map(String::as_str).collect();
    progress.complete_step("Opening structure store", &store_substeps_ref);

    if ctx.interactive {
        print_store_info(
            &args.name,
            store.root(),
            options.mode,
            options.units,
            store.len(),
            None,
        );
    }

    progress.step("Loading force field parameters");
    let param_substeps = build_param_substeps(&args, &config);
    let pipeline = Pipeline::new(config).context("Failed to prepare the pipeline")?;
    let param_substeps_ref: Vec<&str> = param_substeps.iter().map(String::as_str).collect();
    progress.complete_step("Loading force field parameters", &param_substeps_ref);

    progress.step("Building graph dataset");
    let bar = progress.molecule_bar();
    let result = pipeline.run_store(&args.name, &store, &bar);
    let failed = bar.finish();
    let dataset = result.with_context(|| format!("Failed to build dataset '{}'", args.name))?;

    let build_substeps = [
        format!("{} graph records", dataset.records().len()),
        format!("{} molecules failed assignment", failed),
        format!(
            "Written to {}",
            dataset
                .location()
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        ),
    ];
    let build_substeps_ref: Vec<&str> = build_substeps.iter().map(String::as_str).collect();
    progress.complete_step("Building graph dataset", &build_substeps_ref);

    if ctx.interactive {
        print_settings(dataset.metadata());
        print_summary(dataset.summary());
        print_rejections(dataset.summary());
    } else {
        print!("{}", render_report(dataset.metadata(), dataset.summary()));
    }

    progress.finish("Dataset complete");

    Ok(())
}

fn build_param_substeps(args: &BuildArgs, config: &PipelineConfig) -> Vec<String> {
    let mut steps = Vec::new();

    match &args.topology.params {
        Some(path) => steps.push(format!("Custom parameters from {}", path.display())),
        None => steps.push("Embedded DREIDING parameters".to_string()),
    }
    if let Some(path) = &args.topology.rules {
        steps.push(format!("Custom typing rules from {}", path.display()));
    }
    if let ChargeMethod::Qeq(qeq) = config.forge.charge_method {
        steps.push(format!("QEq charges, net charge {}", qeq.total_charge));
    }

    let thresholds = &config.filter.thresholds;
    steps.push(format!(
        "Max energy {}, max force {}",
        threshold(thresholds.max_energy, "kcal/mol"),
        threshold(thresholds.max_force, "kcal/mol/Å")
    ));

    if let Some(cutoff) = config.graph.nonbonded_cutoff {
        steps.push(format!("Non-bonded edges within {} Å", cutoff));
    }

    steps
}
