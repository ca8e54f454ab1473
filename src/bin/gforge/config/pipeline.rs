use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use graph_forge::{
    FilterConfig, FilterThresholds, ForgeConfig, GraphConfig, OutputTarget, PipelineConfig,
};

use crate::cli::{BuildArgs, FilterOptions, GraphOptions, TopologyOptions};
use crate::util::convert::charge_method;

pub fn build_pipeline_config(args: &BuildArgs, output: PathBuf) -> Result<PipelineConfig> {
    Ok(PipelineConfig {
        forge: build_forge_config(&args.topology)?,
        graph: build_graph_config(&args.graph)?,
        filter: build_filter_config(&args.filter)?,
        output: Some(OutputTarget {
            path: output,
            overwrite: args.overwrite,
        }),
    })
}

fn build_forge_config(opts: &TopologyOptions) -> Result<ForgeConfig> {
    let params = match &opts.params {
        Some(path) => Some(fs::read_to_string(path).with_context(|| {
            format!("Failed to read parameter file '{}'", path.display())
        })?),
        None => None,
    };
    let typing_rules = match &opts.rules {
        Some(path) => Some(fs::read_to_string(path).with_context(|| {
            format!("Failed to read typing rules file '{}'", path.display())
        })?),
        None => None,
    };
    if !opts.total_charge.is_finite() {
        bail!("--total-charge must be finite (got {})", opts.total_charge);
    }

    Ok(ForgeConfig {
        params,
        typing_rules,
        charge_method: charge_method(opts.charges, opts.total_charge),
        allow_fragments: opts.allow_fragments,
        ..ForgeConfig::default()
    })
}

fn build_graph_config(opts: &GraphOptions) -> Result<GraphConfig> {
    check_positive("--cutoff", opts.cutoff)?;
    Ok(GraphConfig {
        nonbonded_cutoff: opts.cutoff,
        include_angles: !opts.no_angles,
        include_propers: !opts.no_propers,
        include_impropers: !opts.no_impropers,
    })
}

fn build_filter_config(opts: &FilterOptions) -> Result<FilterConfig> {
    check_positive("--max-energy", opts.max_energy)?;
    check_positive("--max-force", opts.max_force)?;
    check_positive("--dedup-tol", opts.dedup_tolerance)?;
    Ok(FilterConfig {
        thresholds: FilterThresholds {
            max_energy: opts.max_energy,
            max_force: opts.max_force,
            duplicate_tolerance: opts.dedup_tolerance,
        },
        reference: opts.reference.into(),
    })
}

fn check_positive(flag: &str, value: Option<f64>) -> Result<()> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => {
            bail!("{} must be a finite, non-negative number (got {})", flag, v)
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Command};
    use clap::Parser;
    use graph_forge::{ChargeMethod, EnergyReference};

    fn build_args(extra: &[&str]) -> BuildArgs {
        let mut argv = vec!["gforge", "build", "set"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Build(args) => args,
            _ => unreachable!(),
        }
    }

    #[test]
    fn defaults_disable_every_rule() {
        let config = build_pipeline_config(&build_args(&[]), PathBuf::from("out")).unwrap();
        assert_eq!(config.filter, FilterConfig::default());
        assert_eq!(config.graph, GraphConfig::default());
        assert_eq!(config.forge.charge_method, ChargeMethod::None);
        assert_eq!(config.output.map(|o| o.overwrite), Some(false));
    }

    #[test]
    fn flags_map_onto_config() {
        let args = build_args(&[
            "--max-energy",
            "25",
            "--reference",
            "1",
            "--no-angles",
            "--overwrite",
        ]);
        let config = build_pipeline_config(&args, PathBuf::from("out")).unwrap();
        assert_eq!(config.filter.thresholds.max_energy, Some(25.0));
        assert_eq!(config.filter.reference, EnergyReference::Conformation(1));
        assert!(!config.graph.include_angles);
        assert!(config.graph.include_propers);
        assert_eq!(config.output.map(|o| o.overwrite), Some(true));
    }

    #[test]
    fn negative_threshold_is_refused() {
        let args = build_args(&["--max-force=-1"]);
        assert!(build_pipeline_config(&args, PathBuf::from("out")).is_err());
    }

    #[test]
    fn qeq_takes_the_net_charge() {
        let args = build_args(&["--charges", "qeq", "--total-charge", "-1"]);
        let config = build_pipeline_config(&args, PathBuf::from("out")).unwrap();
        match config.forge.charge_method {
            ChargeMethod::Qeq(qeq) => assert_eq!(qeq.total_charge, -1.0),
            other => panic!("unexpected charge method {:?}", other),
        }
    }

    #[test]
    fn missing_rules_file_is_reported() {
        let args = build_args(&["--rules", "/nonexistent/rules.toml"]);
        let err = build_pipeline_config(&args, PathBuf::from("out")).unwrap_err();
        assert!(err.to_string().contains("rules.toml"));
    }

    #[test]
    fn missing_params_file_is_reported() {
        let args = build_args(&["--params", "/nonexistent/params.toml"]);
        let err = build_pipeline_config(&args, PathBuf::from("out")).unwrap_err();
        assert!(err.to_string().contains("params.toml"));
    }
}
