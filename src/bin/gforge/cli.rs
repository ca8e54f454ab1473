use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "gforge",
    about = "Graph datasets for machine-learned force fields",
    version,
    author,
    before_help = crate::display::banner_for_help(),
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Ingest raw molecule entries into the structure store
    #[command(visible_alias = "c")]
    Create(CreateArgs),

    /// Build a filtered graph dataset from a stored structure set
    #[command(visible_alias = "b")]
    Build(BuildArgs),

    /// Print the summary of a finalized dataset
    #[command(visible_alias = "i")]
    Info(InfoArgs),
}

/// Locations and output options shared by all commands.
#[derive(Args)]
pub struct GlobalOptions {
    /// Root of the structure store
    #[arg(
        long,
        value_name = "DIR",
        env = "GFORGE_STORE_DIR",
        default_value = "structures",
        global = true
    )]
    pub store_dir: PathBuf,

    /// Base directory of derived datasets
    #[arg(
        long,
        value_name = "DIR",
        env = "GFORGE_DATASET_DIR",
        default_value = "datasets",
        global = true
    )]
    pub dataset_dir: PathBuf,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress banner, progress and tables (for scripting)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// How raw entries are laid out and labelled.
#[derive(Args)]
#[command(next_help_heading = "Source")]
pub struct SourceOptions {
    /// Layout of the entry files
    #[arg(long, value_name = "MODE", default_value = "generic")]
    pub source: SourceFormat,

    /// Energy unit of the raw labels
    #[arg(long, value_name = "UNIT", default_value = "kcal")]
    pub energy_unit: EnergyUnitArg,

    /// Length unit of the raw coordinates
    #[arg(long, value_name = "UNIT", default_value = "angstrom")]
    pub length_unit: LengthUnitArg,
}

#[derive(Args)]
pub struct CreateArgs {
    /// Name of the structure set under the store directory
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Directory holding the raw entries
    #[arg(short, long, value_name = "DIR")]
    pub input: PathBuf,

    /// Replace an existing structure set of the same name
    #[arg(long)]
    pub overwrite: bool,

    #[command(flatten)]
    pub source: SourceOptions,
}

#[derive(Args)]
pub struct BuildArgs {
    /// Name of the structure set; also names the dataset
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Replace an existing dataset of the same name
    #[arg(long)]
    pub overwrite: bool,

    #[command(flatten)]
    pub source: SourceOptions,

    #[command(flatten)]
    pub filter: FilterOptions,

    #[command(flatten)]
    pub graph: GraphOptions,

    #[command(flatten)]
    pub topology: TopologyOptions,
}

/// Conformation screening rules.
#[derive(Args)]
#[command(next_help_heading = "Filtering")]
pub struct FilterOptions {
    /// Largest admissible |relative energy| (kcal/mol)
    #[arg(long, value_name = "E")]
    pub max_energy: Option<f64>,

    /// Largest admissible per-atom force magnitude (kcal/mol/Å)
    #[arg(long, value_name = "F")]
    pub max_force: Option<f64>,

    /// Coordinate tolerance for duplicate conformations (Å)
    #[arg(long = "dedup-tol", value_name = "T")]
    pub dedup_tolerance: Option<f64>,

    /// Energy zero of each molecule (min, or a conformation index)
    #[arg(long, value_name = "REF", default_value = "min")]
    pub reference: ReferenceArg,
}

/// What goes into each graph record.
#[derive(Args)]
#[command(next_help_heading = "Graph")]
pub struct GraphOptions {
    /// Add non-bonded edges up to this distance (Å)
    #[arg(long, value_name = "R")]
    pub cutoff: Option<f64>,

    /// Omit angle terms
    #[arg(long)]
    pub no_angles: bool,

    /// Omit proper torsion terms
    #[arg(long)]
    pub no_propers: bool,

    /// Omit improper torsion terms
    #[arg(long)]
    pub no_impropers: bool,
}

/// Topology assignment options.
#[derive(Args)]
#[command(next_help_heading = "Topology")]
pub struct TopologyOptions {
    /// Partial charge source
    #[arg(long, value_name = "METHOD", default_value = "none")]
    pub charges: ChargeSource,

    /// Net molecular charge distributed by QEq
    #[arg(long, value_name = "Q", default_value_t = 0.0, allow_hyphen_values = true)]
    pub total_charge: f64,

    /// Custom force field parameters (TOML file)
    #[arg(long, value_name = "FILE")]
    pub params: Option<PathBuf>,

    /// Custom DREIDING typing rules (TOML file)
    #[arg(long, value_name = "FILE")]
    pub rules: Option<PathBuf>,

    /// Accept molecules whose bond graph is disconnected
    #[arg(long)]
    pub allow_fragments: bool,
}

#[derive(Args)]
pub struct InfoArgs {
    /// Name of the dataset under the dataset directory
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Print the manifest as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum SourceFormat {
    /// One JSON entry per molecule
    #[default]
    #[value(alias = "json")]
    Generic,
    /// Multi-conformer V2000 SDF, one file per molecule
    #[value(alias = "sd")]
    Sdf,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum EnergyUnitArg {
    #[default]
    #[value(name = "kcal", alias = "kcal/mol")]
    Kcal,
    #[value(name = "kj", alias = "kj/mol")]
    Kj,
    Ev,
    #[value(alias = "ha")]
    Hartree,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum LengthUnitArg {
    #[default]
    #[value(alias = "a")]
    Angstrom,
    Bohr,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum ChargeSource {
    /// All charges zero
    #[default]
    None,
    /// Charges stored with each molecule
    Provided,
    /// Charge equilibration on the first usable conformation
    Qeq,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReferenceArg {
    #[default]
    Minimum,
    Conformation(usize),
}

impl std::str::FromStr for ReferenceArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if s == "min" || s == "minimum" {
            return Ok(Self::Minimum);
        }
        s.parse::<usize>().map(Self::Conformation).map_err(|_| {
            format!(
                "invalid energy reference: '{}' (use min or a conformation index)",
                s
            )
        })
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}
