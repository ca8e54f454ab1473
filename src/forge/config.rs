pub use cheq::SolverOptions;

/// Configuration for topology assignment.
///
/// The defaults use the embedded DREIDING table and the typer's built-in
/// rules, give every atom zero charge, and reject molecules whose bond graph
/// falls apart into several fragments.
///
/// # Examples
///
/// ```
/// use graph_forge::{ChargeMethod, ForgeConfig};
///
/// let config = ForgeConfig {
///     charge_method: ChargeMethod::Provided,
///     allow_fragments: true,
///     ..ForgeConfig::default()
/// };
/// assert!(config.params.is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ForgeConfig {
    /// Custom force-field parameter TOML replacing the embedded table.
    pub params: Option<String>,
    /// Custom DREIDING typing rules (TOML) replacing the built-in set.
    pub typing_rules: Option<String>,
    /// Source of partial atomic charges.
    pub charge_method: ChargeMethod,
    /// Settings for perceiving connectivity of molecules without declared bonds.
    pub bond_perception: BondPerception,
    /// Accept molecules made of several disconnected fragments.
    pub allow_fragments: bool,
}

/// Where partial atomic charges come from.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ChargeMethod {
    /// Every atom carries zero charge.
    #[default]
    None,
    /// Charges stored with the molecule entry are used verbatim.
    Provided,
    /// Charge equilibration on the molecule's reference geometry.
    ///
    /// The reference geometry is the first conformation whose coordinates
    /// are all finite and match the atom count.
    Qeq(QeqConfig),
}

impl ChargeMethod {
    /// Short name recorded in run metadata.
    pub fn name(&self) -> &'static str {
        match self {
            ChargeMethod::None => "none",
            ChargeMethod::Provided => "provided",
            ChargeMethod::Qeq(_) => "qeq",
        }
    }
}

/// Settings of the QEq solver.
///
/// # Examples
///
/// ```
/// use graph_forge::QeqConfig;
///
/// let anion = QeqConfig {
///     total_charge: -1.0,
///     ..QeqConfig::default()
/// };
/// assert!(anion.solver_options.max_iterations > 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QeqConfig {
    /// Net charge of the molecule in elementary charges.
    pub total_charge: f64,
    /// Convergence and basis settings passed to `cheq`.
    pub solver_options: SolverOptions,
}

impl Default for QeqConfig {
    fn default() -> Self {
        Self {
            total_charge: 0.0,
            solver_options: SolverOptions::default(),
        }
    }
}

/// Distance criterion for bond perception from geometry.
///
/// Two atoms are bonded when `min_distance < d <= r_i + r_j + tolerance`,
/// with `r` the single-bond covalent radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BondPerception {
    /// Slack added to the summed covalent radii, in Å.
    pub tolerance: f64,
    /// Pairs at or below this distance are never bonded, in Å.
    pub min_distance: f64,
}

impl Default for BondPerception {
    fn default() -> Self {
        Self {
            tolerance: 0.4,
            min_distance: 0.4,
        }
    }
}
