use graph_forge::io::{EnergyUnit, LengthUnit, SourceMode};
use graph_forge::{ChargeMethod, EnergyReference, QeqConfig};

use crate::cli;

impl From<cli::SourceFormat> for SourceMode {
    fn from(value: cli::SourceFormat) -> Self {
        match value {
            cli::SourceFormat::Generic => SourceMode::Generic,
            cli::SourceFormat::Sdf => SourceMode::Sdf,
        }
    }
}

impl From<cli::EnergyUnitArg> for EnergyUnit {
    fn from(value: cli::EnergyUnitArg) -> Self {
        match value {
            cli::EnergyUnitArg::Kcal => EnergyUnit::KcalPerMol,
            cli::EnergyUnitArg::Kj => EnergyUnit::KjPerMol,
            cli::EnergyUnitArg::Ev => EnergyUnit::ElectronVolt,
            cli::EnergyUnitArg::Hartree => EnergyUnit::Hartree,
        }
    }
}

impl From<cli::LengthUnitArg> for LengthUnit {
    fn from(value: cli::LengthUnitArg) -> Self {
        match value {
            cli::LengthUnitArg::Angstrom => LengthUnit::Angstrom,
            cli::LengthUnitArg::Bohr => LengthUnit::Bohr,
        }
    }
}

pub fn charge_method(source: cli::ChargeSource, total_charge: f64) -> ChargeMethod {
    match source {
        cli::ChargeSource::None => ChargeMethod::None,
        cli::ChargeSource::Provided => ChargeMethod::Provided,
        cli::ChargeSource::Qeq => ChargeMethod::Qeq(QeqConfig {
            total_charge,
            ..QeqConfig::default()
        }),
    }
}

impl From<cli::ReferenceArg> for EnergyReference {
    fn from(value: cli::ReferenceArg) -> Self {
        match value {
            cli::ReferenceArg::Minimum => EnergyReference::Minimum,
            cli::ReferenceArg::Conformation(idx) => EnergyReference::Conformation(idx),
        }
    }
}

pub fn source_display_name(mode: SourceMode) -> &'static str {
    match mode {
        SourceMode::Generic => "JSON entries",
        SourceMode::Sdf => "SDF multi-conformer",
    }
}
