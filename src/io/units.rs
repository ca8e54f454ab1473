use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown unit '{0}'")]
pub struct ParseUnitError(String);

/// Energy unit of raw store entries; everything is converted to kcal/mol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnergyUnit {
    #[default]
    KcalPerMol,
    KjPerMol,
    ElectronVolt,
    Hartree,
}

impl EnergyUnit {
    pub fn to_kcal_per_mol(&self) -> f64 {
        match self {
            EnergyUnit::KcalPerMol => 1.0,
            EnergyUnit::KjPerMol => 0.239_005_736,
            EnergyUnit::ElectronVolt => 23.060_547_830_619,
            EnergyUnit::Hartree => 627.509_474_063_1,
        }
    }
}

impl fmt::Display for EnergyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EnergyUnit::KcalPerMol => "kcal/mol",
            EnergyUnit::KjPerMol => "kJ/mol",
            EnergyUnit::ElectronVolt => "eV",
            EnergyUnit::Hartree => "hartree",
        })
    }
}

impl FromStr for EnergyUnit {
    type Err = ParseUnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kcal/mol" | "kcal" => Ok(EnergyUnit::KcalPerMol),
            "kj/mol" | "kj" => Ok(EnergyUnit::KjPerMol),
            "ev" => Ok(EnergyUnit::ElectronVolt),
            "hartree" | "ha" | "eh" => Ok(EnergyUnit::Hartree),
            _ => Err(ParseUnitError(s.to_string())),
        }
    }
}

/// Length unit of raw store entries; everything is converted to Å.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LengthUnit {
    #[default]
    Angstrom,
    Bohr,
}

impl LengthUnit {
    pub fn to_angstrom(&self) -> f64 {
        match self {
            LengthUnit::Angstrom => 1.0,
            LengthUnit::Bohr => 0.529_177_210_903,
        }
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LengthUnit::Angstrom => "angstrom",
            LengthUnit::Bohr => "bohr",
        })
    }
}

impl FromStr for LengthUnit {
    type Err = ParseUnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "angstrom" | "a" | "å" => Ok(LengthUnit::Angstrom),
            "bohr" | "a0" => Ok(LengthUnit::Bohr),
            _ => Err(ParseUnitError(s.to_string())),
        }
    }
}

/// Units raw labels are stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Units {
    pub energy: EnergyUnit,
    pub length: LengthUnit,
}

impl Units {
    #[inline]
    pub fn energy_factor(&self) -> f64 {
        self.energy.to_kcal_per_mol()
    }

    #[inline]
    pub fn length_factor(&self) -> f64 {
        self.length.to_angstrom()
    }

    /// Forces and gradients are energy per length.
    #[inline]
    pub fn force_factor(&self) -> f64 {
        self.energy_factor() / self.length_factor()
    }

    pub fn scale_vectors(factor: f64, vectors: &mut [[f64; 3]]) {
        for v in vectors {
            for c in v.iter_mut() {
                *c *= factor;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_spellings() {
        assert_eq!("Hartree".parse::<EnergyUnit>().unwrap(), EnergyUnit::Hartree);
        assert_eq!("kJ/mol".parse::<EnergyUnit>().unwrap(), EnergyUnit::KjPerMol);
        assert_eq!("eV".parse::<EnergyUnit>().unwrap(), EnergyUnit::ElectronVolt);
        assert_eq!("BOHR".parse::<LengthUnit>().unwrap(), LengthUnit::Bohr);
        assert!("furlong".parse::<LengthUnit>().is_err());
    }

    #[test]
    fn force_factor_combines_energy_and_length() {
        let units = Units {
            energy: EnergyUnit::Hartree,
            length: LengthUnit::Bohr,
        };
        let expected = 627.509_474_063_1 / 0.529_177_210_903;
        assert!((units.force_factor() - expected).abs() < 1e-9);
        assert_eq!(Units::default().force_factor(), 1.0);
    }
}
