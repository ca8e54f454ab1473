use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid or unsupported element symbol: '{0}'")]
pub struct ParseElementError(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid bond order string: '{0}'")]
pub struct ParseBondOrderError(String);

/// Generates [`Element`] together with its per-element lookup tables.
///
/// Each row is `Symbol = Z, atomic mass (u), covalent radius (Å)`.
macro_rules! elements {
    ($($sym:ident = $z:literal, $mass:literal, $radius:literal;)+) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        #[repr(u8)]
        pub enum Element {
            $($sym = $z,)+
        }

        impl Element {
            /// Every supported element, ordered by atomic number.
            pub const ALL: &'static [Element] = &[$(Element::$sym,)+];

            pub fn atomic_mass(&self) -> f64 {
                match self {
                    $(Element::$sym => $mass,)+
                }
            }

            /// Single-bond covalent radius in Ångströms.
            pub fn covalent_radius(&self) -> f64 {
                match self {
                    $(Element::$sym => $radius,)+
                }
            }

            pub fn symbol(&self) -> &'static str {
                match self {
                    $(Element::$sym => stringify!($sym),)+
                }
            }
        }
    };
}

elements! {
    H = 1, 1.008, 0.31;
    He = 2, 4.0026, 0.28;
    Li = 3, 6.94, 1.28;
    Be = 4, 9.0122, 0.96;
    B = 5, 10.81, 0.84;
    C = 6, 12.011, 0.76;
    N = 7, 14.007, 0.71;
    O = 8, 15.999, 0.66;
    F = 9, 18.998, 0.57;
    Ne = 10, 20.18, 0.58;
    Na = 11, 22.99, 1.66;
    Mg = 12, 24.305, 1.41;
    Al = 13, 26.982, 1.21;
    Si = 14, 28.085, 1.11;
    P = 15, 30.974, 1.07;
    S = 16, 32.06, 1.05;
    Cl = 17, 35.45, 1.02;
    Ar = 18, 39.948, 1.06;
    K = 19, 39.098, 2.03;
    Ca = 20, 40.078, 1.76;
    Sc = 21, 44.956, 1.70;
    Ti = 22, 47.867, 1.60;
    V = 23, 50.942, 1.53;
    Cr = 24, 51.996, 1.39;
    Mn = 25, 54.938, 1.39;
    Fe = 26, 55.845, 1.32;
    Co = 27, 58.933, 1.26;
    Ni = 28, 58.693, 1.24;
    Cu = 29, 63.546, 1.32;
    Zn = 30, 65.38, 1.22;
    Ga = 31, 69.723, 1.22;
    Ge = 32, 72.63, 1.20;
    As = 33, 74.922, 1.19;
    Se = 34, 78.971, 1.20;
    Br = 35, 79.904, 1.20;
    Kr = 36, 83.798, 1.16;
    Rb = 37, 85.468, 2.20;
    Sr = 38, 87.62, 1.95;
    Y = 39, 88.906, 1.90;
    Zr = 40, 91.224, 1.75;
    Nb = 41, 92.906, 1.64;
    Mo = 42, 95.96, 1.54;
    Tc = 43, 98.0, 1.47;
    Ru = 44, 101.07, 1.46;
    Rh = 45, 102.91, 1.42;
    Pd = 46, 106.42, 1.39;
    Ag = 47, 107.87, 1.45;
    Cd = 48, 112.41, 1.44;
    In = 49, 114.82, 1.42;
    Sn = 50, 118.71, 1.39;
    Sb = 51, 121.76, 1.39;
    Te = 52, 127.6, 1.38;
    I = 53, 126.9, 1.39;
    Xe = 54, 131.29, 1.40;
}

impl Element {
    #[inline]
    pub fn atomic_number(&self) -> u8 {
        *self as u8
    }

    /// Largest bond-order sum the element may carry in a closed-shell molecule.
    ///
    /// Returns `None` for elements whose valence is not checked (metals, noble gases).
    pub fn max_valence(&self) -> Option<f64> {
        match self {
            Element::H | Element::F | Element::Cl | Element::Br | Element::I => Some(1.0),
            Element::O => Some(3.0),
            Element::B | Element::C | Element::N | Element::Si => Some(4.0),
            Element::P => Some(5.0),
            Element::S => Some(6.0),
            _ => None,
        }
    }

    /// Parses a symbol regardless of case, as found in loosely formatted files
    /// (`CL`, `cl` and `Cl` all map to chlorine).
    pub fn from_symbol_lenient(token: &str) -> Option<Self> {
        let token = token.trim();
        let mut chars = token.chars();
        let first = chars.next()?;
        let normalized: String = std::iter::once(first.to_ascii_uppercase())
            .chain(chars.map(|c| c.to_ascii_lowercase()))
            .collect();
        normalized.parse().ok()
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Element {
    type Err = ParseElementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Element::ALL
            .iter()
            .copied()
            .find(|e| e.symbol() == s)
            .ok_or_else(|| ParseElementError(s.to_string()))
    }
}

impl TryFrom<String> for Element {
    type Error = ParseElementError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Element> for String {
    fn from(value: Element) -> Self {
        value.symbol().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Aromatic,
}

impl BondOrder {
    pub fn value(&self) -> f64 {
        match self {
            BondOrder::Single => 1.0,
            BondOrder::Double => 2.0,
            BondOrder::Triple => 3.0,
            BondOrder::Aromatic => 1.5,
        }
    }
}

impl fmt::Display for BondOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BondOrder::Single => "Single",
            BondOrder::Double => "Double",
            BondOrder::Triple => "Triple",
            BondOrder::Aromatic => "Aromatic",
        };
        f.write_str(s)
    }
}

impl FromStr for BondOrder {
    type Err = ParseBondOrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "single" | "1" => Ok(BondOrder::Single),
            "double" | "2" => Ok(BondOrder::Double),
            "triple" | "3" => Ok(BondOrder::Triple),
            "aromatic" | "ar" | "4" => Ok(BondOrder::Aromatic),
            _ => Err(ParseBondOrderError(s.to_string())),
        }
    }
}

impl TryFrom<String> for BondOrder {
    type Error = ParseBondOrderError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BondOrder> for String {
    fn from(value: BondOrder) -> Self {
        value.to_string().to_ascii_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_from_str_is_case_sensitive() {
        assert_eq!(Element::from_str("Cl").unwrap(), Element::Cl);
        let err = Element::from_str("cl").unwrap_err();
        assert_eq!(err.to_string(), "invalid or unsupported element symbol: 'cl'");
    }

    #[test]
    fn lenient_symbol_parsing() {
        assert_eq!(Element::from_symbol_lenient("CL"), Some(Element::Cl));
        assert_eq!(Element::from_symbol_lenient(" br "), Some(Element::Br));
        assert_eq!(Element::from_symbol_lenient("h"), Some(Element::H));
        assert_eq!(Element::from_symbol_lenient("Qq"), None);
        assert_eq!(Element::from_symbol_lenient(""), None);
    }

    #[test]
    fn table_lookups_line_up_with_atomic_number() {
        assert_eq!(Element::ALL.len(), 54);
        for (idx, element) in Element::ALL.iter().enumerate() {
            assert_eq!(element.atomic_number() as usize, idx + 1);
        }
        assert_eq!(Element::C.symbol(), "C");
        assert!((Element::O.atomic_mass() - 15.999).abs() < 1e-9);
        assert!((Element::N.covalent_radius() - 0.71).abs() < 1e-9);
    }

    #[test]
    fn max_valence_known_for_organic_elements() {
        assert_eq!(Element::C.max_valence(), Some(4.0));
        assert_eq!(Element::H.max_valence(), Some(1.0));
        assert_eq!(Element::Fe.max_valence(), None);
    }

    #[test]
    fn element_serializes_as_symbol() {
        let json = serde_json::to_string(&Element::Na).unwrap();
        assert_eq!(json, "\"Na\"");
        let back: Element = serde_json::from_str("\"Na\"").unwrap();
        assert_eq!(back, Element::Na);
        assert!(serde_json::from_str::<Element>("\"Xx\"").is_err());
    }

    #[test]
    fn bond_order_parsing_and_values() {
        assert_eq!(BondOrder::from_str("AR").unwrap(), BondOrder::Aromatic);
        assert_eq!(BondOrder::from_str("2").unwrap(), BondOrder::Double);
        assert_eq!(BondOrder::Aromatic.value(), 1.5);
        assert_eq!(
            BondOrder::from_str("quad").unwrap_err().to_string(),
            "invalid bond order string: 'quad'"
        );
        let json = serde_json::to_string(&BondOrder::Triple).unwrap();
        assert_eq!(json, "\"triple\"");
    }
}
