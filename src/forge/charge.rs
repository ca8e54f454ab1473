use super::config::{ChargeMethod, QeqConfig};
use super::error::Error;
use super::intermediate::{IntermediateAtom, IntermediateMolecule};
use cheq::{AtomView, QEqSolver, get_default_parameters};

/// Fills in per-atom partial charges.
///
/// `provided` are the charges stored with the molecule entry, if any;
/// `geometry` is the reference geometry QEq works on.
pub fn assign_charges(
    molecule: &mut IntermediateMolecule,
    method: ChargeMethod,
    provided: Option<&[f64]>,
    geometry: Option<&[[f64; 3]]>,
) -> Result<(), Error> {
    match method {
        ChargeMethod::None => {
            for atom in &mut molecule.atoms {
                atom.charge = 0.0;
            }
            Ok(())
        }
        ChargeMethod::Provided => {
            let charges = provided.ok_or_else(|| {
                Error::MissingCharges("molecule entry stores no partial charges".into())
            })?;
            if charges.len() != molecule.atoms.len() {
                return Err(Error::MissingCharges(format!(
                    "{} charges stored for {} atoms",
                    charges.len(),
                    molecule.atoms.len()
                )));
            }
            if let Some(idx) = charges.iter().position(|q| !q.is_finite()) {
                return Err(Error::MissingCharges(format!(
                    "charge of atom {idx} is not finite"
                )));
            }
            for (atom, &q) in molecule.atoms.iter_mut().zip(charges) {
                atom.charge = q;
            }
            Ok(())
        }
        ChargeMethod::Qeq(config) => {
            let positions = geometry.ok_or_else(|| {
                Error::ChargeCalculation("no conformation usable as QEq geometry".into())
            })?;
            assign_qeq_charges(molecule, positions, &config)
        }
    }
}

/// An atom at its reference position, as the QEq solver sees it.
struct PlacedAtom<'a> {
    atom: &'a IntermediateAtom,
    position: [f64; 3],
}

impl AtomView for PlacedAtom<'_> {
    #[inline]
    fn atomic_number(&self) -> u8 {
        self.atom.element.atomic_number()
    }

    #[inline]
    fn position(&self) -> [f64; 3] {
        self.position
    }
}

fn assign_qeq_charges(
    molecule: &mut IntermediateMolecule,
    positions: &[[f64; 3]],
    config: &QeqConfig,
) -> Result<(), Error> {
    if positions.len() != molecule.atoms.len() {
        return Err(Error::ChargeCalculation(format!(
            "{} positions for {} atoms",
            positions.len(),
            molecule.atoms.len()
        )));
    }

    let placed: Vec<PlacedAtom> = molecule
        .atoms
        .iter()
        .zip(positions)
        .map(|(atom, &position)| PlacedAtom { atom, position })
        .collect();

    let solver = QEqSolver::new(get_default_parameters()).with_options(config.solver_options);
    let result = solver.solve(&placed, config.total_charge)?;
    log::trace!("QEq converged after {} iterations", result.iterations);

    for (atom, &charge) in molecule.atoms.iter_mut().zip(&result.charges) {
        atom.charge = charge;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::molecule::Bond;
    use crate::model::types::{BondOrder, Element};

    const WATER_GEOMETRY: [[f64; 3]; 3] = [[0.0, 0.0, 0.0], [0.9575, 0.0, 0.0], [-0.2399, 0.9270, 0.0]];

    fn water() -> IntermediateMolecule {
        IntermediateMolecule::new(
            &[Element::O, Element::H, Element::H],
            &[
                Bond::new(0, 1, BondOrder::Single),
                Bond::new(0, 2, BondOrder::Single),
            ],
        )
    }

    #[test]
    fn no_charge_method_zeroes_everything() {
        let mut int = water();
        assign_charges(&mut int, ChargeMethod::None, Some(&[1.0, 2.0, 3.0]), None).unwrap();
        assert!(int.atoms.iter().all(|a| a.charge == 0.0));
    }

    #[test]
    fn provided_charges_are_copied() {
        let mut int = water();
        assign_charges(&mut int, ChargeMethod::Provided, Some(&[-0.8, 0.4, 0.4]), None).unwrap();
        let charges: Vec<f64> = int.atoms.iter().map(|a| a.charge).collect();
        assert_eq!(charges, vec![-0.8, 0.4, 0.4]);
    }

    #[test]
    fn provided_charges_must_exist_and_match() {
        let mut int = water();
        let err = assign_charges(&mut int, ChargeMethod::Provided, None, None).unwrap_err();
        assert_eq!(err.kind(), "missing_charges");

        let err = assign_charges(&mut int, ChargeMethod::Provided, Some(&[0.0]), None).unwrap_err();
        assert!(err.to_string().contains("1 charges stored for 3 atoms"));

        let err = assign_charges(&mut int, ChargeMethod::Provided, Some(&[0.0, f64::NAN, 0.0]), None)
            .unwrap_err();
        assert_eq!(err.kind(), "missing_charges");
    }

    #[test]
    fn qeq_polarizes_water() {
        let mut int = water();
        let method = ChargeMethod::Qeq(QeqConfig::default());
        assign_charges(&mut int, method, None, Some(&WATER_GEOMETRY)).unwrap();

        assert!(int.atoms[0].charge < 0.0);
        assert!(int.atoms[1].charge > 0.0);
        assert!((int.atoms[1].charge - int.atoms[2].charge).abs() < 1e-4);
        let total: f64 = int.atoms.iter().map(|a| a.charge).sum();
        assert!(total.abs() < 1e-6);
    }

    #[test]
    fn qeq_honours_net_charge() {
        let mut int = water();
        let method = ChargeMethod::Qeq(QeqConfig {
            total_charge: -1.0,
            ..QeqConfig::default()
        });
        assign_charges(&mut int, method, None, Some(&WATER_GEOMETRY)).unwrap();
        let total: f64 = int.atoms.iter().map(|a| a.charge).sum();
        assert!((total + 1.0).abs() < 1e-6);
    }

    #[test]
    fn qeq_needs_geometry() {
        let mut int = water();
        let method = ChargeMethod::Qeq(QeqConfig::default());
        let err = assign_charges(&mut int, method, None, None).unwrap_err();
        assert_eq!(err.kind(), "charge_calculation");

        let err = assign_charges(&mut int, method, None, Some(&WATER_GEOMETRY[..2])).unwrap_err();
        assert!(err.to_string().contains("2 positions for 3 atoms"));
    }
}
