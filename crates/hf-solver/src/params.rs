//! Physical parameters of a transport run.

use hf_core::Real;
use hf_core::units::{Energy, Temperature, in_ev, thermal_energy};

use crate::error::{SolverError, SolverResult};

/// Fixed environment for rate evaluation.
///
/// Energies are in eV, lengths in Angstrom and the field in V/Angstrom, so
/// `dz * field_z` is an energy in eV for a unit charge.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportParams {
    /// Thermal energy kB*T (eV).
    pub kbt: Real,
    /// Field strength along z (V/Angstrom).
    pub field_z: Real,
    /// Reorganization energy lambda (eV).
    pub reorg: Real,
    /// Reference energy for Boltzmann preconditioning (eV).
    /// `None` uses the mean field-shifted site energy.
    pub reference_energy: Option<Real>,
    /// Periodic length along z (Angstrom); `None` for open boundaries.
    pub periodic_z: Option<Real>,
}

impl TransportParams {
    pub fn new(kbt: Real, field_z: Real, reorg: Real) -> Self {
        Self {
            kbt,
            field_z,
            reorg,
            reference_energy: None,
            periodic_z: None,
        }
    }

    /// Parameters from a temperature and reorganization energy with units.
    pub fn from_temperature(temperature: Temperature, field_z: Real, reorg: Energy) -> Self {
        Self::new(in_ev(thermal_energy(temperature)), field_z, in_ev(reorg))
    }

    pub fn with_reference_energy(mut self, energy: Real) -> Self {
        self.reference_energy = Some(energy);
        self
    }

    pub fn with_periodic_z(mut self, length: Real) -> Self {
        self.periodic_z = Some(length);
        self
    }

    /// Check that every parameter lies in its physical domain.
    pub fn validate(&self) -> SolverResult<()> {
        let positive = |name, value: Real| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(SolverError::InvalidParameter { name, value })
            }
        };
        positive("kbt", self.kbt)?;
        positive("reorg", self.reorg)?;
        if let Some(l) = self.periodic_z {
            positive("periodic_z", l)?;
        }
        if !self.field_z.is_finite() {
            return Err(SolverError::InvalidParameter {
                name: "field_z",
                value: self.field_z,
            });
        }
        if let Some(e) = self.reference_energy {
            if !e.is_finite() {
                return Err(SolverError::InvalidParameter {
                    name: "reference_energy",
                    value: e,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hf_core::units::{ev, k};

    #[test]
    fn from_temperature_converts_to_ev() {
        let p = TransportParams::from_temperature(k(300.0), 0.0, ev(0.2));
        assert!((p.kbt - 0.025852).abs() < 1e-5);
        assert!((p.reorg - 0.2).abs() < 1e-12);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn rejects_non_physical_values() {
        assert!(TransportParams::new(0.0, 0.0, 0.2).validate().is_err());
        assert!(TransportParams::new(0.025, 0.0, -0.1).validate().is_err());
        assert!(TransportParams::new(0.025, f64::NAN, 0.1).validate().is_err());
        let periodic = TransportParams::new(0.025, 0.0, 0.1).with_periodic_z(0.0);
        assert!(matches!(
            periodic.validate(),
            Err(SolverError::InvalidParameter { name: "periodic_z", .. })
        ));
    }
}
