// hf-core/src/units.rs

use uom::si::f64::{Energy as UomEnergy, ThermodynamicTemperature as UomThermodynamicTemperature};

use crate::Real;

// Public canonical unit types (SI, f64)
pub type Energy = UomEnergy;
pub type Temperature = UomThermodynamicTemperature;

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn ev(v: f64) -> Energy {
    use uom::si::energy::electronvolt;
    Energy::new::<electronvolt>(v)
}

/// Energy expressed in electronvolts, the working unit of the rate engine.
#[inline]
pub fn in_ev(e: Energy) -> Real {
    use uom::si::energy::electronvolt;
    e.get::<electronvolt>()
}

/// Thermal energy kB*T.
pub fn thermal_energy(t: Temperature) -> Energy {
    use uom::si::thermodynamic_temperature::kelvin;
    ev(constants::KB_EV_PER_K * t.get::<kelvin>())
}

/// Fixed physical constants. Energies in eV, lengths in Angstrom, fields in V/Angstrom.
pub mod constants {
    /// Reduced Planck constant (eV s).
    pub const HBAR_EV_S: f64 = 6.582_118_99e-16;
    /// Boltzmann constant (eV/K).
    pub const KB_EV_PER_K: f64 = 8.617_333_26e-5;
    pub const PI: f64 = core::f64::consts::PI;
}
