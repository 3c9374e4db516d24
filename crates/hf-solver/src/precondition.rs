//! Preconditioning strategies for the rate matrix.

use std::fmt;
use std::str::FromStr;

use crate::error::SolverError;

/// Per-site multiplicative weight applied to a site's column of the rate matrix.
///
/// Scaling a column by a nonzero factor keeps the matrix singular and maps the
/// matching null-vector component by the inverse factor, so every form is
/// undone after solving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrecondForm {
    /// Factor 1.
    #[default]
    Off,
    /// `exp((E_ref - (E + z F)) / kBT)`.
    Boltzmann,
    /// Square of the Boltzmann factor.
    BoltzmannSquared,
    /// `1 / (total inbound rate)`.
    RateSum,
}

impl PrecondForm {
    pub const ALL: [PrecondForm; 4] = [
        PrecondForm::Off,
        PrecondForm::Boltzmann,
        PrecondForm::BoltzmannSquared,
        PrecondForm::RateSum,
    ];

    pub fn is_off(self) -> bool {
        self == PrecondForm::Off
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PrecondForm::Off => "off",
            PrecondForm::Boltzmann => "boltzmann",
            PrecondForm::BoltzmannSquared => "boltzmannSquared",
            PrecondForm::RateSum => "rateSum",
        }
    }
}

impl fmt::Display for PrecondForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrecondForm {
    type Err = SolverError;

    /// Accepts the canonical names case-insensitively, with or without `_`/`-`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "off" | "none" => Ok(PrecondForm::Off),
            "boltzmann" => Ok(PrecondForm::Boltzmann),
            "boltzmannsquared" => Ok(PrecondForm::BoltzmannSquared),
            "ratesum" => Ok(PrecondForm::RateSum),
            _ => Err(SolverError::UnknownPrecondForm {
                name: s.to_string(),
            }),
        }
    }
}
