//! Run description schema.

use serde::{Deserialize, Serialize};

use hf_solver::{PrecondForm, Tolerance};

/// One transport run: environment, site network and solver options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunDef {
    pub version: u32,
    pub name: String,
    pub parameters: ParametersDef,
    pub system: SystemDef,
    #[serde(default)]
    pub solver: SolverDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParametersDef {
    /// Field strength along z (V/Angstrom).
    pub field_z: f64,
    /// Kelvin.
    pub temperature: f64,
    /// Reorganization energy (eV).
    pub reorg: f64,
    /// Periodic length along z (Angstrom).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub periodic_z: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum SystemDef {
    Inline {
        sites: Vec<SiteDef>,
        #[serde(default)]
        edges: Vec<EdgeDef>,
    },
    /// Legacy `.xyz` and `.edge` files, relative to the run document.
    Files { xyz: String, edge: String },
    Lattice {
        counts: [usize; 3],
        spacing: [f64; 3],
        energy: f64,
        coupling: f64,
        #[serde(default)]
        periodic_z: bool,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SiteDef {
    /// x, y, z (Angstrom).
    pub position: [f64; 3],
    /// eV.
    pub energy: f64,
}

/// Undirected neighbour pair by 0-based site index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EdgeDef {
    pub a: usize,
    pub b: usize,
    /// Transfer integral J (eV).
    pub coupling: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SolverDef {
    #[serde(default)]
    pub precond: PrecondDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_energy: Option<f64>,
    #[serde(default)]
    pub rescale: bool,
    #[serde(default)]
    pub tolerance: ToleranceDef,
    /// Seconds.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub propagate_times: Vec<f64>,
    #[serde(default)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum PrecondDef {
    #[default]
    Off,
    Boltzmann,
    BoltzmannSquared,
    RateSum,
}

impl From<PrecondDef> for PrecondForm {
    fn from(def: PrecondDef) -> Self {
        match def {
            PrecondDef::Off => PrecondForm::Off,
            PrecondDef::Boltzmann => PrecondForm::Boltzmann,
            PrecondDef::BoltzmannSquared => PrecondForm::BoltzmannSquared,
            PrecondDef::RateSum => PrecondForm::RateSum,
        }
    }
}

/// `"auto"`, `"scaled"` or an explicit singular-value cutoff.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ToleranceDef {
    Keyword(ToleranceKeyword),
    Value(f64),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ToleranceKeyword {
    Auto,
    Scaled,
}

impl Default for ToleranceDef {
    fn default() -> Self {
        ToleranceDef::Keyword(ToleranceKeyword::Auto)
    }
}

impl From<ToleranceDef> for Tolerance {
    fn from(def: ToleranceDef) -> Self {
        match def {
            ToleranceDef::Keyword(ToleranceKeyword::Auto) => Tolerance::Auto,
            ToleranceDef::Keyword(ToleranceKeyword::Scaled) => Tolerance::Scaled,
            ToleranceDef::Value(v) => Tolerance::Fixed(v),
        }
    }
}
