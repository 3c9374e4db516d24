//! Error types for solver operations.

use hf_core::SiteId;
use hf_graph::GraphError;
use thiserror::Error;

/// Errors that can occur while building or solving the master equation.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Problem setup error: {what}")]
    ProblemSetup { what: String },

    #[error("Invalid parameter {name} = {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("Site {site} is not part of the graph")]
    UnknownSite { site: SiteId },

    #[error("Total inbound rate into site {site} is zero; rateSum preconditioning is undefined")]
    ZeroRateSum { site: SiteId },

    #[error("Unknown preconditioning form '{name}' (expected off, boltzmann, boltzmannSquared or rateSum)")]
    UnknownPrecondForm { name: String },

    #[error("Dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Numeric error: {what}")]
    Numeric { what: String },
}

pub type SolverResult<T> = Result<T, SolverError>;
