//! Drift velocity and mobility of a steady state.

use hf_core::Real;
use nalgebra::{DMatrix, DVector};

use crate::error::SolverResult;
use crate::transporter::Transporter;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportEstimate {
    /// Drift velocity along z (Angstrom/s).
    pub velocity: Real,
    /// `velocity / field_z` (Angstrom^2 / (V s)); `None` at zero field.
    pub mobility: Option<Real>,
}

/// Velocity and mobility for `probabilities` on the plain (unpreconditioned,
/// unscaled) rate matrix.
pub fn estimate_transport(
    transporter: &Transporter<'_>,
    plain: &DMatrix<Real>,
    probabilities: &DVector<Real>,
) -> SolverResult<TransportEstimate> {
    let velocity = transporter.velocity_z(plain, probabilities)?;
    let field = transporter.params().field_z;
    let mobility = (field != 0.0).then(|| velocity / field);
    tracing::debug!(velocity, ?mobility, "transport estimate");
    Ok(TransportEstimate { velocity, mobility })
}
