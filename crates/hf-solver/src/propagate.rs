//! Time propagation of an occupation vector under the master equation.

use hf_core::Real;
use nalgebra::{DMatrix, DVector};

use crate::error::{SolverError, SolverResult};

/// `P(t) = exp(A t) P(0)` at one elapsed time.
#[derive(Debug, Clone, PartialEq)]
pub struct Propagation {
    /// Elapsed time (s).
    pub time: Real,
    pub occupation: DVector<Real>,
    /// `max_i |P_i(t) - P_i(0)|`.
    pub max_deviation: Real,
}

/// Propagate `initial` for every entry of `times` using the plain rate matrix.
///
/// A true steady state stays put; the deviation column is the check.
pub fn propagate(
    matrix: &DMatrix<Real>,
    initial: &DVector<Real>,
    times: &[Real],
) -> SolverResult<Vec<Propagation>> {
    if !matrix.is_square() || matrix.nrows() != initial.len() {
        return Err(SolverError::DimensionMismatch {
            what: "propagation initial state",
            expected: matrix.nrows(),
            actual: initial.len(),
        });
    }

    times
        .iter()
        .map(|&time| {
            if !(time.is_finite() && time >= 0.0) {
                return Err(SolverError::InvalidParameter { name: "time", value: time });
            }
            let occupation = (matrix * time).exp() * initial;
            if occupation.iter().any(|p| !p.is_finite()) {
                return Err(SolverError::Numeric {
                    what: format!("matrix exponential overflowed at t = {time:e} s"),
                });
            }
            let max_deviation = (&occupation - initial).amax();
            tracing::debug!(time, max_deviation, "propagated occupation");
            Ok(Propagation {
                time,
                occupation,
                max_deviation,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_state(k01: Real, k10: Real) -> DMatrix<Real> {
        // A[i,f] = rate(f -> i)
        DMatrix::from_row_slice(2, 2, &[-k01, k10, k01, -k10])
    }

    #[test]
    fn steady_state_is_invariant() {
        let a = two_state(1.0, 3.0);
        let p = DVector::from_vec(vec![0.75, 0.25]);
        let out = propagate(&a, &p, &[0.1, 1.0, 10.0]).unwrap();
        assert_eq!(out.len(), 3);
        for step in &out {
            assert!(step.max_deviation < 1e-12, "t = {}", step.time);
        }
    }

    #[test]
    fn relaxes_towards_steady_state() {
        let a = two_state(1.0, 1.0);
        let p = DVector::from_vec(vec![1.0, 0.0]);
        let out = propagate(&a, &p, &[0.0, 20.0]).unwrap();
        assert!(out[0].max_deviation < 1e-15);
        assert!((out[1].occupation[0] - 0.5).abs() < 1e-9);
        assert!((out[1].occupation.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_negative_time_and_bad_length() {
        let a = two_state(1.0, 1.0);
        let p = DVector::from_vec(vec![1.0, 0.0]);
        assert!(matches!(
            propagate(&a, &p, &[-1.0]),
            Err(SolverError::InvalidParameter { name: "time", .. })
        ));
        let q = DVector::from_vec(vec![1.0]);
        assert!(matches!(
            propagate(&a, &q, &[1.0]),
            Err(SolverError::DimensionMismatch { .. })
        ));
    }
}
