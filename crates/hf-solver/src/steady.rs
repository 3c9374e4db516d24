//! Null-space extraction: steady states from the SVD of the rate matrix.

use hf_core::{Real, max_abs};
use hf_graph::SiteGraph;
use nalgebra::{DMatrix, DVector};

use crate::error::{SolverError, SolverResult};

/// Upper bound on implicit QR sweeps inside the SVD.
const MAX_SVD_ITERATIONS: usize = 10_000;

/// Cutoff below which a singular value counts as zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Tolerance {
    /// Derived from the singular vectors, see [`Decomposition::auto_tolerance`].
    #[default]
    Auto,
    /// Derived from the singular values, see [`Decomposition::scaled_tolerance`].
    Scaled,
    Fixed(Real),
}

/// `A = U * diag(sigma) * V^T`.
#[derive(Debug, Clone)]
pub struct Decomposition {
    pub singular_values: DVector<Real>,
    pub u: DMatrix<Real>,
    pub v_t: DMatrix<Real>,
}

impl Decomposition {
    /// `eps * max(|U|, |V|)`, the largest entry over both singular-vector matrices.
    pub fn auto_tolerance(&self) -> Real {
        Real::EPSILON * self.u.amax().max(self.v_t.amax())
    }

    /// `eps * M * sigma_max`: the rounding floor of the decomposition, which
    /// follows the matrix scale and so also admits near-null directions of
    /// weakly coupled networks.
    pub fn scaled_tolerance(&self) -> Real {
        let sigma_max = max_abs(self.singular_values.iter().copied());
        Real::EPSILON * sigma_max * self.singular_values.len() as Real
    }

    pub fn resolve(&self, tolerance: Tolerance) -> SolverResult<Real> {
        match tolerance {
            Tolerance::Auto => Ok(self.auto_tolerance()),
            Tolerance::Scaled => Ok(self.scaled_tolerance()),
            Tolerance::Fixed(t) if t.is_finite() && t >= 0.0 => Ok(t),
            Tolerance::Fixed(t) => Err(SolverError::InvalidParameter {
                name: "tolerance",
                value: t,
            }),
        }
    }

    /// The i-th right singular vector (column i of V).
    pub fn right_singular_vector(&self, i: usize) -> DVector<Real> {
        self.v_t.row(i).transpose()
    }
}

/// Full SVD of a square matrix.
pub fn decompose(matrix: &DMatrix<Real>) -> SolverResult<Decomposition> {
    if matrix.is_empty() {
        return Err(SolverError::ProblemSetup {
            what: "rate matrix is empty (no sites)".to_string(),
        });
    }
    if !matrix.is_square() {
        return Err(SolverError::DimensionMismatch {
            what: "rate matrix columns",
            expected: matrix.nrows(),
            actual: matrix.ncols(),
        });
    }

    let svd = matrix
        .clone()
        .try_svd(true, true, Real::EPSILON, MAX_SVD_ITERATIONS)
        .ok_or_else(|| SolverError::Numeric {
            what: "SVD did not converge".to_string(),
        })?;
    let missing = |what: &str| SolverError::Numeric {
        what: format!("SVD did not return {what}"),
    };
    let u = svd.u.ok_or_else(|| missing("U"))?;
    let v_t = svd.v_t.ok_or_else(|| missing("V^T"))?;

    Ok(Decomposition {
        singular_values: svd.singular_values,
        u,
        v_t,
    })
}

/// One steady-state candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct SteadySolution {
    /// Singular value the vector belongs to (in the units of the solved matrix).
    pub singular_value: Real,
    /// Unit-norm, sign-fixed vector.
    pub vector: DVector<Real>,
    /// `vector` divided by the sum of its absolute values.
    pub probabilities: DVector<Real>,
}

impl SteadySolution {
    pub fn new(singular_value: Real, vector: DVector<Real>) -> Self {
        let total = vector.iter().map(|v| v.abs()).sum::<Real>();
        let probabilities = if total > 0.0 {
            &vector / total
        } else {
            vector.clone()
        };
        Self {
            singular_value,
            vector,
            probabilities,
        }
    }

    /// Write the probabilities onto the sites as occupation probabilities.
    pub fn assign_to(&self, graph: &mut SiteGraph) -> SolverResult<()> {
        graph.assign_occupations(self.probabilities.as_slice())?;
        Ok(())
    }
}

/// Result of null-space selection.
#[derive(Debug, Clone)]
pub struct NullSpace {
    pub singular_values: DVector<Real>,
    /// Tolerance actually applied.
    pub tolerance: Real,
    /// Candidates ordered by increasing singular value.
    pub solutions: Vec<SteadySolution>,
}

/// Scale to unit Euclidean norm.
pub fn normalize_l2(v: &mut DVector<Real>) -> SolverResult<()> {
    let norm = v.norm();
    if !(norm.is_finite() && norm > 0.0) {
        return Err(SolverError::Numeric {
            what: format!("cannot normalize vector with norm {norm}"),
        });
    }
    *v /= norm;
    Ok(())
}

/// Negate `v` when its most negative entry outweighs its largest positive one.
pub fn fix_sign(v: &mut DVector<Real>) {
    let max = v.iter().copied().fold(Real::NEG_INFINITY, Real::max);
    let min = v.iter().copied().fold(Real::INFINITY, Real::min);
    if -min > max {
        v.neg_mut();
    }
}

/// Map a null vector of the preconditioned matrix back to the original one.
///
/// Column f was multiplied by `factors[f]`, so component f is multiplied back.
pub fn reverse_precondition(v: &mut DVector<Real>, factors: &[Real]) -> SolverResult<()> {
    if factors.len() != v.len() {
        return Err(SolverError::DimensionMismatch {
            what: "preconditioning factors",
            expected: v.len(),
            actual: factors.len(),
        });
    }
    for (x, f) in v.iter_mut().zip(factors) {
        *x *= f;
    }
    normalize_l2(v)
}

/// SVD `matrix` and turn every right-singular vector with `sigma <= tolerance`
/// into a steady-state candidate.
///
/// `factors` are the preconditioning weights used to build `matrix`, or `None`
/// if it was not preconditioned. Zero candidates is a valid outcome.
pub fn extract_steady_states(
    matrix: &DMatrix<Real>,
    factors: Option<&[Real]>,
    tolerance: Tolerance,
) -> SolverResult<NullSpace> {
    let dec = decompose(matrix)?;
    let tol = dec.resolve(tolerance)?;
    tracing::debug!(applied = tol, requested = ?tolerance, "selecting null space");

    let mut solutions = Vec::new();
    for (i, &sigma) in dec.singular_values.iter().enumerate() {
        if sigma > tol {
            continue;
        }
        let mut v = dec.right_singular_vector(i);
        if let Some(f) = factors {
            reverse_precondition(&mut v, f)?;
        }
        fix_sign(&mut v);
        solutions.push(SteadySolution::new(sigma, v));
    }
    solutions.sort_by(|a, b| a.singular_value.total_cmp(&b.singular_value));

    match solutions.len() {
        0 => tracing::warn!(tolerance = tol, "no steady state found within tolerance"),
        1 => tracing::info!(sigma = solutions[0].singular_value, "found one steady state"),
        n => tracing::warn!(count = n, "several singular values under tolerance; network may be disconnected"),
    }

    Ok(NullSpace {
        singular_values: dec.singular_values,
        tolerance: tol,
        solutions,
    })
}
