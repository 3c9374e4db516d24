//! High-level solver interface.

use hf_core::Real;
use hf_graph::SiteGraph;
use nalgebra::{DMatrix, DVector};

use crate::error::{SolverError, SolverResult};
use crate::params::TransportParams;
use crate::precondition::PrecondForm;
use crate::propagate::{Propagation, propagate};
use crate::rate_matrix::{MatrixOptions, RateMatrix, assemble};
use crate::steady::{SteadySolution, Tolerance, extract_steady_states};
use crate::transport::{TransportEstimate, estimate_transport};
use crate::transporter::Transporter;

/// Numerical options of one run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SolveConfig {
    pub form: PrecondForm,
    pub rescale: bool,
    pub tolerance: Tolerance,
    /// Elapsed times (s) at which each solution is propagated.
    pub propagate_times: Vec<Real>,
    pub verbose: bool,
}

impl SolveConfig {
    fn matrix_options(&self) -> MatrixOptions {
        MatrixOptions {
            form: self.form,
            rescale: self.rescale,
            verbose: self.verbose,
        }
    }
}

/// A steady state with its post-processing.
#[derive(Debug, Clone)]
pub struct SolutionReport {
    pub solution: SteadySolution,
    pub transport: TransportEstimate,
    /// One entry per configured propagation time.
    pub propagation: Vec<Propagation>,
}

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// The matrix that was decomposed.
    pub rate_matrix: RateMatrix,
    pub singular_values: DVector<Real>,
    /// Tolerance actually applied.
    pub tolerance: Real,
    /// Ordered by increasing singular value.
    pub solutions: Vec<SolutionReport>,
}

impl RunReport {
    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    /// The candidate with the smallest singular value.
    pub fn primary(&self) -> Option<&SolutionReport> {
        self.solutions.first()
    }
}

/// Solve for the steady states of `graph` under `params`.
///
/// This function:
/// 1. Assembles the generator matrix with the configured preconditioning and rescale
/// 2. Decomposes it and keeps the right-singular vectors under the tolerance
/// 3. Reverses the preconditioning, normalizes and fixes the sign of each candidate
/// 4. Computes velocity and mobility on the plain matrix
/// 5. Propagates each candidate for the configured times
///
/// Finding no steady state is not an error; the report is simply empty.
pub fn run(graph: &SiteGraph, params: TransportParams, config: &SolveConfig) -> SolverResult<RunReport> {
    if graph.is_empty() {
        return Err(SolverError::ProblemSetup {
            what: "graph has no sites".to_string(),
        });
    }

    let transporter = Transporter::new(graph, params)?;
    tracing::info!(
        sites = graph.len(),
        edges = graph.edges().len(),
        form = %config.form,
        rescale = config.rescale,
        "assembling rate matrix"
    );
    let rate_matrix = assemble(&transporter, config.matrix_options())?;

    tracing::info!("decomposing rate matrix");
    let null_space = extract_steady_states(
        &rate_matrix.matrix,
        rate_matrix.reverse_factors(),
        config.tolerance,
    )?;
    if config.verbose {
        tracing::info!(
            "singular values: {:?}",
            null_space.singular_values.as_slice()
        );
    }

    let plain: DMatrix<Real> = if rate_matrix.form.is_off() && rate_matrix.scale_exponent.is_none() {
        rate_matrix.matrix.clone()
    } else {
        assemble(&transporter, MatrixOptions::plain())?.matrix
    };

    let solutions = null_space
        .solutions
        .into_iter()
        .map(|solution| {
            let transport = estimate_transport(&transporter, &plain, &solution.probabilities)?;
            let propagation = if config.propagate_times.is_empty() {
                Vec::new()
            } else {
                propagate(&plain, &solution.probabilities, &config.propagate_times)?
            };
            Ok(SolutionReport {
                solution,
                transport,
                propagation,
            })
        })
        .collect::<SolverResult<Vec<_>>>()?;

    tracing::info!(solutions = solutions.len(), "run complete");
    Ok(RunReport {
        rate_matrix,
        singular_values: null_space.singular_values,
        tolerance: null_space.tolerance,
        solutions,
    })
}
