//! Steady-state master-equation solver for charge hopping on a site network.
//!
//! The pipeline:
//! 1. [`Transporter`] evaluates Marcus hopping rates on a [`hf_graph::SiteGraph`]
//!    and memoizes them per edge and direction.
//! 2. [`rate_matrix::assemble`] builds the generator matrix, optionally
//!    preconditioned ([`PrecondForm`]) and rescaled by a power of ten.
//! 3. [`steady::extract_steady_states`] takes the SVD, keeps right-singular
//!    vectors whose singular value is under the tolerance, undoes the
//!    preconditioning and fixes normalization and sign.
//! 4. [`transport`] and [`propagate`] post-process each candidate.
//!
//! [`solve::run`] chains all of it for one configured run.

pub mod error;
pub mod params;
pub mod precondition;
pub mod propagate;
pub mod rate_matrix;
pub mod solve;
pub mod steady;
pub mod transport;
pub mod transporter;

pub use error::{SolverError, SolverResult};
pub use params::TransportParams;
pub use precondition::PrecondForm;
pub use propagate::{Propagation, propagate};
pub use rate_matrix::{MagnitudeRange, MatrixOptions, RateMatrix, assemble, format_matrix};
pub use solve::{RunReport, SolutionReport, SolveConfig, run};
pub use steady::{Decomposition, NullSpace, SteadySolution, Tolerance, extract_steady_states};
pub use transport::{TransportEstimate, estimate_transport};
pub use transporter::Transporter;
