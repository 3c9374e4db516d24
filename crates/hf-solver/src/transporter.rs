//! Marcus-rate engine over a site graph.

use std::sync::OnceLock;

use hf_core::constants::{HBAR_EV_S, PI};
use hf_core::{Real, SiteId, minimum_image};
use hf_graph::{Site, SiteGraph};
use nalgebra::{DMatrix, DVector};

use crate::error::{SolverError, SolverResult};
use crate::params::TransportParams;
use crate::precondition::PrecondForm;

/// Computes driving forces, transfer rates and preconditioning factors.
///
/// Rates are memoized per edge and per direction: the first query for an
/// ordered pair computes and stores the value, later queries for the same pair
/// return it unchanged. The memo is a `OnceLock`, so a `&Transporter` can be
/// shared across rayon workers during matrix assembly.
#[derive(Debug)]
pub struct Transporter<'g> {
    graph: &'g SiteGraph,
    params: TransportParams,
    reference_energy: Real,
    /// `rates[edge][slot]`, slot from `Edge::slot(origin)`.
    rates: Vec<[OnceLock<Real>; 2]>,
}

impl<'g> Transporter<'g> {
    pub fn new(graph: &'g SiteGraph, params: TransportParams) -> SolverResult<Self> {
        params.validate()?;

        let reference_energy = match params.reference_energy {
            Some(e) => e,
            None if graph.is_empty() => 0.0,
            None => {
                let total: Real = graph
                    .sites()
                    .iter()
                    .map(|s| s.energy + s.position.z * params.field_z)
                    .sum();
                total / graph.len() as Real
            }
        };

        let rates = graph
            .edges()
            .iter()
            .map(|_| [OnceLock::new(), OnceLock::new()])
            .collect();

        Ok(Self {
            graph,
            params,
            reference_energy,
            rates,
        })
    }

    pub fn graph(&self) -> &'g SiteGraph {
        self.graph
    }

    pub fn params(&self) -> &TransportParams {
        &self.params
    }

    /// Reference energy used by the Boltzmann forms (configured or mean site energy).
    pub fn reference_energy(&self) -> Real {
        self.reference_energy
    }

    fn site(&self, id: SiteId) -> SolverResult<&'g Site> {
        self.graph.site(id).ok_or(SolverError::UnknownSite { site: id })
    }

    /// Displacement along z from `orig` to `dest`, minimum image when periodic.
    fn delta_z(&self, orig: &Site, dest: &Site) -> Real {
        let dz = dest.position.z - orig.position.z;
        match self.params.periodic_z {
            Some(period) => minimum_image(dz, period),
            None => dz,
        }
    }

    fn delta_e_sites(&self, orig: &Site, dest: &Site) -> Real {
        (dest.energy - orig.energy) + self.delta_z(orig, dest) * self.params.field_z
    }

    /// Energetic driving force for a hop from `orig` to `dest` (eV).
    pub fn delta_e(&self, orig: SiteId, dest: SiteId) -> SolverResult<Real> {
        Ok(self.delta_e_sites(self.site(orig)?, self.site(dest)?))
    }

    /// Marcus rate for coupling `j` and driving force `delta_e` (1/s).
    fn marcus(&self, j: Real, delta_e: Real) -> Real {
        let TransportParams { kbt, reorg, .. } = self.params;
        let prefactor = (2.0 * PI / HBAR_EV_S) * j * j / (4.0 * PI * reorg * kbt).sqrt();
        prefactor * (-(delta_e + reorg).powi(2) / (4.0 * reorg * kbt)).exp()
    }

    /// Transfer rate from `orig` to `dest`; exactly zero when the sites are not neighbours.
    pub fn rate(&self, orig: SiteId, dest: SiteId) -> SolverResult<Real> {
        let (o, d) = (self.site(orig)?, self.site(dest)?);
        let Some(edge) = self.graph.has_neighbour(orig, dest) else {
            return Ok(0.0);
        };
        let slot = edge.slot(orig).ok_or_else(|| SolverError::ProblemSetup {
            what: format!("edge {} does not start at site {orig}", edge.id),
        })?;
        let cell = &self.rates[edge.id.idx()][slot];
        if let Some(&cached) = cell.get() {
            return Ok(cached);
        }

        let rate = self.marcus(edge.coupling, self.delta_e_sites(o, d));
        if !rate.is_finite() {
            return Err(SolverError::Numeric {
                what: format!("rate {orig} -> {dest} is {rate}"),
            });
        }
        Ok(*cell.get_or_init(|| rate))
    }

    /// Memoized rate for `orig -> dest`, if it has been evaluated.
    pub fn cached_rate(&self, orig: SiteId, dest: SiteId) -> Option<Real> {
        let edge = self.graph.has_neighbour(orig, dest)?;
        let slot = edge.slot(orig)?;
        self.rates[edge.id.idx()][slot].get().copied()
    }

    /// Total inbound rate into `site` from all of its neighbours.
    pub fn rate_sum(&self, site: SiteId) -> SolverResult<Real> {
        self.graph
            .neighbours(site)
            .iter()
            .map(|n| self.rate(n.site, site))
            .sum()
    }

    /// Preconditioning weight of `site` under `form`.
    pub fn precond_factor(&self, site: SiteId, form: PrecondForm) -> SolverResult<Real> {
        let boltzmann = |s: &Site| {
            let shifted = s.energy + s.position.z * self.params.field_z;
            ((self.reference_energy - shifted) / self.params.kbt).exp()
        };

        let factor = match form {
            PrecondForm::Off => 1.0,
            PrecondForm::Boltzmann => boltzmann(self.site(site)?),
            PrecondForm::BoltzmannSquared => boltzmann(self.site(site)?).powi(2),
            PrecondForm::RateSum => {
                let sum = self.rate_sum(site)?;
                if sum == 0.0 {
                    return Err(SolverError::ZeroRateSum { site });
                }
                1.0 / sum
            }
        };

        if !(factor.is_finite() && factor > 0.0) {
            return Err(SolverError::Numeric {
                what: format!("{form} factor for site {site} is {factor}"),
            });
        }
        Ok(factor)
    }

    /// Preconditioning weights for every site, in site order.
    pub fn precond_factors(&self, form: PrecondForm) -> SolverResult<Vec<Real>> {
        self.graph
            .sites()
            .iter()
            .map(|s| self.precond_factor(s.id, form))
            .collect()
    }

    /// Drift velocity along z (Angstrom/s): `sum_{i != j} (z_i - z_j) A[j,i] P_i`.
    ///
    /// `matrix` must be the plain rate matrix (no preconditioning, no rescale)
    /// and `occupation` a per-site probability vector.
    pub fn velocity_z(&self, matrix: &DMatrix<Real>, occupation: &DVector<Real>) -> SolverResult<Real> {
        let m = self.graph.len();
        if matrix.nrows() != m || matrix.ncols() != m {
            return Err(SolverError::DimensionMismatch {
                what: "rate matrix",
                expected: m,
                actual: matrix.nrows().max(matrix.ncols()),
            });
        }
        if occupation.len() != m {
            return Err(SolverError::DimensionMismatch {
                what: "occupation vector",
                expected: m,
                actual: occupation.len(),
            });
        }

        let sites = self.graph.sites();
        let mut sum = 0.0;
        for (i, si) in sites.iter().enumerate() {
            for (j, sj) in sites.iter().enumerate() {
                if i != j {
                    // delta_z(i, j) = z_j - z_i
                    sum -= self.delta_z(si, sj) * matrix[(j, i)] * occupation[i];
                }
            }
        }
        Ok(sum)
    }
}
