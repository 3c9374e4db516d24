//! Regular lattice generator.

use hf_core::Real;

use crate::builder::GraphBuilder;
use crate::error::GraphError;
use crate::graph::{Position, SiteGraph};

/// A rectangular grid of sites with uniform coupling between axis neighbours.
#[derive(Debug, Clone, PartialEq)]
pub struct LatticeSpec {
    /// Number of sites along x, y, z.
    pub counts: [usize; 3],
    /// Lattice period along x, y, z (Angstrom).
    pub spacing: [Real; 3],
    /// Site energy used by [`build_lattice`] (eV).
    pub energy: Real,
    /// Transfer integral between axis neighbours (eV).
    pub coupling: Real,
    /// Also join the last z layer to the first.
    pub periodic_z: bool,
}

impl LatticeSpec {
    pub fn site_count(&self) -> usize {
        self.counts.iter().product()
    }

    /// Flat site index of grid point `(ix, iy, iz)`; x varies fastest.
    pub fn index(&self, [ix, iy, iz]: [usize; 3]) -> usize {
        ix + self.counts[0] * (iy + self.counts[1] * iz)
    }

    /// Periodic length along z, when the lattice wraps in z.
    pub fn period_z(&self) -> Option<Real> {
        self.periodic_z
            .then(|| self.counts[2] as Real * self.spacing[2])
    }

    fn check(&self) -> Result<(), GraphError> {
        if self.counts.contains(&0) {
            return Err(GraphError::InvalidLattice {
                what: format!("counts {:?} contain a zero", self.counts),
            });
        }
        if self.spacing.iter().any(|s| !(s.is_finite() && *s > 0.0)) {
            return Err(GraphError::InvalidLattice {
                what: format!("spacing {:?} must be positive", self.spacing),
            });
        }
        Ok(())
    }
}

/// Build a lattice where every site has `spec.energy`.
pub fn build_lattice(spec: &LatticeSpec) -> Result<SiteGraph, GraphError> {
    let energy = spec.energy;
    build_lattice_with(spec, |_| energy)
}

/// Build a lattice with per-site energies from `energy([ix, iy, iz])`.
///
/// Each site is wired to its +x, +y and +z neighbour when that neighbour is
/// inside the array; symmetric insertion gives every interior site all six.
pub fn build_lattice_with<F>(spec: &LatticeSpec, mut energy: F) -> Result<SiteGraph, GraphError>
where
    F: FnMut([usize; 3]) -> Real,
{
    spec.check()?;
    let [nx, ny, nz] = spec.counts;
    let [dx, dy, dz] = spec.spacing;

    let mut builder = GraphBuilder::with_capacity(spec.site_count());
    let mut ids = Vec::with_capacity(spec.site_count());
    for iz in 0..nz {
        for iy in 0..ny {
            for ix in 0..nx {
                let pos = Position::new(ix as Real * dx, iy as Real * dy, iz as Real * dz);
                ids.push(builder.add_site(pos, energy([ix, iy, iz])));
            }
        }
    }

    for iz in 0..nz {
        for iy in 0..ny {
            for ix in 0..nx {
                let here = ids[spec.index([ix, iy, iz])];
                if ix + 1 < nx {
                    builder.add_neighbour(here, ids[spec.index([ix + 1, iy, iz])], spec.coupling)?;
                }
                if iy + 1 < ny {
                    builder.add_neighbour(here, ids[spec.index([ix, iy + 1, iz])], spec.coupling)?;
                }
                if iz + 1 < nz {
                    builder.add_neighbour(here, ids[spec.index([ix, iy, iz + 1])], spec.coupling)?;
                } else if spec.periodic_z && nz > 1 {
                    builder.add_neighbour(here, ids[spec.index([ix, iy, 0])], spec.coupling)?;
                }
            }
        }
    }

    builder.build()
}
