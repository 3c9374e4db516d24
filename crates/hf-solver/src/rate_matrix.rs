//! Rate (generator) matrix assembly.

use std::fmt::Write as _;

use hf_core::{Real, order_of_magnitude};
use nalgebra::DMatrix;
use rayon::prelude::*;

use crate::error::SolverResult;
use crate::precondition::PrecondForm;
use crate::transporter::Transporter;

/// How to assemble the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MatrixOptions {
    pub form: PrecondForm,
    /// Scale by `10^-highest` so the largest entry lies in [1, 10).
    pub rescale: bool,
    /// Log the full matrix at info level.
    pub verbose: bool,
}

impl MatrixOptions {
    /// No preconditioning, no rescale: the matrix used for velocities and propagation.
    pub fn plain() -> Self {
        Self::default()
    }
}

/// Decimal orders of magnitude spanned by the nonzero entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MagnitudeRange {
    pub highest: i32,
    pub lowest: i32,
}

impl MagnitudeRange {
    pub fn span(&self) -> i32 {
        self.highest - self.lowest
    }
}

/// An assembled rate matrix plus what was done to it.
#[derive(Debug, Clone)]
pub struct RateMatrix {
    pub matrix: DMatrix<Real>,
    pub form: PrecondForm,
    /// Per-site preconditioning factors (all 1 for `Off`).
    pub factors: Vec<Real>,
    /// Before rescaling; `None` when every entry is zero.
    pub magnitudes: Option<MagnitudeRange>,
    /// `Some(h)` when the matrix was multiplied by `10^-h`.
    pub scale_exponent: Option<i32>,
}

impl RateMatrix {
    /// Factors to undo after solving, or `None` when no preconditioning was applied.
    pub fn reverse_factors(&self) -> Option<&[Real]> {
        (!self.form.is_off()).then_some(self.factors.as_slice())
    }
}

/// Assemble the M x M generator matrix.
///
/// `A[i,f] = Rate(f,i) * factor(f)` for `i != f` and
/// `A[i,i] = -sum_{k != i} Rate(i,k) * factor(i)`, so each column sums to zero.
/// Non-neighbours contribute exactly zero and are skipped.
pub fn assemble(transporter: &Transporter<'_>, options: MatrixOptions) -> SolverResult<RateMatrix> {
    let graph = transporter.graph();
    let m = graph.len();
    let factors = transporter.precond_factors(options.form)?;

    let rows: Vec<Vec<(usize, Real)>> = graph
        .sites()
        .par_iter()
        .map(|site| -> SolverResult<Vec<(usize, Real)>> {
            let i = site.id.idx();
            let neighbours = graph.neighbours(site.id);
            let mut row = Vec::with_capacity(neighbours.len() + 1);
            let mut loss = 0.0;
            for n in neighbours {
                let f = n.site.idx();
                row.push((f, transporter.rate(n.site, site.id)? * factors[f]));
                loss += transporter.rate(site.id, n.site)? * factors[i];
            }
            row.push((i, -loss));
            Ok(row)
        })
        .collect::<SolverResult<_>>()?;

    let mut matrix = DMatrix::zeros(m, m);
    let mut magnitudes: Option<MagnitudeRange> = None;
    for (i, row) in rows.into_iter().enumerate() {
        for (f, el) in row {
            matrix[(i, f)] = el;
            if let Some(order) = order_of_magnitude(el) {
                magnitudes = Some(match magnitudes {
                    Some(r) => MagnitudeRange {
                        highest: r.highest.max(order),
                        lowest: r.lowest.min(order),
                    },
                    None => MagnitudeRange {
                        highest: order,
                        lowest: order,
                    },
                });
            }
        }
    }

    tracing::debug!(
        sites = m,
        form = %options.form,
        highest = magnitudes.map(|r| r.highest),
        lowest = magnitudes.map(|r| r.lowest),
        "assembled rate matrix"
    );
    if options.verbose {
        tracing::info!("rate matrix A =\n{}", format_matrix(&matrix));
        if let Some(r) = magnitudes {
            tracing::info!(
                "order of magnitude: highest = {}, lowest = {}, diff = {}",
                r.highest,
                r.lowest,
                r.span()
            );
        }
    }

    let scale_exponent = match magnitudes {
        Some(r) if options.rescale => {
            matrix *= (10.0 as Real).powi(-r.highest);
            tracing::debug!("rescaled rate matrix by 1e{}", -r.highest);
            if options.verbose {
                tracing::info!("rescaled A =\n{}", format_matrix(&matrix));
            }
            Some(r.highest)
        }
        _ => None,
    };

    Ok(RateMatrix {
        matrix,
        form: options.form,
        factors,
        magnitudes,
        scale_exponent,
    })
}

/// Render a matrix row by row in scientific notation, zeros as `0`.
pub fn format_matrix(matrix: &DMatrix<Real>) -> String {
    let mut out = String::new();
    for i in 0..matrix.nrows() {
        for j in 0..matrix.ncols() {
            let el = matrix[(i, j)];
            let cell = if el == 0.0 {
                "0".to_string()
            } else {
                format!("{el:.2e}")
            };
            let _ = write!(out, "{cell:<10}");
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::TransportParams;
    use hf_graph::{GraphBuilder, Position, SiteGraph};

    fn chain() -> SiteGraph {
        let mut b = GraphBuilder::new();
        let s: Vec<_> = [0.0, 0.02, -0.01]
            .iter()
            .enumerate()
            .map(|(i, &e)| b.add_site(Position::new(0.0, 0.0, i as Real), e))
            .collect();
        b.add_neighbour(s[0], s[1], 0.01).unwrap();
        b.add_neighbour(s[1], s[2], 0.02).unwrap();
        b.build().unwrap()
    }

    fn params() -> TransportParams {
        TransportParams::new(0.025, 0.005, 0.2)
    }

    #[test]
    fn entries_follow_assembly_convention() {
        let g = chain();
        let t = Transporter::new(&g, params()).unwrap();
        let a = assemble(&t, MatrixOptions::plain()).unwrap();
        let ids: Vec<_> = g.sites().iter().map(|s| s.id).collect();

        assert_eq!(a.matrix[(0, 1)], t.rate(ids[1], ids[0]).unwrap());
        assert_eq!(a.matrix[(1, 0)], t.rate(ids[0], ids[1]).unwrap());
        assert_eq!(a.matrix[(0, 2)], 0.0);
        assert_eq!(a.matrix[(0, 0)], -t.rate(ids[0], ids[1]).unwrap());
        assert!(a.reverse_factors().is_none());
        assert_eq!(a.scale_exponent, None);
    }

    #[test]
    fn preconditioned_columns_are_scaled_by_their_site_factor() {
        let g = chain();
        let t = Transporter::new(&g, params()).unwrap();
        let plain = assemble(&t, MatrixOptions::plain()).unwrap();
        let opts = MatrixOptions {
            form: PrecondForm::Boltzmann,
            ..MatrixOptions::default()
        };
        let pre = assemble(&t, opts).unwrap();
        let factors = pre.reverse_factors().unwrap();

        for f in 0..3 {
            for i in 0..3 {
                let expected = plain.matrix[(i, f)] * factors[f];
                assert!((pre.matrix[(i, f)] - expected).abs() <= 1e-12 * expected.abs());
            }
        }
    }

    #[test]
    fn rescale_puts_largest_entry_in_unit_decade() {
        let g = chain();
        let t = Transporter::new(&g, params()).unwrap();
        let opts = MatrixOptions {
            rescale: true,
            ..MatrixOptions::default()
        };
        let a = assemble(&t, opts).unwrap();
        let r = a.magnitudes.unwrap();
        assert_eq!(a.scale_exponent, Some(r.highest));
        let largest = a.matrix.amax();
        assert!((1.0..10.0).contains(&largest), "largest = {largest}");
    }

    #[test]
    fn edgeless_graph_gives_zero_matrix() {
        let mut b = GraphBuilder::new();
        b.add_site(Position::default(), 0.0);
        b.add_site(Position::default(), 0.1);
        let g = b.build().unwrap();
        let t = Transporter::new(&g, params()).unwrap();
        let opts = MatrixOptions {
            rescale: true,
            ..MatrixOptions::default()
        };
        let a = assemble(&t, opts).unwrap();
        assert!(a.matrix.iter().all(|&x| x == 0.0));
        assert_eq!(a.magnitudes, None);
        assert_eq!(a.scale_exponent, None);
    }

    #[test]
    fn format_matrix_prints_zeros_plainly() {
        let m = DMatrix::from_row_slice(2, 2, &[-1.5e12, 0.0, 1.5e12, 0.0]);
        let text = format_matrix(&m);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("-1.50e12"));
        assert!(lines[0].trim_end().ends_with('0'));
    }
}
