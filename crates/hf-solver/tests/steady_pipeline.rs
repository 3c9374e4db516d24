//! End-to-end tests of the steady-state pipeline.

use hf_core::Real;
use hf_graph::{GraphBuilder, LatticeSpec, Position, SiteGraph, build_lattice};
use hf_solver::{
    MatrixOptions, PrecondForm, RunReport, SolveConfig, Tolerance, TransportParams, Transporter,
    assemble, run,
};
use proptest::prelude::*;

/// Open chain along z with the given site energies.
fn chain(energies: &[Real], spacing: Real, coupling: Real) -> SiteGraph {
    let mut builder = GraphBuilder::new();
    let ids: Vec<_> = energies
        .iter()
        .enumerate()
        .map(|(i, &e)| builder.add_site(Position::new(0.0, 0.0, i as Real * spacing), e))
        .collect();
    for pair in ids.windows(2) {
        builder.add_neighbour(pair[0], pair[1], coupling).unwrap();
    }
    builder.build().unwrap()
}

fn fixture() -> SiteGraph {
    chain(&[0.0, 0.03, -0.02, 0.01, 0.015], 3.0, 0.01)
}

fn params(field_z: Real) -> TransportParams {
    TransportParams::new(0.025, field_z, 0.2)
}

fn scaled() -> SolveConfig {
    SolveConfig {
        tolerance: Tolerance::Scaled,
        ..SolveConfig::default()
    }
}

fn ring(sites: usize) -> (SiteGraph, Real) {
    let spec = LatticeSpec {
        counts: [1, 1, sites],
        spacing: [1.0, 1.0, 2.0],
        energy: 0.0,
        coupling: 0.01,
        periodic_z: true,
    };
    let graph = build_lattice(&spec).unwrap();
    let period = spec.period_z().unwrap();
    (graph, period)
}

/// Rounding floor of `sum (z_i - z_j) A[j,i] P_i` for a state carrying no current.
fn velocity_noise_bound(graph: &SiteGraph, report: &RunReport) -> Real {
    let z = graph.sites().iter().map(|s| s.position.z);
    let span = z.clone().fold(Real::NEG_INFINITY, Real::max) - z.fold(Real::INFINITY, Real::min);
    1e-12 * report.rate_matrix.matrix.amax() * span
}

/// Every reported vector has its dominant entries non-negative.
fn assert_sign_convention(report: &RunReport) {
    for entry in &report.solutions {
        let v = &entry.solution.vector;
        assert!(v.max() >= v.min().abs(), "sign not fixed: {v}");
    }
}

#[test]
fn two_sites_with_auto_tolerance() {
    let graph = chain(&[0.0, 0.0], 4.0, 0.02);
    for form in PrecondForm::ALL {
        let config = SolveConfig {
            form,
            ..SolveConfig::default()
        };
        let report = run(&graph, params(0.0), &config).unwrap();
        assert_eq!(report.solutions.len(), 1, "form {form}");
        let p = &report.solutions[0].solution.probabilities;
        assert!((p[0] - 0.5).abs() < 1e-9, "form {form}: {p}");
        assert!((p[1] - 0.5).abs() < 1e-9, "form {form}: {p}");
        assert_sign_convention(&report);
    }
}

#[test]
fn preconditioning_does_not_change_the_steady_state() {
    let graph = fixture();
    let solve = |form| {
        let config = SolveConfig {
            form,
            rescale: true,
            tolerance: Tolerance::Fixed(1e-8),
            ..SolveConfig::default()
        };
        let report = run(&graph, params(0.002), &config).unwrap();
        assert_eq!(report.solutions.len(), 1, "form {form}");
        assert_sign_convention(&report);
        report.solutions[0].solution.probabilities.clone()
    };

    let reference = solve(PrecondForm::Off);
    assert!((reference.sum() - 1.0).abs() < 1e-12);
    assert!(reference.iter().all(|&p| p > 0.0));

    for form in [
        PrecondForm::Boltzmann,
        PrecondForm::BoltzmannSquared,
        PrecondForm::RateSum,
    ] {
        let p = solve(form);
        let diff = (&p - &reference).amax();
        assert!(diff < 1e-6, "form {form} differs by {diff}");
    }
}

#[test]
fn rescale_does_not_change_the_steady_state() {
    let graph = fixture();
    let solve = |rescale| {
        let config = SolveConfig {
            rescale,
            ..SolveConfig::default()
        };
        run(&graph, params(0.002), &config).unwrap()
    };
    let plain = solve(false);
    let scaled = solve(true);

    assert_eq!(plain.rate_matrix.scale_exponent, None);
    assert!(scaled.rate_matrix.scale_exponent.is_some());
    assert_sign_convention(&plain);
    assert_sign_convention(&scaled);
    let diff = (&plain.solutions[0].solution.probabilities
        - &scaled.solutions[0].solution.probabilities)
        .amax();
    assert!(diff < 1e-9, "rescale changed result by {diff}");

    // An open chain carries no net current, so both velocities sit at the
    // rounding floor of the plain matrix.
    let bound = velocity_noise_bound(&graph, &plain);
    let (v0, v1) = (
        plain.solutions[0].transport.velocity,
        scaled.solutions[0].transport.velocity,
    );
    assert!((v0 - v1).abs() <= bound, "{v0} vs {v1}, bound {bound}");
}

#[test]
fn rescale_keeps_ring_current() {
    let (graph, period) = ring(5);
    let solve = |rescale| {
        let config = SolveConfig {
            rescale,
            ..scaled()
        };
        run(&graph, params(0.002).with_periodic_z(period), &config).unwrap()
    };
    let plain = solve(false);
    let rescaled = solve(true);

    // Transport always uses the plain matrix.
    let (v0, v1) = (
        plain.primary().unwrap().transport.velocity,
        rescaled.primary().unwrap().transport.velocity,
    );
    assert!(v0 > 0.0);
    assert!((v0 - v1).abs() <= 1e-6 * v0, "{v0} vs {v1}");
}

#[test]
fn energetically_favoured_site_is_most_occupied() {
    let graph = fixture();
    let report = run(&graph, params(0.0), &scaled()).unwrap();
    let p = &report.primary().unwrap().solution.probabilities;
    // Site 2 has the lowest energy.
    assert_eq!(p.imax(), 2);
    assert_sign_convention(&report);
}

#[test]
fn open_chain_has_no_net_velocity() {
    let graph = chain(&[0.0; 6], 3.0, 0.01);
    let report = run(&graph, params(0.005), &scaled()).unwrap();
    let best = report.primary().unwrap();
    let bound = velocity_noise_bound(&graph, &report);
    assert!(best.transport.velocity.abs() <= bound, "v = {}", best.transport.velocity);
    assert!(best.transport.mobility.is_some());

    let still = run(&graph, params(0.0), &scaled()).unwrap();
    assert_eq!(still.primary().unwrap().transport.mobility, None);
}

#[test]
fn periodic_ring_carries_uniform_current() {
    let (graph, period) = ring(4);
    let forward = run(&graph, params(0.001).with_periodic_z(period), &scaled()).unwrap();

    assert_eq!(forward.solutions.len(), 1);
    assert_sign_convention(&forward);
    let best = forward.primary().unwrap();
    for &p in best.solution.probabilities.iter() {
        assert!((p - 0.25).abs() < 1e-9);
    }
    assert!(best.transport.velocity > 0.0);
    assert!(best.transport.mobility.unwrap() > 0.0);

    // Reversing the field reverses the drift; mobility keeps its sign.
    let backward = run(&graph, params(-0.001).with_periodic_z(period), &scaled()).unwrap();
    let back = backward.primary().unwrap();
    assert!(back.transport.velocity < 0.0);
    let (v, w) = (best.transport.velocity, back.transport.velocity);
    assert!((v + w).abs() <= 1e-9 * v);
    assert!(back.transport.mobility.unwrap() > 0.0);
}

#[test]
fn disconnected_graph_yields_several_candidates() {
    let mut builder = GraphBuilder::new();
    let ids: Vec<_> = (0..4)
        .map(|i| builder.add_site(Position::new(0.0, 0.0, i as Real), 0.0))
        .collect();
    builder.add_neighbour(ids[0], ids[1], 0.01).unwrap();
    builder.add_neighbour(ids[2], ids[3], 0.01).unwrap();
    let graph = builder.build().unwrap();

    let report = run(&graph, params(0.0), &scaled()).unwrap();
    assert_eq!(report.solutions.len(), 2);
    assert_sign_convention(&report);
}

#[test]
fn found_solution_can_be_stored_on_the_graph() {
    let mut graph = fixture();
    let report = run(&graph, params(0.002), &SolveConfig::default()).unwrap();
    let best = report.primary().unwrap().solution.clone();
    best.assign_to(&mut graph).unwrap();
    let total: Real = graph.sites().iter().filter_map(|s| s.occupation).sum();
    assert!((total - 1.0).abs() < 1e-12);
}

proptest! {
    /// Every column of the generator sums to zero and every off-diagonal
    /// entry is a non-negative rate, with or without preconditioning.
    #[test]
    fn generator_columns_sum_to_zero(
        energies in proptest::collection::vec(-0.1f64..0.1, 2..7),
        coupling in 0.001f64..0.05,
        field in -0.01f64..0.01,
        form_index in 0usize..4,
    ) {
        let graph = chain(&energies, 3.5, coupling);
        let transporter = Transporter::new(&graph, params(field)).unwrap();
        let options = MatrixOptions {
            form: PrecondForm::ALL[form_index],
            ..MatrixOptions::default()
        };
        let a = assemble(&transporter, options).unwrap().matrix;
        let m = a.nrows();

        for f in 0..m {
            let column = a.column(f);
            let scale = column.amax();
            prop_assert!(column.sum().abs() <= 1e-12 * scale);
            for i in 0..m {
                if i != f {
                    prop_assert!(a[(i, f)] >= 0.0);
                }
            }
        }
    }
}
