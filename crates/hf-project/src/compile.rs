//! Turn a validated run description into solver inputs.

use std::path::Path;

use hf_core::units::{ev, k};
use hf_graph::{GraphBuilder, LatticeSpec, Position, SiteGraph, build_lattice};
use hf_solver::{SolveConfig, TransportParams};

use crate::legacy::{build_graph, parse_edges, parse_xyz};
use crate::schema::{RunDef, SystemDef};
use crate::{ProjectResult, read_to_string};

/// Everything `hf_solver::run` needs.
#[derive(Debug, Clone)]
pub struct CompiledRun {
    pub name: String,
    pub graph: SiteGraph,
    pub params: TransportParams,
    pub config: SolveConfig,
}

/// Build the graph, parameters and solver options of `run`.
///
/// `base_dir` resolves the relative paths of a `Files` system.
pub fn compile(run: &RunDef, base_dir: &Path) -> ProjectResult<CompiledRun> {
    let (graph, lattice_period) = compile_system(&run.system, base_dir)?;

    let p = &run.parameters;
    let mut params = TransportParams::from_temperature(k(p.temperature), p.field_z, ev(p.reorg));
    params.periodic_z = p.periodic_z.or(lattice_period);
    params.reference_energy = run.solver.reference_energy;
    params.validate()?;

    let config = SolveConfig {
        form: run.solver.precond.into(),
        rescale: run.solver.rescale,
        tolerance: run.solver.tolerance.into(),
        propagate_times: run.solver.propagate_times.clone(),
        verbose: run.solver.verbose,
    };

    Ok(CompiledRun {
        name: run.name.clone(),
        graph,
        params,
        config,
    })
}

fn compile_system(system: &SystemDef, base_dir: &Path) -> ProjectResult<(SiteGraph, Option<f64>)> {
    match system {
        SystemDef::Inline { sites, edges } => {
            let mut builder = GraphBuilder::with_capacity(sites.len());
            let ids: Vec<_> = sites
                .iter()
                .map(|s| {
                    let [x, y, z] = s.position;
                    builder.add_site(Position::new(x, y, z), s.energy)
                })
                .collect();
            for e in edges {
                let a = ids.get(e.a).copied().ok_or_else(|| missing_site(e.a, ids.len()))?;
                let b = ids.get(e.b).copied().ok_or_else(|| missing_site(e.b, ids.len()))?;
                builder.add_neighbour(a, b, e.coupling)?;
            }
            Ok((builder.build()?, None))
        }
        SystemDef::Files { xyz, edge } => {
            let xyz_path = base_dir.join(xyz);
            let edge_path = base_dir.join(edge);
            let sites = parse_xyz(xyz, &read_to_string(&xyz_path)?)?;
            let edges = parse_edges(edge, &read_to_string(&edge_path)?)?;
            Ok((build_graph(xyz, &sites, edge, &edges)?, None))
        }
        SystemDef::Lattice {
            counts,
            spacing,
            energy,
            coupling,
            periodic_z,
        } => {
            let spec = LatticeSpec {
                counts: *counts,
                spacing: *spacing,
                energy: *energy,
                coupling: *coupling,
                periodic_z: *periodic_z,
            };
            Ok((build_lattice(&spec)?, spec.period_z()))
        }
    }
}

fn missing_site(index: usize, len: usize) -> crate::ProjectError {
    crate::ValidationError::MissingReference {
        id: index.to_string(),
        context: format!("system.edges ({len} sites)"),
    }
    .into()
}
