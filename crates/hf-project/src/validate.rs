//! Run description validation.

use crate::schema::{ParametersDef, RunDef, SolverDef, SystemDef, ToleranceDef};

pub const LATEST_VERSION: u32 = 1;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: impl Into<String>, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn finite(field: impl Into<String>, v: f64) -> Result<(), ValidationError> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, v, "must be finite"))
    }
}

fn positive(field: impl Into<String>, v: f64) -> Result<(), ValidationError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, v, "must be positive"))
    }
}

pub fn validate_run(run: &RunDef) -> Result<(), ValidationError> {
    if run.version == 0 || run.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: run.version,
        });
    }
    validate_parameters(&run.parameters)?;
    validate_system(&run.system)?;
    validate_solver(&run.solver)?;
    Ok(())
}

fn validate_parameters(p: &ParametersDef) -> Result<(), ValidationError> {
    finite("parameters.field_z", p.field_z)?;
    positive("parameters.temperature", p.temperature)?;
    positive("parameters.reorg", p.reorg)?;
    if let Some(l) = p.periodic_z {
        positive("parameters.periodic_z", l)?;
    }
    Ok(())
}

fn validate_system(system: &SystemDef) -> Result<(), ValidationError> {
    match system {
        SystemDef::Inline { sites, edges } => {
            for (i, site) in sites.iter().enumerate() {
                for (axis, &c) in ["x", "y", "z"].iter().zip(&site.position) {
                    finite(format!("system.sites[{i}].position.{axis}"), c)?;
                }
                finite(format!("system.sites[{i}].energy"), site.energy)?;
            }
            for (k, edge) in edges.iter().enumerate() {
                for idx in [edge.a, edge.b] {
                    if idx >= sites.len() {
                        return Err(ValidationError::MissingReference {
                            id: idx.to_string(),
                            context: format!("system.edges[{k}] ({} sites)", sites.len()),
                        });
                    }
                }
                if edge.a == edge.b {
                    return Err(invalid(
                        format!("system.edges[{k}]"),
                        edge.a,
                        "a site cannot neighbour itself",
                    ));
                }
                finite(format!("system.edges[{k}].coupling"), edge.coupling)?;
            }
        }
        SystemDef::Files { xyz, edge } => {
            if xyz.trim().is_empty() {
                return Err(invalid("system.xyz", xyz, "path is empty"));
            }
            if edge.trim().is_empty() {
                return Err(invalid("system.edge", edge, "path is empty"));
            }
        }
        SystemDef::Lattice {
            counts,
            spacing,
            energy,
            coupling,
            ..
        } => {
            if counts.contains(&0) {
                return Err(invalid("system.counts", format!("{counts:?}"), "every count must be at least 1"));
            }
            for (axis, &s) in ["x", "y", "z"].iter().zip(spacing) {
                positive(format!("system.spacing.{axis}"), s)?;
            }
            finite("system.energy", *energy)?;
            finite("system.coupling", *coupling)?;
        }
    }
    Ok(())
}

fn validate_solver(solver: &SolverDef) -> Result<(), ValidationError> {
    if let Some(e) = solver.reference_energy {
        finite("solver.reference_energy", e)?;
    }
    if let ToleranceDef::Value(t) = solver.tolerance {
        if !(t.is_finite() && t >= 0.0) {
            return Err(invalid("solver.tolerance", t, "must be \"auto\", \"scaled\" or a non-negative number"));
        }
    }
    for (i, &t) in solver.propagate_times.iter().enumerate() {
        if !(t.is_finite() && t >= 0.0) {
            return Err(invalid(format!("solver.propagate_times[{i}]"), t, "must be non-negative"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EdgeDef, SiteDef};

    fn run(system: SystemDef) -> RunDef {
        RunDef {
            version: LATEST_VERSION,
            name: "test".to_string(),
            parameters: ParametersDef {
                field_z: 0.001,
                temperature: 300.0,
                reorg: 0.2,
                periodic_z: None,
            },
            system,
            solver: SolverDef::default(),
        }
    }

    fn two_sites(edges: Vec<EdgeDef>) -> SystemDef {
        SystemDef::Inline {
            sites: vec![
                SiteDef {
                    position: [0.0, 0.0, 0.0],
                    energy: 0.0,
                },
                SiteDef {
                    position: [0.0, 0.0, 3.0],
                    energy: 0.1,
                },
            ],
            edges,
        }
    }

    #[test]
    fn valid_inline_run() {
        let r = run(two_sites(vec![EdgeDef {
            a: 0,
            b: 1,
            coupling: 0.01,
        }]));
        assert_eq!(validate_run(&r), Ok(()));
    }

    #[test]
    fn edge_out_of_range() {
        let r = run(two_sites(vec![EdgeDef {
            a: 0,
            b: 2,
            coupling: 0.01,
        }]));
        assert!(matches!(
            validate_run(&r),
            Err(ValidationError::MissingReference { .. })
        ));
    }

    #[test]
    fn self_loop_rejected() {
        let r = run(two_sites(vec![EdgeDef {
            a: 1,
            b: 1,
            coupling: 0.01,
        }]));
        assert!(matches!(
            validate_run(&r),
            Err(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn future_version_rejected() {
        let mut r = run(two_sites(vec![]));
        r.version = LATEST_VERSION + 1;
        assert_eq!(
            validate_run(&r),
            Err(ValidationError::UnsupportedVersion {
                version: LATEST_VERSION + 1
            })
        );
    }

    #[test]
    fn physical_parameters_checked() {
        let mut r = run(two_sites(vec![]));
        r.parameters.temperature = 0.0;
        assert!(validate_run(&r).is_err());

        let mut r = run(two_sites(vec![]));
        r.parameters.periodic_z = Some(-1.0);
        assert!(validate_run(&r).is_err());
    }

    #[test]
    fn solver_options_checked() {
        let mut r = run(two_sites(vec![]));
        r.solver.tolerance = ToleranceDef::Value(-1e-9);
        assert!(validate_run(&r).is_err());

        let mut r = run(two_sites(vec![]));
        r.solver.propagate_times = vec![1e-9, f64::NAN];
        assert!(validate_run(&r).is_err());
    }

    #[test]
    fn empty_lattice_rejected() {
        let r = run(SystemDef::Lattice {
            counts: [2, 0, 2],
            spacing: [1.0, 1.0, 1.0],
            energy: 0.0,
            coupling: 0.01,
            periodic_z: false,
        });
        assert!(validate_run(&r).is_err());
    }
}
