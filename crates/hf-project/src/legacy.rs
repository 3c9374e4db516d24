//! Readers for the `.sim`, `.xyz` and `.edge` input files.
//!
//! * `.sim`: whitespace-separated `label value` pairs (`fieldZ`, `temp`,
//!   `reorg`, optional `periodicZ` and `transE`).
//! * `.xyz`: one site per line, `x y z type energy`; `type` is ignored.
//! * `.edge`: one neighbour pair per line, `site1 site2 J` with 0-based indices.
//!
//! Blank lines and lines starting with `#` are skipped everywhere.

use std::path::Path;

use hf_core::Real;
use hf_core::units::{ev, k};
use hf_graph::{GraphBuilder, Position, SiteGraph};
use hf_solver::TransportParams;

use crate::{ProjectError, ProjectResult, read_to_string};

pub const LABEL_FIELD_Z: &str = "fieldZ";
pub const LABEL_TEMPERATURE: &str = "temp";
pub const LABEL_REORG: &str = "reorg";
pub const LABEL_PERIODIC_Z: &str = "periodicZ";
pub const LABEL_REFERENCE_ENERGY: &str = "transE";

/// Contents of a `.sim` file.
#[derive(Debug, Clone, PartialEq)]
pub struct SimParameters {
    /// V/Angstrom.
    pub field_z: Real,
    /// Kelvin.
    pub temperature: Real,
    /// eV.
    pub reorg: Real,
    pub periodic_z: Option<Real>,
    pub reference_energy: Option<Real>,
}

impl SimParameters {
    pub fn parse(file: &str, text: &str) -> ProjectResult<Self> {
        Ok(Self {
            field_z: read_parameter(file, text, LABEL_FIELD_Z)?,
            temperature: read_parameter(file, text, LABEL_TEMPERATURE)?,
            reorg: read_parameter(file, text, LABEL_REORG)?,
            periodic_z: find_parameter(file, text, LABEL_PERIODIC_Z)?,
            reference_energy: find_parameter(file, text, LABEL_REFERENCE_ENERGY)?,
        })
    }

    pub fn transport_params(&self) -> TransportParams {
        let mut params =
            TransportParams::from_temperature(k(self.temperature), self.field_z, ev(self.reorg));
        params.periodic_z = self.periodic_z;
        params.reference_energy = self.reference_energy;
        params
    }
}

fn content_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

/// Value following the first token equal to `label`, if the label occurs.
pub fn find_parameter(file: &str, text: &str, label: &str) -> ProjectResult<Option<Real>> {
    let mut tokens = content_lines(text)
        .flat_map(|(line, content)| content.split_whitespace().map(move |t| (line, t)));

    while let Some((line, word)) = tokens.next() {
        if word != label {
            continue;
        }
        let Some((value_line, value)) = tokens.next() else {
            return Err(ProjectError::Parse {
                file: file.to_string(),
                line,
                what: format!("'{label}' has no value"),
            });
        };
        return value
            .parse::<Real>()
            .map(Some)
            .map_err(|_| ProjectError::Parse {
                file: file.to_string(),
                line: value_line,
                what: format!("could not convert value '{value}' of '{label}' to a real number"),
            });
    }
    Ok(None)
}

/// Like [`find_parameter`], but a missing label is an error.
pub fn read_parameter(file: &str, text: &str, label: &str) -> ProjectResult<Real> {
    find_parameter(file, text, label)?.ok_or_else(|| ProjectError::MissingParameter {
        file: file.to_string(),
        label: label.to_string(),
    })
}

/// One row of a `.xyz` file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XyzRow {
    pub line: usize,
    pub position: Position,
    pub energy: Real,
}

/// One row of a `.edge` file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeRow {
    pub line: usize,
    pub a: usize,
    pub b: usize,
    pub coupling: Real,
}

pub fn parse_xyz(file: &str, text: &str) -> ProjectResult<Vec<XyzRow>> {
    const EXPECTED: &str = "expected 5 columns: x (real), y (real), z (real), type (token), energy (real)";

    content_lines(text)
        .map(|(line, content)| {
            let bad = || ProjectError::Parse {
                file: file.to_string(),
                line,
                what: EXPECTED.to_string(),
            };
            let cols: Vec<&str> = content.split_whitespace().collect();
            if cols.len() < 5 {
                return Err(bad());
            }
            let real = |s: &str| s.parse::<Real>().map_err(|_| bad());
            Ok(XyzRow {
                line,
                position: Position::new(real(cols[0])?, real(cols[1])?, real(cols[2])?),
                energy: real(cols[4])?,
            })
        })
        .collect()
}

pub fn parse_edges(file: &str, text: &str) -> ProjectResult<Vec<EdgeRow>> {
    const EXPECTED: &str = "expected 3 columns: site 1 (index), site 2 (index), J (real)";

    content_lines(text)
        .map(|(line, content)| {
            let bad = || ProjectError::Parse {
                file: file.to_string(),
                line,
                what: EXPECTED.to_string(),
            };
            let cols: Vec<&str> = content.split_whitespace().collect();
            if cols.len() < 3 {
                return Err(bad());
            }
            let index = |s: &str| s.parse::<usize>().map_err(|_| bad());
            Ok(EdgeRow {
                line,
                a: index(cols[0])?,
                b: index(cols[1])?,
                coupling: cols[2].parse::<Real>().map_err(|_| bad())?,
            })
        })
        .collect()
}

/// Build a graph from parsed `.xyz` and `.edge` rows.
pub fn build_graph(
    xyz_file: &str,
    sites: &[XyzRow],
    edge_file: &str,
    edges: &[EdgeRow],
) -> ProjectResult<SiteGraph> {
    let mut builder = GraphBuilder::with_capacity(sites.len());
    for row in sites {
        if !(row.energy.is_finite()
            && row.position.x.is_finite()
            && row.position.y.is_finite()
            && row.position.z.is_finite())
        {
            return Err(ProjectError::Parse {
                file: xyz_file.to_string(),
                line: row.line,
                what: "non-finite coordinate or energy".to_string(),
            });
        }
    }
    let ids: Vec<_> = sites
        .iter()
        .map(|row| builder.add_site(row.position, row.energy))
        .collect();

    for row in edges {
        let (Some(&a), Some(&b)) = (ids.get(row.a), ids.get(row.b)) else {
            return Err(ProjectError::Parse {
                file: edge_file.to_string(),
                line: row.line,
                what: format!("site index out of range ({} sites in {xyz_file})", ids.len()),
            });
        };
        builder
            .add_neighbour(a, b, row.coupling)
            .map_err(|e| ProjectError::Parse {
                file: edge_file.to_string(),
                line: row.line,
                what: e.to_string(),
            })?;
    }

    Ok(builder.build()?)
}

/// A run assembled from the three legacy files.
#[derive(Debug, Clone)]
pub struct LegacyRun {
    pub parameters: SimParameters,
    pub graph: SiteGraph,
}

pub fn load_legacy(sim: &Path, xyz: &Path, edge: &Path) -> ProjectResult<LegacyRun> {
    let (sim_name, xyz_name, edge_name) = (
        sim.display().to_string(),
        xyz.display().to_string(),
        edge.display().to_string(),
    );
    let parameters = SimParameters::parse(&sim_name, &read_to_string(sim)?)?;
    let sites = parse_xyz(&xyz_name, &read_to_string(xyz)?)?;
    let edges = parse_edges(&edge_name, &read_to_string(edge)?)?;
    let graph = build_graph(&xyz_name, &sites, &edge_name, &edges)?;
    Ok(LegacyRun { parameters, graph })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SIM: &str = "# demo\nfieldZ 0.001\ntemp 300\nreorg 0.2\n";

    #[test]
    fn sim_parameters() {
        let p = SimParameters::parse("demo.sim", SIM).unwrap();
        assert_eq!(p.field_z, 0.001);
        assert_eq!(p.temperature, 300.0);
        assert_eq!(p.reorg, 0.2);
        assert_eq!(p.periodic_z, None);
        assert_eq!(p.reference_energy, None);

        let params = p.transport_params();
        assert!((params.kbt - 300.0 * hf_core::constants::KB_EV_PER_K).abs() < 1e-12);
    }

    #[test]
    fn value_may_follow_on_next_line() {
        assert_eq!(find_parameter("a.sim", "temp\n 250", "temp").unwrap(), Some(250.0));
    }

    #[test]
    fn missing_label() {
        assert!(matches!(
            read_parameter("a.sim", "temp 300", "reorg"),
            Err(ProjectError::MissingParameter { .. })
        ));
    }

    #[test]
    fn bad_value_reports_line() {
        match read_parameter("a.sim", "fieldZ 0\n\nreorg abc\n", "reorg") {
            Err(ProjectError::Parse { line, .. }) => assert_eq!(line, 3),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn xyz_rows() {
        let rows = parse_xyz("s.xyz", "0 0 0 C -0.1\n\n# comment\n1.5 0 3.0 C 0.2 extra\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].line, 4);
        assert_eq!(rows[1].position, Position::new(1.5, 0.0, 3.0));
        assert_eq!(rows[1].energy, 0.2);
    }

    #[test]
    fn xyz_too_few_columns() {
        match parse_xyz("s.xyz", "0 0 0 C -0.1\n0 0 1 C\n") {
            Err(ProjectError::Parse { file, line, .. }) => {
                assert_eq!(file, "s.xyz");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn edge_rows_and_range_check() {
        let sites = parse_xyz("s.xyz", "0 0 0 C 0\n0 0 1 C 0\n").unwrap();
        let edges = parse_edges("s.edge", "0 1 0.01\n1 0 0.01\n").unwrap();
        let graph = build_graph("s.xyz", &sites, "s.edge", &edges).unwrap();
        assert_eq!(graph.edges().len(), 1);

        let bad = parse_edges("s.edge", "0 1 0.01\n0 5 0.01\n").unwrap();
        match build_graph("s.xyz", &sites, "s.edge", &bad) {
            Err(ProjectError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn edge_negative_index_is_a_parse_error() {
        assert!(matches!(
            parse_edges("s.edge", "-1 0 0.01\n"),
            Err(ProjectError::Parse { line: 1, .. })
        ));
    }

    proptest! {
        #[test]
        fn sim_values_read_back_exactly(
            field in -1.0f64..1.0,
            temp in 1.0f64..1000.0,
            reorg in 0.01f64..2.0,
            shuffle in 0usize..3,
        ) {
            let mut lines = vec![
                format!("{LABEL_FIELD_Z} {field}"),
                format!("{LABEL_TEMPERATURE}\t{temp}"),
                format!("{LABEL_REORG} {reorg}"),
            ];
            lines.rotate_left(shuffle);
            let text = lines.join("\n");
            let p = SimParameters::parse("p.sim", &text).unwrap();
            prop_assert_eq!(p.field_z, field);
            prop_assert_eq!(p.temperature, temp);
            prop_assert_eq!(p.reorg, reorg);
        }
    }
}
