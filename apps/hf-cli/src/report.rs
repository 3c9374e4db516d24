//! Plain-text report printing.

use std::io::{self, Write};

use hf_core::Real;
use hf_graph::SiteGraph;
use hf_project::SimParameters;
use hf_solver::{RunReport, TransportParams, format_matrix};

/// Scientific notation with two decimals, zero printed as `0`.
fn sci(v: Real) -> String {
    if v == 0.0 {
        "0".to_string()
    } else {
        format!("{v:.2e}")
    }
}

pub fn write_sim_parameters(out: &mut impl Write, p: &SimParameters) -> io::Result<()> {
    writeln!(out, "\nReading simulation parameters...")?;
    writeln!(out, "fieldZ (V/Ang) = {}", p.field_z)?;
    writeln!(out, "temp (K) = {}", p.temperature)?;
    writeln!(out, "reorg (eV) = {}", p.reorg)?;
    if let Some(l) = p.periodic_z {
        writeln!(out, "periodicZ (Ang) = {l}")?;
    }
    if let Some(e) = p.reference_energy {
        writeln!(out, "transE (eV) = {e}")?;
    }
    Ok(())
}

pub fn write_parameters(out: &mut impl Write, p: &TransportParams) -> io::Result<()> {
    writeln!(out, "\nSimulation parameters:")?;
    writeln!(out, "fieldZ (V/Ang) = {}", p.field_z)?;
    writeln!(out, "kBT (eV) = {}", p.kbt)?;
    writeln!(out, "reorg (eV) = {}", p.reorg)?;
    if let Some(l) = p.periodic_z {
        writeln!(out, "periodicZ (Ang) = {l}")?;
    }
    Ok(())
}

pub fn write_sites(out: &mut impl Write, graph: &SiteGraph) -> io::Result<()> {
    writeln!(out, "\nCreating sites...")?;
    for site in graph.sites() {
        let p = site.position;
        write!(
            out,
            "site {}: ({}, {}, {}) E = {} eV, neighbours:",
            site.id, p.x, p.y, p.z, site.energy
        )?;
        for n in graph.neighbours(site.id) {
            let j = graph.edge(n.edge).map_or(0.0, |e| e.coupling);
            write!(out, " {} (J = {j})", n.site)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn write_report(out: &mut impl Write, graph: &SiteGraph, report: &RunReport) -> io::Result<()> {
    let rm = &report.rate_matrix;
    write!(out, "\nCreating rate matrix A (precond = {}", rm.form)?;
    if let Some(h) = rm.scale_exponent {
        write!(out, ", scaled by 1e{}", -h)?;
    }
    writeln!(out, ")...")?;
    write!(out, "{}", format_matrix(&rm.matrix))?;
    if let Some(r) = rm.magnitudes {
        writeln!(
            out,
            "Order of magnitude: highest = {}, lowest = {}, diff = {}",
            r.highest,
            r.lowest,
            r.span()
        )?;
    }

    writeln!(out, "\nSolving ME using SVD...")?;
    writeln!(out, "\nSingular values = ")?;
    for &s in report.singular_values.iter() {
        writeln!(out, "{}", sci(s))?;
    }
    writeln!(
        out,
        "\nDisregarding singular values greater than threshold = {}",
        sci(report.tolerance)
    )?;

    if report.is_empty() {
        writeln!(out, "\nno steady state found within tolerance")?;
        return Ok(());
    }

    writeln!(out, "\nPrinting possible solutions\n")?;
    for (n, entry) in report.solutions.iter().enumerate() {
        let solution = &entry.solution;
        writeln!(
            out,
            "Solution {} (singular value {}):",
            n + 1,
            sci(solution.singular_value)
        )?;
        writeln!(
            out,
            "{:>6} {:>10} {:>10} {:>10} {:>10} {:>12}",
            "site", "x", "y", "z", "E", "P"
        )?;
        for (site, &p) in graph.sites().iter().zip(solution.probabilities.iter()) {
            writeln!(
                out,
                "{:>6} {:>10.3} {:>10.3} {:>10.3} {:>10.4} {:>12.4e}",
                site.id.idx(),
                site.position.x,
                site.position.y,
                site.position.z,
                site.energy,
                p
            )?;
        }

        writeln!(out, "velocity (Ang/s) = {}", sci(entry.transport.velocity))?;
        match entry.transport.mobility {
            Some(mu) => writeln!(out, "mobility (Ang^2/Vs) = {}", sci(mu))?,
            None => writeln!(out, "mobility = undefined (zero field)")?,
        }

        for step in &entry.propagation {
            let values: Vec<String> = step.occupation.iter().map(|&p| sci(p)).collect();
            writeln!(
                out,
                "t = {} s: max |P(t) - P(0)| = {}  P(t) = ( {} )",
                sci(step.time),
                sci(step.max_deviation),
                values.join(", ")
            )?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Occupation probabilities stored on the sites, `unset` where none was assigned.
pub fn write_occupations(out: &mut impl Write, graph: &SiteGraph) -> io::Result<()> {
    writeln!(out, "Site occupations:")?;
    for site in graph.sites() {
        match site.occupation {
            Some(p) => writeln!(out, "  site {}: P = {}", site.id, sci(p))?,
            None => writeln!(out, "  site {}: P = unset", site.id)?,
        }
    }
    Ok(())
}
