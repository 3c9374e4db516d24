use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use hf_project::{compile, load, load_legacy};
use hf_solver::{PrecondForm, SolveConfig, Tolerance, run};

mod report;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("Project error: {0}")]
    Project(#[from] hf_project::ProjectError),

    #[error("Solver error: {0}")]
    Solver(#[from] hf_solver::SolverError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "hopflow")]
#[command(about = "HopFlow - steady-state charge hopping on site networks", long_about = None)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a run description
    Validate {
        /// Path to the run YAML or JSON file
        run_path: PathBuf,
    },
    /// Solve a run description and print the report
    Solve {
        /// Path to the run YAML or JSON file
        run_path: PathBuf,
    },
    /// Solve from .sim, .xyz and .edge input files
    Files {
        /// The three input files, in any order
        #[arg(required = true, num_args = 3..)]
        inputs: Vec<PathBuf>,
        /// Preconditioning: off, boltzmann, boltzmannSquared or rateSum
        #[arg(long, default_value = "off")]
        precond: PrecondForm,
        /// Reference energy for Boltzmann preconditioning (eV)
        #[arg(long)]
        reference_energy: Option<f64>,
        /// Rescale the matrix by a power of ten before decomposing
        #[arg(long)]
        rescale: bool,
        /// Singular value cutoff: "auto", "scaled" or a number
        #[arg(long, default_value = "auto", value_parser = parse_tolerance)]
        tolerance: Tolerance,
        /// Propagate each solution for this many seconds (repeatable)
        #[arg(long = "time")]
        times: Vec<f64>,
    },
}

fn parse_tolerance(s: &str) -> Result<Tolerance, String> {
    if s.eq_ignore_ascii_case("auto") {
        return Ok(Tolerance::Auto);
    }
    if s.eq_ignore_ascii_case("scaled") {
        return Ok(Tolerance::Scaled);
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(Tolerance::Fixed(v)),
        _ => Err(format!("expected \"auto\", \"scaled\" or a non-negative number, got '{s}'")),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Validate { run_path } => cmd_validate(&run_path),
        Commands::Solve { run_path } => cmd_solve(&run_path, cli.verbose),
        Commands::Files {
            inputs,
            precond,
            reference_energy,
            rescale,
            tolerance,
            times,
        } => {
            let config = SolveConfig {
                form: precond,
                rescale,
                tolerance,
                propagate_times: times,
                verbose: cli.verbose,
            };
            cmd_files(&inputs, reference_energy, config)
        }
    }
}

fn base_dir(path: &Path) -> &Path {
    path.parent().unwrap_or(Path::new("."))
}

fn cmd_validate(run_path: &Path) -> CliResult<()> {
    println!("Validating run: {}", run_path.display());
    let def = load(run_path)?;
    let compiled = compile(&def, base_dir(run_path))?;
    println!("✓ Run is valid");
    println!("  Name: {}", compiled.name);
    println!("  Sites: {}", compiled.graph.len());
    println!("  Edges: {}", compiled.graph.edges().len());
    Ok(())
}

fn cmd_solve(run_path: &Path, verbose: bool) -> CliResult<()> {
    let def = load(run_path)?;
    let mut compiled = compile(&def, base_dir(run_path))?;
    compiled.config.verbose |= verbose;

    println!("Solving run: {}", compiled.name);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    report::write_parameters(&mut out, &compiled.params)?;
    report::write_sites(&mut out, &compiled.graph)?;

    let result = run(&compiled.graph, compiled.params.clone(), &compiled.config)?;
    report::write_report(&mut out, &compiled.graph, &result)?;

    if let Some(best) = result.primary() {
        best.solution.assign_to(&mut compiled.graph)?;
        report::write_occupations(&mut out, &compiled.graph)?;
    }
    out.flush()?;
    Ok(())
}

struct InputFiles {
    sim: PathBuf,
    xyz: PathBuf,
    edge: PathBuf,
}

fn classify_inputs(inputs: &[PathBuf]) -> CliResult<InputFiles> {
    let (mut sim, mut xyz, mut edge) = (None, None, None);
    for path in inputs {
        let slot = match path.extension().and_then(|e| e.to_str()) {
            Some("sim") => &mut sim,
            Some("xyz") => &mut xyz,
            Some("edge") => &mut edge,
            _ => {
                return Err(CliError::InvalidInput(format!(
                    "unrecognised input file '{}'",
                    path.display()
                )))
            }
        };
        *slot = Some(path.clone());
    }
    match (sim, xyz, edge) {
        (Some(sim), Some(xyz), Some(edge)) => Ok(InputFiles { sim, xyz, edge }),
        _ => Err(CliError::InvalidInput(
            "expect at least three input files: .sim, .xyz, .edge".to_string(),
        )),
    }
}

fn cmd_files(inputs: &[PathBuf], reference_energy: Option<f64>, config: SolveConfig) -> CliResult<()> {
    let files = classify_inputs(inputs)?;
    println!(
        "Taking input from {}, {}, {} ...",
        files.sim.display(),
        files.xyz.display(),
        files.edge.display()
    );

    let mut legacy = load_legacy(&files.sim, &files.xyz, &files.edge)?;
    let mut params = legacy.parameters.transport_params();
    if reference_energy.is_some() {
        params.reference_energy = reference_energy;
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    report::write_sim_parameters(&mut out, &legacy.parameters)?;
    report::write_sites(&mut out, &legacy.graph)?;

    let result = run(&legacy.graph, params, &config)?;
    report::write_report(&mut out, &legacy.graph, &result)?;

    if let Some(best) = result.primary() {
        best.solution.assign_to(&mut legacy.graph)?;
        report::write_occupations(&mut out, &legacy.graph)?;
    }
    out.flush()?;
    Ok(())
}
