//! hf-project: run description format, legacy input readers and validation.

pub mod compile;
pub mod legacy;
pub mod schema;
pub mod validate;

use std::path::Path;

pub use compile::{CompiledRun, compile};
pub use legacy::{LegacyRun, SimParameters, load_legacy};
pub use schema::*;
pub use validate::{LATEST_VERSION, ValidationError, validate_run};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{file}:{line}: {what}")]
    Parse {
        file: String,
        line: usize,
        what: String,
    },

    #[error("Could not find '{label}' in {file}")]
    MissingParameter { file: String, label: String },

    #[error("Unrecognised input file '{path}' (expected {expected})")]
    UnsupportedFormat { path: String, expected: String },

    #[error("Graph error: {0}")]
    Graph(#[from] hf_graph::GraphError),

    #[error("Solver error: {0}")]
    Solver(#[from] hf_solver::SolverError),
}

pub(crate) fn read_to_string(path: &Path) -> ProjectResult<String> {
    std::fs::read_to_string(path).map_err(|source| ProjectError::Io {
        path: path.display().to_string(),
        source,
    })
}

pub fn load_yaml(path: &Path) -> ProjectResult<RunDef> {
    let content = read_to_string(path)?;
    let run: RunDef = serde_yaml::from_str(&content)?;
    validate_run(&run)?;
    Ok(run)
}

pub fn load_json(path: &Path) -> ProjectResult<RunDef> {
    let content = read_to_string(path)?;
    let run: RunDef = serde_json::from_str(&content)?;
    validate_run(&run)?;
    Ok(run)
}

/// Load a run description, choosing the format by extension.
pub fn load(path: &Path) -> ProjectResult<RunDef> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => load_yaml(path),
        Some("json") => load_json(path),
        _ => Err(ProjectError::UnsupportedFormat {
            path: path.display().to_string(),
            expected: ".yaml, .yml or .json".to_string(),
        }),
    }
}

pub fn save_yaml(path: &Path, run: &RunDef) -> ProjectResult<()> {
    validate_run(run)?;
    let content = serde_yaml::to_string(run)?;
    std::fs::write(path, content).map_err(|source| ProjectError::Io {
        path: path.display().to_string(),
        source,
    })
}
