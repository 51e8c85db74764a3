//! ds-project: project file format, validation and conversion to a core
//! solve.

pub mod build;
pub mod report;
pub mod schema;
pub mod validate;

use std::path::Path;

use ds_reactor::{CoreError, CoreSolver};

pub use build::build_core_spec;
pub use report::{AssemblySummary, ConvergenceSummary, FailureSummary, SolutionSummary};
pub use schema::*;
pub use validate::{LATEST_VERSION, ValidationError, validate_project};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Core setup error: {0}")]
    Core(#[from] CoreError),

    #[error("Coolant error: {0}")]
    Coolant(#[from] ds_coolant::CoolantError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn load_yaml(path: &Path) -> ProjectResult<ProjectDef> {
    let content = std::fs::read_to_string(path)?;
    let project: ProjectDef = serde_yaml::from_str(&content)?;
    validate_project(&project)?;
    Ok(project)
}

pub fn save_yaml(path: &Path, project: &ProjectDef) -> ProjectResult<()> {
    validate_project(project)?;
    let content = serde_yaml::to_string(project)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &Path) -> ProjectResult<ProjectDef> {
    let content = std::fs::read_to_string(path)?;
    let project: ProjectDef = serde_json::from_str(&content)?;
    validate_project(&project)?;
    Ok(project)
}

pub fn save_json(path: &Path, project: &ProjectDef) -> ProjectResult<()> {
    validate_project(project)?;
    let content = serde_json::to_string_pretty(project)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Loads by extension: `.json` as JSON, anything else as YAML.
pub fn load(path: &Path) -> ProjectResult<ProjectDef> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => load_json(path),
        _ => load_yaml(path),
    }
}

/// Outcome of [`solve_project`]: a summary either way.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Converged(SolutionSummary),
    Failed(FailureSummary),
}

/// Builds and solves `project`.
///
/// Setup problems (bad input, bad geometry) are errors; a solve that
/// starts and then fails is reported as [`RunOutcome::Failed`].
pub fn solve_project(project: &ProjectDef) -> ProjectResult<RunOutcome> {
    let spec = build_core_spec(project)?;
    let names: Vec<String> = spec.assemblies.iter().map(|a| a.name.clone()).collect();
    let coolant = spec.coolant.clone();
    let solver = CoreSolver::new(spec)?;
    match solver.solve() {
        Ok(solution) => Ok(RunOutcome::Converged(SolutionSummary::from_solution(
            &solution,
            coolant.as_ref(),
        )?)),
        Err(failure) => Ok(RunOutcome::Failed(FailureSummary::from_failure(
            &failure, &names,
        ))),
    }
}
