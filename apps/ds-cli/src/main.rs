use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use ds_project::{
    FailureSummary, ProjectResult, RunOutcome, SolutionSummary, build_core_spec, solve_project,
};
use ds_reactor::CoreSolver;

#[derive(Parser)]
#[command(name = "ds-cli")]
#[command(about = "DuctSweep CLI - subchannel thermal-hydraulics of wire-wrapped cores", long_about = None)]
struct Cli {
    /// Log solver progress at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate project file syntax, structure and geometry
    Validate {
        /// Path to the project YAML or JSON file
        project_path: PathBuf,
    },
    /// Solve a core and print a summary
    Run {
        /// Path to the project YAML or JSON file
        project_path: PathBuf,
        /// Print the full summary as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ProjectResult<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    match cli.command {
        Commands::Validate { project_path } => cmd_validate(&project_path),
        Commands::Run { project_path, json } => cmd_run(&project_path, json),
    }
}

fn cmd_validate(project_path: &Path) -> ProjectResult<ExitCode> {
    println!("Validating project: {}", project_path.display());
    let project = ds_project::load(project_path)?;
    let spec = build_core_spec(&project)?;
    let solver = CoreSolver::new(spec)?;
    println!(
        "✓ Project is valid ({} assemblies, {} axial steps)",
        solver.networks().len(),
        solver.mesh().steps()
    );
    Ok(ExitCode::SUCCESS)
}

fn cmd_run(project_path: &Path, json: bool) -> ProjectResult<ExitCode> {
    let project = ds_project::load(project_path)?;
    if !json {
        println!("Solving core: {}", project.name);
    }

    let start = Instant::now();
    let outcome = solve_project(&project)?;
    let elapsed = start.elapsed();

    match outcome {
        RunOutcome::Converged(summary) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_solution(&summary);
                println!("  Wall time: {:.3} s", elapsed.as_secs_f64());
            }
            Ok(ExitCode::SUCCESS)
        }
        RunOutcome::Failed(failure) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&failure)?);
            } else {
                print_failure(&failure);
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_solution(summary: &SolutionSummary) {
    println!(
        "✓ Converged after {} sweeps ({} axial nodes)",
        summary.convergence.sweeps, summary.axial_nodes
    );
    println!(
        "  Total power: {:.4e} W, relative energy imbalance: {:.2e}",
        summary.total_power_w, summary.relative_energy_imbalance
    );
    println!();
    println!(
        "  {:<16} {:>9} {:>10} {:>10} {:>8} {:>10} {:>10}",
        "assembly", "flow", "T_out", "T_peak", "z_peak", "T_duct", "dp"
    );
    println!(
        "  {:<16} {:>9} {:>10} {:>10} {:>8} {:>10} {:>10}",
        "", "[kg/s]", "[K]", "[K]", "[m]", "[K]", "[kPa]"
    );
    for a in &summary.assemblies {
        println!(
            "  {:<16} {:>9.4} {:>10.2} {:>10.2} {:>8.3} {:>10.2} {:>10.2}",
            a.name,
            a.flow_kg_s,
            a.mixed_outlet_temperature_k,
            a.peak_coolant_temperature_k,
            a.peak_coolant_z_m,
            a.peak_face_temperature_k,
            a.pressure_drop_pa / 1e3
        );
    }

    let pins: Vec<_> = summary
        .assemblies
        .iter()
        .filter_map(|a| Some((a, a.peak_clad_temperature_k?, a.peak_fuel_temperature_k?)))
        .collect();
    if !pins.is_empty() {
        println!();
        println!("  {:<16} {:>10} {:>10}", "assembly", "T_clad", "T_fuel");
        for (a, clad, fuel) in pins {
            println!("  {:<16} {:>10.2} {:>10.2}", a.name, clad, fuel);
        }
    }

    for a in &summary.assemblies {
        for w in &a.warnings {
            println!("  ! {}: {}", a.name, w);
        }
    }
}

fn print_failure(failure: &FailureSummary) {
    println!("✗ Solve failed during {}: {}", failure.stage, failure.error);
    if let Some(assembly) = &failure.assembly {
        println!("  Assembly: {}", assembly);
    }
    if let Some(z) = failure.axial_position_m {
        println!("  Axial position: {:.4} m", z);
    }
    println!(
        "  Iterations: {}, residual: {:.3e}",
        failure.iterations, failure.residual
    );
    if failure.has_partial {
        println!("  Partial results were kept for the last completed round");
    }
}
