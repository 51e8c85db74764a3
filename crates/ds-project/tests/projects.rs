use std::path::Path;

use ds_project::{ProjectError, RunOutcome, build_core_spec, load, solve_project};
use ds_reactor::{BalanceMode, CoreError, CoreSolver, PeripheryBoundary};

fn project_path(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../projects").join(name)
}

#[test]
fn sample_projects_load_and_build() {
    for name in ["single_assembly.yaml", "seven_assembly_core.yaml"] {
        let project = load(&project_path(name))
            .unwrap_or_else(|e| panic!("Failed to load {}: {}", name, e));
        let spec = build_core_spec(&project)
            .unwrap_or_else(|e| panic!("Failed to build {}: {}", name, e));
        assert_eq!(spec.assemblies.len(), project.assemblies.len());
        CoreSolver::new(spec).unwrap_or_else(|e| panic!("Bad core in {}: {}", name, e));
    }
}

#[test]
fn seven_assembly_core_maps_solver_settings() {
    let project = load(&project_path("seven_assembly_core.yaml")).unwrap();
    let spec = build_core_spec(&project).unwrap();

    let balance = spec.solver.balance.unwrap();
    assert_eq!(balance.mode, BalanceMode::Equalize);
    assert_eq!(spec.solver.periphery, PeripheryBoundary::Adiabatic);
    assert_eq!(spec.duct.gap_conductivity, 0.5);
    assert!(spec.assemblies[6].locked);
    assert_eq!(spec.assemblies[6].flow_rate.value, 0.3);
    assert_eq!(spec.inlet_temperature.value, 573.15);
}

#[test]
fn single_assembly_solves() {
    let project = load(&project_path("single_assembly.yaml")).unwrap();
    let RunOutcome::Converged(summary) = solve_project(&project).unwrap() else {
        panic!("single assembly did not converge");
    };

    assert_eq!(summary.assemblies.len(), 1);
    assert!(summary.axial_nodes >= 101);
    let a = &summary.assemblies[0];
    assert_eq!(a.name, "driver");
    assert!((a.flow_kg_s - 8.0).abs() < 1e-12);
    assert!((a.power_w - 1.5e6).abs() < 1e-6);
    assert!(summary.relative_energy_imbalance < 1e-9);
    assert!(a.mixed_outlet_temperature_k > 623.15);
    assert!(a.peak_coolant_temperature_k >= a.mixed_outlet_temperature_k);
    assert!(a.pressure_drop_pa > 0.0);

    let clad = a.peak_clad_temperature_k.unwrap();
    let fuel = a.peak_fuel_temperature_k.unwrap();
    assert!(clad > a.peak_coolant_temperature_k);
    assert!(fuel > clad);

    let json = serde_json::to_string(&summary).unwrap();
    assert!(json.contains("\"name\":\"driver\""));
}

#[test]
fn seven_assembly_core_orifices_to_convergence() {
    let project = load(&project_path("seven_assembly_core.yaml")).unwrap();
    let summary = match solve_project(&project).unwrap() {
        RunOutcome::Converged(summary) => summary,
        RunOutcome::Failed(failure) => panic!("seven assembly core failed: {}", failure.error),
    };

    assert_eq!(summary.assemblies.len(), 7);
    assert!(summary.relative_energy_imbalance < 1e-9);
    let (driven, reflector) = summary.assemblies.split_at(6);
    assert_eq!(reflector[0].flow_kg_s, 0.3);
    let total: f64 = driven.iter().map(|a| a.flow_kg_s).sum();
    assert!((total - 9.0).abs() < 1e-9, "{total}");

    let peaks: Vec<f64> = driven.iter().map(|a| a.peak_coolant_temperature_k).collect();
    let spread = peaks.iter().copied().fold(f64::NEG_INFINITY, f64::max)
        - peaks.iter().copied().fold(f64::INFINITY, f64::min);
    assert!(spread < 1.0, "peaks {peaks:?}");
    // The 400 kW center assembly needs the most coolant.
    assert!(driven[1..].iter().all(|a| a.flow_kg_s < driven[0].flow_kg_s));
    assert!(summary.assemblies.iter().all(|a| a.max_mass_imbalance < 1e-9));
}

#[test]
fn oversized_bundle_is_a_setup_error() {
    let mut project = load(&project_path("single_assembly.yaml")).unwrap();
    project.assembly_types[0].duct_flat_to_flat_m = 0.05;

    let err = solve_project(&project).unwrap_err();
    assert!(matches!(
        err,
        ProjectError::Core(CoreError::InvalidGeometry { .. })
    ));
}

#[test]
fn iteration_cap_reports_failure() {
    let mut project = load(&project_path("single_assembly.yaml")).unwrap();
    project.solver.max_inner_iterations = 1;

    let RunOutcome::Failed(failure) = solve_project(&project).unwrap() else {
        panic!("expected the capped solve to fail");
    };
    assert_eq!(failure.stage, "Init");
    assert_eq!(failure.assembly.as_deref(), Some("driver"));
    assert!(!failure.has_partial);
}
