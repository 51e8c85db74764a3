//! Serializable summaries of solve results.

use serde::Serialize;

use ds_coolant::{CoolantModel, CoolantResult};
use ds_reactor::{CoreSolution, SolveFailure};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AssemblySummary {
    pub name: String,
    pub flow_kg_s: f64,
    pub mixed_outlet_temperature_k: f64,
    pub peak_coolant_temperature_k: f64,
    pub peak_coolant_z_m: f64,
    pub peak_face_temperature_k: f64,
    pub pressure_drop_pa: f64,
    pub power_w: f64,
    pub duct_heat_w: f64,
    pub enthalpy_rise_w: f64,
    pub max_mass_imbalance: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_clad_temperature_k: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_fuel_temperature_k: Option<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConvergenceSummary {
    pub sweeps: usize,
    pub states: Vec<String>,
    pub duct_residuals: Vec<f64>,
    pub balance_residuals: Vec<f64>,
    pub balance_spreads: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SolutionSummary {
    pub axial_nodes: usize,
    pub assemblies: Vec<AssemblySummary>,
    pub total_power_w: f64,
    pub relative_energy_imbalance: f64,
    pub convergence: ConvergenceSummary,
}

impl SolutionSummary {
    pub fn from_solution(
        solution: &CoreSolution,
        coolant: &dyn CoolantModel,
    ) -> CoolantResult<Self> {
        let mut assemblies = Vec::with_capacity(solution.profiles().len());
        for (i, profile) in solution.profiles().iter().enumerate() {
            let peak = profile.peak_coolant();
            let pins = solution.pins.get(i).and_then(Option::as_ref);
            assemblies.push(AssemblySummary {
                name: solution.names.get(i).cloned().unwrap_or_default(),
                flow_kg_s: solution.flows()[i],
                mixed_outlet_temperature_k: profile.mixed_outlet_temperature(coolant)?,
                peak_coolant_temperature_k: peak.temperature,
                peak_coolant_z_m: peak.z,
                peak_face_temperature_k: profile.peak_face_temperature(),
                pressure_drop_pa: profile.pressure_drop.total(),
                power_w: profile.energy.power,
                duct_heat_w: profile.energy.duct_heat,
                enthalpy_rise_w: profile.energy.enthalpy_rise,
                max_mass_imbalance: profile.max_mass_imbalance(),
                warnings: profile.warnings.iter().map(ToString::to_string).collect(),
                peak_clad_temperature_k: pins.map(|p| p.peak_clad()),
                peak_fuel_temperature_k: pins.map(|p| p.peak_fuel()),
            });
        }

        let energy = solution.energy_balance();
        let report = &solution.report;
        Ok(Self {
            axial_nodes: solution.mesh.nodes().len(),
            assemblies,
            total_power_w: energy.power,
            relative_energy_imbalance: energy.relative_imbalance(),
            convergence: ConvergenceSummary {
                sweeps: report.sweeps,
                states: report.states.iter().map(|s| format!("{s:?}")).collect(),
                duct_residuals: report.duct_residuals.clone(),
                balance_residuals: report.balance_residuals.clone(),
                balance_spreads: report.balance_spreads.clone(),
            },
        })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FailureSummary {
    pub error: String,
    pub stage: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assembly: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub axial_position_m: Option<f64>,
    pub iterations: usize,
    pub residual: f64,
    pub has_partial: bool,
}

impl FailureSummary {
    /// `names` maps assembly ids to the names given in the project.
    pub fn from_failure(failure: &SolveFailure, names: &[String]) -> Self {
        let d = &failure.diagnostic;
        Self {
            error: failure.error.to_string(),
            stage: format!("{:?}", d.stage),
            assembly: d
                .assembly
                .map(|id| names.get(id.idx()).cloned().unwrap_or_else(|| id.to_string())),
            axial_position_m: d.axial_position,
            iterations: d.iterations,
            residual: d.residual,
            has_partial: failure.partial.is_some(),
        }
    }
}
