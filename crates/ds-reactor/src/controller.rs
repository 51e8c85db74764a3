//! Outer iteration over the whole core.
//!
//! `Init` marches every assembly with adiabatic ducts at the given inlet
//! flows. `DuctCoupling` alternates coupler passes and core sweeps until
//! the duct fluxes settle. `FlowBalancing` then corrects the inlet flows
//! and hands back to `DuctCoupling`, until the corrections settle. Every
//! sweep produces a new [`CoreSnapshot`]; nothing is mutated in place.

use rayon::prelude::*;
use tracing::{debug, info};

use ds_core::AssemblyId;
use ds_geometry::SubchannelNetwork;
use ds_geometry::layout::CoreLayout;
use ds_solver::{
    AssemblyInput, AxialMesh, AxialProfile, DuctBoundary, EnergyBalance, MarchError,
    PeakTemperature, PinProfile, march_assembly, pin_temperatures, stability_limit, stable_step,
};

use crate::balancer::{BalancePoint, Correction, FlowBalancer};
use crate::config::CoreSpec;
use crate::coupler::{DuctCoupler, DuctGeometry, FaceHeat, face_heat, relax};
use crate::error::{CoreError, CoreResult, invalid_input};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveState {
    Init,
    DuctCoupling,
    FlowBalancing,
    Converged,
    Failed,
}

/// Where a failed solve stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Init,
    DuctCoupling,
    FlowBalancing,
    PinTemperatures,
}

/// Immutable result of one core sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct CoreSnapshot {
    /// Sweep counter, starting at 0 for `Init`.
    pub round: usize,
    /// Inlet flow per assembly [kg/s].
    pub flows: Vec<f64>,
    /// Duct boundaries the sweep was marched with.
    pub boundaries: Vec<DuctBoundary>,
    pub profiles: Vec<AxialProfile>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvergenceReport {
    /// State sequence, one entry per transition.
    pub states: Vec<SolveState>,
    pub sweeps: usize,
    pub duct_residuals: Vec<f64>,
    pub balance_residuals: Vec<f64>,
    /// Metric spread seen by each balancing round.
    pub balance_spreads: Vec<f64>,
}

impl ConvergenceReport {
    fn enter(&mut self, state: SolveState) {
        if self.states.last() != Some(&state) {
            self.states.push(state);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FailureDiagnostic {
    pub stage: FailureStage,
    pub assembly: Option<AssemblyId>,
    pub axial_position: Option<f64>,
    pub iterations: usize,
    pub residual: f64,
}

/// A solve that ended in `Failed`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{error}")]
pub struct SolveFailure {
    #[source]
    pub error: CoreError,
    pub diagnostic: FailureDiagnostic,
    /// Last consistent snapshot for outer-loop failures; `None` for
    /// node-level failures.
    pub partial: Option<CoreSnapshot>,
    pub report: ConvergenceReport,
}

pub type SolveResult = Result<CoreSolution, Box<SolveFailure>>;

#[derive(Debug, Clone, PartialEq)]
pub struct CoreSolution {
    pub snapshot: CoreSnapshot,
    pub mesh: AxialMesh,
    pub names: Vec<String>,
    pub face_heat: Vec<FaceHeat>,
    /// Present for assemblies with a pin model.
    pub pins: Vec<Option<PinProfile>>,
    pub report: ConvergenceReport,
}

impl CoreSolution {
    pub fn profiles(&self) -> &[AxialProfile] {
        &self.snapshot.profiles
    }

    pub fn flows(&self) -> &[f64] {
        &self.snapshot.flows
    }

    pub fn profile(&self, id: AssemblyId) -> Option<&AxialProfile> {
        self.snapshot.profiles.get(id.idx())
    }

    /// Sum of every assembly's balance.
    pub fn energy_balance(&self) -> EnergyBalance {
        self.snapshot
            .profiles
            .iter()
            .fold(EnergyBalance::default(), |acc, p| EnergyBalance {
                power: acc.power + p.energy.power,
                duct_heat: acc.duct_heat + p.energy.duct_heat,
                enthalpy_rise: acc.enthalpy_rise + p.energy.enthalpy_rise,
            })
    }

    /// Hottest coolant subchannel in the core.
    pub fn peak_coolant(&self) -> Option<(AssemblyId, PeakTemperature)> {
        self.snapshot
            .profiles
            .iter()
            .enumerate()
            .map(|(i, p)| (AssemblyId::from_usize(i), p.peak_coolant()))
            .max_by(|a, b| a.1.temperature.total_cmp(&b.1.temperature))
    }

    pub fn max_mass_imbalance(&self) -> f64 {
        self.snapshot
            .profiles
            .iter()
            .map(AxialProfile::max_mass_imbalance)
            .fold(0.0, f64::max)
    }
}

/// Validated core ready to solve.
#[derive(Debug)]
pub struct CoreSolver {
    spec: CoreSpec,
    networks: Vec<SubchannelNetwork>,
    layout: CoreLayout,
    ducts: Vec<DuctGeometry>,
    mesh: AxialMesh,
}

impl CoreSolver {
    /// Build every assembly's network and the shared axial mesh.
    ///
    /// All geometry errors surface here, before any march.
    pub fn new(spec: CoreSpec) -> CoreResult<Self> {
        spec.solver.validate()?;
        if spec.assemblies.is_empty() {
            return Err(invalid_input("core has no assemblies"));
        }
        let length = spec.length.value;
        if !length.is_finite() || length <= 0.0 {
            return Err(invalid_input(format!("heated length must be positive, got {length}")));
        }

        let networks = spec
            .assemblies
            .iter()
            .enumerate()
            .map(|(i, a)| {
                SubchannelNetwork::build(&a.bundle).map_err(|source| CoreError::InvalidGeometry {
                    assembly: AssemblyId::from_usize(i),
                    source,
                })
            })
            .collect::<CoreResult<Vec<_>>>()?;
        let layout = CoreLayout::new(spec.assemblies.iter().map(|a| a.position).collect())
            .map_err(CoreError::Layout)?;
        let ducts = spec
            .assemblies
            .iter()
            .map(|a| DuctGeometry {
                face_width: a.bundle.face_length(),
                wall_thickness: a.bundle.duct_wall_thickness.value,
            })
            .collect();

        let config = spec.solver.march_config();
        let mut breakpoints = Vec::new();
        let mut limit = f64::INFINITY;
        for (i, (assembly, network)) in spec.assemblies.iter().zip(&networks).enumerate() {
            let input = AssemblyInput {
                network,
                coolant: spec.coolant.as_ref(),
                power: &assembly.power,
                flow_rate: assembly.flow_rate,
                inlet_temperature: spec.inlet_temperature,
                inlet_pressure: spec.inlet_pressure,
            };
            let march = |source| CoreError::March {
                assembly: AssemblyId::from_usize(i),
                source,
            };
            input.validate(length).map_err(march)?;
            limit = limit.min(stability_limit(input, &config).map_err(march)?);
            breakpoints.extend(assembly.power.shape.breakpoints());
        }
        let step = stable_step(spec.solver.axial_step_size, limit);
        let mesh = AxialMesh::new(length, step, &breakpoints).map_err(|source| CoreError::March {
            assembly: AssemblyId::from_usize(0),
            source,
        })?;
        debug!(
            assemblies = networks.len(),
            steps = mesh.steps(),
            dz = mesh.max_step(),
            "core prepared"
        );

        Ok(Self {
            spec,
            networks,
            layout,
            ducts,
            mesh,
        })
    }

    pub fn spec(&self) -> &CoreSpec {
        &self.spec
    }

    pub fn networks(&self) -> &[SubchannelNetwork] {
        &self.networks
    }

    pub fn layout(&self) -> &CoreLayout {
        &self.layout
    }

    pub fn mesh(&self) -> &AxialMesh {
        &self.mesh
    }

    /// March every assembly once, in parallel.
    pub fn sweep(&self, flows: &[f64], boundaries: &[DuctBoundary]) -> CoreResult<Vec<AxialProfile>> {
        let config = self.spec.solver.march_config();
        self.networks
            .par_iter()
            .enumerate()
            .map(|(i, network)| {
                let assembly = &self.spec.assemblies[i];
                let input = AssemblyInput {
                    network,
                    coolant: self.spec.coolant.as_ref(),
                    power: &assembly.power,
                    flow_rate: ds_core::kgps(flows[i]),
                    inlet_temperature: self.spec.inlet_temperature,
                    inlet_pressure: self.spec.inlet_pressure,
                };
                march_assembly(input, &self.mesh, &boundaries[i], &config).map_err(|source| {
                    CoreError::March {
                        assembly: AssemblyId::from_usize(i),
                        source,
                    }
                })
            })
            .collect()
    }

    fn snapshot(
        &self,
        round: usize,
        flows: Vec<f64>,
        boundaries: Vec<DuctBoundary>,
    ) -> CoreResult<CoreSnapshot> {
        let profiles = self.sweep(&flows, &boundaries)?;
        Ok(CoreSnapshot {
            round,
            flows,
            boundaries,
            profiles,
        })
    }

    fn metrics(&self, snapshot: &CoreSnapshot) -> CoreResult<Vec<f64>> {
        let Some(balance) = self.spec.solver.balance else {
            return Ok(Vec::new());
        };
        snapshot
            .profiles
            .iter()
            .enumerate()
            .map(|(i, p)| {
                balance
                    .metric
                    .evaluate(p, self.spec.coolant.as_ref())
                    .map_err(|source| CoreError::March {
                        assembly: AssemblyId::from_usize(i),
                        source: MarchError::Coolant {
                            z: p.outlet().map_or(0.0, |node| node.z),
                            source,
                        },
                    })
            })
            .collect()
    }

    /// Drive the state machine to `Converged` or `Failed`.
    pub fn solve(&self) -> SolveResult {
        let solver = &self.spec.solver;
        let coupler = DuctCoupler::new(&self.layout, &self.ducts, self.spec.duct, solver.periphery);
        let locked: Vec<bool> = self.spec.assemblies.iter().map(|a| a.locked).collect();

        let mut report = ConvergenceReport::default();
        let mut state = SolveState::Init;
        let mut current: Option<CoreSnapshot> = None;
        let mut history: Option<(Vec<f64>, Vec<f64>)> = None;
        let mut passes = 0;
        let mut rounds = 0;

        loop {
            report.enter(state);
            state = match (state, current.take()) {
                (SolveState::Init, _) => {
                    let flows = self.spec.assemblies.iter().map(|a| a.flow_rate.value).collect();
                    let boundaries = vec![DuctBoundary::adiabatic(self.mesh.steps()); self.networks.len()];
                    report.sweeps += 1;
                    match self.snapshot(0, flows, boundaries) {
                        Ok(snapshot) => current = Some(snapshot),
                        Err(error) => return Err(fail(FailureStage::Init, error, 0, f64::NAN, None, report)),
                    }
                    info!("initial sweep complete");
                    SolveState::DuctCoupling
                }

                (SolveState::DuctCoupling, Some(snapshot)) => {
                    passes += 1;
                    let computed = coupler.couple(&snapshot.profiles, &self.mesh);
                    let (relaxed, residual) = relax(&snapshot.boundaries, computed, solver.duct_relaxation);
                    report.duct_residuals.push(residual);
                    debug!(pass = passes, residual, "duct coupling pass");

                    if residual < solver.duct_coupling_tolerance {
                        info!(passes, residual, "duct coupling converged");
                        passes = 0;
                        current = Some(snapshot);
                        if solver.balance.is_some() {
                            SolveState::FlowBalancing
                        } else {
                            SolveState::Converged
                        }
                    } else if passes >= solver.max_outer_iterations {
                        let error = CoreError::DuctConvergence {
                            iterations: passes,
                            residual,
                        };
                        return Err(fail(
                            FailureStage::DuctCoupling,
                            error,
                            passes,
                            residual,
                            Some(snapshot),
                            report,
                        ));
                    } else {
                        report.sweeps += 1;
                        match self.snapshot(snapshot.round + 1, snapshot.flows.clone(), relaxed) {
                            Ok(next) => current = Some(next),
                            Err(error) => {
                                return Err(fail(FailureStage::DuctCoupling, error, passes, residual, None, report));
                            }
                        }
                        SolveState::DuctCoupling
                    }
                }

                (SolveState::FlowBalancing, Some(snapshot)) => {
                    rounds += 1;
                    let metrics = match self.metrics(&snapshot) {
                        Ok(m) => m,
                        Err(error) => {
                            return Err(fail(FailureStage::FlowBalancing, error, rounds, f64::NAN, None, report));
                        }
                    };
                    let Correction {
                        flows,
                        residual,
                        spread,
                    } = match solver.balance {
                        Some(config) => FlowBalancer {
                            config,
                            locked: &locked,
                            reference: self.spec.inlet_temperature.value,
                            relaxation: solver.flow_relaxation,
                        }
                        .correct(
                            BalancePoint {
                                flows: &snapshot.flows,
                                metrics: &metrics,
                            },
                            history.as_ref().map(|(flows, metrics)| BalancePoint { flows, metrics }),
                        ),
                        None => Correction {
                            flows: snapshot.flows.clone(),
                            residual: 0.0,
                            spread: 0.0,
                        },
                    };
                    report.balance_residuals.push(residual);
                    report.balance_spreads.push(spread);
                    debug!(round = rounds, residual, spread, "flow balancing round");

                    if residual < solver.flow_balance_tolerance {
                        info!(rounds, residual, spread, "flow balancing converged");
                        current = Some(snapshot);
                        SolveState::Converged
                    } else if rounds >= solver.max_outer_iterations {
                        let error = CoreError::OrificingDivergence {
                            iterations: rounds,
                            residual,
                            flows: snapshot.flows.clone(),
                        };
                        return Err(fail(
                            FailureStage::FlowBalancing,
                            error,
                            rounds,
                            residual,
                            Some(snapshot),
                            report,
                        ));
                    } else {
                        history = Some((snapshot.flows.clone(), metrics));
                        report.sweeps += 1;
                        match self.snapshot(snapshot.round + 1, flows, snapshot.boundaries.clone()) {
                            Ok(next) => current = Some(next),
                            Err(error) => {
                                return Err(fail(FailureStage::FlowBalancing, error, rounds, residual, None, report));
                            }
                        }
                        SolveState::DuctCoupling
                    }
                }

                (SolveState::Converged, Some(snapshot)) => {
                    return self.finish(snapshot, report);
                }

                (_, _) => {
                    let error = invalid_input("core solve lost its snapshot");
                    return Err(fail(FailureStage::Init, error, 0, f64::NAN, None, report));
                }
            };
        }
    }

    fn finish(&self, snapshot: CoreSnapshot, mut report: ConvergenceReport) -> SolveResult {
        let pins = self
            .spec
            .assemblies
            .par_iter()
            .zip(&self.networks)
            .zip(&snapshot.profiles)
            .enumerate()
            .map(|(i, ((assembly, network), profile))| {
                assembly
                    .pin_model
                    .as_ref()
                    .map(|model| pin_temperatures(network, &assembly.power, profile, model))
                    .transpose()
                    .map_err(|source| CoreError::Pin {
                        assembly: AssemblyId::from_usize(i),
                        source,
                    })
            })
            .collect::<CoreResult<Vec<_>>>();
        let pins = match pins {
            Ok(pins) => pins,
            Err(error) => {
                report.enter(SolveState::Failed);
                let diagnostic = FailureDiagnostic {
                    stage: FailureStage::PinTemperatures,
                    assembly: error.assembly(),
                    axial_position: None,
                    iterations: 0,
                    residual: f64::NAN,
                };
                return Err(Box::new(SolveFailure {
                    error,
                    diagnostic,
                    partial: Some(snapshot),
                    report,
                }));
            }
        };

        info!(sweeps = report.sweeps, "core solve converged");
        Ok(CoreSolution {
            face_heat: face_heat(&snapshot.boundaries, &self.mesh),
            mesh: self.mesh.clone(),
            names: self.spec.assemblies.iter().map(|a| a.name.clone()).collect(),
            pins,
            snapshot,
            report,
        })
    }
}

fn fail(
    stage: FailureStage,
    error: CoreError,
    iterations: usize,
    residual: f64,
    partial: Option<CoreSnapshot>,
    mut report: ConvergenceReport,
) -> Box<SolveFailure> {
    report.enter(SolveState::Failed);
    let (iterations, residual) = match &error {
        CoreError::March {
            source: MarchError::FlowDivergence {
                iterations,
                residual,
                ..
            },
            ..
        } => (*iterations, *residual),
        _ => (iterations, residual),
    };
    let diagnostic = FailureDiagnostic {
        stage,
        assembly: error.assembly(),
        axial_position: error.axial_position(),
        iterations,
        residual,
    };
    tracing::error!(?stage, error = %error, "core solve failed");
    Box::new(SolveFailure {
        error,
        diagnostic,
        partial,
        report,
    })
}
