//! In-memory description of a core and its solver settings.

use std::sync::Arc;

use ds_coolant::CoolantModel;
use ds_core::{Length, MassRate, Pressure, Temperature};
use ds_correlations::{CorrelationSet, RangePolicy};
use ds_geometry::BundleSpec;
use ds_geometry::layout::HexPosition;
use ds_solver::{AssemblyPower, MarchConfig, PinModel};

use crate::balancer::BalanceConfig;
use crate::error::{CoreResult, invalid_input};

/// One assembly as given by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblySpec {
    pub name: String,
    pub position: HexPosition,
    pub bundle: BundleSpec,
    pub power: AssemblyPower,
    /// Inlet flow before any orificing.
    pub flow_rate: MassRate,
    /// Locked assemblies keep their flow during balancing.
    pub locked: bool,
    pub pin_model: Option<PinModel>,
}

impl AssemblySpec {
    pub fn new(name: impl Into<String>, position: HexPosition, bundle: BundleSpec) -> Self {
        Self {
            name: name.into(),
            position,
            bundle,
            power: AssemblyPower::uniform(ds_core::watts(0.0)),
            flow_rate: ds_core::kgps(1.0),
            locked: false,
            pin_model: None,
        }
    }

    pub fn with_power(mut self, power: AssemblyPower) -> Self {
        self.power = power;
        self
    }

    pub fn with_flow_rate(mut self, flow_rate: MassRate) -> Self {
        self.flow_rate = flow_rate;
        self
    }

    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    pub fn with_pin_model(mut self, model: PinModel) -> Self {
        self.pin_model = Some(model);
        self
    }
}

/// Boundary applied to duct faces with no neighbor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PeripheryBoundary {
    #[default]
    Adiabatic,
    /// Exchange with a sink at `temperature` [K] through `resistance` [m^2-K/W]
    /// in addition to the film and wall resistances.
    FixedTemperature { temperature: f64, resistance: f64 },
    /// Prescribed heat into the assembly per face [W/m].
    FixedHeatRate { linear_heat_rate: f64 },
}

/// Materials between neighboring coolant streams.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DuctMaterials {
    /// Duct wall conductivity [W/m-K].
    pub wall_conductivity: f64,
    /// Inter-assembly gap width [m].
    pub gap_width: f64,
    /// Conductivity of the inter-assembly gap medium [W/m-K].
    pub gap_conductivity: f64,
}

impl Default for DuctMaterials {
    fn default() -> Self {
        Self {
            wall_conductivity: 20.0,
            gap_width: 2.0e-3,
            gap_conductivity: 60.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    pub correlation_set: CorrelationSet,
    /// Requested axial step [m]; reduced to the stability limit if needed.
    pub axial_step_size: f64,
    /// Largest duct flux change, relative to the largest flux, at which
    /// coupling stops.
    pub duct_coupling_tolerance: f64,
    /// Largest log flow correction at which balancing stops.
    pub flow_balance_tolerance: f64,
    /// Cap on coupling passes per balancing round and on balancing rounds.
    pub max_outer_iterations: usize,
    /// Cap on flow-split iterations per axial node.
    pub max_inner_iterations: usize,
    pub flow_split_tolerance: f64,
    pub periphery: PeripheryBoundary,
    pub range_policy: RangePolicy,
    /// Under-relaxation of duct fluxes between passes, in (0, 1].
    pub duct_relaxation: f64,
    /// Under-relaxation of flow corrections, in (0, 1].
    pub flow_relaxation: f64,
    /// Flow balancing; `None` solves at the given inlet flows.
    pub balance: Option<BalanceConfig>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            correlation_set: CorrelationSet::default(),
            axial_step_size: 0.01,
            duct_coupling_tolerance: 1e-4,
            flow_balance_tolerance: 1e-4,
            max_outer_iterations: 30,
            max_inner_iterations: 50,
            flow_split_tolerance: 1e-8,
            periphery: PeripheryBoundary::Adiabatic,
            range_policy: RangePolicy::Warn,
            duct_relaxation: 0.7,
            flow_relaxation: 1.0,
            balance: None,
        }
    }
}

impl SolverConfig {
    pub fn march_config(&self) -> MarchConfig {
        MarchConfig {
            correlations: self.correlation_set,
            range_policy: self.range_policy,
            max_inner_iterations: self.max_inner_iterations,
            flow_split_tolerance: self.flow_split_tolerance,
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        let positive = [
            (self.axial_step_size, "axial_step_size"),
            (self.duct_coupling_tolerance, "duct_coupling_tolerance"),
            (self.flow_balance_tolerance, "flow_balance_tolerance"),
            (self.flow_split_tolerance, "flow_split_tolerance"),
        ];
        for (value, what) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid_input(format!("{what} must be positive, got {value}")));
            }
        }
        for (value, what) in [
            (self.duct_relaxation, "duct_relaxation"),
            (self.flow_relaxation, "flow_relaxation"),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(invalid_input(format!("{what} must lie in (0, 1], got {value}")));
            }
        }
        if self.max_outer_iterations == 0 || self.max_inner_iterations == 0 {
            return Err(invalid_input("iteration caps must be at least 1"));
        }
        match self.periphery {
            PeripheryBoundary::FixedTemperature {
                temperature,
                resistance,
            } if !(temperature > 0.0 && resistance >= 0.0) => Err(invalid_input(
                "periphery temperature must be positive and resistance non-negative",
            )),
            _ => Ok(()),
        }
    }
}

/// Everything a core solve reads.
#[derive(Debug, Clone)]
pub struct CoreSpec {
    /// Assembly arena; position `i` is `AssemblyId::from_usize(i)`.
    pub assemblies: Vec<AssemblySpec>,
    pub coolant: Arc<dyn CoolantModel>,
    pub inlet_temperature: Temperature,
    pub inlet_pressure: Pressure,
    /// Heated length shared by every assembly.
    pub length: Length,
    pub duct: DuctMaterials,
    pub solver: SolverConfig,
}
