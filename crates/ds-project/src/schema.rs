//! Project file schema. All quantities are plain SI numbers; field
//! suffixes name the unit.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectDef {
    pub version: u32,
    pub name: String,
    pub coolant: CoolantDef,
    pub inlet: InletDef,
    /// Heated length shared by every assembly.
    pub length_m: f64,
    #[serde(default)]
    pub duct: DuctDef,
    #[serde(default)]
    pub assembly_types: Vec<AssemblyTypeDef>,
    #[serde(default)]
    pub assemblies: Vec<AssemblyDef>,
    #[serde(default)]
    pub solver: SolverDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum CoolantDef {
    Sodium,
    Constant {
        density_kg_m3: f64,
        heat_capacity_j_kgk: f64,
        viscosity_pa_s: f64,
        conductivity_w_mk: f64,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct InletDef {
    pub temperature_k: f64,
    pub pressure_pa: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DuctDef {
    pub wall_conductivity_w_mk: f64,
    pub gap_width_m: f64,
    pub gap_conductivity_w_mk: f64,
}

impl Default for DuctDef {
    fn default() -> Self {
        let d = ds_reactor::DuctMaterials::default();
        Self {
            wall_conductivity_w_mk: d.wall_conductivity,
            gap_width_m: d.gap_width,
            gap_conductivity_w_mk: d.gap_conductivity,
        }
    }
}

/// Bundle geometry shared by several assemblies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssemblyTypeDef {
    pub id: String,
    pub pin_rings: usize,
    pub pin_diameter_m: f64,
    pub pin_pitch_m: f64,
    pub wire_diameter_m: f64,
    pub wire_pitch_m: f64,
    pub duct_flat_to_flat_m: f64,
    pub duct_wall_m: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin_model: Option<PinModelDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PinModelDef {
    pub clad_thickness_m: f64,
    pub clad: ConductivityDef,
    #[serde(default)]
    pub gap_thickness_m: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gap: Option<ConductivityDef>,
    pub fuel: Vec<FuelRegionDef>,
    #[serde(default = "default_emissivity")]
    pub emissivity: f64,
}

fn default_emissivity() -> f64 {
    0.9
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ConductivityDef {
    Constant { value_w_mk: f64 },
    /// `k = c0 + c1 T + c2 T^2 + ...`
    Polynomial { coefficients: Vec<f64> },
    /// U-Pu-Zr with weight fractions and porosity.
    Metallic { pu: f64, zr: f64, porosity: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FuelRegionDef {
    pub inner_fraction: f64,
    pub conductivity: ConductivityDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssemblyDef {
    pub name: String,
    pub type_id: String,
    /// Axial hex coordinates `[q, r]`.
    pub position: [i32; 2],
    pub power_w: f64,
    pub flow_kg_s: f64,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub power_shape: PowerShapeDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin_peaking: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "type")]
pub enum PowerShapeDef {
    #[default]
    Uniform,
    ChoppedCosine {
        extrapolation_m: f64,
    },
    Tabulated {
        regions: Vec<PowerRegionDef>,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PowerRegionDef {
    pub z_start_m: f64,
    pub z_end_m: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SolverDef {
    /// One of `cheng-todreas`, `novendstern`, `rehme`.
    pub correlation_set: String,
    /// Overrides the set's heat transfer with `Nu = a + b Pe^c`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_nusselt: Option<[f64; 3]>,
    pub axial_step_m: f64,
    pub duct_coupling_tolerance: f64,
    pub flow_balance_tolerance: f64,
    pub max_outer_iterations: usize,
    pub max_inner_iterations: usize,
    pub flow_split_tolerance: f64,
    pub periphery: PeripheryDef,
    pub range_policy: RangePolicyDef,
    pub duct_relaxation: f64,
    pub flow_relaxation: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<BalanceDef>,
}

impl Default for SolverDef {
    fn default() -> Self {
        let c = ds_reactor::SolverConfig::default();
        Self {
            correlation_set: "cheng-todreas".to_string(),
            custom_nusselt: None,
            axial_step_m: c.axial_step_size,
            duct_coupling_tolerance: c.duct_coupling_tolerance,
            flow_balance_tolerance: c.flow_balance_tolerance,
            max_outer_iterations: c.max_outer_iterations,
            max_inner_iterations: c.max_inner_iterations,
            flow_split_tolerance: c.flow_split_tolerance,
            periphery: PeripheryDef::Adiabatic,
            range_policy: RangePolicyDef::Warn,
            duct_relaxation: c.duct_relaxation,
            flow_relaxation: c.flow_relaxation,
            balance: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "type")]
pub enum PeripheryDef {
    #[default]
    Adiabatic,
    FixedTemperature {
        temperature_k: f64,
        resistance_m2k_w: f64,
    },
    FixedHeatRate {
        linear_heat_rate_w_m: f64,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RangePolicyDef {
    #[default]
    Warn,
    Error,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BalanceDef {
    pub metric: BalanceMetricDef,
    /// Match this value instead of equalizing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BalanceMetricDef {
    PeakCoolantTemperature,
    OutletTemperature,
    PressureDrop,
}
