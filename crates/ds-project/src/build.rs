//! Conversion from the file schema to the solver's in-memory core.

use std::collections::HashMap;
use std::sync::Arc;

use ds_coolant::{ConstantCoolant, CoolantModel, Sodium};
use ds_correlations::{CorrelationSet, HeatTransfer, RangePolicy};
use ds_geometry::{BundleSpec, HexPosition};
use ds_reactor::{
    AssemblySpec, BalanceConfig, BalanceMetric, BalanceMode, CoreSpec, DuctMaterials,
    PeripheryBoundary, SolverConfig,
};
use ds_solver::{
    AssemblyPower, AxialPowerShape, Conductivity, FuelRegion, MetallicFuel, PinModel, PowerRegion,
};

use crate::schema::{
    AssemblyTypeDef, BalanceMetricDef, ConductivityDef, CoolantDef, PeripheryDef, PinModelDef,
    PowerShapeDef, ProjectDef, RangePolicyDef, SolverDef,
};
use crate::validate::{ValidationError, validate_project};

/// Validates `project` and lowers it to a [`CoreSpec`].
pub fn build_core_spec(project: &ProjectDef) -> Result<CoreSpec, ValidationError> {
    validate_project(project)?;

    let types: HashMap<&str, &AssemblyTypeDef> = project
        .assembly_types
        .iter()
        .map(|t| (t.id.as_str(), t))
        .collect();

    let mut assemblies = Vec::with_capacity(project.assemblies.len());
    for def in &project.assemblies {
        let ty = types
            .get(def.type_id.as_str())
            .ok_or_else(|| ValidationError::MissingReference {
                id: def.type_id.clone(),
                context: format!("assembly {} type_id", def.name),
            })?;

        let mut power = AssemblyPower::uniform(ds_core::watts(def.power_w))
            .with_shape(power_shape(&def.power_shape));
        if let Some(peaking) = &def.pin_peaking {
            power = power.with_pin_peaking(peaking.clone());
        }

        let position = HexPosition::new(def.position[0], def.position[1]);
        let mut spec = AssemblySpec::new(def.name.clone(), position, bundle(ty))
            .with_power(power)
            .with_flow_rate(ds_core::kgps(def.flow_kg_s));
        if def.locked {
            spec = spec.locked();
        }
        if let Some(pin) = &ty.pin_model {
            spec = spec.with_pin_model(pin_model(pin));
        }
        assemblies.push(spec);
    }

    Ok(CoreSpec {
        assemblies,
        coolant: coolant(&project.coolant),
        inlet_temperature: ds_core::k(project.inlet.temperature_k),
        inlet_pressure: ds_core::pa(project.inlet.pressure_pa),
        length: ds_core::m(project.length_m),
        duct: DuctMaterials {
            wall_conductivity: project.duct.wall_conductivity_w_mk,
            gap_width: project.duct.gap_width_m,
            gap_conductivity: project.duct.gap_conductivity_w_mk,
        },
        solver: solver_config(&project.solver)?,
    })
}

fn coolant(def: &CoolantDef) -> Arc<dyn CoolantModel> {
    match *def {
        CoolantDef::Sodium => Arc::new(Sodium::new()),
        CoolantDef::Constant {
            density_kg_m3,
            heat_capacity_j_kgk,
            viscosity_pa_s,
            conductivity_w_mk,
        } => Arc::new(ConstantCoolant::new(
            density_kg_m3,
            heat_capacity_j_kgk,
            viscosity_pa_s,
            conductivity_w_mk,
        )),
    }
}

fn bundle(ty: &AssemblyTypeDef) -> BundleSpec {
    BundleSpec {
        pin_rings: ty.pin_rings,
        pin_diameter: ds_core::m(ty.pin_diameter_m),
        pin_pitch: ds_core::m(ty.pin_pitch_m),
        wire_diameter: ds_core::m(ty.wire_diameter_m),
        wire_pitch: ds_core::m(ty.wire_pitch_m),
        duct_inner_flat_to_flat: ds_core::m(ty.duct_flat_to_flat_m),
        duct_wall_thickness: ds_core::m(ty.duct_wall_m),
    }
}

fn power_shape(def: &PowerShapeDef) -> AxialPowerShape {
    match def {
        PowerShapeDef::Uniform => AxialPowerShape::Uniform,
        PowerShapeDef::ChoppedCosine { extrapolation_m } => AxialPowerShape::ChoppedCosine {
            extrapolation_length: *extrapolation_m,
        },
        PowerShapeDef::Tabulated { regions } => AxialPowerShape::Tabulated {
            regions: regions
                .iter()
                .map(|r| PowerRegion {
                    z_start: r.z_start_m,
                    z_end: r.z_end_m,
                    weight: r.weight,
                })
                .collect(),
        },
    }
}

fn conductivity(def: &ConductivityDef) -> Conductivity {
    match def {
        ConductivityDef::Constant { value_w_mk } => Conductivity::Constant(*value_w_mk),
        ConductivityDef::Polynomial { coefficients } => Conductivity::Polynomial(coefficients.clone()),
        ConductivityDef::Metallic { pu, zr, porosity } => {
            Conductivity::Metallic(MetallicFuel::new(*pu, *zr, *porosity))
        }
    }
}

fn pin_model(def: &PinModelDef) -> PinModel {
    let fuel = def
        .fuel
        .iter()
        .map(|r| FuelRegion {
            inner_fraction: r.inner_fraction,
            conductivity: conductivity(&r.conductivity),
        })
        .collect();
    let mut model = PinModel::new(def.clad_thickness_m, conductivity(&def.clad), fuel);
    if let Some(gap) = &def.gap {
        model = model.with_gap(def.gap_thickness_m, conductivity(gap));
    }
    model.emissivity = def.emissivity;
    model
}

fn solver_config(def: &SolverDef) -> Result<SolverConfig, ValidationError> {
    let mut correlation_set =
        CorrelationSet::from_name(&def.correlation_set).map_err(|e| {
            ValidationError::InvalidValue {
                field: "solver.correlation_set".to_string(),
                value: def.correlation_set.clone(),
                reason: e.to_string(),
            }
        })?;
    if let Some([a, b, c]) = def.custom_nusselt {
        correlation_set = correlation_set.with_heat_transfer(HeatTransfer::Custom { a, b, c });
    }

    let periphery = match def.periphery {
        PeripheryDef::Adiabatic => PeripheryBoundary::Adiabatic,
        PeripheryDef::FixedTemperature {
            temperature_k,
            resistance_m2k_w,
        } => PeripheryBoundary::FixedTemperature {
            temperature: temperature_k,
            resistance: resistance_m2k_w,
        },
        PeripheryDef::FixedHeatRate {
            linear_heat_rate_w_m,
        } => PeripheryBoundary::FixedHeatRate {
            linear_heat_rate: linear_heat_rate_w_m,
        },
    };

    let balance = def.balance.map(|b| BalanceConfig {
        metric: match b.metric {
            BalanceMetricDef::PeakCoolantTemperature => BalanceMetric::PeakCoolantTemperature,
            BalanceMetricDef::OutletTemperature => BalanceMetric::OutletTemperature,
            BalanceMetricDef::PressureDrop => BalanceMetric::PressureDrop,
        },
        mode: match b.target {
            Some(target) => BalanceMode::Match { target },
            None => BalanceMode::Equalize,
        },
    });

    Ok(SolverConfig {
        correlation_set,
        axial_step_size: def.axial_step_m,
        duct_coupling_tolerance: def.duct_coupling_tolerance,
        flow_balance_tolerance: def.flow_balance_tolerance,
        max_outer_iterations: def.max_outer_iterations,
        max_inner_iterations: def.max_inner_iterations,
        flow_split_tolerance: def.flow_split_tolerance,
        periphery,
        range_policy: match def.range_policy {
            RangePolicyDef::Warn => RangePolicy::Warn,
            RangePolicyDef::Error => RangePolicy::Error,
        },
        duct_relaxation: def.duct_relaxation,
        flow_relaxation: def.flow_relaxation,
        balance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{BalanceDef, FuelRegionDef};

    #[test]
    fn custom_nusselt_overrides_heat_transfer() {
        let def = SolverDef {
            correlation_set: "rehme".to_string(),
            custom_nusselt: Some([4.8, 0.025, 0.8]),
            range_policy: RangePolicyDef::Error,
            balance: Some(BalanceDef {
                metric: BalanceMetricDef::PressureDrop,
                target: Some(5.0e4),
            }),
            ..SolverDef::default()
        };
        let config = solver_config(&def).unwrap();
        let rehme = CorrelationSet::from_name("rehme").unwrap();
        assert_eq!(config.correlation_set.friction, rehme.friction);
        assert_eq!(
            config.correlation_set.heat_transfer,
            HeatTransfer::Custom {
                a: 4.8,
                b: 0.025,
                c: 0.8
            }
        );
        assert_eq!(config.range_policy, RangePolicy::Error);
        assert_eq!(
            config.balance,
            Some(BalanceConfig {
                metric: BalanceMetric::PressureDrop,
                mode: BalanceMode::Match { target: 5.0e4 },
            })
        );
    }

    #[test]
    fn pin_model_keeps_gap_and_emissivity() {
        let def = PinModelDef {
            clad_thickness_m: 5e-4,
            clad: ConductivityDef::Constant { value_w_mk: 25.0 },
            gap_thickness_m: 1e-4,
            gap: Some(ConductivityDef::Constant { value_w_mk: 0.3 }),
            fuel: vec![FuelRegionDef {
                inner_fraction: 0.0,
                conductivity: ConductivityDef::Metallic {
                    pu: 0.2,
                    zr: 0.1,
                    porosity: 0.05,
                },
            }],
            emissivity: 0.7,
        };
        let model = pin_model(&def);
        assert_eq!(model.gap_thickness, 1e-4);
        assert_eq!(model.gap, Conductivity::Constant(0.3));
        assert_eq!(model.emissivity, 0.7);
        assert_eq!(
            model.fuel[0].conductivity,
            Conductivity::Metallic(MetallicFuel::new(0.2, 0.1, 0.05))
        );
        model.validate(8e-3).unwrap();
    }
}
