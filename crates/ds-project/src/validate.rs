//! Project validation logic.

use std::collections::HashSet;

use ds_correlations::CorrelationSet;

use crate::schema::{
    AssemblyTypeDef, ConductivityDef, CoolantDef, PeripheryDef, PinModelDef, PowerShapeDef,
    ProjectDef, SolverDef,
};

pub const LATEST_VERSION: u32 = 1;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: impl Into<String>, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn positive(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, value, "must be positive"))
    }
}

fn non_negative(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, value, "must be >= 0"))
    }
}

/// Structural checks. Geometry consistency is checked when the core is
/// built.
pub fn validate_project(project: &ProjectDef) -> Result<(), ValidationError> {
    if project.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }

    if let CoolantDef::Constant {
        density_kg_m3,
        heat_capacity_j_kgk,
        viscosity_pa_s,
        conductivity_w_mk,
    } = project.coolant
    {
        positive("coolant.density_kg_m3", density_kg_m3)?;
        positive("coolant.heat_capacity_j_kgk", heat_capacity_j_kgk)?;
        positive("coolant.viscosity_pa_s", viscosity_pa_s)?;
        positive("coolant.conductivity_w_mk", conductivity_w_mk)?;
    }
    positive("inlet.temperature_k", project.inlet.temperature_k)?;
    if !project.inlet.pressure_pa.is_finite() {
        return Err(invalid("inlet.pressure_pa", project.inlet.pressure_pa, "must be finite"));
    }
    positive("length_m", project.length_m)?;
    positive("duct.wall_conductivity_w_mk", project.duct.wall_conductivity_w_mk)?;
    non_negative("duct.gap_width_m", project.duct.gap_width_m)?;
    positive("duct.gap_conductivity_w_mk", project.duct.gap_conductivity_w_mk)?;

    let mut type_ids = HashSet::new();
    for t in &project.assembly_types {
        if !type_ids.insert(t.id.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: t.id.clone(),
                context: "assembly_types".to_string(),
            });
        }
        validate_type(t)?;
    }

    if project.assemblies.is_empty() {
        return Err(invalid("assemblies", 0, "at least one assembly is required"));
    }
    let mut names = HashSet::new();
    let mut positions = HashSet::new();
    for a in &project.assemblies {
        if !names.insert(a.name.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: a.name.clone(),
                context: "assemblies".to_string(),
            });
        }
        if !type_ids.contains(a.type_id.as_str()) {
            return Err(ValidationError::MissingReference {
                id: a.type_id.clone(),
                context: format!("assembly {} type_id", a.name),
            });
        }
        if !positions.insert(a.position) {
            return Err(ValidationError::DuplicateId {
                id: format!("{:?}", a.position),
                context: "assembly positions".to_string(),
            });
        }
        non_negative(&format!("{}.power_w", a.name), a.power_w)?;
        positive(&format!("{}.flow_kg_s", a.name), a.flow_kg_s)?;
        match &a.power_shape {
            PowerShapeDef::Uniform => {}
            PowerShapeDef::ChoppedCosine { extrapolation_m } => {
                non_negative(&format!("{}.power_shape.extrapolation_m", a.name), *extrapolation_m)?;
            }
            PowerShapeDef::Tabulated { regions } => {
                if regions.is_empty() {
                    return Err(invalid(
                        format!("{}.power_shape.regions", a.name),
                        0,
                        "tabulated shape needs regions",
                    ));
                }
                for r in regions {
                    if !(r.z_end_m > r.z_start_m) {
                        return Err(invalid(
                            format!("{}.power_shape.regions", a.name),
                            format!("[{}, {}]", r.z_start_m, r.z_end_m),
                            "region end must exceed start",
                        ));
                    }
                    non_negative(&format!("{}.power_shape.weight", a.name), r.weight)?;
                }
            }
        }
        if let Some(peaking) = &a.pin_peaking {
            for p in peaking {
                non_negative(&format!("{}.pin_peaking", a.name), *p)?;
            }
        }
    }

    validate_solver(&project.solver)
}

fn validate_type(t: &AssemblyTypeDef) -> Result<(), ValidationError> {
    if t.pin_rings < 2 {
        return Err(invalid(format!("{}.pin_rings", t.id), t.pin_rings, "need at least 2 rings"));
    }
    positive(&format!("{}.pin_diameter_m", t.id), t.pin_diameter_m)?;
    positive(&format!("{}.pin_pitch_m", t.id), t.pin_pitch_m)?;
    non_negative(&format!("{}.wire_diameter_m", t.id), t.wire_diameter_m)?;
    non_negative(&format!("{}.wire_pitch_m", t.id), t.wire_pitch_m)?;
    positive(&format!("{}.duct_flat_to_flat_m", t.id), t.duct_flat_to_flat_m)?;
    positive(&format!("{}.duct_wall_m", t.id), t.duct_wall_m)?;
    if let Some(pin) = &t.pin_model {
        validate_pin(&t.id, pin)?;
    }
    Ok(())
}

fn validate_pin(id: &str, pin: &PinModelDef) -> Result<(), ValidationError> {
    positive(&format!("{id}.pin_model.clad_thickness_m"), pin.clad_thickness_m)?;
    non_negative(&format!("{id}.pin_model.gap_thickness_m"), pin.gap_thickness_m)?;
    if pin.gap_thickness_m > 0.0 && pin.gap.is_none() {
        return Err(invalid(
            format!("{id}.pin_model.gap"),
            "none",
            "an open gap needs a conductivity",
        ));
    }
    if pin.fuel.is_empty() {
        return Err(invalid(format!("{id}.pin_model.fuel"), 0, "at least one region"));
    }
    let conductivities = std::iter::once(&pin.clad)
        .chain(pin.gap.as_ref())
        .chain(pin.fuel.iter().map(|f| &f.conductivity));
    for k in conductivities {
        match k {
            ConductivityDef::Constant { value_w_mk } => {
                positive(&format!("{id}.pin_model conductivity"), *value_w_mk)?;
            }
            ConductivityDef::Polynomial { coefficients } if coefficients.is_empty() => {
                return Err(invalid(
                    format!("{id}.pin_model conductivity"),
                    "[]",
                    "polynomial needs coefficients",
                ));
            }
            ConductivityDef::Metallic { porosity, .. } if !(0.0..1.0).contains(porosity) => {
                return Err(invalid(
                    format!("{id}.pin_model porosity"),
                    porosity,
                    "must lie in [0, 1)",
                ));
            }
            _ => {}
        }
    }
    Ok(())
}

fn validate_solver(s: &SolverDef) -> Result<(), ValidationError> {
    if CorrelationSet::from_name(&s.correlation_set).is_err() {
        return Err(invalid(
            "solver.correlation_set",
            &s.correlation_set,
            "unknown correlation set",
        ));
    }
    positive("solver.axial_step_m", s.axial_step_m)?;
    positive("solver.duct_coupling_tolerance", s.duct_coupling_tolerance)?;
    positive("solver.flow_balance_tolerance", s.flow_balance_tolerance)?;
    positive("solver.flow_split_tolerance", s.flow_split_tolerance)?;
    if s.max_outer_iterations == 0 {
        return Err(invalid("solver.max_outer_iterations", 0, "must be at least 1"));
    }
    if s.max_inner_iterations == 0 {
        return Err(invalid("solver.max_inner_iterations", 0, "must be at least 1"));
    }
    for (field, value) in [
        ("solver.duct_relaxation", s.duct_relaxation),
        ("solver.flow_relaxation", s.flow_relaxation),
    ] {
        if !(value > 0.0 && value <= 1.0) {
            return Err(invalid(field, value, "must lie in (0, 1]"));
        }
    }
    if let PeripheryDef::FixedTemperature {
        temperature_k,
        resistance_m2k_w,
    } = s.periphery
    {
        positive("solver.periphery.temperature_k", temperature_k)?;
        non_negative("solver.periphery.resistance_m2k_w", resistance_m2k_w)?;
    }
    Ok(())
}
