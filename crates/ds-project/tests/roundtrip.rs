use ds_project::schema::*;
use ds_project::{load_json, load_yaml, save_json, save_yaml, validate_project};

fn small_project() -> ProjectDef {
    ProjectDef {
        version: 1,
        name: "Two Assemblies".to_string(),
        coolant: CoolantDef::Constant {
            density_kg_m3: 850.0,
            heat_capacity_j_kgk: 1270.0,
            viscosity_pa_s: 3.0e-4,
            conductivity_w_mk: 70.0,
        },
        inlet: InletDef {
            temperature_k: 600.0,
            pressure_pa: 2.0e5,
        },
        length_m: 0.8,
        duct: DuctDef::default(),
        assembly_types: vec![AssemblyTypeDef {
            id: "t19".to_string(),
            pin_rings: 3,
            pin_diameter_m: 0.008,
            pin_pitch_m: 0.0091,
            wire_diameter_m: 0.001,
            wire_pitch_m: 0.2,
            duct_flat_to_flat_m: 0.0417,
            duct_wall_m: 0.003,
            pin_model: None,
        }],
        assemblies: vec![
            AssemblyDef {
                name: "a".to_string(),
                type_id: "t19".to_string(),
                position: [0, 0],
                power_w: 2.0e5,
                flow_kg_s: 1.5,
                locked: false,
                power_shape: PowerShapeDef::Tabulated {
                    regions: vec![
                        PowerRegionDef {
                            z_start_m: 0.0,
                            z_end_m: 0.4,
                            weight: 1.0,
                        },
                        PowerRegionDef {
                            z_start_m: 0.4,
                            z_end_m: 0.8,
                            weight: 2.0,
                        },
                    ],
                },
                pin_peaking: None,
            },
            AssemblyDef {
                name: "b".to_string(),
                type_id: "t19".to_string(),
                position: [1, 0],
                power_w: 1.0e5,
                flow_kg_s: 1.0,
                locked: true,
                power_shape: PowerShapeDef::Uniform,
                pin_peaking: Some(vec![1.0; 19]),
            },
        ],
        solver: SolverDef {
            balance: Some(BalanceDef {
                metric: BalanceMetricDef::OutletTemperature,
                target: Some(700.0),
            }),
            periphery: PeripheryDef::FixedTemperature {
                temperature_k: 600.0,
                resistance_m2k_w: 0.01,
            },
            ..SolverDef::default()
        },
    }
}

#[test]
fn roundtrip_yaml_small_project() {
    let project = small_project();
    validate_project(&project).unwrap();

    let path = std::env::temp_dir().join("ds_project_roundtrip_small.yaml");
    save_yaml(&path, &project).unwrap();
    let loaded = load_yaml(&path).unwrap();

    assert_eq!(project, loaded);
}

#[test]
fn roundtrip_json_small_project() {
    let project = small_project();

    let path = std::env::temp_dir().join("ds_project_roundtrip_small.json");
    save_json(&path, &project).unwrap();
    let loaded = load_json(&path).unwrap();

    assert_eq!(loaded.name, project.name);
    assert_eq!(loaded.assemblies.len(), 2);
    assert_eq!(loaded.assemblies[1].pin_peaking.as_ref().map(Vec::len), Some(19));
    assert!(matches!(
        loaded.solver.periphery,
        PeripheryDef::FixedTemperature { .. }
    ));
    assert!(loaded.assemblies[1].locked);
    assert!(matches!(
        loaded.assemblies[0].power_shape,
        PowerShapeDef::Tabulated { ref regions } if regions.len() == 2
    ));
}

#[test]
fn solver_section_defaults_when_omitted() {
    let yaml = r#"
version: 1
name: minimal
coolant:
  type: Sodium
inlet:
  temperature_k: 600.0
  pressure_pa: 200000.0
length_m: 1.0
assembly_types:
  - id: t
    pin_rings: 3
    pin_diameter_m: 0.008
    pin_pitch_m: 0.0091
    wire_diameter_m: 0.001
    wire_pitch_m: 0.2
    duct_flat_to_flat_m: 0.0417
    duct_wall_m: 0.003
assemblies:
  - name: only
    type_id: t
    position: [0, 0]
    power_w: 100000.0
    flow_kg_s: 1.0
"#;
    let project: ProjectDef = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(project.solver, SolverDef::default());
    assert_eq!(project.duct, DuctDef::default());
    assert_eq!(project.assemblies[0].power_shape, PowerShapeDef::Uniform);
    assert!(!project.assemblies[0].locked);
    validate_project(&project).unwrap();
}
