//! End-to-end marches of a 61-pin sodium-cooled assembly.

use ds_coolant::{ConstantCoolant, CoolantModel, Sodium};
use ds_core::{k, kgps, mm, pa, watts};
use ds_correlations::{CorrelationError, CorrelationSet, FlowRegime, RangePolicy};
use ds_geometry::{BundleSpec, SubchannelNetwork};
use ds_solver::{
    AssemblyInput, AssemblyPower, AxialMarch, AxialMesh, AxialPowerShape, AxialProfile,
    DuctBoundary, MarchConfig, MarchError, MarchResult, march_assembly, stability_limit,
};

fn bundle() -> SubchannelNetwork {
    SubchannelNetwork::build(&BundleSpec {
        pin_rings: 5,
        pin_diameter: mm(8.0),
        pin_pitch: mm(9.1),
        wire_diameter: mm(1.0),
        wire_pitch: mm(200.0),
        duct_inner_flat_to_flat: mm(73.2),
        duct_wall_thickness: mm(3.0),
    })
    .unwrap()
}

fn bundle_19() -> SubchannelNetwork {
    SubchannelNetwork::build(&BundleSpec {
        pin_rings: 3,
        pin_diameter: mm(8.0),
        pin_pitch: mm(9.1),
        wire_diameter: mm(1.0),
        wire_pitch: mm(200.0),
        duct_inner_flat_to_flat: mm(41.7),
        duct_wall_thickness: mm(3.0),
    })
    .unwrap()
}

fn input<'a>(
    network: &'a SubchannelNetwork,
    coolant: &'a dyn CoolantModel,
    power: &'a AssemblyPower,
) -> AssemblyInput<'a> {
    AssemblyInput {
        network,
        coolant,
        power,
        flow_rate: kgps(8.0),
        inlet_temperature: k(573.15),
        inlet_pressure: pa(2.0e5),
    }
}

#[test]
fn sodium_assembly_conserves_energy_and_mass() {
    let network = bundle();
    let sodium = Sodium::new();
    let power = AssemblyPower::uniform(watts(1.5e6));
    let mesh = AxialMesh::new(1.0, 0.01, &[]).unwrap();
    let boundary = DuctBoundary::adiabatic(mesh.steps());
    let config = MarchConfig::default();

    let profile = march_assembly(input(&network, &sodium, &power), &mesh, &boundary, &config).unwrap();
    assert_eq!(profile.nodes.len(), 101);

    for node in &profile.nodes {
        assert!((node.total_flow() - 8.0).abs() < 1e-9, "z = {}", node.z);
        assert!(node.mass_imbalance < 1e-9, "z = {}", node.z);
        assert!(node.flow.iter().all(|m| *m > 0.0));
    }

    assert!((profile.energy.power - 1.5e6).abs() < 1e-6);
    assert_eq!(profile.energy.duct_heat, 0.0);
    assert!(profile.energy.relative_imbalance() < 1e-9);

    let h_in = sodium.enthalpy(573.15).unwrap();
    let expected = sodium.temperature(h_in + 1.5e6 / 8.0).unwrap();
    let outlet = profile.mixed_outlet_temperature(&sodium).unwrap();
    assert!((outlet - expected).abs() < 1e-6, "{outlet} vs {expected}");

    let cp = sodium.heat_capacity(0.5 * (573.15 + outlet)).unwrap();
    let rise = 1.5e6 / (8.0 * cp);
    assert!(((outlet - 573.15) - rise).abs() < 0.01 * rise);

    assert!(profile.pressure_drop.friction > 0.0);
    assert!(profile.pressure_drop.gravity > 7.5e3 && profile.pressure_drop.gravity < 9.0e3);
    let drop = profile.inlet().unwrap().pressure - profile.outlet().unwrap().pressure;
    assert!((drop - profile.pressure_drop.total()).abs() < 1e-6 * drop);
}

#[test]
fn constant_properties_give_exact_rise() {
    let network = bundle();
    let coolant = ConstantCoolant::new(850.0, 1270.0, 2.5e-4, 65.0);
    let power = AssemblyPower::uniform(watts(1.0e6));
    let mesh = AxialMesh::new(1.0, 0.02, &[]).unwrap();
    let boundary = DuctBoundary::adiabatic(mesh.steps());

    let profile = march_assembly(
        input(&network, &coolant, &power),
        &mesh,
        &boundary,
        &MarchConfig::default(),
    )
    .unwrap();
    let outlet = profile.mixed_outlet_temperature(&coolant).unwrap();
    let expected = 573.15 + 1.0e6 / (8.0 * 1270.0);
    assert!((outlet - expected).abs() < 1e-8, "{outlet} vs {expected}");
}

#[test]
fn duct_heat_enters_the_balance() {
    let network = bundle();
    let coolant = ConstantCoolant::new(850.0, 1270.0, 2.5e-4, 65.0);
    let power = AssemblyPower::uniform(watts(5.0e5));
    let mesh = AxialMesh::new(1.0, 0.02, &[]).unwrap();
    let boundary = DuctBoundary::from_steps(vec![[-1.0e3, 0.0, 0.0, 2.0e3, 0.0, 0.0]; mesh.steps()]);

    let profile = march_assembly(
        input(&network, &coolant, &power),
        &mesh,
        &boundary,
        &MarchConfig::default(),
    )
    .unwrap();
    assert!((profile.energy.duct_heat - 1.0e3).abs() < 1e-6);
    assert!((boundary.total_heat(&mesh) - 1.0e3).abs() < 1e-6);
    assert!(profile.energy.relative_imbalance() < 1e-9);

    let (t, _) = profile.face_state(mesh.steps() - 1).unwrap();
    assert!(t[3] > t[0], "heated face {} vs cooled face {}", t[3], t[0]);
}

#[test]
fn uniform_power_is_rotationally_symmetric() {
    let network = bundle();
    let sodium = Sodium::new();
    let power = AssemblyPower::uniform(watts(1.5e6));
    let mesh = AxialMesh::new(1.0, 0.02, &[]).unwrap();
    let boundary = DuctBoundary::adiabatic(mesh.steps());
    let profile = march_assembly(
        input(&network, &sodium, &power),
        &mesh,
        &boundary,
        &MarchConfig::default(),
    )
    .unwrap();
    let outlet = profile.outlet().unwrap();

    let (s, c) = (60f64.to_radians().sin(), 60f64.to_radians().cos());
    for sc in network.subchannels() {
        let [x, y] = sc.centroid;
        let rotated = [c * x - s * y, s * x + c * y];
        let image = network
            .subchannels()
            .iter()
            .find(|o| (o.centroid[0] - rotated[0]).abs() < 1e-9 && (o.centroid[1] - rotated[1]).abs() < 1e-9)
            .unwrap();
        let (a, b) = (outlet.temperature[sc.id.idx()], outlet.temperature[image.id.idx()]);
        assert!((a - b).abs() < 1e-6, "{} -> {}: {a} vs {b}", sc.id, image.id);
        let (a, b) = (outlet.flow[sc.id.idx()], outlet.flow[image.id.idx()]);
        assert!((a - b).abs() < 1e-9 * 8.0);
    }
}

#[test]
fn temperatures_rise_monotonically() {
    let network = bundle();
    let sodium = Sodium::new();
    let power = AssemblyPower::uniform(watts(1.5e6)).with_shape(AxialPowerShape::ChoppedCosine {
        extrapolation_length: 0.1,
    });
    let mesh = AxialMesh::new(1.0, 0.02, &[]).unwrap();
    let boundary = DuctBoundary::adiabatic(mesh.steps());
    let profile = march_assembly(
        input(&network, &sodium, &power),
        &mesh,
        &boundary,
        &MarchConfig::default(),
    )
    .unwrap();

    for pair in profile.nodes.windows(2) {
        assert!(pair[1].mean_temperature() > pair[0].mean_temperature());
        for (i, (t0, t1)) in pair[0].temperature.iter().zip(&pair[1].temperature).enumerate() {
            assert!(*t1 >= t0 - 1e-9, "subchannel {i} cools at z = {}: {t0} -> {t1}", pair[1].z);
        }
    }
    let (inlet, outlet) = (profile.inlet().unwrap(), profile.outlet().unwrap());
    for (t_in, t_out) in inlet.temperature.iter().zip(&outlet.temperature) {
        assert!(t_out > t_in);
    }
    let peak = profile.peak_coolant();
    assert!(peak.temperature >= outlet.peak().1 - 1e-9);
    assert!(peak.z > 0.5);
    assert!(profile.peak_face_temperature() > 573.15);
}

#[test]
fn split_cap_reports_divergence_at_inlet() {
    let network = bundle();
    let sodium = Sodium::new();
    let power = AssemblyPower::uniform(watts(1.5e6));
    let mesh = AxialMesh::new(1.0, 0.01, &[]).unwrap();
    let boundary = DuctBoundary::adiabatic(mesh.steps());
    let config = MarchConfig {
        max_inner_iterations: 1,
        ..MarchConfig::default()
    };

    let err = march_assembly(input(&network, &sodium, &power), &mesh, &boundary, &config).unwrap_err();
    assert!(matches!(err, MarchError::FlowDivergence { iterations: 1, .. }), "{err}");
    assert_eq!(err.axial_position(), Some(0.0));

    let mut march = AxialMarch::new(input(&network, &sodium, &power), &mesh, &boundary, &config).unwrap();
    assert!(matches!(march.next(), Some(Err(_))));
    assert!(march.next().is_none());
    assert!(march.next().is_none());
}

#[test]
fn march_is_lazy_and_restartable() {
    let network = bundle();
    let sodium = Sodium::new();
    let power = AssemblyPower::uniform(watts(1.5e6));
    let mesh = AxialMesh::new(0.5, 0.05, &[]).unwrap();
    let boundary = DuctBoundary::adiabatic(mesh.steps());
    let config = MarchConfig::default();
    let mut march = AxialMarch::new(input(&network, &sodium, &power), &mesh, &boundary, &config).unwrap();

    let first = march.next().unwrap().unwrap();
    assert_eq!(first.z, 0.0);
    assert!(first.temperature.iter().all(|t| *t == 573.15));

    let rest: Vec<_> = march.by_ref().map(Result::unwrap).collect();
    assert_eq!(rest.len(), mesh.steps());
    assert!((rest[rest.len() - 1].z - 0.5).abs() < 1e-12);
    assert!(march.next().is_none());

    march.restart();
    let again = march.next().unwrap().unwrap();
    assert_eq!(again, first);
}

#[test]
fn invalid_input_is_rejected_before_marching() {
    let network = bundle();
    let sodium = Sodium::new();
    let power = AssemblyPower::uniform(watts(1.5e6)).with_pin_peaking(vec![1.0; 7]);
    let mesh = AxialMesh::new(1.0, 0.01, &[]).unwrap();
    let boundary = DuctBoundary::adiabatic(mesh.steps());
    let config = MarchConfig::default();
    let result = AxialMarch::new(
        input(&network, &sodium, &power),
        &mesh,
        &boundary,
        &config,
    );
    assert!(matches!(result, Err(MarchError::InvalidInput { .. })));
}

#[test]
fn stability_limit_allows_centimeter_steps() {
    let network = bundle();
    let sodium = Sodium::new();
    let power = AssemblyPower::uniform(watts(1.5e6));
    let limit = stability_limit(input(&network, &sodium, &power), &MarchConfig::default()).unwrap();
    assert!(limit > 0.01 && limit.is_finite(), "{limit}");
}

/// March a 19-pin assembly at `flow` with the step held under the
/// stability limit.
fn march_19(flow: f64, power: f64, config: &MarchConfig) -> MarchResult<AxialProfile> {
    let network = bundle_19();
    let sodium = Sodium::new();
    let power = AssemblyPower::uniform(watts(power));
    let input = AssemblyInput {
        flow_rate: kgps(flow),
        ..input(&network, &sodium, &power)
    };
    let dz = stability_limit(input, config)?.min(0.02);
    let mesh = AxialMesh::new(1.0, dz, &[])?;
    let boundary = DuctBoundary::adiabatic(mesh.steps());
    march_assembly(input, &mesh, &boundary, config)
}

/// Bundle regime of the 19-pin assembly at the inlet temperature.
fn inlet_regime(flow: f64) -> FlowRegime {
    let network = bundle_19();
    let bundle = network.bundle();
    let mu = Sodium::new().properties(573.15).unwrap().viscosity;
    FlowRegime::classify(flow * bundle.hydraulic_diameter() / (bundle.bundle_area * mu), bundle)
}

#[test]
fn transition_flows_split_without_cycling() {
    assert!(matches!(inlet_regime(0.391), FlowRegime::Transition { .. }));

    let config = MarchConfig::default();
    let flows = (0..=12).map(|i| 0.36 + 0.005 * i as f64).chain([0.391]);
    for flow in flows {
        let profile = march_19(flow, 2.0e5, &config).unwrap_or_else(|e| panic!("{flow} kg/s: {e}"));
        assert!(profile.energy.relative_imbalance() < 1e-9, "{flow} kg/s");
        assert!(
            profile.nodes.iter().all(|n| n.split_iterations < config.max_inner_iterations),
            "{flow} kg/s"
        );
    }
}

#[test]
fn flow_sweep_crosses_every_regime() {
    let config = MarchConfig::default();
    let mut seen = (false, false);
    for i in 0..=26 {
        let flow = 0.2 + 0.05 * i as f64;
        let profile = march_19(flow, 5.0e4, &config).unwrap_or_else(|e| panic!("{flow} kg/s: {e}"));
        let outlet = profile.outlet().unwrap();
        assert!((outlet.total_flow() - flow).abs() < 1e-9 * flow);
        assert!(profile.max_mass_imbalance() < 1e-9);
        match inlet_regime(flow) {
            FlowRegime::Transition { .. } => seen.0 = true,
            FlowRegime::Turbulent => seen.1 = true,
            FlowRegime::Laminar => {}
        }
    }
    assert_eq!(seen, (true, true));
}

#[test]
fn strict_range_policy_stops_the_march() {
    let config = MarchConfig {
        correlations: CorrelationSet::from_name("novendstern").unwrap(),
        range_policy: RangePolicy::Error,
        ..MarchConfig::default()
    };
    let err = march_19(0.1, 5.0e3, &config).unwrap_err();
    match &err {
        MarchError::Correlation {
            z,
            source: CorrelationError::OutOfRange(warning),
        } => {
            assert_eq!(*z, 0.0);
            assert_eq!(warning.correlation, "Novendstern");
            assert_eq!(warning.parameter, "Re");
        }
        other => panic!("unexpected {other}"),
    }

    let relaxed = MarchConfig {
        range_policy: RangePolicy::Warn,
        ..config
    };
    let profile = march_19(0.1, 5.0e3, &relaxed).unwrap();
    assert!(profile.warnings.iter().any(|w| w.correlation == "Novendstern"));
}
