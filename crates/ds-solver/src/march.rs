//! Axial marching of one assembly.
//!
//! [`AxialMarch`] is a lazy generator of [`AxialNode`]s: the inlet node
//! first, then one node per mesh step. It stops after the outlet node or at
//! the first error, and can only be restarted from the inlet.

use std::iter::FusedIterator;

use tracing::{debug, warn};

use ds_coolant::{CoolantError, CoolantModel, CoolantProperties, CoolantResult};
use ds_core::{MassRate, Pressure, SubchannelId, Temperature};
use ds_correlations::{
    CorrelationResult, CorrelationSet, Evaluated, FlowRegime, LocalFlow, RangePolicy, RangeWarning,
};
use ds_geometry::SubchannelNetwork;
use ds_geometry::network::FACES;

use crate::energy::{Exchange, StepBalance};
use crate::error::{AtHeight, MarchResult, invalid_input};
use crate::mesh::AxialMesh;
use crate::power::AssemblyPower;
use crate::split::{Split, SplitProblem, diversion};

/// Numerical settings of the march.
#[derive(Clone, Debug, PartialEq)]
pub struct MarchConfig {
    pub correlations: CorrelationSet,
    pub range_policy: RangePolicy,
    /// Cap on flow-split iterations per node.
    pub max_inner_iterations: usize,
    /// Relative flow change at which the split is converged.
    pub flow_split_tolerance: f64,
}

impl Default for MarchConfig {
    fn default() -> Self {
        Self {
            correlations: CorrelationSet::default(),
            range_policy: RangePolicy::default(),
            max_inner_iterations: 50,
            flow_split_tolerance: 1e-8,
        }
    }
}

/// Everything one assembly march reads.
#[derive(Clone, Copy)]
pub struct AssemblyInput<'a> {
    pub network: &'a SubchannelNetwork,
    pub coolant: &'a dyn CoolantModel,
    pub power: &'a AssemblyPower,
    pub flow_rate: MassRate,
    pub inlet_temperature: Temperature,
    pub inlet_pressure: Pressure,
}

impl AssemblyInput<'_> {
    pub fn validate(&self, length: f64) -> MarchResult<()> {
        let flow = self.flow_rate.value;
        if !flow.is_finite() || flow <= 0.0 {
            return Err(invalid_input(format!("assembly flow rate must be positive, got {flow}")));
        }
        let t = self.inlet_temperature.value;
        if !t.is_finite() || t <= 0.0 {
            return Err(invalid_input(format!("inlet temperature must be positive, got {t}")));
        }
        if !self.inlet_pressure.value.is_finite() {
            return Err(invalid_input("inlet pressure must be finite"));
        }
        self.power.validate(self.network.pins().len(), length)
    }
}

/// Solution at one axial height.
#[derive(Debug, Clone, PartialEq)]
pub struct AxialNode {
    pub z: f64,
    /// Axial mass flow per subchannel [kg/s].
    pub flow: Vec<f64>,
    /// Specific enthalpy per subchannel [J/kg].
    pub enthalpy: Vec<f64>,
    /// Temperature per subchannel [K].
    pub temperature: Vec<f64>,
    /// Heat transfer coefficient per subchannel [W/m^2-K].
    pub htc: Vec<f64>,
    pub pressure: f64,
    /// Diversion cross-flow per gap over the step ending here [kg/s-m].
    pub cross_flow: Vec<f64>,
    /// Wall-length weighted coolant temperature on each duct face [K].
    pub face_temperature: [f64; FACES],
    /// Wall-length weighted heat transfer coefficient on each duct face.
    pub face_htc: [f64; FACES],
    /// Largest node mass imbalance relative to the assembly flow.
    pub mass_imbalance: f64,
    pub split_iterations: usize,
}

impl AxialNode {
    pub fn total_flow(&self) -> f64 {
        self.flow.iter().sum()
    }

    pub fn mixed_enthalpy(&self) -> f64 {
        self.flow
            .iter()
            .zip(&self.enthalpy)
            .map(|(m, h)| m * h)
            .sum::<f64>()
            / self.total_flow()
    }

    /// Flow-weighted mean temperature.
    pub fn mean_temperature(&self) -> f64 {
        self.flow
            .iter()
            .zip(&self.temperature)
            .map(|(m, t)| m * t)
            .sum::<f64>()
            / self.total_flow()
    }

    /// Hottest subchannel.
    pub fn peak(&self) -> (SubchannelId, f64) {
        self.temperature
            .iter()
            .enumerate()
            .fold((SubchannelId::from_index(0), f64::NEG_INFINITY), |best, (i, &t)| {
                if t > best.1 {
                    (SubchannelId::from_usize(i), t)
                } else {
                    best
                }
            })
    }
}

/// Heat entering an assembly through its duct faces, per mesh step.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DuctBoundary {
    steps: Vec<[f64; FACES]>,
}

impl DuctBoundary {
    pub fn adiabatic(steps: usize) -> Self {
        Self {
            steps: vec![[0.0; FACES]; steps],
        }
    }

    pub fn from_steps(steps: Vec<[f64; FACES]>) -> Self {
        Self { steps }
    }

    /// Linear heat rate into the assembly on each face [W/m]; zero past the end.
    pub fn linear_heat_rate(&self, step: usize) -> [f64; FACES] {
        self.steps.get(step).copied().unwrap_or([0.0; FACES])
    }

    pub fn steps(&self) -> &[[f64; FACES]] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Total heat into the assembly [W].
    pub fn total_heat(&self, mesh: &AxialMesh) -> f64 {
        self.steps
            .iter()
            .enumerate()
            .filter_map(|(i, q)| mesh.step(i).map(|(z0, z1)| q.iter().sum::<f64>() * (z1 - z0)))
            .sum()
    }
}

/// Energy bookkeeping of one assembly pass [W].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnergyBalance {
    pub power: f64,
    pub duct_heat: f64,
    pub enthalpy_rise: f64,
}

impl EnergyBalance {
    pub fn imbalance(&self) -> f64 {
        self.power + self.duct_heat - self.enthalpy_rise
    }

    pub fn relative_imbalance(&self) -> f64 {
        self.imbalance().abs() / (self.power.abs() + self.duct_heat.abs()).max(1.0)
    }
}

/// Pressure drop components over the bundle [Pa].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PressureDrop {
    pub friction: f64,
    pub gravity: f64,
}

impl PressureDrop {
    pub fn total(&self) -> f64 {
        self.friction + self.gravity
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakTemperature {
    pub z: f64,
    pub subchannel: SubchannelId,
    pub temperature: f64,
}

/// Completed march of one assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct AxialProfile {
    pub nodes: Vec<AxialNode>,
    pub energy: EnergyBalance,
    pub pressure_drop: PressureDrop,
    /// One entry per correlation parameter that left its validated range.
    pub warnings: Vec<RangeWarning>,
}

impl AxialProfile {
    /// `None` only for a profile with no nodes.
    pub fn inlet(&self) -> Option<&AxialNode> {
        self.nodes.first()
    }

    pub fn outlet(&self) -> Option<&AxialNode> {
        self.nodes.last()
    }

    pub fn mixed_outlet_temperature(&self, coolant: &dyn CoolantModel) -> CoolantResult<f64> {
        let outlet = self.outlet().ok_or(CoolantError::InvalidArg {
            what: "profile has no outlet node",
        })?;
        coolant.temperature(outlet.mixed_enthalpy())
    }

    pub fn peak_coolant(&self) -> PeakTemperature {
        self.nodes.iter().fold(
            PeakTemperature {
                z: 0.0,
                subchannel: SubchannelId::from_index(0),
                temperature: f64::NEG_INFINITY,
            },
            |best, node| {
                let (subchannel, temperature) = node.peak();
                if temperature > best.temperature {
                    PeakTemperature {
                        z: node.z,
                        subchannel,
                        temperature,
                    }
                } else {
                    best
                }
            },
        )
    }

    pub fn peak_face_temperature(&self) -> f64 {
        self.nodes
            .iter()
            .flat_map(|n| n.face_temperature)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Step-averaged face temperatures and heat transfer coefficients.
    pub fn face_state(&self, step: usize) -> Option<([f64; FACES], [f64; FACES])> {
        let a = self.nodes.get(step)?;
        let b = self.nodes.get(step + 1)?;
        let mut t = [0.0; FACES];
        let mut h = [0.0; FACES];
        for k in 0..FACES {
            t[k] = 0.5 * (a.face_temperature[k] + b.face_temperature[k]);
            h[k] = 0.5 * (a.face_htc[k] + b.face_htc[k]);
        }
        Some((t, h))
    }

    pub fn max_mass_imbalance(&self) -> f64 {
        self.nodes
            .iter()
            .map(|n| n.mass_imbalance)
            .fold(0.0, f64::max)
    }
}

/// Deduplicated range warnings under a policy.
#[derive(Debug, Clone)]
struct RangeLog {
    policy: RangePolicy,
    seen: Vec<RangeWarning>,
}

impl RangeLog {
    fn accept<T>(&mut self, evaluated: Evaluated<T>, z: f64) -> MarchResult<T> {
        let (value, warnings) = self.policy.accept(evaluated).at(z)?;
        for w in warnings {
            let known = self
                .seen
                .iter()
                .any(|s| s.correlation == w.correlation && s.parameter == w.parameter);
            if !known {
                warn!(z, warning = %w, "correlation used outside its validated range");
                self.seen.push(w);
            }
        }
        Ok(value)
    }
}

/// Lazy, restartable generator of axial nodes for one assembly.
pub struct AxialMarch<'a> {
    input: AssemblyInput<'a>,
    mesh: &'a AxialMesh,
    boundary: &'a DuctBoundary,
    config: &'a MarchConfig,
    /// Pin heat into each subchannel over the full length [W].
    subchannel_power: Vec<f64>,
    current: Option<AxialNode>,
    step: usize,
    finished: bool,
    energy: EnergyBalance,
    pressure_drop: PressureDrop,
    log: RangeLog,
}

impl<'a> AxialMarch<'a> {
    pub fn new(
        input: AssemblyInput<'a>,
        mesh: &'a AxialMesh,
        boundary: &'a DuctBoundary,
        config: &'a MarchConfig,
    ) -> MarchResult<Self> {
        input.validate(mesh.length())?;
        if config.max_inner_iterations == 0 {
            return Err(invalid_input("max_inner_iterations must be at least 1"));
        }

        let network = input.network;
        let pin_powers = input.power.pin_powers(network.pins().len());
        let mut subchannel_power = vec![0.0; network.subchannels().len()];
        for share in network.pin_shares() {
            subchannel_power[share.subchannel.idx()] += share.fraction * pin_powers[share.pin.idx()];
        }

        Ok(Self {
            input,
            mesh,
            boundary,
            config,
            subchannel_power,
            current: None,
            step: 0,
            finished: false,
            energy: EnergyBalance::default(),
            pressure_drop: PressureDrop::default(),
            log: RangeLog {
                policy: config.range_policy,
                seen: Vec::new(),
            },
        })
    }

    /// Forget every node and start again from the inlet.
    pub fn restart(&mut self) {
        self.current = None;
        self.step = 0;
        self.finished = false;
        self.energy = EnergyBalance::default();
        self.pressure_drop = PressureDrop::default();
        self.log.seen.clear();
    }

    /// Pin and duct heat added so far; the enthalpy rise is filled in by
    /// [`march_assembly`].
    pub fn energy(&self) -> EnergyBalance {
        self.energy
    }

    pub fn pressure_drop(&self) -> PressureDrop {
        self.pressure_drop
    }

    pub fn warnings(&self) -> &[RangeWarning] {
        &self.log.seen
    }

    fn properties(&self, temperature: &[f64], z: f64) -> MarchResult<Vec<CoolantProperties>> {
        temperature
            .iter()
            .map(|&t| self.input.coolant.properties(t).at(z))
            .collect()
    }

    /// Bundle-level regime from the flow-weighted viscosity.
    fn regime(&self, flow: &[f64], props: &[CoolantProperties]) -> FlowRegime {
        let bundle = self.input.network.bundle();
        let total: f64 = flow.iter().sum();
        let viscosity = flow
            .iter()
            .zip(props)
            .map(|(m, p)| m * p.viscosity)
            .sum::<f64>()
            / total;
        let reynolds = total * bundle.hydraulic_diameter() / (bundle.bundle_area * viscosity);
        FlowRegime::classify(reynolds, bundle)
    }

    /// Friction, heat transfer and mixing for every subchannel at one state.
    fn correlations(
        &mut self,
        regime: FlowRegime,
        flow: &[f64],
        props: &[CoolantProperties],
        z: f64,
    ) -> MarchResult<Vec<CorrelationResult>> {
        let network = self.input.network;
        let bundle = *network.bundle();
        let set = self.config.correlations;
        network
            .subchannels()
            .iter()
            .zip(flow.iter().zip(props))
            .map(|(sc, (m, p))| {
                let reynolds = m * sc.hydraulic_diameter / (sc.area * p.viscosity);
                let local = local_flow(reynolds, p, sc.hydraulic_diameter);
                self.log.accept(set.evaluate(regime, &bundle, &local), z)
            })
            .collect()
    }

    /// Equal-pressure-drop split with the regime held at `regime`.
    fn split(
        &mut self,
        guess: &[f64],
        props: &[CoolantProperties],
        regime: FlowRegime,
        dz: f64,
        z: f64,
    ) -> MarchResult<Split> {
        let density: Vec<f64> = props.iter().map(|p| p.density).collect();
        let viscosity: Vec<f64> = props.iter().map(|p| p.viscosity).collect();
        let network = self.input.network;
        let problem = SplitProblem {
            network,
            density: &density,
            viscosity: &viscosity,
            total_flow: self.input.flow_rate.value,
            dz,
            z,
            max_iterations: self.config.max_inner_iterations,
            tolerance: self.config.flow_split_tolerance,
        };
        let bundle = *network.bundle();
        let set = self.config.correlations;
        let subchannels = network.subchannels();
        let log = &mut self.log;
        problem.solve(guess, |i, re| {
            let local = local_flow(re, &props[i], subchannels[i].hydraulic_diameter);
            log.accept(set.evaluate(regime, &bundle, &local), z)
                .map(|result| result.friction_factor)
        })
    }

    fn faces(&self, temperature: &[f64], htc: &[f64], mean: f64) -> ([f64; FACES], [f64; FACES]) {
        let faces = self.input.network.faces();
        if faces.is_empty() {
            return ([mean; FACES], [0.0; FACES]);
        }
        let mut t = [0.0; FACES];
        let mut h = [0.0; FACES];
        for face in faces {
            for contact in &face.contacts {
                let w = face.weight(contact);
                t[face.index] += w * temperature[contact.subchannel.idx()];
                h[face.index] += w * htc[contact.subchannel.idx()];
            }
        }
        (t, h)
    }

    fn inlet(&mut self) -> MarchResult<AxialNode> {
        let network = self.input.network;
        let n = network.subchannels().len();
        let t_in = self.input.inlet_temperature.value;
        let total = self.input.flow_rate.value;
        let h_in = self.input.coolant.enthalpy(t_in).at(0.0)?;
        let props = self.properties(&vec![t_in; n], 0.0)?;

        let area = network.total_area();
        let guess: Vec<f64> = network
            .subchannels()
            .iter()
            .map(|sc| total * sc.area / area)
            .collect();
        let dz = self.mesh.step(0).map_or(self.mesh.length(), |(a, b)| b - a);
        let regime = self.regime(&guess, &props);
        let split = self.split(&guess, &props, regime, dz, 0.0)?;
        let temperature = vec![t_in; n];
        let htc = heat_transfer(&self.correlations(regime, &split.flow, &props, 0.0)?);
        let (face_temperature, face_htc) = self.faces(&temperature, &htc, t_in);

        Ok(AxialNode {
            z: 0.0,
            flow: split.flow,
            enthalpy: vec![h_in; n],
            temperature,
            htc,
            pressure: self.input.inlet_pressure.value,
            cross_flow: vec![0.0; network.gaps().len()],
            face_temperature,
            face_htc,
            mass_imbalance: 0.0,
            split_iterations: split.iterations,
        })
    }

    fn advance(&mut self, prev: &AxialNode) -> MarchResult<AxialNode> {
        let network = self.input.network;
        let (z0, z1) = self
            .mesh
            .step(self.step)
            .ok_or_else(|| invalid_input("march advanced past the mesh"))?;
        let dz = z1 - z0;

        let props = self.properties(&prev.temperature, z0)?;
        let regime = self.regime(&prev.flow, &props);
        let local = self.correlations(regime, &prev.flow, &props, z0)?;
        let mixing = local
            .first()
            .map(|r| r.mixing)
            .ok_or_else(|| invalid_input("bundle has no subchannels"))?;
        let split = self.split(&prev.flow, &props, regime, dz, z1)?;
        let (cross, mass_imbalance) = diversion(network, &prev.flow, &split.flow);
        let exchange = Exchange::new(network, &prev.flow, &props, mixing);

        let fraction = self.input.power.shape.fraction(z0, z1, self.mesh.length());
        let heat: Vec<f64> = self.subchannel_power.iter().map(|q| q * fraction).collect();

        let step = StepBalance {
            network,
            flow_in: &prev.flow,
            enthalpy_in: &prev.enthalpy,
            temperature_in: &prev.temperature,
            flow_out: &split.flow,
            cross_flow: &cross,
            exchange: &exchange,
            heat: &heat,
            duct: self.boundary.linear_heat_rate(self.step),
            dz,
        }
        .solve();

        let temperature = step
            .enthalpy
            .iter()
            .map(|&h| self.input.coolant.temperature(h).at(z1))
            .collect::<MarchResult<Vec<f64>>>()?;
        let props_out = self.properties(&temperature, z1)?;
        let regime_out = self.regime(&split.flow, &props_out);
        let htc = heat_transfer(&self.correlations(regime_out, &split.flow, &props_out, z1)?);

        self.energy.power += heat.iter().sum::<f64>();
        self.energy.duct_heat += step.duct_heat;
        self.pressure_drop.friction += split.pressure_drop - split.gravity_drop;
        self.pressure_drop.gravity += split.gravity_drop;

        let node = AxialNode {
            z: z1,
            face_temperature: [0.0; FACES],
            face_htc: [0.0; FACES],
            flow: split.flow,
            enthalpy: step.enthalpy,
            temperature,
            htc,
            pressure: prev.pressure - split.pressure_drop,
            cross_flow: cross.iter().map(|w| w / dz).collect(),
            mass_imbalance,
            split_iterations: split.iterations,
        };
        let (face_temperature, face_htc) =
            self.faces(&node.temperature, &node.htc, node.mean_temperature());
        Ok(AxialNode {
            face_temperature,
            face_htc,
            ..node
        })
    }
}

impl Iterator for AxialMarch<'_> {
    type Item = MarchResult<AxialNode>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = match self.current.take() {
            None => self.inlet(),
            Some(prev) if self.step < self.mesh.steps() => {
                let next = self.advance(&prev);
                if next.is_ok() {
                    self.step += 1;
                }
                next
            }
            Some(_) => {
                self.finished = true;
                return None;
            }
        };
        match result {
            Ok(node) => {
                self.current = Some(node.clone());
                Some(Ok(node))
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

impl FusedIterator for AxialMarch<'_> {}

/// Run a full assembly pass and collect the profile.
pub fn march_assembly(
    input: AssemblyInput<'_>,
    mesh: &AxialMesh,
    boundary: &DuctBoundary,
    config: &MarchConfig,
) -> MarchResult<AxialProfile> {
    let mut march = AxialMarch::new(input, mesh, boundary, config)?;
    let nodes = march.by_ref().collect::<MarchResult<Vec<_>>>()?;

    let (first, last) = match (nodes.first(), nodes.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(invalid_input("march produced no nodes")),
    };
    let flux = |n: &AxialNode| n.flow.iter().zip(&n.enthalpy).map(|(m, h)| m * h).sum::<f64>();
    let energy = EnergyBalance {
        enthalpy_rise: flux(last) - flux(first),
        ..march.energy()
    };
    debug!(
        nodes = nodes.len(),
        power = energy.power,
        duct_heat = energy.duct_heat,
        imbalance = energy.imbalance(),
        "assembly march complete"
    );

    Ok(AxialProfile {
        energy,
        pressure_drop: march.pressure_drop(),
        warnings: march.warnings().to_vec(),
        nodes,
    })
}

fn local_flow(reynolds: f64, props: &CoolantProperties, hydraulic_diameter: f64) -> LocalFlow {
    LocalFlow {
        reynolds,
        prandtl: props.prandtl(),
        conductivity: props.conductivity,
        hydraulic_diameter,
    }
}

fn heat_transfer(results: &[CorrelationResult]) -> Vec<f64> {
    results.iter().map(|r| r.heat_transfer_coefficient).collect()
}

/// Largest stable axial step at the inlet state.
pub fn stability_limit(input: AssemblyInput<'_>, config: &MarchConfig) -> MarchResult<f64> {
    let network = input.network;
    let t_in = input.inlet_temperature.value;
    let props = input.coolant.properties(t_in).at(0.0)?;
    let props = vec![props; network.subchannels().len()];
    let total = input.flow_rate.value;
    let area = network.total_area();
    let flow: Vec<f64> = network
        .subchannels()
        .iter()
        .map(|sc| total * sc.area / area)
        .collect();

    let bundle = *network.bundle();
    let reynolds = total * bundle.hydraulic_diameter() / (bundle.bundle_area * props[0].viscosity);
    let regime = FlowRegime::classify(reynolds, &bundle);
    let local = local_flow(reynolds, &props[0], bundle.hydraulic_diameter());
    let mixing = config.correlations.evaluate(regime, &bundle, &local).value.mixing;
    Ok(Exchange::new(network, &flow, &props, mixing).stability_limit(network, &flow, &props))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn energy_balance_imbalance() {
        let e = EnergyBalance {
            power: 100.0,
            duct_heat: -10.0,
            enthalpy_rise: 90.0,
        };
        assert_eq!(e.imbalance(), 0.0);
        assert_eq!(e.relative_imbalance(), 0.0);
    }

    #[test]
    fn duct_boundary_past_end_is_adiabatic() {
        let b = DuctBoundary::from_steps(vec![[1.0; FACES]]);
        assert_eq!(b.linear_heat_rate(0), [1.0; FACES]);
        assert_eq!(b.linear_heat_rate(5), [0.0; FACES]);
        let mesh = AxialMesh::new(1.0, 0.5, &[]).unwrap();
        assert!((b.total_heat(&mesh) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn empty_profile_has_no_ends() {
        let profile = AxialProfile {
            nodes: Vec::new(),
            energy: EnergyBalance::default(),
            pressure_drop: PressureDrop::default(),
            warnings: Vec::new(),
        };
        assert!(profile.inlet().is_none());
        assert!(profile.outlet().is_none());
        let coolant = ds_coolant::ConstantCoolant::new(850.0, 1270.0, 2.5e-4, 65.0);
        assert!(matches!(
            profile.mixed_outlet_temperature(&coolant),
            Err(CoolantError::InvalidArg { .. })
        ));
    }
}
