//! Per-step energy balance of every subchannel.

use ds_coolant::CoolantProperties;
use ds_correlations::MixingParameters;
use ds_geometry::network::FACES;
use ds_geometry::{SubchannelKind, SubchannelNetwork};

/// Lateral exchange coefficients for one step.
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    /// Conduction plus eddy mixing per gap [W/m-K].
    pub conductance: Vec<f64>,
    /// Swirl mass flow around the perimeter [kg/s-m].
    pub swirl: f64,
}

impl Exchange {
    pub fn new(
        network: &SubchannelNetwork,
        flow: &[f64],
        props: &[CoolantProperties],
        mixing: MixingParameters,
    ) -> Self {
        let bundle = network.bundle();
        let volume_flow: f64 = flow.iter().zip(props).map(|(m, p)| m / p.density).sum();
        let velocity = volume_flow / bundle.bundle_area;
        let eddy = mixing.eddy * velocity * bundle.hydraulic_diameter();

        let conductance = network
            .gaps()
            .iter()
            .map(|gap| {
                let (a, b) = (&props[gap.from.idx()], &props[gap.to.idx()]);
                let k = 0.5 * (a.conductivity + b.conductivity);
                let rho_cp = 0.5 * (a.density * a.heat_capacity + b.density * b.heat_capacity);
                (k + rho_cp * eddy) * gap.width / gap.length
            })
            .collect();

        let swirl = if network.perimeter_cycle().is_empty() {
            0.0
        } else {
            let (mass, area) = network
                .subchannels()
                .iter()
                .filter(|sc| sc.kind == SubchannelKind::Edge)
                .fold((0.0, 0.0), |(m, a), sc| (m + flow[sc.id.idx()], a + sc.area));
            let gaps = network.perimeter_gaps();
            let width = gaps
                .iter()
                .map(|g| network.gaps()[g.idx()].width)
                .sum::<f64>()
                / gaps.len() as f64;
            if area > 0.0 {
                mixing.swirl * mass / area * width
            } else {
                0.0
            }
        };

        Self { conductance, swirl }
    }

    /// Largest axial step for which the explicit exchange terms keep every
    /// subchannel's outflow coefficient below its own heat capacity rate.
    pub fn stability_limit(
        &self,
        network: &SubchannelNetwork,
        flow: &[f64],
        props: &[CoolantProperties],
    ) -> f64 {
        let mut on_cycle = vec![false; flow.len()];
        for id in network.perimeter_cycle() {
            on_cycle[id.idx()] = true;
        }
        network
            .subchannels()
            .iter()
            .map(|sc| {
                let i = sc.id.idx();
                let cp = props[i].heat_capacity;
                let outflow: f64 = network
                    .gaps_of(sc.id)
                    .iter()
                    .map(|link| self.conductance[link.gap.idx()])
                    .sum::<f64>()
                    + if on_cycle[i] { self.swirl * cp } else { 0.0 };
                if outflow > 0.0 {
                    0.5 * flow[i] * cp / outflow
                } else {
                    f64::INFINITY
                }
            })
            .fold(f64::INFINITY, f64::min)
    }
}

/// State entering one step plus everything added over it.
pub struct StepBalance<'a> {
    pub network: &'a SubchannelNetwork,
    pub flow_in: &'a [f64],
    pub enthalpy_in: &'a [f64],
    pub temperature_in: &'a [f64],
    pub flow_out: &'a [f64],
    /// Diversion flow per gap over the step [kg/s].
    pub cross_flow: &'a [f64],
    pub exchange: &'a Exchange,
    /// Pin heat into each subchannel over the step [W].
    pub heat: &'a [f64],
    /// Duct heat into the assembly per face [W/m].
    pub duct: [f64; FACES],
    pub dz: f64,
}

/// Outlet enthalpies and the duct heat actually applied [W].
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    pub enthalpy: Vec<f64>,
    pub duct_heat: f64,
}

impl StepBalance<'_> {
    /// `m_out h_out = m_in h_in + Q + diversion + mixing + swirl + duct`.
    ///
    /// Diversion and swirl carry the donor's inlet enthalpy; every lateral
    /// term is applied with equal and opposite sign on both sides.
    pub fn solve(&self) -> StepResult {
        let network = self.network;
        let mut energy: Vec<f64> = self
            .flow_in
            .iter()
            .zip(self.enthalpy_in)
            .zip(self.heat)
            .map(|((m, h), q)| m * h + q)
            .collect();

        for (gap, &w) in network.gaps().iter().zip(self.cross_flow) {
            let (from, to) = (gap.from.idx(), gap.to.idx());
            let donor = if w >= 0.0 { from } else { to };
            let conductance = self.exchange.conductance[gap.id.idx()];
            let mixing =
                conductance * self.dz * (self.temperature_in[from] - self.temperature_in[to]);
            let flux = w * self.enthalpy_in[donor] + mixing;
            energy[from] -= flux;
            energy[to] += flux;
        }

        let cycle = network.perimeter_cycle();
        let swirl = self.exchange.swirl * self.dz;
        for (j, a) in cycle.iter().enumerate() {
            let b = cycle[(j + 1) % cycle.len()];
            let flux = swirl * self.enthalpy_in[a.idx()];
            energy[a.idx()] -= flux;
            energy[b.idx()] += flux;
        }

        let mut duct_heat = 0.0;
        for face in network.faces() {
            let q = self.duct[face.index];
            for contact in &face.contacts {
                let heat = q * face.weight(contact) * self.dz;
                energy[contact.subchannel.idx()] += heat;
                duct_heat += heat;
            }
        }

        let enthalpy = energy
            .iter()
            .zip(self.flow_out)
            .map(|(e, m)| e / m)
            .collect();
        StepResult {
            enthalpy,
            duct_heat,
        }
    }
}
