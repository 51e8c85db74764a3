//! Radial temperature distribution in fuel pins.
//!
//! Works outward-in from the coolant: film drop to the clad surface, clad
//! conduction, gap conduction plus radiation, then conduction through the
//! fuel regions to the centerline. Each layer uses a conductivity averaged
//! between its two boundary temperatures, iterated to a fixed point.

use std::f64::consts::PI;

use ds_core::constants::STEFAN_BOLTZMANN;
use thiserror::Error;

use crate::march::AxialProfile;
use crate::power::AssemblyPower;
use ds_geometry::SubchannelNetwork;

const CLAD_ITERATIONS: usize = 20;
const GAP_ITERATIONS: usize = 10;
const FUEL_ITERATIONS: usize = 10;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PinError {
    #[error("{stage} temperature did not converge after {iterations} iterations (last change {change:.3e} K)")]
    NotConverged {
        stage: &'static str,
        iterations: usize,
        change: f64,
    },

    #[error("Invalid pin model: {what}")]
    InvalidInput { what: String },
}

pub type PinResult<T> = Result<T, PinError>;

fn invalid(what: impl Into<String>) -> PinError {
    PinError::InvalidInput { what: what.into() }
}

/// U-Pu-Zr conductivity with a porosity correction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MetallicFuel {
    /// Plutonium weight fraction.
    pub pu: f64,
    /// Zirconium weight fraction.
    pub zr: f64,
    pub porosity: f64,
    /// Porosity shape factor.
    pub beta: f64,
}

impl MetallicFuel {
    pub fn new(pu: f64, zr: f64, porosity: f64) -> Self {
        Self {
            pu,
            zr,
            porosity,
            beta: 2.0,
        }
    }

    /// [W/m-K] at `t` [K].
    pub fn conductivity(&self, t: f64) -> f64 {
        let (pu, zr) = (self.pu, self.zr);
        let c0 = 17.5 * ((1.0 - 2.23 * zr) / (1.0 + 1.61 * zr) - 2.62 * pu);
        let c1 = 0.0154 * ((1.0 + 0.061 * zr) / (1.0 + 1.61 * zr) + 0.9 * pu);
        let c2 = 9.38e-6 * (1.0 - 2.7 * pu);
        let porosity = (1.0 - self.porosity) / (1.0 + self.beta * self.porosity);
        (c0 + c1 * t + c2 * t * t) * porosity
    }
}

/// Temperature-dependent thermal conductivity.
#[derive(Clone, Debug, PartialEq)]
pub enum Conductivity {
    Constant(f64),
    /// `k = c[0] + c[1] T + c[2] T^2 + ...`
    Polynomial(Vec<f64>),
    Metallic(MetallicFuel),
}

impl Conductivity {
    pub fn at(&self, t: f64) -> f64 {
        match self {
            Conductivity::Constant(k) => *k,
            Conductivity::Polynomial(c) => c.iter().rev().fold(0.0, |acc, c| acc * t + c),
            Conductivity::Metallic(fuel) => fuel.conductivity(t),
        }
    }

    fn mean(&self, a: f64, b: f64) -> f64 {
        0.5 * (self.at(a) + self.at(b))
    }
}

/// One annular fuel region starting at `inner_fraction` of the fuel radius
/// and ending where the next region starts.
#[derive(Clone, Debug, PartialEq)]
pub struct FuelRegion {
    pub inner_fraction: f64,
    pub conductivity: Conductivity,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PinModel {
    pub clad_thickness: f64,
    pub clad: Conductivity,
    /// Radial fuel-clad gap; zero for a closed gap.
    pub gap_thickness: f64,
    pub gap: Conductivity,
    /// Ordered from the center outward.
    pub fuel: Vec<FuelRegion>,
    /// Emissivity used for gap radiation.
    pub emissivity: f64,
    /// Convergence tolerance on each layer's inner temperature [K].
    pub tolerance: f64,
}

impl PinModel {
    pub fn new(clad_thickness: f64, clad: Conductivity, fuel: Vec<FuelRegion>) -> Self {
        Self {
            clad_thickness,
            clad,
            gap_thickness: 0.0,
            gap: Conductivity::Constant(0.0),
            fuel,
            emissivity: 0.9,
            tolerance: 1e-3,
        }
    }

    pub fn with_gap(mut self, thickness: f64, conductivity: Conductivity) -> Self {
        self.gap_thickness = thickness;
        self.gap = conductivity;
        self
    }

    pub fn validate(&self, pin_diameter: f64) -> PinResult<()> {
        let r_co = 0.5 * pin_diameter;
        if !(self.clad_thickness > 0.0 && self.clad_thickness < r_co) {
            return Err(invalid(format!(
                "clad thickness {} must lie in (0, {r_co})",
                self.clad_thickness
            )));
        }
        if !(self.gap_thickness >= 0.0 && self.clad_thickness + self.gap_thickness < r_co) {
            return Err(invalid(format!("gap thickness {} leaves no fuel", self.gap_thickness)));
        }
        if self.gap_thickness > 0.0 && self.gap.at(600.0) <= 0.0 {
            return Err(invalid("gap conductivity must be positive"));
        }
        let first = self
            .fuel
            .first()
            .ok_or_else(|| invalid("at least one fuel region is required"))?;
        if !(0.0..1.0).contains(&first.inner_fraction) {
            return Err(invalid("fuel inner fraction must lie in [0, 1)"));
        }
        if self
            .fuel
            .windows(2)
            .any(|w| w[1].inner_fraction <= w[0].inner_fraction || w[1].inner_fraction >= 1.0)
        {
            return Err(invalid("fuel regions must be strictly increasing below 1"));
        }
        if !(self.tolerance > 0.0) {
            return Err(invalid("tolerance must be positive"));
        }
        Ok(())
    }

    /// Temperatures of one pin from its coolant state and linear power.
    pub fn temperatures(
        &self,
        pin_diameter: f64,
        coolant: f64,
        htc: f64,
        linear_power: f64,
    ) -> PinResult<PinTemperatures> {
        let r_co = 0.5 * pin_diameter;
        let r_ci = r_co - self.clad_thickness;
        let r_cm = 0.5 * (r_co + r_ci);
        let c = linear_power / (2.0 * PI);

        let clad_outer = if htc > 0.0 { coolant + c / (htc * r_co) } else { coolant };
        let drop = c * (r_co / r_ci).ln();
        let mut clad_inner = clad_outer + drop / self.clad.at(clad_outer);
        converge("clad", CLAD_ITERATIONS, self.tolerance, || {
            let next = clad_outer + drop / self.clad.mean(clad_outer, clad_inner);
            let change = (next - clad_inner).abs();
            clad_inner = next;
            change
        })?;
        let clad_mid = clad_outer + c * (r_co / r_cm).ln() / self.clad.mean(clad_outer, clad_inner);

        let r_f = r_ci - self.gap_thickness;
        let fuel_surface = if self.gap_thickness > 0.0 {
            self.gap_temperature(clad_inner, c / r_f)?
        } else {
            clad_inner
        };

        let fuel_centerline = self.fuel_temperature(fuel_surface, r_f, linear_power)?;

        Ok(PinTemperatures {
            coolant,
            clad_outer,
            clad_mid,
            clad_inner,
            fuel_surface,
            fuel_centerline,
        })
    }

    /// Solve `q'' = k (T_f - T_ci) / g + e sigma (T_f^4 - T_ci^4)` for `T_f`.
    fn gap_temperature(&self, clad_inner: f64, flux: f64) -> PinResult<f64> {
        let radiation = self.emissivity * STEFAN_BOLTZMANN;
        let d1 = self.gap_thickness * (flux + radiation * clad_inner.powi(4));
        let d2 = self.gap_thickness * radiation;
        let k0 = self.gap.at(clad_inner);
        let mut t = clad_inner + (d1 - d2 * clad_inner.powi(4)) / k0;
        converge("gap", GAP_ITERATIONS, self.tolerance, || {
            let k = self.gap.mean(clad_inner, t);
            let next = clad_inner + (d1 - d2 * t.powi(4)) / k;
            let change = (next - t).abs();
            t = next;
            change
        })?;
        Ok(t)
    }

    fn fuel_temperature(&self, surface: f64, r_f: f64, linear_power: f64) -> PinResult<f64> {
        let r_hole = self.fuel.first().map_or(0.0, |r| r.inner_fraction) * r_f;
        let q = linear_power / (PI * (r_f * r_f - r_hole * r_hole));

        let mut t_out = surface;
        for (i, region) in self.fuel.iter().enumerate().rev() {
            let r_in = region.inner_fraction * r_f;
            let r_out = self.fuel.get(i + 1).map_or(r_f, |next| next.inner_fraction * r_f);
            let mut geometric = r_out * r_out - r_in * r_in;
            if r_hole > 0.0 {
                geometric -= 2.0 * r_hole * r_hole * (r_out / r_in).ln();
            }
            let drop = 0.25 * q * geometric;

            let mut t_in = t_out + drop / region.conductivity.at(t_out);
            converge("fuel", FUEL_ITERATIONS, self.tolerance, || {
                let next = t_out + drop / region.conductivity.mean(t_out, t_in);
                let change = (next - t_in).abs();
                t_in = next;
                change
            })?;
            t_out = t_in;
        }
        Ok(t_out)
    }
}

fn converge(
    stage: &'static str,
    iterations: usize,
    tolerance: f64,
    mut step: impl FnMut() -> f64,
) -> PinResult<()> {
    let mut change = f64::INFINITY;
    for _ in 0..iterations {
        change = step();
        if change < tolerance {
            return Ok(());
        }
    }
    Err(PinError::NotConverged {
        stage,
        iterations,
        change,
    })
}

/// Radial temperatures of one pin at one height [K].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PinTemperatures {
    pub coolant: f64,
    pub clad_outer: f64,
    pub clad_mid: f64,
    pub clad_inner: f64,
    pub fuel_surface: f64,
    pub fuel_centerline: f64,
}

/// Pin temperatures at every node of an assembly profile.
#[derive(Clone, Debug, PartialEq)]
pub struct PinProfile {
    pub z: Vec<f64>,
    /// `pins[node][pin]`
    pub pins: Vec<Vec<PinTemperatures>>,
}

impl PinProfile {
    pub fn peak_clad(&self) -> f64 {
        self.pins
            .iter()
            .flatten()
            .map(|p| p.clad_mid)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn peak_fuel(&self) -> f64 {
        self.pins
            .iter()
            .flatten()
            .map(|p| p.fuel_centerline)
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Evaluate `model` for every pin of every node in `profile`.
///
/// Each pin sees the share-weighted temperature and heat transfer
/// coefficient of the subchannels around it.
pub fn pin_temperatures(
    network: &SubchannelNetwork,
    power: &AssemblyPower,
    profile: &AxialProfile,
    model: &PinModel,
) -> PinResult<PinProfile> {
    let diameter = network.pin_geometry().diameter;
    model.validate(diameter)?;
    let length = profile
        .outlet()
        .map(|node| node.z)
        .ok_or_else(|| invalid("axial profile has no nodes"))?;
    let pin_powers = power.pin_powers(network.pins().len());

    let mut z = Vec::with_capacity(profile.nodes.len());
    let mut pins = Vec::with_capacity(profile.nodes.len());
    for node in &profile.nodes {
        let density = power.shape.density(node.z, length);
        let row = network
            .pins()
            .iter()
            .map(|pin| {
                let (t, h) = network.shares_of(pin.id).iter().fold((0.0, 0.0), |(t, h), s| {
                    let i = s.subchannel.idx();
                    (t + s.fraction * node.temperature[i], h + s.fraction * node.htc[i])
                });
                model.temperatures(diameter, t, h, pin_powers[pin.id.idx()] * density)
            })
            .collect::<PinResult<Vec<_>>>()?;
        z.push(node.z);
        pins.push(row);
    }
    Ok(PinProfile { z, pins })
}
