//! Assembly power: total, axial shape and radial pin peaking.

use std::f64::consts::PI;

use ds_core::Power;

use crate::error::{MarchResult, invalid_input};

/// Piecewise-constant relative power density over `[z_start, z_end]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerRegion {
    pub z_start: f64,
    pub z_end: f64,
    pub weight: f64,
}

/// Axial distribution of linear power.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AxialPowerShape {
    #[default]
    Uniform,
    /// Cosine over the bundle length extended by `extrapolation_length` at
    /// both ends.
    ChoppedCosine { extrapolation_length: f64 },
    Tabulated { regions: Vec<PowerRegion> },
}

impl AxialPowerShape {
    pub fn validate(&self, length: f64) -> MarchResult<()> {
        match self {
            AxialPowerShape::Uniform => Ok(()),
            AxialPowerShape::ChoppedCosine {
                extrapolation_length,
            } => {
                if extrapolation_length.is_finite() && *extrapolation_length >= 0.0 {
                    Ok(())
                } else {
                    Err(invalid_input(format!(
                        "extrapolation length must be >= 0, got {extrapolation_length}"
                    )))
                }
            }
            AxialPowerShape::Tabulated { regions } => {
                for r in regions {
                    if !(r.z_end > r.z_start) || !r.weight.is_finite() || r.weight < 0.0 {
                        return Err(invalid_input(format!(
                            "bad power region [{}, {}] with weight {}",
                            r.z_start, r.z_end, r.weight
                        )));
                    }
                }
                if tabulated_norm(regions, length) <= 0.0 {
                    return Err(invalid_input("tabulated power shape has no power in the bundle"));
                }
                Ok(())
            }
        }
    }

    /// Region boundaries the axial mesh must land on.
    pub fn breakpoints(&self) -> Vec<f64> {
        match self {
            AxialPowerShape::Tabulated { regions } => regions
                .iter()
                .flat_map(|r| [r.z_start, r.z_end])
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Fraction of the axial power in `[z0, z1]`.
    pub fn fraction(&self, z0: f64, z1: f64, length: f64) -> f64 {
        match self {
            AxialPowerShape::Uniform => (z1 - z0) / length,
            AxialPowerShape::ChoppedCosine {
                extrapolation_length,
            } => {
                let le = length + 2.0 * extrapolation_length;
                let integral = |z: f64| (PI * (z - length / 2.0) / le).sin();
                (integral(z1) - integral(z0)) / (integral(length) - integral(0.0))
            }
            AxialPowerShape::Tabulated { regions } => {
                let norm = tabulated_norm(regions, length);
                let inside: f64 = regions.iter().map(|r| r.weight * overlap(r, z0, z1)).sum();
                inside / norm
            }
        }
    }

    /// Normalized linear power density at `z` (integrates to 1 over the length).
    pub fn density(&self, z: f64, length: f64) -> f64 {
        match self {
            AxialPowerShape::Uniform => 1.0 / length,
            AxialPowerShape::ChoppedCosine {
                extrapolation_length,
            } => {
                let le = length + 2.0 * extrapolation_length;
                let norm = 2.0 * le / PI * (PI * length / (2.0 * le)).sin();
                (PI * (z - length / 2.0) / le).cos() / norm
            }
            AxialPowerShape::Tabulated { regions } => {
                let norm = tabulated_norm(regions, length);
                regions
                    .iter()
                    .find(|r| z >= r.z_start && z <= r.z_end)
                    .map_or(0.0, |r| r.weight / norm)
            }
        }
    }
}

fn tabulated_norm(regions: &[PowerRegion], length: f64) -> f64 {
    regions
        .iter()
        .map(|r| r.weight * overlap(r, 0.0, length))
        .sum()
}

fn overlap(region: &PowerRegion, z0: f64, z1: f64) -> f64 {
    (region.z_end.min(z1) - region.z_start.max(z0)).max(0.0)
}

/// Heat generated in one assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyPower {
    pub total: Power,
    pub shape: AxialPowerShape,
    /// Relative pin powers in pin order; normalized to a mean of one.
    /// `None` means a flat radial profile.
    pub pin_peaking: Option<Vec<f64>>,
}

impl AssemblyPower {
    pub fn uniform(total: Power) -> Self {
        Self {
            total,
            shape: AxialPowerShape::Uniform,
            pin_peaking: None,
        }
    }

    pub fn with_shape(mut self, shape: AxialPowerShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_pin_peaking(mut self, peaking: Vec<f64>) -> Self {
        self.pin_peaking = Some(peaking);
        self
    }

    pub fn validate(&self, pin_count: usize, length: f64) -> MarchResult<()> {
        let total = self.total.value;
        if !total.is_finite() || total < 0.0 {
            return Err(invalid_input(format!("assembly power must be >= 0, got {total}")));
        }
        self.shape.validate(length)?;
        if let Some(peaking) = &self.pin_peaking {
            if peaking.len() != pin_count {
                return Err(invalid_input(format!(
                    "{} pin peaking factors for {} pins",
                    peaking.len(),
                    pin_count
                )));
            }
            if peaking.iter().any(|p| !p.is_finite() || *p < 0.0)
                || peaking.iter().sum::<f64>() <= 0.0
            {
                return Err(invalid_input("pin peaking factors must be >= 0 with a positive sum"));
            }
        }
        Ok(())
    }

    /// Total power of each pin [W].
    pub fn pin_powers(&self, pin_count: usize) -> Vec<f64> {
        let total = self.total.value;
        match &self.pin_peaking {
            Some(peaking) if peaking.len() == pin_count => {
                let sum: f64 = peaking.iter().sum();
                peaking.iter().map(|p| total * p / sum).collect()
            }
            _ => vec![total / pin_count.max(1) as f64; pin_count],
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn cosine_fractions_are_additive(
            extrapolation in 0.0_f64..1.0,
            length in 0.2_f64..4.0,
            split in 0.01_f64..0.99,
        ) {
            let shape = AxialPowerShape::ChoppedCosine { extrapolation_length: extrapolation };
            let z = split * length;
            let lower = shape.fraction(0.0, z, length);
            let upper = shape.fraction(z, length, length);
            prop_assert!(lower > 0.0 && upper > 0.0);
            prop_assert!((lower + upper - 1.0).abs() < 1e-12);
        }

        #[test]
        fn pin_powers_sum_to_total(
            total in 0.0_f64..1e7,
            peaking in proptest::collection::vec(0.1_f64..3.0, 7),
        ) {
            let power = AssemblyPower::uniform(ds_core::watts(total)).with_pin_peaking(peaking);
            let sum: f64 = power.pin_powers(7).iter().sum();
            prop_assert!((sum - total).abs() <= 1e-9 * total.max(1.0));
        }
    }
}
