//! Core-wide inlet flow allocation (orificing).
//!
//! Each assembly's balance metric is treated as a function of `ln m`. The
//! slope comes from a secant through the last two rounds when one is
//! available, otherwise from a scaling model: temperature rises go as
//! `1/m` and pressure drops roughly as `m^1.8`. Under `Equalize` a common
//! target is found by bisection so the unlocked flows keep their total.

use ds_coolant::{CoolantModel, CoolantResult};
use ds_solver::AxialProfile;
use tracing::debug;

const MAX_LOG_STEP: f64 = std::f64::consts::LN_2;
const TARGET_BISECTIONS: usize = 200;
const PRESSURE_EXPONENT: f64 = 1.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceMetric {
    PeakCoolantTemperature,
    OutletTemperature,
    PressureDrop,
}

impl BalanceMetric {
    pub fn evaluate(&self, profile: &AxialProfile, coolant: &dyn CoolantModel) -> CoolantResult<f64> {
        match self {
            BalanceMetric::PeakCoolantTemperature => Ok(profile.peak_coolant().temperature),
            BalanceMetric::OutletTemperature => profile.mixed_outlet_temperature(coolant),
            BalanceMetric::PressureDrop => Ok(profile.pressure_drop.total()),
        }
    }

    /// d(metric)/d(ln m) when no history is available.
    fn model_slope(&self, value: f64, reference: f64) -> f64 {
        match self {
            BalanceMetric::PeakCoolantTemperature | BalanceMetric::OutletTemperature => {
                -(value - reference).max(1e-6)
            }
            BalanceMetric::PressureDrop => PRESSURE_EXPONENT * value.max(1e-6),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BalanceMode {
    /// Same metric in every unlocked assembly at fixed total flow.
    Equalize,
    /// Drive every unlocked assembly to `target`.
    Match { target: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceConfig {
    pub metric: BalanceMetric,
    pub mode: BalanceMode,
}

/// Flows and metrics of one round.
#[derive(Debug, Clone, Copy)]
pub struct BalancePoint<'a> {
    pub flows: &'a [f64],
    pub metrics: &'a [f64],
}

#[derive(Debug, Clone, PartialEq)]
pub struct Correction {
    pub flows: Vec<f64>,
    /// Largest unrelaxed `|ln m_new - ln m|` over unlocked assemblies.
    pub residual: f64,
    /// Max minus min metric over unlocked assemblies.
    pub spread: f64,
}

pub struct FlowBalancer<'a> {
    pub config: BalanceConfig,
    pub locked: &'a [bool],
    /// Inlet temperature for temperature metrics.
    pub reference: f64,
    pub relaxation: f64,
}

impl FlowBalancer<'_> {
    fn slopes(&self, current: BalancePoint<'_>, previous: Option<BalancePoint<'_>>) -> Vec<f64> {
        (0..current.flows.len())
            .map(|i| {
                let model = self.config.metric.model_slope(current.metrics[i], self.reference);
                let Some(prev) = previous else {
                    return model;
                };
                let dx = current.flows[i].ln() - prev.flows[i].ln();
                if dx.abs() < 1e-9 {
                    return model;
                }
                let secant = (current.metrics[i] - prev.metrics[i]) / dx;
                if secant.signum() == model.signum() && secant.is_finite() {
                    secant
                } else {
                    model
                }
            })
            .collect()
    }

    pub fn correct(
        &self,
        current: BalancePoint<'_>,
        previous: Option<BalancePoint<'_>>,
    ) -> Correction {
        let n = current.flows.len();
        let free: Vec<usize> = (0..n).filter(|&i| !self.locked[i]).collect();
        let slopes = self.slopes(current, previous);

        let (lo, hi) = free.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &i| {
            (lo.min(current.metrics[i]), hi.max(current.metrics[i]))
        });
        if free.is_empty() {
            return Correction {
                flows: current.flows.to_vec(),
                residual: 0.0,
                spread: 0.0,
            };
        }
        let spread = hi - lo;

        let step = |i: usize, target: f64| {
            ((target - current.metrics[i]) / slopes[i]).clamp(-MAX_LOG_STEP, MAX_LOG_STEP)
        };
        let target = match self.config.mode {
            BalanceMode::Match { target } => target,
            BalanceMode::Equalize => {
                let total: f64 = free.iter().map(|&i| current.flows[i]).sum();
                let excess = |y: f64| {
                    free.iter()
                        .map(|&i| current.flows[i] * step(i, y).exp())
                        .sum::<f64>()
                        - total
                };
                let (mut a, mut b) = (lo, hi);
                let fa = excess(a);
                for _ in 0..TARGET_BISECTIONS {
                    let mid = 0.5 * (a + b);
                    if (excess(mid) > 0.0) == (fa > 0.0) {
                        a = mid;
                    } else {
                        b = mid;
                    }
                    if b - a <= f64::EPSILON * b.abs().max(1.0) {
                        break;
                    }
                }
                0.5 * (a + b)
            }
        };

        let mut flows = current.flows.to_vec();
        let mut residual: f64 = 0.0;
        for &i in &free {
            let dx = step(i, target);
            residual = residual.max(dx.abs());
            flows[i] = current.flows[i] * (self.relaxation * dx).exp();
        }

        if self.config.mode == BalanceMode::Equalize {
            let before: f64 = free.iter().map(|&i| current.flows[i]).sum();
            let after: f64 = free.iter().map(|&i| flows[i]).sum();
            for &i in &free {
                flows[i] *= before / after;
            }
        }

        debug!(target, residual, spread, "flow balance correction");
        Correction {
            flows,
            residual,
            spread,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balancer(mode: BalanceMode, locked: &[bool]) -> FlowBalancer<'_> {
        FlowBalancer {
            config: BalanceConfig {
                metric: BalanceMetric::OutletTemperature,
                mode,
            },
            locked,
            reference: 600.0,
            relaxation: 1.0,
        }
    }

    /// `T = 600 + P / m` for three assemblies.
    fn outlet(powers: &[f64], flows: &[f64]) -> Vec<f64> {
        powers.iter().zip(flows).map(|(p, m)| 600.0 + p / m).collect()
    }

    #[test]
    fn equalize_conserves_total_flow() {
        let locked = [false; 3];
        let b = balancer(BalanceMode::Equalize, &locked);
        let flows = [2.0, 2.0, 2.0];
        let metrics = outlet(&[100.0, 150.0, 200.0], &flows);
        let c = b.correct(BalancePoint { flows: &flows, metrics: &metrics }, None);
        assert!((c.flows.iter().sum::<f64>() - 6.0).abs() < 1e-12);
        assert!(c.flows[0] < c.flows[1] && c.flows[1] < c.flows[2]);
        assert!((c.spread - 50.0).abs() < 1e-12);
    }

    #[test]
    fn secant_iteration_equalizes() {
        let locked = [false; 3];
        let b = balancer(BalanceMode::Equalize, &locked);
        let powers = [100.0, 150.0, 200.0];
        let mut flows = vec![2.0; 3];
        let mut history: Option<(Vec<f64>, Vec<f64>)> = None;
        let mut residual = f64::INFINITY;
        for _ in 0..20 {
            let metrics = outlet(&powers, &flows);
            let previous = history.as_ref().map(|(f, m)| BalancePoint { flows: f, metrics: m });
            let c = b.correct(BalancePoint { flows: &flows, metrics: &metrics }, previous);
            residual = c.residual;
            history = Some((flows.clone(), metrics));
            flows = c.flows;
            if residual < 1e-10 {
                break;
            }
        }
        assert!(residual < 1e-10);
        // Equal rise means flow proportional to power.
        assert!((flows[0] - 4.0 / 3.0).abs() < 1e-8);
        assert!((flows[2] - 8.0 / 3.0).abs() < 1e-8);
    }

    #[test]
    fn locked_assemblies_keep_their_flow() {
        let locked = [true, false, false];
        let b = balancer(BalanceMode::Equalize, &locked);
        let flows = [2.0, 2.0, 2.0];
        let metrics = outlet(&[100.0, 150.0, 200.0], &flows);
        let c = b.correct(BalancePoint { flows: &flows, metrics: &metrics }, None);
        assert_eq!(c.flows[0], 2.0);
        assert!((c.flows[1] + c.flows[2] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn match_mode_drives_to_target() {
        let locked = [false; 2];
        let b = balancer(BalanceMode::Match { target: 700.0 }, &locked);
        let flows = [1.0, 1.0];
        let metrics = outlet(&[100.0, 100.0], &flows);
        let c = b.correct(BalancePoint { flows: &flows, metrics: &metrics }, None);
        assert_eq!(c.residual, 0.0);
        assert_eq!(c.flows, vec![1.0, 1.0]);

        let b = balancer(BalanceMode::Match { target: 650.0 }, &locked);
        let c = b.correct(BalancePoint { flows: &flows, metrics: &metrics }, None);
        assert!(c.flows[0] > 1.0);
    }

    #[test]
    fn pressure_slope_is_positive() {
        assert!(BalanceMetric::PressureDrop.model_slope(5.0e4, 0.0) > 0.0);
        assert!(BalanceMetric::OutletTemperature.model_slope(700.0, 600.0) < 0.0);
    }
}
