//! Flow split and diversion cross-flow.
//!
//! Every subchannel sees the same axial pressure drop over a step:
//! `dp = K_i m_i^2 + G_i` with `K_i = f_i dz / (2 rho_i D_h,i A_i^2)` and
//! `G_i = rho_i g dz`. Friction factors are re-evaluated at the latest
//! flows until the split stops moving; steps are under-relaxed and
//! backtracked whenever the residual rises. The change in each subchannel's
//! flow over the step is then carried by lateral flow through the gaps.

use ds_core::constants::G0_MPS2;
use ds_core::{SubchannelId, max_abs, relative_change};
use ds_geometry::SubchannelNetwork;

use crate::error::{MarchError, MarchResult};

const MAX_DROP_ITER: usize = 200;
/// Smallest relaxation factor of the split iteration.
const MIN_RELAX: f64 = 1.0 / 64.0;

/// Converged split for one step.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub flow: Vec<f64>,
    /// Total pressure drop over the step [Pa].
    pub pressure_drop: f64,
    /// Flow-weighted gravity head over the step [Pa].
    pub gravity_drop: f64,
    pub iterations: usize,
}

/// Inputs of one split solve.
pub struct SplitProblem<'a> {
    pub network: &'a SubchannelNetwork,
    pub density: &'a [f64],
    pub viscosity: &'a [f64],
    pub total_flow: f64,
    pub dz: f64,
    /// Height reported in errors.
    pub z: f64,
    pub max_iterations: usize,
    pub tolerance: f64,
}

/// One pass of the friction-factor map at a trial split.
struct Mapped {
    /// Split that carries the common drop with the trial friction factors.
    next: Vec<f64>,
    pressure_drop: f64,
    /// Largest relative difference between `next` and the trial split.
    residual: f64,
}

impl SplitProblem<'_> {
    /// Under-relaxed Picard iteration on friction factors, starting from
    /// `guess`.
    ///
    /// `friction(i, re)` returns the Darcy friction factor of subchannel `i`
    /// at Reynolds number `re`. A relaxed step is kept only when it lowers
    /// the residual; otherwise the relaxation factor is halved and the step
    /// retried. Every map evaluation counts against `max_iterations`.
    pub fn solve(
        &self,
        guess: &[f64],
        mut friction: impl FnMut(usize, f64) -> MarchResult<f64>,
    ) -> MarchResult<Split> {
        let gravity: Vec<f64> = self.density.iter().map(|rho| rho * G0_MPS2 * self.dz).collect();

        let mut flow = guess.to_vec();
        let mut state = self.map(&flow, &gravity, &mut friction)?;
        let mut relax = 1.0;
        let mut iterations = 1;
        loop {
            if state.residual < self.tolerance {
                return Ok(self.finish(state, &gravity, iterations));
            }
            if iterations >= self.max_iterations {
                break;
            }

            let trial: Vec<f64> = flow
                .iter()
                .zip(&state.next)
                .map(|(old, new)| old + relax * (new - old))
                .collect();
            let candidate = self.map(&trial, &gravity, &mut friction)?;
            iterations += 1;

            if candidate.residual < state.residual || relax <= MIN_RELAX {
                // Stagnated: the relaxed step moves neither the split nor
                // the drop.
                let settled = relax * state.residual < self.tolerance
                    && relative_change(candidate.pressure_drop, state.pressure_drop, f64::MIN_POSITIVE)
                        < self.tolerance;
                flow = trial;
                state = candidate;
                if settled {
                    return Ok(self.finish(state, &gravity, iterations));
                }
            } else {
                relax = (0.5 * relax).max(MIN_RELAX);
            }
        }

        Err(MarchError::FlowDivergence {
            z: self.z,
            iterations: self.max_iterations,
            residual: state.residual,
        })
    }

    fn map(
        &self,
        flow: &[f64],
        gravity: &[f64],
        friction: &mut impl FnMut(usize, f64) -> MarchResult<f64>,
    ) -> MarchResult<Mapped> {
        let subchannels = self.network.subchannels();
        let floor = 1e-12 * self.total_flow;

        let mut k = Vec::with_capacity(subchannels.len());
        for (i, sc) in subchannels.iter().enumerate() {
            let re = flow[i].max(floor) * sc.hydraulic_diameter / (sc.area * self.viscosity[i]);
            let f = friction(i, re)?;
            k.push(f * self.dz / (2.0 * self.density[i] * sc.hydraulic_diameter * sc.area * sc.area));
        }

        let pressure_drop = common_drop(&k, gravity, self.total_flow, self.z)?;
        let mut next: Vec<f64> = k
            .iter()
            .zip(gravity)
            .map(|(k, g)| ((pressure_drop - g).max(0.0) / k).sqrt())
            .collect();
        let scale = self.total_flow / next.iter().sum::<f64>();
        next.iter_mut().for_each(|m| *m *= scale);

        let residual = max_abs(
            next.iter()
                .zip(flow)
                .map(|(new, old)| relative_change(*new, *old, floor)),
        );
        Ok(Mapped {
            next,
            pressure_drop,
            residual,
        })
    }

    fn finish(&self, state: Mapped, gravity: &[f64], iterations: usize) -> Split {
        let gravity_drop = state
            .next
            .iter()
            .zip(gravity)
            .map(|(m, g)| m * g)
            .sum::<f64>()
            / self.total_flow;
        Split {
            flow: state.next,
            pressure_drop: state.pressure_drop,
            gravity_drop,
            iterations,
        }
    }
}

/// Pressure drop at which `sum_i sqrt((dp - G_i) / K_i)` equals `total`.
///
/// Safeguarded Newton on a bracket whose lower end is the largest gravity
/// head. If the other subchannels already carry the whole flow there, the
/// heaviest one would need down-flow.
pub(crate) fn common_drop(k: &[f64], gravity: &[f64], total: f64, z: f64) -> MarchResult<f64> {
    let (heaviest, head) = gravity
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, &g)| if g > best.1 { (i, g) } else { best });

    let flow_sum = |dp: f64| {
        k.iter().zip(gravity).fold((0.0, 0.0), |(s, ds), (&k, &g)| {
            let x = dp - g;
            if x > 0.0 {
                (s + (x / k).sqrt(), ds + 0.5 / (k * x).sqrt())
            } else {
                (s, ds)
            }
        })
    };

    let mut lo = head;
    if flow_sum(lo).0 >= total {
        return Err(MarchError::NegativeFlow {
            z,
            subchannel: SubchannelId::from_usize(heaviest),
        });
    }
    let k_max = k.iter().copied().fold(0.0, f64::max);
    let mut hi = lo + k_max * total * total;

    let mut x = 0.5 * (lo + hi);
    for _ in 0..MAX_DROP_ITER {
        let (s, ds) = flow_sum(x);
        let r = s - total;
        if r.abs() <= 1e-14 * total {
            break;
        }
        if r > 0.0 {
            hi = x;
        } else {
            lo = x;
        }
        let newton = x - r / ds;
        x = if newton > lo && newton < hi {
            newton
        } else {
            0.5 * (lo + hi)
        };
        if hi - lo <= f64::EPSILON * hi.abs() {
            break;
        }
    }
    Ok(x)
}

/// Diversion cross-flow [kg/s per gap] that carries `flow_in - flow_out`,
/// and the largest remaining node mass imbalance relative to the total.
pub fn diversion(network: &SubchannelNetwork, flow_in: &[f64], flow_out: &[f64]) -> (Vec<f64>, f64) {
    let rhs: Vec<f64> = flow_in.iter().zip(flow_out).map(|(a, b)| a - b).collect();
    let phi = network.laplacian().solve(&rhs);

    let cross: Vec<f64> = network
        .gaps()
        .iter()
        .map(|g| g.width * (phi[g.from.idx()] - phi[g.to.idx()]))
        .collect();

    let total: f64 = flow_in.iter().sum();
    let imbalance = network
        .subchannels()
        .iter()
        .map(|sc| {
            let out: f64 = network
                .gaps_of(sc.id)
                .iter()
                .map(|link| link.sign * cross[link.gap.idx()])
                .sum();
            (rhs[sc.id.idx()] - out).abs()
        })
        .fold(0.0, f64::max);

    (cross, imbalance / total.max(f64::MIN_POSITIVE))
}
