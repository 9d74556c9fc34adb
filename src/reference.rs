//! Adaptive-step reference solution of the SIR system.
//!
//! The system is handed to the Dormand-Prince 5(4) integrator from `ode_solvers`, which controls
//! its own step size against the tolerances below and reports the solution on the same grid the
//! fixed-step integrator uses (`Parameters::grid`, read off the solver's dense output). The
//! result is the baseline that Euler runs are checked against.

use crate::error::SirError;
use crate::log::{debug, trace};
use crate::model::{SirModel, SirState};
use crate::parameters::Parameters;
use crate::trajectory::Trajectory;
use ode_solvers::dop_shared::Stats;
use ode_solvers::dopri5::Dopri5;
use ode_solvers::{System, Vector3};

/// Relative tolerance of the adaptive solver.
pub const RELATIVE_TOLERANCE: f64 = 1.0e-10;
/// Absolute tolerance of the adaptive solver.
pub const ABSOLUTE_TOLERANCE: f64 = 1.0e-12;

type State = Vector3<f64>;

impl System<f64, State> for SirModel {
    fn system(&self, _t: f64, y: &State, dy: &mut State) {
        let derivative = self.derivative(&SirState::new(y[0], y[1], y[2]));
        dy[0] = derivative.s;
        dy[1] = derivative.i;
        dy[2] = derivative.r;
    }
}

/// Work done by the adaptive solver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolverStats {
    pub evaluations: u32,
    pub accepted_steps: u32,
    pub rejected_steps: u32,
}

impl SolverStats {
    fn add(&mut self, stats: &Stats) {
        self.evaluations += stats.num_eval;
        self.accepted_steps += stats.accepted_steps;
        self.rejected_steps += stats.rejected_steps;
    }
}

/// Solves the system from t = 0 to `parameters.days` with the adaptive solver. The trajectory
/// has one sample per point of `parameters.grid()`.
///
/// # Errors
///
/// Returns `SirError::InvalidParameter` if the parameters do not validate and
/// `SirError::Integration` if the solver fails to reach the end of the horizon.
pub fn integrate(parameters: &Parameters) -> Result<(Trajectory, SolverStats), SirError> {
    parameters.validate()?;
    let model = parameters.model();
    let times = parameters.grid();
    let full_steps = parameters.full_steps();
    debug!(
        "reference: integrating over {} days, output every {}",
        parameters.days, parameters.step
    );

    let initial = parameters.initial;
    let mut stats = SolverStats::default();
    let mut samples = dense_samples(
        model,
        0.0,
        State::new(initial.s, initial.i, initial.r),
        parameters.step,
        full_steps,
        &mut stats,
    )?;
    if parameters.final_step() > 0.0 {
        let start = samples[full_steps];
        let tail = dense_samples(
            model,
            times[full_steps],
            start,
            parameters.final_step(),
            1,
            &mut stats,
        )?;
        samples.push(tail[1]);
    }
    trace!("reference: {:?}", stats);

    let mut trajectory = Trajectory::with_capacity(times.len());
    trajectory.push(0.0, initial);
    for (t, y) in times.iter().zip(&samples).skip(1) {
        trajectory.push(*t, SirState::new(y[0], y[1], y[2]));
    }
    if trajectory.len() != times.len() {
        return Err(SirError::Integration(format!(
            "adaptive solver produced {} of {} samples",
            trajectory.len(),
            times.len()
        )));
    }
    Ok((trajectory, stats))
}

/// Solves from `(t0, y0)` and returns the dense output at `t0 + k * dx` for `k = 0..=count`.
/// The solver is run one interval past the last sample, as its accumulated output time can
/// overshoot `t0 + count * dx` by a rounding error and would otherwise drop that sample.
#[allow(clippy::cast_precision_loss)]
fn dense_samples(
    model: SirModel,
    t0: f64,
    y0: State,
    dx: f64,
    count: usize,
    stats: &mut SolverStats,
) -> Result<Vec<State>, SirError> {
    let t_end = t0 + (count + 1) as f64 * dx;
    let mut stepper = Dopri5::new(
        model,
        t0,
        t_end,
        dx,
        y0,
        RELATIVE_TOLERANCE,
        ABSOLUTE_TOLERANCE,
    );
    let solver_stats = stepper
        .integrate()
        .map_err(|e| SirError::Integration(format!("adaptive solver failed: {e:?}")))?;
    stats.add(&solver_stats);

    let samples = stepper.y_out();
    if samples.len() <= count {
        return Err(SirError::Integration(format!(
            "adaptive solver stopped at t = {:?} before reaching {}",
            stepper.x_out().last(),
            t0 + count as f64 * dx
        )));
    }
    Ok(samples[..=count].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_almost_eq;
    use crate::euler;
    use crate::numeric::POPULATION_TOLERANCE;

    #[test]
    fn starts_at_initial_state_and_reaches_horizon() {
        let parameters = Parameters::default();
        let (trajectory, stats) = integrate(&parameters).unwrap();
        assert_eq!(trajectory.times()[0], 0.0);
        assert_eq!(trajectory.states()[0], parameters.initial);
        assert_eq!(trajectory.final_time(), Some(180.0));
        assert_eq!(trajectory.len(), 1801);
        assert!(stats.accepted_steps > 0);
        assert!(stats.evaluations >= stats.accepted_steps);
    }

    #[test]
    fn output_grid_matches_euler() {
        for (days, step) in [(180, 0.1), (100, 0.01), (7, 0.7), (1, 0.4), (10, 3.0), (30, 0.25)] {
            let parameters = Parameters {
                days,
                step,
                ..Parameters::default()
            };
            let (reference, _) = integrate(&parameters).unwrap();
            let euler = euler::integrate(&parameters).unwrap();
            assert_eq!(reference.len(), euler.len(), "days {days}, step {step}");
            assert_eq!(reference.times(), euler.times(), "days {days}, step {step}");
            assert_eq!(reference.final_time(), Some(f64::from(days)));
        }
    }

    #[test]
    fn short_last_step_continues_the_solution() {
        // The short last step must land on the same curve as a run that hits the horizon exactly.
        let uneven = Parameters {
            days: 10,
            step: 3.0,
            ..Parameters::default()
        };
        let even = Parameters {
            step: 1.0,
            ..uneven.clone()
        };
        let (uneven, _) = integrate(&uneven).unwrap();
        let (even, _) = integrate(&even).unwrap();
        let a = uneven.final_state().unwrap();
        let b = even.final_state().unwrap();
        assert!(a.max_abs_diff(&b) < 1e-7, "{a:?} vs {b:?}");
    }

    #[test]
    fn population_is_conserved() {
        let (trajectory, _) = integrate(&Parameters::default()).unwrap();
        assert!(trajectory.max_conservation_error() < POPULATION_TOLERANCE);
    }

    #[test]
    fn matches_final_size_relation() {
        // With R(0) = 0 the SIR model satisfies S(inf) = S(0) * exp(-R0 * (1 - S(inf))).
        let parameters = Parameters {
            days: 400,
            ..Parameters::default()
        };
        let (trajectory, _) = integrate(&parameters).unwrap();
        let s_inf = trajectory.final_state().unwrap().s;
        let expected = parameters.initial.s * (-parameters.r0() * (1.0 - s_inf)).exp();
        assert_almost_eq!(s_inf, expected, 1e-4);
    }

    #[test]
    fn susceptible_never_increases() {
        let (trajectory, _) = integrate(&Parameters::default()).unwrap();
        for pair in trajectory.states().windows(2) {
            assert!(pair[1].s <= pair[0].s + 1e-12);
        }
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let parameters = Parameters {
            days: 0,
            ..Parameters::default()
        };
        assert!(matches!(
            integrate(&parameters),
            Err(SirError::InvalidParameter(_))
        ));
    }
}
