//! Fixed-step explicit Euler integration of the SIR system.
//!
//! Each step evaluates the derivative at the current state and moves along it for one step:
//!
//! ```text
//! S[k+1] = S[k] - Beta*I[k]*S[k]*h
//! I[k+1] = I[k] + Beta*I[k]*S[k]*h - Gamma*I[k]*h
//! R[k+1] = R[k] + Gamma*I[k]*h
//! ```
//!
//! There is no error control. The scheme is first order, so halving `h` roughly halves the
//! global error, and it needs `h` small relative to `1 / max(Beta, Gamma)`.

use crate::error::SirError;
use crate::log::{debug, trace};
use crate::model::{SirModel, SirState};
use crate::parameters::Parameters;
use crate::trajectory::Trajectory;

/// Advances `state` by one explicit Euler step of length `h`.
#[must_use]
pub fn step(model: &SirModel, state: &SirState, h: f64) -> SirState {
    *state + model.derivative(state) * h
}

/// Integrates from t = 0 to `parameters.days` on the grid `t_k = k * step`. When `step` does not
/// divide `days` the last step is shortened so the run ends exactly on the horizon.
///
/// # Errors
///
/// Returns `SirError::InvalidParameter` if the parameters do not validate.
pub fn integrate(parameters: &Parameters) -> Result<Trajectory, SirError> {
    parameters.validate()?;
    let model = parameters.model();
    let h = parameters.step;
    let full_steps = parameters.full_steps();
    let times = parameters.grid();
    debug!(
        "euler: integrating {} steps of {} over {} days",
        times.len() - 1,
        h,
        parameters.days
    );

    let mut trajectory = Trajectory::with_capacity(times.len());
    let mut state = parameters.initial;
    trajectory.push(0.0, state);
    for (k, &t) in times.iter().enumerate().skip(1) {
        let dt = if k <= full_steps {
            h
        } else {
            parameters.final_step()
        };
        state = step(&model, &state, dt);
        trajectory.push(t, state);
    }

    trace!(
        "euler: finished with state {:?}, conservation error {:e}",
        trajectory.final_state(),
        trajectory.max_conservation_error()
    );
    Ok(trajectory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_almost_eq;
    use crate::numeric::POPULATION_TOLERANCE;

    #[test]
    fn single_step_matches_recurrence() {
        let model = SirModel::new(0.5, 0.25);
        let next = step(&model, &SirState::new(0.8, 0.2, 0.0), 0.1);
        assert_almost_eq!(next.s, 0.8 - 0.5 * 0.2 * 0.8 * 0.1, 1e-15);
        assert_almost_eq!(next.i, 0.2 + 0.5 * 0.2 * 0.8 * 0.1 - 0.25 * 0.2 * 0.1, 1e-15);
        assert_almost_eq!(next.r, 0.25 * 0.2 * 0.1, 1e-15);
    }

    #[test]
    fn grid_covers_horizon() {
        let trajectory = integrate(&Parameters::default()).unwrap();
        assert_eq!(trajectory.len(), 1801);
        assert_eq!(trajectory.times()[0], 0.0);
        assert_almost_eq!(trajectory.final_time().unwrap(), 180.0, 1e-9);
        assert_eq!(trajectory.states()[0], Parameters::default().initial);
    }

    #[test]
    fn short_last_step_lands_on_horizon() {
        let parameters = Parameters {
            days: 1,
            step: 0.4,
            ..Parameters::default()
        };
        let trajectory = integrate(&parameters).unwrap();
        assert_eq!(trajectory.len(), 4);
        assert_eq!(trajectory.final_time(), Some(1.0));

        let model = parameters.model();
        let mut expected = parameters.initial;
        for h in [0.4, 0.4, parameters.final_step()] {
            expected = step(&model, &expected, h);
        }
        assert_eq!(trajectory.final_state(), Some(expected));
    }

    #[test]
    fn population_is_conserved() {
        let trajectory = integrate(&Parameters::default()).unwrap();
        assert!(trajectory.max_conservation_error() < POPULATION_TOLERANCE);
    }

    #[test]
    fn susceptible_never_increases() {
        let trajectory = integrate(&Parameters::default()).unwrap();
        for pair in trajectory.states().windows(2) {
            assert!(pair[1].s <= pair[0].s);
        }
    }

    #[test]
    fn recovered_never_decreases() {
        let trajectory = integrate(&Parameters::default()).unwrap();
        for pair in trajectory.states().windows(2) {
            assert!(pair[1].r >= pair[0].r);
        }
    }

    #[test]
    fn epidemic_peaks_then_decays_when_r0_above_one() {
        let parameters = Parameters::default();
        let trajectory = integrate(&parameters).unwrap();
        let states = trajectory.states();
        // Grows initially.
        assert!(states[1].i > states[0].i);

        let (peak_time, peak) = trajectory.peak_infectious().unwrap();
        assert!(peak_time > 0.0 && peak_time < 180.0);
        assert!(peak > 0.1);

        let last = trajectory.final_state().unwrap();
        assert!(last.i < 0.01);
        assert!(last.r > 0.8);
    }

    #[test]
    fn infection_dies_out_when_r0_at_most_one() {
        for beta in [0.05, 0.1] {
            let parameters = Parameters {
                beta,
                gamma: 0.1,
                ..Parameters::default()
            };
            let trajectory = integrate(&parameters).unwrap();
            for pair in trajectory.states().windows(2) {
                assert!(pair[1].i <= pair[0].i);
            }
        }
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let parameters = Parameters {
            gamma: -1.0,
            ..Parameters::default()
        };
        assert!(matches!(
            integrate(&parameters),
            Err(SirError::InvalidParameter(_))
        ));
    }
}
