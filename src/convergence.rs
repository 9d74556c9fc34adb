//! Checks that the fixed-step integrator converges to the adaptive reference solution.
//!
//! Euler is first order, so dividing the step by `refinement` should divide its deviation from
//! the reference by roughly the same factor.

use crate::error::SirError;
use crate::log::info;
use crate::parameters::Parameters;
use crate::trajectory::Trajectory;
use crate::{euler, reference};
use serde::{Deserialize, Serialize};

/// Default factor by which the step is divided for the refined run.
pub const DEFAULT_REFINEMENT: u32 = 10;

/// Deviation of the coarse Euler run from the reference above which the scheme is considered
/// unconverged for the default step size.
pub const DEFAULT_TOLERANCE: f64 = 1e-2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceReport {
    pub step: f64,
    pub refined_step: f64,
    /// Maximum deviation of the Euler run at `step` from the reference.
    pub coarse_deviation: f64,
    /// Maximum deviation of the Euler run at `refined_step` from the reference.
    pub refined_deviation: f64,
}

impl ConvergenceReport {
    /// Ratio of coarse to refined deviation. Close to the refinement factor for a first order
    /// method.
    #[must_use]
    pub fn order_ratio(&self) -> f64 {
        self.coarse_deviation / self.refined_deviation
    }

    /// True when refining the step brought Euler closer to the reference and the coarse run is
    /// already within `tolerance`.
    #[must_use]
    pub fn is_converged(&self, tolerance: f64) -> bool {
        self.refined_deviation < self.coarse_deviation && self.coarse_deviation < tolerance
    }
}

/// Runs Euler at `parameters.step` and at `parameters.step / refinement` and compares both with
/// the adaptive solution.
///
/// # Errors
///
/// Returns an error if `refinement` is zero or either integrator fails.
pub fn convergence_check(
    parameters: &Parameters,
    refinement: u32,
) -> Result<ConvergenceReport, SirError> {
    if refinement == 0 {
        return Err(SirError::InvalidParameter(
            "refinement factor must be at least 1".to_string(),
        ));
    }
    let refined = parameters.refined(refinement);
    let (reference, _) = reference::integrate(&refined)?;
    let coarse = euler::integrate(parameters)?;
    let fine = euler::integrate(&refined)?;

    let report = ConvergenceReport {
        step: parameters.step,
        refined_step: refined.step,
        coarse_deviation: deviation(&coarse, &reference)?,
        refined_deviation: deviation(&fine, &reference)?,
    };
    info!(
        "euler deviation from reference: {:e} at step {}, {:e} at step {} (ratio {:.2})",
        report.coarse_deviation,
        report.step,
        report.refined_deviation,
        report.refined_step,
        report.order_ratio()
    );
    Ok(report)
}

fn deviation(euler: &Trajectory, reference: &Trajectory) -> Result<f64, SirError> {
    euler
        .max_deviation(reference)
        .ok_or_else(|| SirError::SirError("cannot compare empty trajectories".to_string()))
}
