//! Model parameters and their validation.
//!
//! Parameters come from three places, applied in order: the built-in defaults (or a named
//! preset), an optional JSON config file, and finally command line flags. The last two are
//! `ParameterOverrides`, so a config file only needs to name the fields it wants to change:
//!
//! ```json
//! { "beta": 0.3, "days": 120 }
//! ```

use crate::error::SirError;
use crate::log::{debug, trace};
use crate::model::{SirModel, SirState};
use crate::numeric::is_positive_finite;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// How far the initial fractions may be from summing to one.
const INITIAL_SUM_TOLERANCE: f64 = 1e-9;

/// Relative slack when deciding whether `step` divides the horizon.
const GRID_TOLERANCE: f64 = 1e-9;

/// Everything needed to run one simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Parameters {
    /// Transmission rate
    pub beta: f64,
    /// Recovery rate
    pub gamma: f64,
    /// Length of the simulation in days
    pub days: u32,
    /// Sample time. The fixed-step integrator advances by exactly this much; the adaptive solver
    /// reports its solution on the same grid.
    pub step: f64,
    /// Population fractions at t = 0
    pub initial: SirState,
}

impl Default for Parameters {
    fn default() -> Self {
        Preset::Covid.parameters()
    }
}

/// Named parameter sets for well known diseases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// R0 = 2.3 with a 14 day infectious period
    Covid,
    /// R0 = 15 with an 8 day infectious period
    Measles,
}

impl Preset {
    #[must_use]
    pub fn parameters(self) -> Parameters {
        let (r0, infectious_period) = match self {
            Preset::Covid => (2.3, 14.0),
            Preset::Measles => (15.0, 8.0),
        };
        Parameters {
            beta: r0 / infectious_period,
            gamma: 1.0 / infectious_period,
            days: 180,
            step: 0.1,
            initial: SirState::new(0.999, 0.001, 0.0),
        }
    }
}

impl Parameters {
    #[must_use]
    pub fn model(&self) -> SirModel {
        SirModel::new(self.beta, self.gamma)
    }

    /// Basic reproduction number `beta / gamma`.
    #[must_use]
    pub fn r0(&self) -> f64 {
        self.model().r0()
    }

    #[must_use]
    pub fn horizon(&self) -> f64 {
        f64::from(self.days)
    }

    /// Number of whole steps of length `step` that fit in the horizon. A ratio within rounding
    /// of an integer counts as exact, so `100 / 0.01` gives 10000.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn full_steps(&self) -> usize {
        let ratio = self.horizon() / self.step;
        let nearest = ratio.round();
        if (ratio - nearest).abs() <= GRID_TOLERANCE * nearest.max(1.0) {
            nearest as usize
        } else {
            ratio.floor() as usize
        }
    }

    /// Length of the shorter last step that ends exactly on the horizon. Zero when `step`
    /// divides `days`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn final_step(&self) -> f64 {
        let rest = self.horizon() - self.full_steps() as f64 * self.step;
        if rest > GRID_TOLERANCE * self.horizon() {
            rest
        } else {
            0.0
        }
    }

    /// Output time points shared by both integrators: `t_k = k * step` while it stays inside
    /// the horizon, then the horizon itself. Starts at 0 and ends at exactly `days`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn grid(&self) -> Vec<f64> {
        let full = self.full_steps();
        let mut times = Vec::with_capacity(full + 2);
        // Multiplying avoids the drift of accumulating `t += h`.
        times.extend((0..full).map(|k| k as f64 * self.step));
        if self.final_step() > 0.0 {
            times.push(full as f64 * self.step);
        }
        times.push(self.horizon());
        times
    }

    /// Returns a copy with the step divided by `factor`.
    #[must_use]
    pub fn refined(&self, factor: u32) -> Parameters {
        Parameters {
            step: self.step / f64::from(factor),
            ..self.clone()
        }
    }

    /// Checks that the parameters describe a well posed problem.
    ///
    /// # Errors
    ///
    /// Returns `SirError::InvalidParameter` naming the first field that is out of range.
    pub fn validate(&self) -> Result<(), SirError> {
        if !is_positive_finite(self.beta) {
            return Err(invalid(format!(
                "beta must be a positive number, got {}",
                self.beta
            )));
        }
        if !is_positive_finite(self.gamma) {
            return Err(invalid(format!(
                "gamma must be a positive number, got {}",
                self.gamma
            )));
        }
        if self.days == 0 {
            return Err(invalid("days must be at least 1".to_string()));
        }
        if !is_positive_finite(self.step) {
            return Err(invalid(format!(
                "step must be a positive number, got {}",
                self.step
            )));
        }
        if self.step > self.horizon() {
            return Err(invalid(format!(
                "step ({}) must not exceed the horizon of {} days",
                self.step, self.days
            )));
        }
        for (name, value) in [
            ("susceptible", self.initial.s),
            ("infectious", self.initial.i),
            ("recovered", self.initial.r),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(format!(
                    "initial {name} fraction must lie in [0, 1], got {value}"
                )));
            }
        }
        let total = self.initial.total();
        if (total - 1.0).abs() > INITIAL_SUM_TOLERANCE {
            return Err(invalid(format!(
                "initial fractions must sum to 1, got {total}"
            )));
        }
        if self.step * self.model().stiffness() >= 1.0 {
            debug!(
                "step {} is large relative to the rates (beta {}, gamma {}); Euler results may be inaccurate",
                self.step, self.beta, self.gamma
            );
        }
        Ok(())
    }

    /// Reads parameters from a JSON file. Fields missing from the file keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON for `Parameters`.
    pub fn from_json_file(path: &Path) -> Result<Parameters, SirError> {
        let mut parameters = Parameters::default();
        ParameterOverrides::from_json_file(path)?.apply_to(&mut parameters);
        Ok(parameters)
    }
}

/// A partial set of parameters. Only the fields that are set replace the base values.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterOverrides {
    pub beta: Option<f64>,
    pub gamma: Option<f64>,
    pub days: Option<u32>,
    pub step: Option<f64>,
    pub initial: Option<SirState>,
}

impl ParameterOverrides {
    /// Reads overrides from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or names an unknown field.
    pub fn from_json_file(path: &Path) -> Result<ParameterOverrides, SirError> {
        trace!("loading parameters from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let overrides: ParameterOverrides = serde_json::from_str(&contents)?;
        Ok(overrides)
    }

    pub fn apply_to(&self, parameters: &mut Parameters) {
        if let Some(beta) = self.beta {
            parameters.beta = beta;
        }
        if let Some(gamma) = self.gamma {
            parameters.gamma = gamma;
        }
        if let Some(days) = self.days {
            parameters.days = days;
        }
        if let Some(step) = self.step {
            parameters.step = step;
        }
        if let Some(initial) = self.initial {
            parameters.initial = initial;
        }
    }
}

fn invalid(message: String) -> SirError {
    SirError::InvalidParameter(message)
}
