//! The SIR compartmental model.
//!
//! The population is split into three fractions that always sum to one:
//!
//! ```text
//! dS(t)/dt = -Beta * I(t) * S(t)
//! dI(t)/dt =  Beta * I(t) * S(t) - Gamma * I(t)
//! dR(t)/dt =  Gamma * I(t)
//! ```
//!
//! The derivatives sum to zero, which is what keeps `S + I + R` constant. An epidemic takes off
//! (`dI/dt > 0` at the start) if and only if `R0 = Beta / Gamma > 1`.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul};

/// Population fractions at a single point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SirState {
    /// Susceptible
    pub s: f64,
    /// Infectious
    pub i: f64,
    /// Recovered
    pub r: f64,
}

impl SirState {
    #[must_use]
    pub const fn new(s: f64, i: f64, r: f64) -> Self {
        SirState { s, i, r }
    }

    /// `S + I + R`. Equal to one for a valid state, up to rounding.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.s + self.i + self.r
    }

    /// Largest absolute componentwise difference between two states.
    #[must_use]
    pub fn max_abs_diff(&self, other: &SirState) -> f64 {
        (self.s - other.s)
            .abs()
            .max((self.i - other.i).abs())
            .max((self.r - other.r).abs())
    }

    /// Linear interpolation, `weight = 0` gives `self` and `weight = 1` gives `other`.
    #[must_use]
    pub fn lerp(&self, other: &SirState, weight: f64) -> SirState {
        *self * (1.0 - weight) + *other * weight
    }
}

impl Add for SirState {
    type Output = SirState;

    fn add(self, rhs: SirState) -> SirState {
        SirState::new(self.s + rhs.s, self.i + rhs.i, self.r + rhs.r)
    }
}

impl Mul<f64> for SirState {
    type Output = SirState;

    fn mul(self, rhs: f64) -> SirState {
        SirState::new(self.s * rhs, self.i * rhs, self.r * rhs)
    }
}

/// The rate constants of the model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SirModel {
    /// Transmission rate
    pub beta: f64,
    /// Recovery rate, the inverse of the infectious period
    pub gamma: f64,
}

impl SirModel {
    #[must_use]
    pub const fn new(beta: f64, gamma: f64) -> Self {
        SirModel { beta, gamma }
    }

    /// Basic reproduction number.
    #[must_use]
    pub fn r0(&self) -> f64 {
        self.beta / self.gamma
    }

    /// Fraction of the population that must be immune for the epidemic to decline. Zero when the
    /// disease cannot spread in the first place.
    #[must_use]
    pub fn herd_immunity_threshold(&self) -> f64 {
        let r0 = self.r0();
        if r0 <= 1.0 {
            0.0
        } else {
            1.0 - 1.0 / r0
        }
    }

    /// Time derivative of the state. The three components always sum to zero.
    #[must_use]
    pub fn derivative(&self, state: &SirState) -> SirState {
        let infections = self.beta * state.i * state.s;
        let recoveries = self.gamma * state.i;
        SirState::new(-infections, infections - recoveries, recoveries)
    }

    /// The largest rate in the system. Explicit Euler needs `step * stiffness() < 1` to stay
    /// well behaved.
    #[must_use]
    pub fn stiffness(&self) -> f64 {
        self.beta.max(self.gamma)
    }
}
