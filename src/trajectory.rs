//! A solution of the SIR system sampled on a time grid, and the quantities derived from it.

use crate::model::SirState;
use crate::parameters::Parameters;
use serde::{Deserialize, Serialize};

/// Time points and the state at each of them. Both vectors have the same length and the times
/// are strictly increasing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    times: Vec<f64>,
    states: Vec<SirState>,
}

impl Trajectory {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Trajectory {
            times: Vec::with_capacity(capacity),
            states: Vec::with_capacity(capacity),
        }
    }

    /// Appends a sample. Samples that do not advance time are dropped, which can happen when a
    /// solver emits its final point twice.
    pub fn push(&mut self, time: f64, state: SirState) {
        if self.times.last().is_some_and(|&last| time <= last) {
            return;
        }
        self.times.push(time);
        self.states.push(state);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    #[must_use]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    #[must_use]
    pub fn states(&self) -> &[SirState] {
        &self.states
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, &SirState)> {
        self.times.iter().copied().zip(self.states.iter())
    }

    #[must_use]
    pub fn final_state(&self) -> Option<SirState> {
        self.states.last().copied()
    }

    #[must_use]
    pub fn final_time(&self) -> Option<f64> {
        self.times.last().copied()
    }

    /// Time and value of the largest infectious fraction.
    #[must_use]
    pub fn peak_infectious(&self) -> Option<(f64, f64)> {
        self.iter()
            .map(|(t, state)| (t, state.i))
            .fold(None, |peak, (t, i)| match peak {
                Some((_, best)) if best >= i => peak,
                _ => Some((t, i)),
            })
    }

    /// `max |S + I + R - 1|` over all samples.
    #[must_use]
    pub fn max_conservation_error(&self) -> f64 {
        self.states
            .iter()
            .map(|state| (state.total() - 1.0).abs())
            .fold(0.0, f64::max)
    }

    /// The state at time `t`, linearly interpolated between samples. Times outside the sampled
    /// range are clamped to the first or last sample.
    #[must_use]
    pub fn state_at(&self, t: f64) -> Option<SirState> {
        let first = *self.times.first()?;
        let last = *self.times.last()?;
        if t <= first {
            return self.states.first().copied();
        }
        if t >= last {
            return self.states.last().copied();
        }
        // First index with time > t; it is at least 1 because t > first.
        let upper = self.times.partition_point(|&time| time <= t);
        let lower = upper - 1;
        let (t0, t1) = (self.times[lower], self.times[upper]);
        let weight = (t - t0) / (t1 - t0);
        Some(self.states[lower].lerp(&self.states[upper], weight))
    }

    /// Largest componentwise difference between `self` and `other`, evaluated at every time
    /// point of `self` with `other` interpolated.
    #[must_use]
    pub fn max_deviation(&self, other: &Trajectory) -> Option<f64> {
        if other.is_empty() {
            return None;
        }
        self.iter()
            .filter_map(|(t, state)| other.state_at(t).map(|theirs| state.max_abs_diff(&theirs)))
            .reduce(f64::max)
    }

    /// Derived epidemiological figures for a run with the given parameters.
    #[must_use]
    pub fn summary(&self, parameters: &Parameters) -> Option<EpidemicSummary> {
        let final_state = self.final_state()?;
        let (peak_time, peak_infectious) = self.peak_infectious()?;
        let model = parameters.model();
        Some(EpidemicSummary {
            r0: model.r0(),
            herd_immunity_threshold: model.herd_immunity_threshold(),
            peak_time,
            peak_infectious,
            final_susceptible: final_state.s,
            final_infectious: final_state.i,
            final_recovered: final_state.r,
            attack_rate: parameters.initial.s - final_state.s,
            conservation_error: self.max_conservation_error(),
        })
    }
}

/// Headline numbers of a simulated epidemic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpidemicSummary {
    pub r0: f64,
    pub herd_immunity_threshold: f64,
    pub peak_time: f64,
    pub peak_infectious: f64,
    pub final_susceptible: f64,
    pub final_infectious: f64,
    pub final_recovered: f64,
    /// Fraction of the population infected over the course of the run.
    pub attack_rate: f64,
    pub conservation_error: f64,
}
