//! Floating point comparison helpers built on the `approx` crate.
//!
//! The integrators accumulate rounding error over thousands of steps, so the checks here are
//! always tolerance based. `POPULATION_TOLERANCE` is the drift allowed in `S + I + R` before a
//! trajectory is considered to have lost mass.

use approx::AbsDiffEq;

/// Maximum allowed deviation of `S + I + R` from one over a full run.
pub const POPULATION_TOLERANCE: f64 = 1e-9;

/// Compares if two floats are close via `approx::abs_diff_eq` using a maximum absolute difference
/// (epsilon) of `acc`.
#[must_use]
pub fn almost_eq(a: f64, b: f64, acc: f64) -> bool {
    if a.is_infinite() && b.is_infinite() {
        return a == b;
    }
    a.abs_diff_eq(&b, acc)
}

/// Returns true if `value` is finite and strictly greater than zero.
#[must_use]
pub fn is_positive_finite(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Asserts that two floats are within `prec` of each other.
#[macro_export]
macro_rules! assert_almost_eq {
    ($a:expr, $b:expr, $prec:expr $(,)?) => {
        if !$crate::numeric::almost_eq($a, $b, $prec) {
            panic!(
                "assertion failed: `abs(left - right) < {:e}`, (left: `{}`, right: `{}`)",
                $prec, $a, $b
            );
        }
    };
}
pub use assert_almost_eq;
