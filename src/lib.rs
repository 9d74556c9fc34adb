//! A deterministic simulator for the SIR epidemic model
//!
//! The SIR model splits a population into susceptible, infectious and recovered fractions and
//! evolves them with three coupled ordinary differential equations driven by a transmission
//! rate `beta` and a recovery rate `gamma`. Their ratio, `R0 = beta / gamma`, decides whether
//! an outbreak grows.
//!
//! Two integrators produce the same `Trajectory` shape:
//! * `reference`: an adaptive-step Dormand-Prince solver, used as the accurate baseline.
//! * `euler`: a fixed-step explicit Euler recursion.
//!
//! The `sir_model` and `sir_euler` binaries wrap them with a command line (see `runner`), CSV
//! reports (`report`) and an interactive terminal plot (`plot`). `convergence` checks one
//! integrator against the other.
pub mod convergence;
pub mod error;
pub mod euler;
pub mod log;
pub mod model;
pub mod numeric;
pub mod parameters;
pub mod plot;
pub mod prelude;
pub mod reference;
pub mod report;
pub mod runner;
pub mod trajectory;
