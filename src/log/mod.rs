//! The `log` module configures the crate's diagnostic logging. Logging is about the behavior of
//! the integrators and the command line tools; simulation results go through `report` instead.
//!
//! This module (re)exports the five logging macros: `error!`, `warn!`, `info!`, `debug!` and
//! `trace!`, where `error!` represents the highest-priority log messages and `trace!` the lowest.
//!
//! Logging is _disabled_ by default. The binaries enable it with `--log-level <spec>` or
//! `-v`/`-vv`/`-vvv`. From code it can be controlled with:
//!
//!  - `enable_logging()`: turns on all log messages
//!  - `disable_logging()`: turns off all log messages
//!  - `set_log_level(level: LevelFilter)`: enables only log messages with priority at least `level`
//!  - `set_module_filter()` / `set_module_filters()` / `remove_module_filter()`: per-module levels
//!
//! ```rust
//! use sirsim::log::{set_log_level, set_module_filter, LevelFilter};
//!
//! // Report progress, but show every step the Euler integrator takes.
//! set_log_level(LevelFilter::Info);
//! set_module_filter("sirsim::euler", LevelFilter::Trace);
//! ```
//!
//! Messages are written to stderr so they never interleave with data written to stdout or with
//! the terminal plot.
#[cfg(feature = "logging")]
mod standard_logger;

#[cfg(not(feature = "logging"))]
mod null_logger;

use crate::error::SirError;
pub use log::{debug, error, info, trace, warn, LevelFilter};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::LazyLock;
use std::sync::{Mutex, MutexGuard};

#[cfg(feature = "logging")]
use log4rs::Handle;

// Logging disabled
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Off;

/// A global instance of the logging configuration.
static LOG_CONFIGURATION: LazyLock<Mutex<LogConfiguration>> = LazyLock::new(Mutex::default);

/// A level filter applied to log messages whose target starts with `module`.
#[derive(Debug, Clone, PartialEq)]
struct ModuleLogConfiguration {
    module: String,
    level: LevelFilter,
}

impl From<(&str, LevelFilter)> for ModuleLogConfiguration {
    fn from((module, level): (&str, LevelFilter)) -> Self {
        Self {
            module: module.to_string(),
            level,
        }
    }
}

/// Tracks the global level, per-module levels and the handle of the installed logger.
///
/// Loggers are installed globally, so only one instance exists. The public API are free
/// functions that lock the singleton and call the matching method.
#[derive(Debug)]
pub(in crate::log) struct LogConfiguration {
    /// Level for targets without their own filter. `LevelFilter::Off` disables logging.
    pub(in crate::log) global_log_level: LevelFilter,
    pub(in crate::log) module_configurations: HashMap<String, ModuleLogConfiguration>,

    #[cfg(feature = "logging")]
    root_handle: Option<Handle>,
}

impl Default for LogConfiguration {
    fn default() -> Self {
        Self {
            global_log_level: DEFAULT_LOG_LEVEL,
            module_configurations: HashMap::new(),

            #[cfg(feature = "logging")]
            root_handle: None,
        }
    }
}

impl LogConfiguration {
    fn set_log_level(&mut self, level: LevelFilter) {
        self.global_log_level = level;
        self.set_config();
    }

    /// Returns true if the configuration changed.
    fn insert_module_filter(&mut self, module: &str, level: LevelFilter) -> bool {
        match self.module_configurations.entry(module.to_string()) {
            Entry::Occupied(mut entry) => {
                if entry.get().level == level {
                    return false;
                }
                entry.get_mut().level = level;
            }
            Entry::Vacant(entry) => {
                entry.insert((module, level).into());
            }
        }
        true
    }

    fn set_module_filters(&mut self, module_filters: &[(&str, LevelFilter)]) {
        let mut mutated = false;
        for (module, level) in module_filters {
            mutated |= self.insert_module_filter(module, *level);
        }
        if mutated {
            self.set_config();
        }
    }

    fn remove_module_filter(&mut self, module: &str) {
        if self.module_configurations.remove(module).is_some() {
            self.set_config();
        }
    }
}

/// A parsed `--log-level` argument: an optional global level followed by `module=level` pairs,
/// separated by commas, e.g. `info,sirsim::euler=trace`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LogSpec {
    pub global: Option<LevelFilter>,
    pub modules: Vec<(String, LevelFilter)>,
}

impl FromStr for LogSpec {
    type Err = SirError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let mut parsed = LogSpec::default();
        for part in spec.split(',').map(str::trim).filter(|part| !part.is_empty()) {
            match part.split_once('=') {
                Some((module, level)) => {
                    let module = module.trim();
                    if module.is_empty() {
                        return Err(SirError::SirError(format!(
                            "missing module name in log filter `{part}`"
                        )));
                    }
                    parsed.modules.push((module.to_string(), parse_level(level)?));
                }
                None => parsed.global = Some(parse_level(part)?),
            }
        }
        Ok(parsed)
    }
}

fn parse_level(level: &str) -> Result<LevelFilter, SirError> {
    LevelFilter::from_str(level.trim())
        .map_err(|_| SirError::SirError(format!("invalid log level `{}`", level.trim())))
}

impl LogSpec {
    /// Installs this specification. Module filters without a global level enable only those
    /// modules; the global level stays as it was.
    pub fn apply(&self) {
        if let Some(level) = self.global {
            set_log_level(level);
        }
        if !self.modules.is_empty() {
            let filters: Vec<(&str, LevelFilter)> = self
                .modules
                .iter()
                .map(|(module, level)| (module.as_str(), *level))
                .collect();
            set_module_filters(&filters);
        }
        for (module, level) in &self.modules {
            info!("Logging enabled for {} at level {}", module, level);
        }
    }
}

/// Maps a `-v` count to a level: 0 is off, then info, debug and trace.
#[must_use]
pub fn level_for_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Off,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

// The public API

/// Enables the logger with no global level filter / full logging. Equivalent to
/// `set_log_level(LevelFilter::Trace)`.
pub fn enable_logging() {
    set_log_level(LevelFilter::Trace);
}

/// Disables logging completely. Equivalent to `set_log_level(LevelFilter::Off)`.
pub fn disable_logging() {
    set_log_level(LevelFilter::Off);
}

/// Sets the global log level. A global filter level of `LevelFilter::Off` disables logging.
pub fn set_log_level(level: LevelFilter) {
    get_log_configuration().set_log_level(level);
}

/// Sets a level filter for the given module path.
pub fn set_module_filter(module_path: &str, level_filter: LevelFilter) {
    get_log_configuration().set_module_filters(&[(module_path, level_filter)]);
}

/// Removes a module-specific level filter. The global level filter will apply to the module.
pub fn remove_module_filter(module_path: &str) {
    get_log_configuration().remove_module_filter(module_path);
}

/// Sets the level filters for a set of modules in one reconfiguration.
pub fn set_module_filters(module_filters: &[(&str, LevelFilter)]) {
    get_log_configuration().set_module_filters(module_filters);
}

fn get_log_configuration() -> MutexGuard<'static, LogConfiguration> {
    LOG_CONFIGURATION.lock().expect("Mutex poisoned")
}

#[cfg(test)]
mod tests {
    use super::*;

    // Force logging tests to run serially for consistent behavior.
    static TEST_MUTEX: LazyLock<Mutex<()>> = LazyLock::new(Mutex::default);

    #[test]
    fn test_set_log_level() {
        let _guard = TEST_MUTEX.lock().expect("Mutex poisoned");
        set_log_level(LevelFilter::Error);
        assert_eq!(get_log_configuration().global_log_level, LevelFilter::Error);
        error!("test_set_log_level: global set to error");
        trace!("test_set_log_level: NOT EMITTED");

        set_log_level(LevelFilter::Trace);
        assert_eq!(get_log_configuration().global_log_level, LevelFilter::Trace);
        disable_logging();
        assert_eq!(get_log_configuration().global_log_level, LevelFilter::Off);
    }

    #[test]
    fn test_set_remove_module_filters() {
        let _guard = TEST_MUTEX.lock().expect("Mutex poisoned");
        set_module_filters(&[
            ("sirsim::euler", LevelFilter::Trace),
            ("sirsim::reference", LevelFilter::Debug),
        ]);
        {
            let config = get_log_configuration();
            assert_eq!(
                config.module_configurations.get("sirsim::euler"),
                Some(&("sirsim::euler", LevelFilter::Trace).into())
            );
            assert_eq!(
                config.module_configurations.get("sirsim::reference"),
                Some(&("sirsim::reference", LevelFilter::Debug).into())
            );
        }

        set_module_filter("sirsim::euler", LevelFilter::Warn);
        remove_module_filter("sirsim::reference");
        {
            let config = get_log_configuration();
            assert_eq!(
                config.module_configurations.get("sirsim::euler"),
                Some(&("sirsim::euler", LevelFilter::Warn).into())
            );
            assert!(!config.module_configurations.contains_key("sirsim::reference"));
        }
        remove_module_filter("sirsim::euler");
    }

    #[test]
    fn parses_global_and_module_levels() {
        let spec: LogSpec = "info, sirsim::euler=trace,ode_solvers=Off".parse().unwrap();
        assert_eq!(spec.global, Some(LevelFilter::Info));
        assert_eq!(
            spec.modules,
            vec![
                ("sirsim::euler".to_string(), LevelFilter::Trace),
                ("ode_solvers".to_string(), LevelFilter::Off),
            ]
        );
    }

    #[test]
    fn rejects_bad_levels() {
        assert!("loud".parse::<LogSpec>().is_err());
        assert!("sirsim=loud".parse::<LogSpec>().is_err());
        assert!("=debug".parse::<LogSpec>().is_err());
    }

    #[test]
    fn verbosity_levels() {
        assert_eq!(level_for_verbosity(0), LevelFilter::Off);
        assert_eq!(level_for_verbosity(1), LevelFilter::Info);
        assert_eq!(level_for_verbosity(2), LevelFilter::Debug);
        assert_eq!(level_for_verbosity(7), LevelFilter::Trace);
    }
}
