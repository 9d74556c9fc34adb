use std::error::Error;
use std::path::PathBuf;

use crate::convergence::{convergence_check, ConvergenceReport, DEFAULT_REFINEMENT};
use crate::error::SirError;
use crate::log::{info, level_for_verbosity, set_log_level, LogSpec};
use crate::parameters::{ParameterOverrides, Parameters, Preset};
use crate::report::ReportOptions;
use crate::trajectory::{EpidemicSummary, Trajectory};
use crate::{euler, plot, reference};
use clap::{ArgAction, Args, Command, FromArgMatches as _};

/// Cli arguments shared by both simulators
#[derive(Args, Debug, Default)]
pub struct BaseArgs {
    /// Optional directory for CSV and JSON report output
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Prefix prepended to report file names
    #[arg(long, default_value = "")]
    pub file_prefix: String,

    /// Replace report files that already exist
    #[arg(long)]
    pub force_overwrite: bool,

    /// Do not open the interactive plot
    #[arg(long)]
    pub no_plot: bool,

    /// Enable logging, e.g. `info` or `info,sirsim::euler=trace`
    #[arg(long)]
    pub log_level: Option<String>,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Model arguments of `sir_model`. Anything not given keeps the value from the config file,
/// preset or built-in defaults, in that order.
#[derive(Args, Debug, Default)]
pub struct ModelArgs {
    /// Transmission rate [default: 2.3/14]
    #[arg(short, long)]
    pub beta: Option<f64>,

    /// Recovery rate [default: 1/14]
    #[arg(short, long)]
    pub gamma: Option<f64>,

    /// Simulation horizon in days [default: 180]
    #[arg(short, long)]
    pub days: Option<u32>,

    /// Sample time in days [default: 0.1]
    #[arg(long)]
    pub step: Option<f64>,

    /// Start from a named parameter set
    #[arg(long, value_enum)]
    pub preset: Option<Preset>,

    /// Optional path for a JSON parameters file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Also check fixed-step Euler against the adaptive solution
    #[arg(long)]
    pub compare: bool,
}

impl ModelArgs {
    /// Resolves the parameters: preset or defaults, then the config file, then flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be loaded.
    pub fn parameters(&self) -> Result<Parameters, SirError> {
        let mut parameters = self
            .preset
            .map_or_else(Parameters::default, Preset::parameters);
        if let Some(path) = &self.config {
            info!("Loading parameters from: {}", path.display());
            ParameterOverrides::from_json_file(path)?.apply_to(&mut parameters);
        }
        self.overrides().apply_to(&mut parameters);
        Ok(parameters)
    }

    fn overrides(&self) -> ParameterOverrides {
        ParameterOverrides {
            beta: self.beta,
            gamma: self.gamma,
            days: self.days,
            step: self.step,
            initial: None,
        }
    }
}

/// Which integrator a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Adaptive,
    Euler,
}

impl Method {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Method::Adaptive => "adaptive",
            Method::Euler => "euler",
        }
    }

    /// Integrates `parameters` with this method.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters are invalid or the solver fails.
    pub fn integrate(self, parameters: &Parameters) -> Result<Trajectory, SirError> {
        match self {
            Method::Euler => euler::integrate(parameters),
            Method::Adaptive => {
                let (trajectory, stats) = reference::integrate(parameters)?;
                info!(
                    "adaptive solver: {} evaluations, {} accepted and {} rejected steps",
                    stats.evaluations, stats.accepted_steps, stats.rejected_steps
                );
                Ok(trajectory)
            }
        }
    }
}

/// What a run produced.
#[derive(Debug)]
pub struct RunOutput {
    pub parameters: Parameters,
    pub trajectory: Trajectory,
    pub summary: EpidemicSummary,
    pub convergence: Option<ConvergenceReport>,
    pub reports: Vec<PathBuf>,
}

fn create_cli(name: &'static str, about: &'static str) -> Command {
    let cli = Command::new(name).about(about);
    BaseArgs::augment_args(cli)
}

/// Configures logging from `--log-level` and `-v`. An explicit spec wins over verbosity.
///
/// # Errors
///
/// Returns an error if the log level spec does not parse.
pub fn init_logging(args: &BaseArgs) -> Result<(), SirError> {
    if let Some(spec) = &args.log_level {
        let spec: LogSpec = spec.parse()?;
        spec.apply();
    } else if args.verbose > 0 {
        set_log_level(level_for_verbosity(args.verbose));
    }
    Ok(())
}

/// Entry point of `sir_model`: adaptive solver with parameters from the command line.
///
/// # Errors
///
/// Returns an error if argument parsing, parameter loading or the run fails.
pub fn run_sir_model() -> Result<RunOutput, Box<dyn Error>> {
    let cli = ModelArgs::augment_args(create_cli(
        "sir_model",
        "SIR Model epidemic simulator (adaptive solver)",
    ));
    let matches = cli.get_matches();

    let base_args = BaseArgs::from_arg_matches(&matches)?;
    let model_args = ModelArgs::from_arg_matches(&matches)?;
    init_logging(&base_args)?;
    let parameters = model_args.parameters()?;
    Ok(run_with_args_internal(
        &base_args,
        Method::Adaptive,
        parameters,
        model_args.compare,
    )?)
}

/// Entry point of `sir_euler`: fixed-step Euler with the built-in parameters.
///
/// # Errors
///
/// Returns an error if argument parsing or the run fails.
pub fn run_sir_euler() -> Result<RunOutput, Box<dyn Error>> {
    let cli = create_cli(
        "sir_euler",
        "SIR Model epidemic simulator (fixed-step explicit Euler)",
    );
    let matches = cli.get_matches();

    let base_args = BaseArgs::from_arg_matches(&matches)?;
    init_logging(&base_args)?;
    Ok(run_with_args_internal(
        &base_args,
        Method::Euler,
        Parameters::default(),
        false,
    )?)
}

fn run_with_args_internal(
    args: &BaseArgs,
    method: Method,
    parameters: Parameters,
    compare: bool,
) -> Result<RunOutput, SirError> {
    parameters.validate()?;
    info!(
        "running {} integrator: beta {}, gamma {}, {} days, step {}",
        method.name(),
        parameters.beta,
        parameters.gamma,
        parameters.days,
        parameters.step
    );

    let trajectory = method.integrate(&parameters)?;
    let summary = trajectory
        .summary(&parameters)
        .ok_or_else(|| SirError::SirError("integration produced no samples".to_string()))?;
    println!(
        "R0: {:.2}, peak infectious {:.4} at day {:.1}, final recovered {:.4}",
        summary.r0, summary.peak_infectious, summary.peak_time, summary.final_recovered
    );

    let convergence = if compare {
        let report = convergence_check(&parameters, DEFAULT_REFINEMENT)?;
        println!(
            "Euler deviation from adaptive solution: {:.3e} at step {}, {:.3e} at step {}",
            report.coarse_deviation, report.step, report.refined_deviation, report.refined_step
        );
        Some(report)
    } else {
        None
    };

    // Optionally write reports
    let mut reports = Vec::new();
    if let Some(output_dir) = &args.output_dir {
        let mut options = ReportOptions::default();
        options
            .directory(output_dir.clone())
            .file_prefix(args.file_prefix.clone())
            .overwrite(args.force_overwrite);
        reports.push(options.write_trajectory(method.name(), &trajectory)?);
        reports.push(options.write_summary(&format!("{}_summary", method.name()), &summary)?);
    }

    if !args.no_plot {
        plot::show(&parameters, &trajectory)?;
    }

    Ok(RunOutput {
        parameters,
        trajectory,
        summary,
        convergence,
        reports,
    })
}
