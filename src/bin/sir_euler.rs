use sirsim::runner::run_sir_euler;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run_sir_euler() {
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Simulation failure: {error}");
            ExitCode::FAILURE
        }
    }
}
