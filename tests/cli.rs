use assert_approx_eq::assert_approx_eq;
use assert_cmd::Command;
use sirsim::report::TrajectoryRow;
use std::path::PathBuf;
use tempfile::tempdir;

fn sir_model() -> Command {
    Command::cargo_bin("sir_model").unwrap()
}

fn sir_euler() -> Command {
    Command::cargo_bin("sir_euler").unwrap()
}

fn read_rows(path: PathBuf) -> Vec<TrajectoryRow> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader.deserialize().map(Result::unwrap).collect()
}

fn stdout_of(command: &mut Command) -> String {
    let output = command.output().unwrap();
    assert!(output.status.success(), "{output:?}");
    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn model_runs_with_defaults() {
    let stdout = stdout_of(sir_model().arg("--no-plot"));
    assert!(stdout.contains("R0: 2.30"), "{stdout}");
}

#[test]
fn model_accepts_short_flags() {
    let stdout = stdout_of(sir_model().args(["-b", "0.3", "-g", "0.1", "-d", "100", "--no-plot"]));
    assert!(stdout.contains("R0: 3.00"), "{stdout}");
}

#[test]
fn malformed_flag_prints_usage() {
    let output = sir_model()
        .args(["--beta", "fast", "--no-plot"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("invalid value"), "{stderr}");
    assert!(stderr.contains("Usage"), "{stderr}");
}

#[test]
fn invalid_rate_fails() {
    let output = sir_model()
        .args(["--gamma", "0", "--no-plot"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("InvalidParameter"), "{stderr}");
    assert!(stderr.contains("gamma"), "{stderr}");
}

#[test]
fn log_level_enables_messages_on_stderr() {
    let output = sir_model()
        .args(["--log-level", "info", "--no-plot"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("running adaptive integrator"), "{stderr}");
    assert!(stderr.contains("adaptive solver:"), "{stderr}");
}

#[test]
fn verbosity_controls_levels() {
    let output = sir_euler().args(["-v", "--no-plot"]).output().unwrap();
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("INFO"), "{stderr}");
    assert!(!stderr.contains("DEBUG"), "{stderr}");

    let output = sir_euler().args(["-vv", "--no-plot"]).output().unwrap();
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("DEBUG sirsim::euler"), "{stderr}");
}

#[test]
fn model_writes_reports() {
    let temp_dir = tempdir().unwrap();
    sir_model()
        .arg("--no-plot")
        .arg("--output-dir")
        .arg(temp_dir.path())
        .assert()
        .success();
    let rows = read_rows(temp_dir.path().join("adaptive.csv"));
    assert_eq!(rows.len(), 1801);
    assert_eq!(rows[0].time, 0.0);
    assert_eq!(rows[0].susceptible, 0.999);
    assert!(temp_dir.path().join("adaptive_summary.json").exists());
}

#[test]
fn existing_reports_need_force_overwrite() {
    let temp_dir = tempdir().unwrap();
    let run = |extra: &[&str]| {
        let mut command = sir_euler();
        command
            .arg("--no-plot")
            .arg("-o")
            .arg(temp_dir.path())
            .args(extra);
        command.output().unwrap().status.success()
    };
    assert!(run(&[]));
    assert!(!run(&[]));
    assert!(run(&["--force-overwrite"]));
}

#[test]
fn euler_uses_fixed_grid() {
    let temp_dir = tempdir().unwrap();
    sir_euler()
        .args(["--no-plot", "--file-prefix", "b_", "-o"])
        .arg(temp_dir.path())
        .assert()
        .success();
    let rows = read_rows(temp_dir.path().join("b_euler.csv"));
    assert_eq!(rows.len(), 1801);
    let last = rows.last().unwrap();
    assert_approx_eq!(last.time, 180.0, 1e-9);
    let total = last.susceptible + last.infectious + last.recovered;
    assert_approx_eq!(total, 1.0, 1e-9);
}

#[test]
fn euler_does_not_take_model_parameters() {
    sir_euler()
        .args(["--beta", "0.3", "--no-plot"])
        .assert()
        .failure();
}

#[test]
fn config_file_and_compare() {
    let config = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join("measles.json");
    let stdout = stdout_of(
        sir_model()
            .arg("--config")
            .arg(config)
            .args(["--compare", "--no-plot"]),
    );
    assert!(stdout.contains("R0: 15.00"), "{stdout}");
    assert!(stdout.contains("Euler deviation from adaptive solution"), "{stdout}");
}

#[test]
fn uneven_step_ends_on_horizon() {
    let temp_dir = tempdir().unwrap();
    sir_model()
        .args(["--days", "10", "--step", "3", "--no-plot", "-o"])
        .arg(temp_dir.path())
        .assert()
        .success();
    let rows = read_rows(temp_dir.path().join("adaptive.csv"));
    let times: Vec<f64> = rows.iter().map(|row| row.time).collect();
    assert_eq!(times, vec![0.0, 3.0, 6.0, 9.0, 10.0]);
}

#[test]
fn config_file_keeps_preset_rates() {
    let temp_dir = tempdir().unwrap();
    let config = temp_dir.path().join("days.json");
    std::fs::write(&config, r#"{ "days": 60 }"#).unwrap();
    let stdout = stdout_of(
        sir_model()
            .args(["--preset", "measles", "--no-plot", "--config"])
            .arg(&config),
    );
    assert!(stdout.contains("R0: 15.00"), "{stdout}");
}
