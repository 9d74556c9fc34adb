//! CSV and JSON output of simulation results.
//!
//! A trajectory is written one row per time point with the columns
//! `time,susceptible,infectious,recovered`. The summary of a run is written as a single JSON
//! object. Files are placed in the directory configured on `ReportOptions` and named
//! `{prefix}{name}.csv` / `{prefix}{name}.json`.

use crate::error::SirError;
use crate::log::{info, trace};
use crate::trajectory::{EpidemicSummary, Trajectory};
use csv::Writer;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fs::{create_dir_all, File};
use std::path::{Path, PathBuf};

/// One CSV row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryRow {
    pub time: f64,
    pub susceptible: f64,
    pub infectious: f64,
    pub recovered: f64,
}

/// Where and how report files are written.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportOptions {
    pub directory: PathBuf,
    pub file_prefix: String,
    pub overwrite: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions {
            directory: PathBuf::from("."),
            file_prefix: String::new(),
            overwrite: false,
        }
    }
}

impl ReportOptions {
    pub fn directory(&mut self, directory: PathBuf) -> &mut Self {
        self.directory = directory;
        self
    }

    pub fn file_prefix(&mut self, file_prefix: String) -> &mut Self {
        self.file_prefix = file_prefix;
        self
    }

    pub fn overwrite(&mut self, overwrite: bool) -> &mut Self {
        self.overwrite = overwrite;
        self
    }

    #[must_use]
    pub fn path_for(&self, name: &str, extension: &str) -> PathBuf {
        self.directory
            .join(format!("{}{}.{}", self.file_prefix, name, extension))
    }

    /// Writes `trajectory` to `{prefix}{name}.csv` and returns the path written.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists and `overwrite` is off, or on any I/O failure.
    pub fn write_trajectory(
        &self,
        name: &str,
        trajectory: &Trajectory,
    ) -> Result<PathBuf, SirError> {
        let path = self.path_for(name, "csv");
        let file = self.create_file(&path, "csv")?;
        write_trajectory_csv(file, trajectory)?;
        info!("wrote {} rows to {}", trajectory.len(), path.display());
        Ok(path)
    }

    /// Writes `summary` to `{prefix}{name}.json` and returns the path written.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists and `overwrite` is off, or on any I/O failure.
    pub fn write_summary(
        &self,
        name: &str,
        summary: &EpidemicSummary,
    ) -> Result<PathBuf, SirError> {
        let path = self.path_for(name, "json");
        let file = self.create_file(&path, "json")?;
        serde_json::to_writer_pretty(file, summary)?;
        info!("wrote summary to {}", path.display());
        Ok(path)
    }

    // Checks that the path is valid. Creates the file and all parent directories if they do not
    // exist.
    fn create_file(&self, path: &Path, extension: &str) -> Result<File, SirError> {
        if path.extension().and_then(OsStr::to_str) != Some(extension) {
            return Err(SirError::ReportError(format!(
                "report {} must have a .{} extension",
                path.display(),
                extension
            )));
        }
        if path.exists() && !self.overwrite {
            return Err(SirError::ReportError(format!(
                "{} already exists; pass overwrite to replace it",
                path.display()
            )));
        }
        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }
        trace!("creating report file {}", path.display());
        Ok(File::create(path)?)
    }
}

/// Serializes a trajectory as CSV to any writer.
///
/// # Errors
///
/// Returns an error if serialization or flushing fails.
pub fn write_trajectory_csv<W: std::io::Write>(
    writer: W,
    trajectory: &Trajectory,
) -> Result<(), SirError> {
    let mut writer = Writer::from_writer(writer);
    for (time, state) in trajectory.iter() {
        writer.serialize(TrajectoryRow {
            time,
            susceptible: state.s,
            infectious: state.i,
            recovered: state.r,
        })?;
    }
    writer.flush()?;
    Ok(())
}
