use std::fmt::{self, Debug, Display};
use std::io;

/// Provides `SirError` and maps other errors to
/// convert to a `SirError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum SirError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    CSVError(csv::Error),
    /// A model parameter failed validation. The message names the offending field.
    InvalidParameter(String),
    /// The adaptive solver gave up before reaching the end of the horizon.
    Integration(String),
    ReportError(String),
    SirError(String),
}

impl From<io::Error> for SirError {
    fn from(error: io::Error) -> Self {
        SirError::IoError(error)
    }
}

impl From<serde_json::Error> for SirError {
    fn from(error: serde_json::Error) -> Self {
        SirError::JsonError(error)
    }
}

impl From<csv::Error> for SirError {
    fn from(error: csv::Error) -> Self {
        SirError::CSVError(error)
    }
}

impl From<String> for SirError {
    fn from(error: String) -> Self {
        SirError::SirError(error)
    }
}

impl From<&str> for SirError {
    fn from(error: &str) -> Self {
        SirError::SirError(error.to_string())
    }
}

impl std::error::Error for SirError {}

impl Display for SirError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Error: {self:?}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions_preserve_variant() {
        let error: SirError = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        assert!(matches!(error, SirError::IoError(_)));

        let error: SirError = "plain message".into();
        assert!(matches!(error, SirError::SirError(ref message) if message == "plain message"));

        let json_error = serde_json::from_str::<u32>("not json").unwrap_err();
        let error: SirError = json_error.into();
        assert!(matches!(error, SirError::JsonError(_)));
    }

    #[test]
    fn display_includes_message() {
        let error = SirError::InvalidParameter("beta must be positive".to_string());
        assert_eq!(
            error.to_string(),
            "Error: InvalidParameter(\"beta must be positive\")"
        );
    }
}
