//! Unified error types for sluice
//!
//! [`SluiceError`] is the error returned at API boundaries: fatal import
//! failures, configuration problems and network inconsistencies. Per-record
//! parse failures use their own typed errors in sluice-io and never escape
//! an import as a `SluiceError`.

use thiserror::Error;

/// Unified error type for sluice operations.
#[derive(Error, Debug)]
pub enum SluiceError {
    /// I/O errors (file access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors (e.g. an invalid time-series reader set)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network structure errors (unknown branch, missing geometry)
    #[error("Network error: {0}")]
    Network(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using SluiceError.
pub type SluiceResult<T> = Result<T, SluiceError>;

impl From<anyhow::Error> for SluiceError {
    fn from(err: anyhow::Error) -> Self {
        SluiceError::Other(format!("{:#}", err))
    }
}

impl From<String> for SluiceError {
    fn from(s: String) -> Self {
        SluiceError::Other(s)
    }
}

impl From<&str> for SluiceError {
    fn from(s: &str) -> Self {
        SluiceError::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SluiceError::Config("no readers registered".into());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("no readers registered"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SluiceError = io_err.into();
        assert!(matches!(err, SluiceError::Io(_)));
    }

    #[test]
    fn test_anyhow_conversion_keeps_context() {
        let err = anyhow::anyhow!("root cause").context("reading structures.ini");
        let converted: SluiceError = err.into();
        let text = converted.to_string();
        assert!(text.contains("reading structures.ini"));
        assert!(text.contains("root cause"));
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> SluiceResult<()> {
            Err(SluiceError::Network("branch 'B9' not found".into()))
        }

        fn outer() -> SluiceResult<()> {
            inner()?;
            Ok(())
        }

        assert!(outer().is_err());
    }
}
