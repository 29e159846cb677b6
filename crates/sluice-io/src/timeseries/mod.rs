//! Time-series reference resolution.
//!
//! Structure properties such as a pump capacity or a weir crest level hold
//! either a number or a reference to a time-series file. The
//! [`TimeSeriesResolver`] turns such a reference into a [`TimeFunction`],
//! dispatching on the file suffix to exactly one registered reader:
//!
//! - `.tim` ([`tim::TimFileReader`]): one series per file, stateless
//! - `.bc` ([`bc::BcFileReader`]): blocks for many structures, parsed once per file
//!
//! A tabular file that lacks the requested structure or quantity is a soft
//! failure: a warning is recorded and an empty function is returned.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{NaiveDateTime, TimeDelta};
use sluice_core::{DiagnosticIssue, SluiceError, SluiceResult, TimeFunction};
use thiserror::Error;
use tracing::warn;

pub mod bc;
mod source;
pub mod tim;

pub use bc::BcFileReader;
pub use source::{FileSource, FsSource};
pub use tim::TimFileReader;

/// Suffixes that must be claimed by a registered reader.
pub const REQUIRED_SUFFIXES: &[&str] = &["tim", "bc"];

/// Hard failures while reading a referenced time-series file.
#[derive(Debug, Error)]
pub enum TimeSeriesError {
    #[error("failed to read time series file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid time value '{value}' in {path} at line {line}")]
    InvalidTime {
        path: PathBuf,
        line: usize,
        value: String,
    },

    #[error("invalid numeric value '{value}' in {path} at line {line}")]
    InvalidValue {
        path: PathBuf,
        line: usize,
        value: String,
    },

    #[error("missing value column in {path} at line {line}")]
    MissingValue { path: PathBuf, line: usize },

    #[error("unsupported time unit '{unit}' in {path}")]
    InvalidUnit { path: PathBuf, unit: String },

    #[error("no time series reader registered for {0}")]
    UnsupportedSuffix(PathBuf),
}

/// Result of looking up one series in a file.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesLookup {
    Found(TimeFunction),
    /// The file has no data for the structure
    UnknownName,
    /// The file has data for the structure but not for the quantity
    UnknownQuantity,
}

/// A reader for one family of time-series files.
pub trait TimeSeriesFileReader {
    /// Lowercase file suffixes (without dot) this reader claims
    fn suffixes(&self) -> &'static [&'static str];

    fn read(
        &mut self,
        source: &dyn FileSource,
        path: &Path,
        structure_name: &str,
        quantity: &str,
        reference_time: NaiveDateTime,
    ) -> Result<SeriesLookup, TimeSeriesError>;
}

/// What a property value refers to.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeSeriesReference {
    Constant(f64),
    File(PathBuf),
}

impl TimeSeriesReference {
    /// A value that parses as a number is a constant, anything else is a file path.
    pub fn classify(reference: &str) -> Self {
        let trimmed = reference.trim();
        match trimmed.parse::<f64>() {
            Ok(value) => TimeSeriesReference::Constant(value),
            Err(_) => TimeSeriesReference::File(PathBuf::from(trimmed)),
        }
    }
}

/// Resolves time-series references for one import run.
///
/// Owns the readers (and with them the tabular cache); create one per import.
pub struct TimeSeriesResolver {
    readers: Vec<Box<dyn TimeSeriesFileReader>>,
    by_suffix: HashMap<&'static str, usize>,
    source: Box<dyn FileSource>,
    issues: Vec<DiagnosticIssue>,
}

impl TimeSeriesResolver {
    /// Register readers. Every suffix must be claimed by exactly one reader and
    /// every suffix in [`REQUIRED_SUFFIXES`] must be claimed.
    pub fn new(readers: Vec<Box<dyn TimeSeriesFileReader>>) -> SluiceResult<Self> {
        if readers.is_empty() {
            return Err(SluiceError::Config(
                "no time series readers registered".to_string(),
            ));
        }

        let mut by_suffix = HashMap::new();
        for (index, reader) in readers.iter().enumerate() {
            if reader.suffixes().is_empty() {
                return Err(SluiceError::Config(format!(
                    "time series reader {} claims no file suffix",
                    index
                )));
            }
            for &suffix in reader.suffixes() {
                if by_suffix.insert(suffix, index).is_some() {
                    return Err(SluiceError::Config(format!(
                        "suffix '.{}' is claimed by more than one time series reader",
                        suffix
                    )));
                }
            }
        }

        if let Some(missing) = REQUIRED_SUFFIXES
            .iter()
            .find(|suffix| !by_suffix.contains_key(*suffix))
        {
            return Err(SluiceError::Config(format!(
                "no time series reader registered for suffix '.{}'",
                missing
            )));
        }

        Ok(Self {
            readers,
            by_suffix,
            source: Box::new(FsSource),
            issues: Vec::new(),
        })
    }

    /// Resolver with the `.tim` and `.bc` readers.
    pub fn standard() -> SluiceResult<Self> {
        Self::new(vec![
            Box::new(TimFileReader),
            Box::new(BcFileReader::default()),
        ])
    }

    pub fn with_source(mut self, source: Box<dyn FileSource>) -> Self {
        self.source = source;
        self
    }

    /// Resolve `reference` for `structure_name` / `quantity`.
    ///
    /// Constants become a one-point function at `reference_time`. A missing
    /// structure or quantity in a tabular file yields an empty function.
    pub fn resolve(
        &mut self,
        reference: &str,
        structure_name: &str,
        quantity: &str,
        reference_time: NaiveDateTime,
    ) -> Result<TimeFunction, TimeSeriesError> {
        let path = match TimeSeriesReference::classify(reference) {
            TimeSeriesReference::Constant(value) => {
                return Ok(TimeFunction::constant(reference_time, value))
            }
            TimeSeriesReference::File(path) => path,
        };

        let suffix = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let index = *self
            .by_suffix
            .get(suffix.as_str())
            .ok_or_else(|| TimeSeriesError::UnsupportedSuffix(path.clone()))?;

        let lookup = self.readers[index].read(
            self.source.as_ref(),
            &path,
            structure_name,
            quantity,
            reference_time,
        )?;

        let message = match lookup {
            SeriesLookup::Found(function) => return Ok(function),
            SeriesLookup::UnknownName => format!(
                "No time series for '{}' in {}, property '{}' is ignored",
                structure_name,
                path.display(),
                quantity
            ),
            SeriesLookup::UnknownQuantity => format!(
                "Time series for '{}' in {} has no quantity '{}', property is ignored",
                structure_name,
                path.display(),
                quantity
            ),
        };
        warn!("{}", message);
        self.issues
            .push(DiagnosticIssue::warning("timeseries", message).with_entity(structure_name));
        Ok(TimeFunction::empty())
    }

    /// Warnings recorded since the last call.
    pub fn take_issues(&mut self) -> Vec<DiagnosticIssue> {
        std::mem::take(&mut self.issues)
    }
}

pub(crate) fn parse_number(
    token: Option<&str>,
    path: &Path,
    line: usize,
    is_time: bool,
) -> Result<f64, TimeSeriesError> {
    let Some(token) = token else {
        return Err(TimeSeriesError::MissingValue {
            path: path.to_path_buf(),
            line,
        });
    };
    // "nan" and "inf" parse as f64 but are not data.
    match token.parse::<f64>() {
        Ok(number) if number.is_finite() => Ok(number),
        _ => {
            let (path, value) = (path.to_path_buf(), token.to_string());
            Err(if is_time {
                TimeSeriesError::InvalidTime { path, line, value }
            } else {
                TimeSeriesError::InvalidValue { path, line, value }
            })
        }
    }
}

/// `origin` plus `seconds`, rounded to the millisecond.
///
/// Offsets outside the representable date range are an
/// [`TimeSeriesError::InvalidTime`] for the row instead of a panic.
pub(crate) fn shift_time(
    origin: NaiveDateTime,
    seconds: f64,
    path: &Path,
    line: usize,
) -> Result<NaiveDateTime, TimeSeriesError> {
    let millis = (seconds * 1000.0).round();
    let shifted = if millis.is_finite() && millis.abs() < i64::MAX as f64 {
        TimeDelta::try_milliseconds(millis as i64).and_then(|d| origin.checked_add_signed(d))
    } else {
        None
    };
    shifted.ok_or_else(|| TimeSeriesError::InvalidTime {
        path: path.to_path_buf(),
        line,
        value: seconds.to_string(),
    })
}

pub(crate) fn open_error(path: &Path, source: io::Error) -> TimeSeriesError {
    TimeSeriesError::Io {
        path: path.to_path_buf(),
        source,
    }
}
