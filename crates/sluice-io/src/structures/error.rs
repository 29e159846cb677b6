use sluice_core::StructureType;
use thiserror::Error;

use crate::timeseries::TimeSeriesError;

/// Why a structure type tag could not be turned into a parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("unknown structure type '{0}'")]
    Unknown(String),

    #[error("structure type '{0}' is recognised but cannot be imported (no parser available)")]
    NoParser(StructureType),
}

/// Failure of one structure record. Never aborts an import.
#[derive(Debug, Error)]
pub enum StructureError {
    #[error("missing required property '{key}' (section starting at line {line})")]
    MissingProperty { key: String, line: usize },

    #[error("invalid value '{value}' for property '{key}' at line {line}, expected {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: String,
        line: usize,
    },

    #[error("structure definition has no 'type' property")]
    MissingType,

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("member '{member}' must be defined before the compound that references it")]
    UnresolvedMember { member: String },

    #[error("time series for property '{key}' could not be read: {source}")]
    TimeSeries {
        key: String,
        #[source]
        source: TimeSeriesError,
    },

    #[error("a structure named '{name}' was already imported")]
    DuplicateName { name: String },
}
