//! Typed property reads on a [`Record`].

use std::str::FromStr;

use sluice_core::Keyword;

use super::StructureError;
use crate::ini::Record;

const NUMBER: &str = "a number";
const WHOLE_NUMBER: &str = "a whole number";
const NUMBER_LIST: &str = "a series of space separated numbers";
const FLAG: &str = "a '1' or '0'";

fn invalid(record: &Record, key: &str, expected: impl Into<String>) -> StructureError {
    let property = record.property(key);
    StructureError::InvalidValue {
        key: key.to_string(),
        value: property.map(|p| p.value.clone()).unwrap_or_default(),
        expected: expected.into(),
        line: property.map_or(record.line, |p| p.line),
    }
}

fn missing(record: &Record, key: &str) -> StructureError {
    StructureError::MissingProperty {
        key: key.to_string(),
        line: record.line,
    }
}

fn parse_optional<T: FromStr>(
    record: &Record,
    key: &str,
    expected: &str,
) -> Result<Option<T>, StructureError> {
    record
        .value(key)
        .map(|v| v.parse::<T>().map_err(|_| invalid(record, key, expected)))
        .transpose()
}

pub(crate) fn required_str<'a>(record: &'a Record, key: &str) -> Result<&'a str, StructureError> {
    record.value(key).ok_or_else(|| missing(record, key))
}

pub(crate) fn optional_f64(record: &Record, key: &str) -> Result<Option<f64>, StructureError> {
    parse_optional(record, key, NUMBER)
}

pub(crate) fn required_f64(record: &Record, key: &str) -> Result<f64, StructureError> {
    optional_f64(record, key)?.ok_or_else(|| missing(record, key))
}

pub(crate) fn f64_or(record: &Record, key: &str, default: f64) -> Result<f64, StructureError> {
    Ok(optional_f64(record, key)?.unwrap_or(default))
}

pub(crate) fn u32_or(record: &Record, key: &str, default: u32) -> Result<u32, StructureError> {
    Ok(parse_optional(record, key, WHOLE_NUMBER)?.unwrap_or(default))
}

pub(crate) fn bool_or(record: &Record, key: &str, default: bool) -> Result<bool, StructureError> {
    match record.value(key).map(str::to_ascii_lowercase).as_deref() {
        None => Ok(default),
        Some("1" | "true") => Ok(true),
        Some("0" | "false") => Ok(false),
        Some(_) => Err(invalid(record, key, FLAG)),
    }
}

pub(crate) fn keyword_or<T: Keyword>(
    record: &Record,
    key: &str,
    default: T,
) -> Result<T, StructureError> {
    match record.value(key) {
        None => Ok(default),
        Some(value) => T::from_keyword(value)
            .map_err(|e| invalid(record, key, format!("one of {}", e.expected))),
    }
}

/// Space separated numbers; `None` when the key is absent.
pub(crate) fn optional_list(record: &Record, key: &str) -> Result<Option<Vec<f64>>, StructureError> {
    record
        .value(key)
        .map(|v| {
            v.split_whitespace()
                .map(str::parse::<f64>)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| invalid(record, key, NUMBER_LIST))
        })
        .transpose()
}

/// A list whose length must equal the value of `count_key`.
pub(crate) fn counted_list(
    record: &Record,
    count_key: &str,
    key: &str,
    count: usize,
) -> Result<Vec<f64>, StructureError> {
    let values = optional_list(record, key)?.unwrap_or_default();
    if values.len() != count {
        return Err(invalid(
            record,
            key,
            format!("{} values ({} = {})", count, count_key, count),
        ));
    }
    Ok(values)
}

/// Two counted lists zipped into rows; an absent or zero count gives an empty table.
pub(crate) fn table(
    record: &Record,
    count_key: &str,
    first_key: &str,
    second_key: &str,
) -> Result<Vec<(f64, f64)>, StructureError> {
    let count = u32_or(record, count_key, 0)? as usize;
    if count == 0 {
        return Ok(Vec::new());
    }
    let first = counted_list(record, count_key, first_key, count)?;
    let second = counted_list(record, count_key, second_key, count)?;
    Ok(first.into_iter().zip(second).collect())
}
