//! Single-series `.tim` files.
//!
//! Each data line holds a time in minutes since the reference time followed
//! by one or more values; the first value column is used. Lines starting
//! with `*` or `#` are comments.

use std::io::BufRead;
use std::path::Path;

use chrono::NaiveDateTime;
use sluice_core::TimeFunction;

use super::{
    open_error, parse_number, shift_time, FileSource, SeriesLookup, TimeSeriesError,
    TimeSeriesFileReader,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct TimFileReader;

impl TimeSeriesFileReader for TimFileReader {
    fn suffixes(&self) -> &'static [&'static str] {
        &["tim"]
    }

    fn read(
        &mut self,
        source: &dyn FileSource,
        path: &Path,
        _structure_name: &str,
        _quantity: &str,
        reference_time: NaiveDateTime,
    ) -> Result<SeriesLookup, TimeSeriesError> {
        let reader = source.open(path).map_err(|e| open_error(path, e))?;
        let function = parse_tim(reader, path, reference_time)?;
        Ok(SeriesLookup::Found(function))
    }
}

pub fn parse_tim(
    reader: impl BufRead,
    path: &Path,
    reference_time: NaiveDateTime,
) -> Result<TimeFunction, TimeSeriesError> {
    let mut points = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|e| open_error(path, e))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('*') || line.starts_with('#') {
            continue;
        }

        let mut tokens = line.split_whitespace();
        let minutes = parse_number(tokens.next(), path, line_no, true)?;
        let value = parse_number(tokens.next(), path, line_no, false)?;

        points.push((shift_time(reference_time, minutes * 60.0, path, line_no)?, value));
    }

    Ok(TimeFunction::new(points))
}
