//! Tabular `.bc` files.
//!
//! A `.bc` file holds `[forcing]` blocks for many structures:
//!
//! ```text
//! [forcing]
//! name              = P1
//! function          = timeseries
//! timeInterpolation = linear
//! quantity          = time
//! unit              = minutes since 2022-05-05 00:00:00
//! quantity          = pump_capacity
//! unit              = m3/s
//! 0    1.0
//! 60   2.0
//! ```
//!
//! The whole file is split into raw blocks grouped by `name` the first time a
//! path is requested ([`BcCache`]). Numbers are only parsed for the block that
//! is looked up, so a malformed block fails only the references that use it.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use sluice_core::{Interpolation, TimeFunction};
use tracing::debug;

use super::{
    open_error, parse_number, shift_time, FileSource, SeriesLookup, TimeSeriesError,
    TimeSeriesFileReader,
};

/// One `[forcing]` block before any numeric parsing.
#[derive(Debug, Clone, Default, PartialEq)]
struct RawBlock {
    line: usize,
    properties: Vec<(String, String)>,
    rows: Vec<(usize, String)>,
}

impl RawBlock {
    fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// `(quantity, unit)` pairs in declaration order.
    fn columns(&self) -> Vec<(&str, Option<&str>)> {
        let mut columns: Vec<(&str, Option<&str>)> = Vec::new();
        for (key, value) in &self.properties {
            if key.eq_ignore_ascii_case("quantity") {
                columns.push((value.as_str(), None));
            } else if key.eq_ignore_ascii_case("unit") {
                if let Some(last) = columns.last_mut() {
                    last.1.get_or_insert(value.as_str());
                }
            }
        }
        columns
    }

    fn has_quantity(&self, quantity: &str) -> bool {
        self.columns()
            .iter()
            .any(|(q, _)| q.eq_ignore_ascii_case(quantity))
    }
}

/// Blocks of one `.bc` file grouped by structure name.
#[derive(Debug, Clone, Default)]
pub struct BcCache {
    path: PathBuf,
    groups: HashMap<String, Vec<RawBlock>>,
}

impl BcCache {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    fn build(reader: impl BufRead, path: &Path) -> Result<Self, TimeSeriesError> {
        let mut groups: HashMap<String, Vec<RawBlock>> = HashMap::new();
        let mut current: Option<RawBlock> = None;

        let mut finish = |block: Option<RawBlock>| {
            let Some(block) = block else { return };
            match block.property("name").map(str::trim).filter(|n| !n.is_empty()) {
                Some(name) => groups.entry(name.to_string()).or_default().push(block),
                None => debug!(
                    line = block.line,
                    "Discarding forcing block without a name in {}",
                    path.display()
                ),
            }
        };

        for (idx, line) in reader.lines().enumerate() {
            let line_no = idx + 1;
            let line = line.map_err(|e| open_error(path, e))?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                finish(current.take());
                if header.trim().eq_ignore_ascii_case("forcing") {
                    current = Some(RawBlock {
                        line: line_no,
                        ..RawBlock::default()
                    });
                }
                continue;
            }

            match current.as_mut() {
                Some(block) => match line.split_once('=') {
                    Some((key, value)) if block.rows.is_empty() => block
                        .properties
                        .push((key.trim().to_string(), value.trim().to_string())),
                    _ => block.rows.push((line_no, line.to_string())),
                },
                None => debug!(line = line_no, "Omitting line outside forcing block: {}", line),
            }
        }
        finish(current.take());

        Ok(Self {
            path: path.to_path_buf(),
            groups,
        })
    }

    fn lookup(
        &self,
        structure_name: &str,
        quantity: &str,
        reference_time: NaiveDateTime,
    ) -> Result<SeriesLookup, TimeSeriesError> {
        let Some(blocks) = self.groups.get(structure_name) else {
            return Ok(SeriesLookup::UnknownName);
        };
        match blocks.iter().find(|b| b.has_quantity(quantity)) {
            Some(block) => self
                .parse_block(block, quantity, reference_time)
                .map(SeriesLookup::Found),
            None => Ok(SeriesLookup::UnknownQuantity),
        }
    }

    fn parse_block(
        &self,
        block: &RawBlock,
        quantity: &str,
        reference_time: NaiveDateTime,
    ) -> Result<TimeFunction, TimeSeriesError> {
        let columns = block.columns();
        let value_column = columns
            .iter()
            .position(|(q, _)| q.eq_ignore_ascii_case(quantity))
            .unwrap_or(0);

        let function_kind = block.property("function").unwrap_or("timeseries");
        if function_kind.eq_ignore_ascii_case("constant") {
            let (line, row) = block.rows.first().map(|(l, r)| (*l, r.as_str())).unwrap_or((block.line, ""));
            let value = parse_number(row.split_whitespace().nth(value_column), &self.path, line, false)?;
            return Ok(TimeFunction::constant(reference_time, value));
        }

        let time_column = columns
            .iter()
            .position(|(q, _)| q.eq_ignore_ascii_case("time"))
            .unwrap_or(0);
        let unit = columns
            .get(time_column)
            .and_then(|(_, unit)| *unit)
            .unwrap_or_default();
        let (seconds_per_unit, origin) =
            parse_time_unit(unit).ok_or_else(|| TimeSeriesError::InvalidUnit {
                path: self.path.clone(),
                unit: unit.to_string(),
            })?;

        let mut points = Vec::with_capacity(block.rows.len());
        for (line, row) in &block.rows {
            let tokens: Vec<&str> = row.split_whitespace().collect();
            let time = parse_number(tokens.get(time_column).copied(), &self.path, *line, true)?;
            let value = parse_number(tokens.get(value_column).copied(), &self.path, *line, false)?;
            let at = shift_time(origin, time * seconds_per_unit, &self.path, *line)?;
            points.push((at, value));
        }

        let periodic = block
            .property("periodic")
            .map(|p| matches!(p.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);
        let interpolation = block
            .property("timeInterpolation")
            .and_then(Interpolation::from_keyword)
            .unwrap_or_default();

        Ok(TimeFunction::new(points)
            .with_periodic(periodic)
            .with_interpolation(interpolation))
    }
}

/// Parse `"<unit> since <date>"` into seconds per unit and the origin.
pub fn parse_time_unit(unit: &str) -> Option<(f64, NaiveDateTime)> {
    let lower = unit.trim().to_ascii_lowercase();
    let (scale, date) = lower.split_once(" since ")?;
    let seconds = match scale.trim() {
        "seconds" | "second" | "s" | "sec" => 1.0,
        "minutes" | "minute" | "min" => 60.0,
        "hours" | "hour" | "h" => 3600.0,
        "days" | "day" | "d" => 86_400.0,
        _ => return None,
    };

    let date = date.trim();
    let origin = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(date, fmt).ok())
        .or_else(|| {
            // Trailing time zone offsets ("+00:00") are ignored.
            let head = date.get(..19)?;
            NaiveDateTime::parse_from_str(head, "%Y-%m-%d %H:%M:%S").ok()
        })
        .or_else(|| {
            NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    Some((seconds, origin))
}

/// Render one `[forcing]` block with times in seconds since `reference_time`.
pub fn write_bc_block(
    name: &str,
    quantity: &str,
    unit: &str,
    function: &TimeFunction,
    reference_time: NaiveDateTime,
) -> String {
    let mut out = String::new();
    out.push_str("[forcing]\n");
    out.push_str(&format!("name              = {}\n", name));
    out.push_str("function          = timeseries\n");
    out.push_str(&format!(
        "timeInterpolation = {}\n",
        function.interpolation.as_str()
    ));
    out.push_str(&format!("periodic          = {}\n", function.periodic));
    out.push_str("quantity          = time\n");
    out.push_str(&format!(
        "unit              = seconds since {}\n",
        reference_time.format("%Y-%m-%d %H:%M:%S")
    ));
    out.push_str(&format!("quantity          = {}\n", quantity));
    out.push_str(&format!("unit              = {}\n", unit));
    for (t, v) in &function.points {
        let seconds = (*t - reference_time).num_milliseconds() as f64 / 1000.0;
        out.push_str(&format!("{} {}\n", seconds, v));
    }
    out.push('\n');
    out
}

/// Reader for `.bc` files with a per-path cache.
#[derive(Debug, Default)]
pub struct BcFileReader {
    cache: Option<BcCache>,
}

impl BcFileReader {
    fn cache_for(
        &mut self,
        source: &dyn FileSource,
        path: &Path,
    ) -> Result<&BcCache, TimeSeriesError> {
        let cache = match self.cache.take() {
            Some(cache) if cache.path == path => cache,
            _ => {
                debug!("Building forcing cache for {}", path.display());
                // The reader is consumed by the build and closed on every outcome.
                let reader = source.open(path).map_err(|e| open_error(path, e))?;
                BcCache::build(reader, path)?
            }
        };
        Ok(self.cache.insert(cache))
    }
}

impl TimeSeriesFileReader for BcFileReader {
    fn suffixes(&self) -> &'static [&'static str] {
        &["bc"]
    }

    fn read(
        &mut self,
        source: &dyn FileSource,
        path: &Path,
        structure_name: &str,
        quantity: &str,
        reference_time: NaiveDateTime,
    ) -> Result<SeriesLookup, TimeSeriesError> {
        self.cache_for(source, path)?
            .lookup(structure_name, quantity, reference_time)
    }
}
