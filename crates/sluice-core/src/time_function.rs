//! Time-dependent values.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// How values between two time points are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Interpolation {
    #[default]
    Linear,
    /// Value holds from a point until the next one
    BlockFrom,
    /// Value holds from the previous point up to this one
    BlockTo,
}

impl Interpolation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interpolation::Linear => "linear",
            Interpolation::BlockFrom => "block-from",
            Interpolation::BlockTo => "block-to",
        }
    }

    /// Parse an interpolation keyword, ignoring case. Unknown keywords give `None`.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.trim().to_ascii_lowercase().as_str() {
            "linear" => Some(Interpolation::Linear),
            "block-from" | "blockfrom" => Some(Interpolation::BlockFrom),
            "block-to" | "blockto" => Some(Interpolation::BlockTo),
            _ => None,
        }
    }
}

/// Ordered (timestamp, value) pairs, optionally repeating.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TimeFunction {
    pub points: Vec<(NaiveDateTime, f64)>,
    pub periodic: bool,
    pub interpolation: Interpolation,
}

impl TimeFunction {
    /// Build a function from points; points are sorted by time.
    pub fn new(mut points: Vec<(NaiveDateTime, f64)>) -> Self {
        points.sort_by_key(|(t, _)| *t);
        Self {
            points,
            periodic: false,
            interpolation: Interpolation::Linear,
        }
    }

    /// A function without points. Callers treat it as "no data".
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn constant(at: NaiveDateTime, value: f64) -> Self {
        Self::new(vec![(at, value)])
    }

    pub fn with_periodic(mut self, periodic: bool) -> Self {
        self.periodic = periodic;
        self
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn start(&self) -> Option<NaiveDateTime> {
        self.points.first().map(|(t, _)| *t)
    }

    pub fn end(&self) -> Option<NaiveDateTime> {
        self.points.last().map(|(t, _)| *t)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|(_, v)| *v)
    }

    /// Evaluate the function at `time`.
    ///
    /// Outside the defined range the nearest value is held, unless the function
    /// is periodic, in which case `time` is wrapped into the first period.
    pub fn value_at(&self, time: NaiveDateTime) -> Option<f64> {
        let (first_t, first_v) = *self.points.first()?;
        let (last_t, last_v) = *self.points.last()?;

        let time = if self.periodic && last_t > first_t && (time < first_t || time > last_t) {
            let period = (last_t - first_t).num_milliseconds();
            let offset = (time - first_t).num_milliseconds().rem_euclid(period);
            first_t + Duration::milliseconds(offset)
        } else {
            time
        };

        if time <= first_t {
            return Some(first_v);
        }
        if time >= last_t {
            return Some(last_v);
        }

        let upper = self.points.partition_point(|(t, _)| *t <= time);
        let (t0, v0) = self.points[upper - 1];
        let (t1, v1) = self.points[upper];

        let value = match self.interpolation {
            Interpolation::BlockFrom => v0,
            Interpolation::BlockTo => {
                if time == t0 {
                    v0
                } else {
                    v1
                }
            }
            Interpolation::Linear => {
                let span = (t1 - t0).num_milliseconds() as f64;
                let fraction = (time - t0).num_milliseconds() as f64 / span;
                v0 + fraction * (v1 - v0)
            }
        };
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn t(hour: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2022, 5, 5)
            .unwrap()
            .and_hms_opt(hour, min, 0)
            .unwrap()
    }

    fn ramp() -> TimeFunction {
        TimeFunction::new(vec![(t(1, 0), 2.0), (t(0, 0), 0.0), (t(2, 0), 2.0)])
    }

    #[test]
    fn test_points_are_sorted() {
        let f = ramp();
        assert_eq!(f.start(), Some(t(0, 0)));
        assert_eq!(f.end(), Some(t(2, 0)));
        assert_eq!(f.values().collect::<Vec<_>>(), vec![0.0, 2.0, 2.0]);
    }

    #[test]
    fn test_linear_interpolation() {
        let f = ramp();
        assert_eq!(f.value_at(t(0, 30)), Some(1.0));
        assert_eq!(f.value_at(t(1, 30)), Some(2.0));
    }

    #[test]
    fn test_values_held_outside_range() {
        let f = ramp();
        assert_eq!(f.value_at(t(0, 0) - Duration::hours(3)), Some(0.0));
        assert_eq!(f.value_at(t(5, 0)), Some(2.0));
    }

    #[test]
    fn test_block_interpolation() {
        let from = ramp().with_interpolation(Interpolation::BlockFrom);
        assert_eq!(from.value_at(t(0, 59)), Some(0.0));

        let to = ramp().with_interpolation(Interpolation::BlockTo);
        assert_eq!(to.value_at(t(0, 1)), Some(2.0));
        assert_eq!(to.value_at(t(1, 0)), Some(2.0));
    }

    #[test]
    fn test_periodic_wraps_time() {
        let f = ramp().with_periodic(true);
        // 2h period: 02:30 maps back to 00:30
        assert_eq!(f.value_at(t(2, 30)), Some(1.0));
    }

    #[test]
    fn test_empty_function() {
        let f = TimeFunction::empty();
        assert!(f.is_empty());
        assert_eq!(f.len(), 0);
        assert_eq!(f.value_at(t(0, 0)), None);
    }

    #[test]
    fn test_interpolation_keywords() {
        assert_eq!(
            Interpolation::from_keyword("Block-From"),
            Some(Interpolation::BlockFrom)
        );
        assert_eq!(Interpolation::from_keyword("cubic"), None);
        assert_eq!(Interpolation::BlockTo.as_str(), "block-to");
    }
}
