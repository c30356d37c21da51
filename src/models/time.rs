//! Pivot and time scale.
//!
//! The solver works on integers. A [`Pivot`] maps absolute UTC timestamps
//! to that integer domain and back: `n = round((t - pivot) / unit)` and
//! `t = pivot + n * unit`. One pivot must be used for the whole lifetime of
//! a planning run, otherwise solved values cannot be mapped back.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PlanningError;

/// Unit of the solver's integer time domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeScale {
    Days,
    Hours,
    #[default]
    Minutes,
    Seconds,
}

impl TimeScale {
    /// Length of one unit in seconds.
    pub fn seconds(self) -> i64 {
        match self {
            TimeScale::Days => 86_400,
            TimeScale::Hours => 3_600,
            TimeScale::Minutes => 60,
            TimeScale::Seconds => 1,
        }
    }

    /// Length of `units` units as a duration.
    pub fn duration(self, units: i64) -> Duration {
        Duration::seconds(units * self.seconds())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeScale::Days => "days",
            TimeScale::Hours => "hours",
            TimeScale::Minutes => "minutes",
            TimeScale::Seconds => "seconds",
        }
    }
}

impl fmt::Display for TimeScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeScale {
    type Err = PlanningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "days" => Ok(TimeScale::Days),
            "hours" => Ok(TimeScale::Hours),
            "minutes" => Ok(TimeScale::Minutes),
            "seconds" => Ok(TimeScale::Seconds),
            other => Err(PlanningError::Config(format!(
                "scale '{other}' not implemented, try one of: days, hours, minutes, seconds"
            ))),
        }
    }
}

/// Reference instant plus unit for the integer time domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pivot {
    /// Instant mapped to integer 0.
    pub at: DateTime<Utc>,
    /// Unit of one integer step.
    pub scale: TimeScale,
}

impl Pivot {
    pub fn new(at: DateTime<Utc>, scale: TimeScale) -> Self {
        Self { at, scale }
    }

    /// Converts an absolute instant into the integer domain (rounded to the
    /// nearest unit).
    pub fn to_int(&self, instant: DateTime<Utc>) -> i64 {
        let millis = (instant - self.at).num_milliseconds();
        let unit = self.scale.seconds() * 1000;
        (millis as f64 / unit as f64).round() as i64
    }

    /// Converts an integer back into an absolute instant.
    pub fn to_datetime(&self, value: i64) -> DateTime<Utc> {
        self.at + self.scale.duration(value)
    }
}
