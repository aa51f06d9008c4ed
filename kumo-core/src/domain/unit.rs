//! Calendar units used to bucket timestamps.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A calendar bucket size.
///
/// A bucket is identified by its start: the timestamp truncated to the unit.
/// Two timestamps share a bucket exactly when they truncate to the same start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarUnit {
    Second,
    Minute,
    Hour,
    Day,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown calendar unit '{0}' (expected second, minute, hour or day)")]
pub struct UnknownUnit(pub String);

impl CalendarUnit {
    /// Start of the bucket containing `ts`.
    pub fn bucket_start(self, ts: NaiveDateTime) -> NaiveDateTime {
        let time = ts.time();
        let seconds_into_bucket = match self {
            CalendarUnit::Second => 0,
            CalendarUnit::Minute => time.second(),
            CalendarUnit::Hour => time.minute() * 60 + time.second(),
            CalendarUnit::Day => time.num_seconds_from_midnight(),
        };
        ts - Duration::seconds(i64::from(seconds_into_bucket))
            - Duration::nanoseconds(i64::from(time.nanosecond()))
    }

    /// Nominal length of one bucket.
    pub fn duration(self) -> Duration {
        match self {
            CalendarUnit::Second => Duration::seconds(1),
            CalendarUnit::Minute => Duration::minutes(1),
            CalendarUnit::Hour => Duration::hours(1),
            CalendarUnit::Day => Duration::days(1),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CalendarUnit::Second => "second",
            CalendarUnit::Minute => "minute",
            CalendarUnit::Hour => "hour",
            CalendarUnit::Day => "day",
        }
    }
}

impl fmt::Display for CalendarUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CalendarUnit {
    type Err = UnknownUnit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "second" | "s" => Ok(CalendarUnit::Second),
            "minute" | "m" => Ok(CalendarUnit::Minute),
            "hour" | "h" => Ok(CalendarUnit::Hour),
            "day" | "d" => Ok(CalendarUnit::Day),
            _ => Err(UnknownUnit(s.to_string())),
        }
    }
}
