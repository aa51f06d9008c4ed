//! Bar table: the materialized, timestamp-indexed bar series.
//!
//! Indicator and signal computations need random access (forward and backward
//! shifts), so they operate on a completed table rather than on a stream.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Bar, CalendarUnit};

/// Structural problems found by [`BarTable::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BarTableError {
    #[error("bar {position} at {timestamp} does not follow {previous}")]
    NotIncreasing {
        position: usize,
        timestamp: NaiveDateTime,
        previous: NaiveDateTime,
    },
    #[error("bar {position} at {timestamp} violates OHLC bounds")]
    InconsistentBar {
        position: usize,
        timestamp: NaiveDateTime,
    },
}

/// Ordered sequence of closed bars.
///
/// Timestamps are expected to be strictly increasing. Gaps are allowed and
/// are never filled in. Construction does not check ordering: producers own
/// that contract, and [`validate`](Self::validate) is available to them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarTable {
    bars: Vec<Bar>,
    unit: Option<CalendarUnit>,
}

impl BarTable {
    pub fn from_bars(bars: Vec<Bar>) -> Self {
        Self { bars, unit: None }
    }

    /// Record the calendar unit the bars were built at.
    pub fn with_unit(mut self, unit: CalendarUnit) -> Self {
        self.unit = Some(unit);
        self
    }

    pub fn unit(&self) -> Option<CalendarUnit> {
        self.unit
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn into_bars(self) -> Vec<Bar> {
        self.bars
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Bar> {
        self.bars.iter()
    }

    /// Bar at `position`.
    pub fn get(&self, position: usize) -> Option<&Bar> {
        self.bars.get(position)
    }

    /// Position of the bar stamped exactly `timestamp`.
    pub fn position_of(&self, timestamp: NaiveDateTime) -> Option<usize> {
        self.bars
            .binary_search_by_key(&timestamp, |bar| bar.timestamp)
            .ok()
    }

    /// Bar stamped exactly `timestamp`.
    pub fn get_by_timestamp(&self, timestamp: NaiveDateTime) -> Option<&Bar> {
        self.position_of(timestamp).map(|i| &self.bars[i])
    }

    pub fn timestamps(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.bars.iter().map(|bar| bar.timestamp)
    }

    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Spacing between the last two bars.
    pub fn period(&self) -> Option<Duration> {
        match self.bars.as_slice() {
            [.., prev, last] => Some(last.timestamp - prev.timestamp),
            _ => None,
        }
    }

    /// Spacing used to stamp index slots projected past the last bar:
    /// the recorded unit if any, otherwise the last observed spacing.
    pub fn projection_step(&self) -> Option<Duration> {
        self.unit
            .map(CalendarUnit::duration)
            .or_else(|| self.period())
            .filter(|step| *step > Duration::zero())
    }

    /// Check strict timestamp order and per-bar OHLC bounds.
    pub fn validate(&self) -> Result<(), BarTableError> {
        for (position, bar) in self.bars.iter().enumerate() {
            if !bar.is_sane() {
                return Err(BarTableError::InconsistentBar {
                    position,
                    timestamp: bar.timestamp,
                });
            }
            if position > 0 {
                let previous = self.bars[position - 1].timestamp;
                if bar.timestamp <= previous {
                    return Err(BarTableError::NotIncreasing {
                        position,
                        timestamp: bar.timestamp,
                        previous,
                    });
                }
            }
        }
        Ok(())
    }
}

impl FromIterator<Bar> for BarTable {
    fn from_iter<T: IntoIterator<Item = Bar>>(iter: T) -> Self {
        Self::from_bars(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a BarTable {
    type Item = &'a Bar;
    type IntoIter = std::slice::Iter<'a, Bar>;

    fn into_iter(self) -> Self::IntoIter {
        self.bars.iter()
    }
}
