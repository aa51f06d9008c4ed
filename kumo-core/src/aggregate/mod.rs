//! Streaming OHLC aggregation: ticks → second bars → unit bars.
//!
//! Each stage is a state struct with a `push` method that folds in one input
//! and returns the bar it closed, if any. Iterator adapters wrap the state
//! structs to form a pull-based chain: asking the resampler for one bar pulls
//! exactly as many second bars (and ticks) as it takes to close it.
//!
//! Emitted bars are stamped with the start of their bucket. A bucket is only
//! emitted once an input from a later bucket has been seen; the bucket still
//! open when a finite source ends is never emitted.

pub mod resample;
pub mod seconds;

pub use resample::{resample, ResampledBars, Resampler};
pub use seconds::{aggregate_seconds, check_consistency, SecondAggregator, SecondBars};

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::{Bar, CalendarUnit};

/// Fatal aggregation failures. A run must stop on any of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregationError {
    #[error(
        "inconsistent high in bar at {timestamp}: open={open} high={high} low={low} close={close}"
    )]
    InconsistentHigh {
        timestamp: NaiveDateTime,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
    },
    #[error(
        "inconsistent low in bar at {timestamp}: open={open} high={high} low={low} close={close}"
    )]
    InconsistentLow {
        timestamp: NaiveDateTime,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
    },
}

/// The open bucket of one aggregation stage.
#[derive(Debug, Clone)]
pub(crate) struct BucketAccumulator {
    unit: CalendarUnit,
    current: Option<Bar>,
}

impl BucketAccumulator {
    pub(crate) fn new(unit: CalendarUnit) -> Self {
        Self {
            unit,
            current: None,
        }
    }

    /// Fold `observation` into the open bucket.
    ///
    /// When the observation belongs to a different bucket, the open bucket is
    /// returned and the observation seeds the next one.
    pub(crate) fn push(&mut self, observation: &Bar) -> Option<Bar> {
        let bucket = self.unit.bucket_start(observation.timestamp);
        if let Some(open) = self.current.as_mut() {
            if open.timestamp == bucket {
                open.absorb(observation);
                return None;
            }
        }
        self.current.replace(Bar {
            timestamp: bucket,
            ..*observation
        })
    }

    pub(crate) fn pending(&self) -> Option<&Bar> {
        self.current.as_ref()
    }

    pub(crate) fn unit(&self) -> CalendarUnit {
        self.unit
    }
}
