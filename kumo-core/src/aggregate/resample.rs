//! Bar resampler: finer bars in, one bar per calendar unit out.
//!
//! Bounds are not re-checked here; inputs are trusted to satisfy the OHLC
//! invariant already enforced by the second aggregator.

use super::{AggregationError, BucketAccumulator};
use crate::domain::{Bar, CalendarUnit};

/// Re-buckets bars into a coarser calendar unit.
///
/// `open` comes from the first constituent, `high`/`low` are running extrema,
/// `close` comes from the last constituent.
#[derive(Debug, Clone)]
pub struct Resampler {
    bucket: BucketAccumulator,
}

impl Resampler {
    pub fn new(unit: CalendarUnit) -> Self {
        Self {
            bucket: BucketAccumulator::new(unit),
        }
    }

    pub fn unit(&self) -> CalendarUnit {
        self.bucket.unit()
    }

    /// Fold in one bar. Returns the completed bucket when `bar` opens a new one.
    pub fn push(&mut self, bar: &Bar) -> Option<Bar> {
        let closed = self.bucket.push(bar)?;
        tracing::trace!(unit = %self.unit(), timestamp = %closed.timestamp, "bucket closed");
        Some(closed)
    }

    /// The bucket still being accumulated.
    pub fn pending(&self) -> Option<&Bar> {
        self.bucket.pending()
    }
}

/// Lazy resampled stream over an upstream bar stream.
///
/// Upstream errors are passed through unchanged.
#[derive(Debug, Clone)]
pub struct ResampledBars<I> {
    bars: I,
    state: Resampler,
}

impl<I> ResampledBars<I> {
    pub fn pending(&self) -> Option<&Bar> {
        self.state.pending()
    }
}

impl<I> Iterator for ResampledBars<I>
where
    I: Iterator<Item = Result<Bar, AggregationError>>,
{
    type Item = Result<Bar, AggregationError>;

    fn next(&mut self) -> Option<Self::Item> {
        for item in self.bars.by_ref() {
            match item {
                Ok(bar) => {
                    if let Some(closed) = self.state.push(&bar) {
                        return Some(Ok(closed));
                    }
                }
                Err(err) => return Some(Err(err)),
            }
        }
        None
    }
}

/// Resample a bar stream into bars of `unit`.
pub fn resample<T>(bars: T, unit: CalendarUnit) -> ResampledBars<T::IntoIter>
where
    T: IntoIterator<Item = Result<Bar, AggregationError>>,
{
    ResampledBars {
        bars: bars.into_iter(),
        state: Resampler::new(unit),
    }
}
