//! Second aggregator: ticks in, one-second OHLC bars out.

use rust_decimal::Decimal;

use super::{AggregationError, BucketAccumulator};
use crate::domain::{Bar, CalendarUnit, Tick};

/// Check the OHLC bounds of a bar about to be emitted.
///
/// The accumulation logic cannot produce a violation from well-formed ticks,
/// so a failure here means either the tick contract or the aggregator is
/// broken.
pub fn check_consistency(bar: &Bar) -> Result<(), AggregationError> {
    let Bar {
        timestamp,
        open,
        high,
        low,
        close,
    } = *bar;
    if high < low || high < open || high < close {
        return Err(AggregationError::InconsistentHigh {
            timestamp,
            open,
            high,
            low,
            close,
        });
    }
    if low > high || low > open || low > close {
        return Err(AggregationError::InconsistentLow {
            timestamp,
            open,
            high,
            low,
            close,
        });
    }
    Ok(())
}

/// Accumulates tick mid prices into one bar per wall-clock second.
#[derive(Debug, Clone)]
pub struct SecondAggregator {
    bucket: BucketAccumulator,
}

impl Default for SecondAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl SecondAggregator {
    pub fn new() -> Self {
        Self {
            bucket: BucketAccumulator::new(CalendarUnit::Second),
        }
    }

    /// Fold in one tick. Returns the previous second's bar when `tick` opens
    /// a new second.
    ///
    /// Ticks are trusted to arrive in timestamp order with `bid <= ask`.
    pub fn push(&mut self, tick: Tick) -> Result<Option<Bar>, AggregationError> {
        let mid: Decimal = tick.mid();
        match self.bucket.push(&Bar::flat(tick.timestamp, mid)) {
            Some(closed) => {
                if let Err(err) = check_consistency(&closed) {
                    tracing::error!(%err, "second bar failed consistency check");
                    return Err(err);
                }
                tracing::trace!(
                    timestamp = %closed.timestamp,
                    close = %closed.close,
                    "second bar closed"
                );
                Ok(Some(closed))
            }
            None => Ok(None),
        }
    }

    /// The second still being accumulated.
    pub fn pending(&self) -> Option<&Bar> {
        self.bucket.pending()
    }
}

/// Lazy second-bar stream over a tick source.
///
/// Yields `Err` at most once; the stream ends after a consistency failure.
#[derive(Debug, Clone)]
pub struct SecondBars<I> {
    ticks: I,
    state: SecondAggregator,
    halted: bool,
}

impl<I> SecondBars<I> {
    pub fn pending(&self) -> Option<&Bar> {
        self.state.pending()
    }
}

impl<I: Iterator<Item = Tick>> Iterator for SecondBars<I> {
    type Item = Result<Bar, AggregationError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.halted {
            return None;
        }
        for tick in self.ticks.by_ref() {
            match self.state.push(tick) {
                Ok(Some(bar)) => return Some(Ok(bar)),
                Ok(None) => {}
                Err(err) => {
                    self.halted = true;
                    return Some(Err(err));
                }
            }
        }
        None
    }
}

/// Aggregate a tick source into one-second bars.
pub fn aggregate_seconds<T>(ticks: T) -> SecondBars<T::IntoIter>
where
    T: IntoIterator<Item = Tick>,
{
    SecondBars {
        ticks: ticks.into_iter(),
        state: SecondAggregator::new(),
        halted: false,
    }
}
