//! Tick: a single bid/ask quote.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::PRICE_SCALE;

/// One bid/ask sample.
///
/// Producers must keep `bid <= ask` and emit non-decreasing timestamps.
/// Consumers in this crate rely on that and do not re-check it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tick {
    pub timestamp: NaiveDateTime,
    pub bid: Decimal,
    pub ask: Decimal,
}

impl Tick {
    pub fn new(timestamp: NaiveDateTime, bid: Decimal, ask: Decimal) -> Self {
        Self {
            timestamp,
            bid,
            ask,
        }
    }

    /// `(bid + ask) / 2`, rounded to the price scale (banker's rounding).
    pub fn mid(&self) -> Decimal {
        let mut mid = ((self.bid + self.ask) / Decimal::TWO).round_dp(PRICE_SCALE);
        mid.rescale(PRICE_SCALE);
        mid
    }

    pub fn spread(&self) -> Decimal {
        self.ask - self.bid
    }
}
