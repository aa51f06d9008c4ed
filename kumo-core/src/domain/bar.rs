//! Bar: the fundamental market data unit.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// OHLC bar for a single time bucket.
///
/// `timestamp` is the start of the bucket the bar summarizes. Prices carry
/// [`PRICE_SCALE`](super::PRICE_SCALE) fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
}

impl Bar {
    pub fn new(
        timestamp: NaiveDateTime,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
        }
    }

    /// A bar whose four prices are all `price`.
    pub fn flat(timestamp: NaiveDateTime, price: Decimal) -> Self {
        Self::new(timestamp, price, price, price, price)
    }

    /// Midpoint of the bar's range, `(high + low) / 2`.
    pub fn mid(&self) -> Decimal {
        (self.high + self.low) / Decimal::TWO
    }

    /// OHLC sanity check: low <= open, close <= high.
    pub fn is_sane(&self) -> bool {
        self.low <= self.high
            && self.low <= self.open
            && self.low <= self.close
            && self.high >= self.open
            && self.high >= self.close
    }

    /// Widen the range with a later constituent and take its close.
    pub(crate) fn absorb(&mut self, later: &Bar) {
        self.high = self.high.max(later.high);
        self.low = self.low.min(later.low);
        self.close = later.close;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn sample_bar() -> Bar {
        Bar::new(
            NaiveDate::from_ymd_opt(2010, 1, 1)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            dec!(100.000),
            dec!(100.250),
            dec!(99.900),
            dec!(100.100),
        )
    }

    #[test]
    fn bar_is_sane() {
        assert!(sample_bar().is_sane());
    }

    #[test]
    fn bar_detects_insane_high_low() {
        let mut bar = sample_bar();
        bar.high = dec!(99.800); // below low
        assert!(!bar.is_sane());
    }

    #[test]
    fn mid_is_range_midpoint() {
        assert_eq!(sample_bar().mid(), dec!(100.075));
    }

    #[test]
    fn absorb_widens_and_takes_close() {
        let mut bar = sample_bar();
        let later = Bar::new(bar.timestamp, dec!(100.1), dec!(100.3), dec!(100.0), dec!(100.2));
        bar.absorb(&later);
        assert_eq!(bar.open, dec!(100.000));
        assert_eq!(bar.high, dec!(100.3));
        assert_eq!(bar.low, dec!(99.900));
        assert_eq!(bar.close, dec!(100.2));
    }

    #[test]
    fn bar_serialization_roundtrip() {
        let bar = sample_bar();
        let json = serde_json::to_string(&bar).unwrap();
        let deser: Bar = serde_json::from_str(&json).unwrap();
        assert_eq!(bar, deser);
        assert!(json.contains("\"100.250\""));
    }
}
