//! Rolling high/low midpoint: the building block of every Ichimoku line.
//!
//! `rolling_midpoint(bars, n)[t] = (max(high[t-n+1..=t]) + min(low[t-n+1..=t])) / 2`
//!
//! Lookback: n - 1. Positions before that are `None`.

use rust_decimal::Decimal;

use crate::domain::Bar;

/// Average of two optional values; `None` if either is missing.
pub fn midpoint(a: Option<Decimal>, b: Option<Decimal>) -> Option<Decimal> {
    Some((a? + b?) / Decimal::TWO)
}

/// Midpoint of the highest high and lowest low over the trailing `period`
/// bars, including the current one.
///
/// A zero period yields an all-`None` series.
pub fn rolling_midpoint(bars: &[Bar], period: usize) -> Vec<Option<Decimal>> {
    let n = bars.len();
    let mut result = vec![None; n];

    if period == 0 || n < period {
        return result;
    }

    for i in (period - 1)..n {
        let window = &bars[i + 1 - period..=i];
        let highest = window.iter().map(|bar| bar.high).max();
        let lowest = window.iter().map(|bar| bar.low).min();
        result[i] = midpoint(highest, lowest);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_ohlc_bars;
    use rust_decimal_macros::dec;

    #[test]
    fn midpoint_3() {
        let bars = make_ohlc_bars(&[
            (dec!(10), dec!(12), dec!(9), dec!(11)),
            (dec!(11), dec!(15), dec!(10), dec!(14)),
            (dec!(14), dec!(14), dec!(13), dec!(13.5)),
            (dec!(13.5), dec!(16), dec!(12), dec!(15)),
            (dec!(15), dec!(15.5), dec!(14), dec!(14.5)),
        ]);
        let result = rolling_midpoint(&bars, 3);

        assert_eq!(result[0], None);
        assert_eq!(result[1], None);
        // [2] = (max(12, 15, 14) + min(9, 10, 13)) / 2 = 12
        assert_eq!(result[2], Some(dec!(12)));
        // [3] = (16 + 10) / 2 = 13
        assert_eq!(result[3], Some(dec!(13)));
        // [4] = (16 + 12) / 2 = 14
        assert_eq!(result[4], Some(dec!(14)));
    }

    #[test]
    fn short_series_is_all_none() {
        let bars = make_ohlc_bars(&[(dec!(1), dec!(2), dec!(0.5), dec!(1.5)); 4]);
        assert!(rolling_midpoint(&bars, 5).iter().all(Option::is_none));
    }

    #[test]
    fn period_one_is_bar_midpoint() {
        let bars = make_ohlc_bars(&[(dec!(1), dec!(3), dec!(1), dec!(2))]);
        assert_eq!(rolling_midpoint(&bars, 1), vec![Some(dec!(2))]);
    }

    #[test]
    fn zero_period_is_all_none() {
        let bars = make_ohlc_bars(&[(dec!(1), dec!(3), dec!(1), dec!(2))]);
        assert_eq!(rolling_midpoint(&bars, 0), vec![None]);
    }

    #[test]
    fn midpoint_propagates_absence() {
        assert_eq!(midpoint(Some(dec!(1)), None), None);
        assert_eq!(midpoint(Some(dec!(1)), Some(dec!(2))), Some(dec!(1.5)));
    }
}
