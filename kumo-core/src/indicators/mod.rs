//! Indicator engine.
//!
//! Indicators are batch transforms over a completed [`BarTable`]: they need
//! forward and backward shifts, so there is no streaming mode. Values that
//! depend on bars outside the table are `None`, never zero.
//!
//! [`BarTable`]: crate::domain::BarTable

pub mod ichimoku;
pub mod window;

pub use ichimoku::{compute_overlay, IchimokuParams, Overlay, OverlayPoint};
pub use window::{midpoint, rolling_midpoint};

/// Create bars from `(open, high, low, close)` rows, one minute apart.
#[cfg(test)]
pub fn make_ohlc_bars(
    data: &[(
        rust_decimal::Decimal,
        rust_decimal::Decimal,
        rust_decimal::Decimal,
        rust_decimal::Decimal,
    )],
) -> Vec<crate::domain::Bar> {
    use crate::domain::Bar;
    let base = chrono::NaiveDate::from_ymd_opt(2010, 1, 1)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| {
            Bar::new(base + chrono::Duration::minutes(i as i64), open, high, low, close)
        })
        .collect()
}

/// Create bars from close prices: open = previous close, range widened by 1.
#[cfg(test)]
pub fn make_bars(closes: &[rust_decimal::Decimal]) -> Vec<crate::domain::Bar> {
    use rust_decimal::Decimal;
    let rows: Vec<_> = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            (open, open.max(close) + Decimal::ONE, open.min(close) - Decimal::ONE, close)
        })
        .collect();
    make_ohlc_bars(&rows)
}
