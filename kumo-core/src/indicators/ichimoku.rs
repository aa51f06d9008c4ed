//! Ichimoku overlay: five lines over one shared, extended index.
//!
//! With `d` = displacement and `N_x` the window lengths:
//! - tenkan[t]   = rolling_midpoint(N_tenkan)[t]
//! - kijun[t]    = rolling_midpoint(N_kijun)[t]
//! - senkou_a[t] = (tenkan[t-d] + kijun[t-d]) / 2
//! - senkou_b[t] = rolling_midpoint(N_senkou_b)[t-d]
//! - chikou[t]   = close[t+d]
//!
//! The index is the table's own positions followed by `d` projected slots.
//! Projected slots carry no prices; they only host the leading spans.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::window::{midpoint, rolling_midpoint};
use crate::domain::BarTable;

/// Window lengths and displacement, in bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IchimokuParams {
    pub tenkan: usize,
    pub kijun: usize,
    pub senkou_b: usize,
    pub displacement: usize,
}

impl Default for IchimokuParams {
    fn default() -> Self {
        Self {
            tenkan: 9,
            kijun: 26,
            senkou_b: 52,
            displacement: 26,
        }
    }
}

/// The five overlay values at one index position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayPoint {
    pub timestamp: Option<NaiveDateTime>,
    pub tenkan: Option<Decimal>,
    pub kijun: Option<Decimal>,
    pub senkou_a: Option<Decimal>,
    pub senkou_b: Option<Decimal>,
    pub chikou: Option<Decimal>,
}

impl OverlayPoint {
    /// Upper cloud boundary over whichever spans are present; `None` only
    /// when both are missing.
    pub fn kumo_top(&self) -> Option<Decimal> {
        self.spans().max()
    }

    /// Lower cloud boundary, same presence rule as [`Self::kumo_top`].
    pub fn kumo_bottom(&self) -> Option<Decimal> {
        self.spans().min()
    }

    fn spans(&self) -> impl Iterator<Item = Decimal> {
        self.senkou_a.into_iter().chain(self.senkou_b)
    }
}

/// Column-oriented overlay aligned to `table.len() + displacement` positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlay {
    timestamps: Vec<Option<NaiveDateTime>>,
    real_len: usize,
    displacement: usize,
    tenkan: Vec<Option<Decimal>>,
    kijun: Vec<Option<Decimal>>,
    senkou_a: Vec<Option<Decimal>>,
    senkou_b: Vec<Option<Decimal>>,
    chikou: Vec<Option<Decimal>>,
}

impl Overlay {
    /// Total positions, real plus projected.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Number of positions backed by a real bar.
    pub fn real_len(&self) -> usize {
        self.real_len
    }

    pub fn displacement(&self) -> usize {
        self.displacement
    }

    /// Whether `position` is one of the slots projected past the last bar.
    pub fn is_projected(&self, position: usize) -> bool {
        position >= self.real_len && position < self.len()
    }

    /// Timestamp of `position`. Projected slots have none when the table's
    /// spacing could not be determined.
    pub fn timestamp(&self, position: usize) -> Option<NaiveDateTime> {
        self.timestamps.get(position).copied().flatten()
    }

    pub fn tenkan(&self) -> &[Option<Decimal>] {
        &self.tenkan
    }

    pub fn kijun(&self) -> &[Option<Decimal>] {
        &self.kijun
    }

    pub fn senkou_a(&self) -> &[Option<Decimal>] {
        &self.senkou_a
    }

    pub fn senkou_b(&self) -> &[Option<Decimal>] {
        &self.senkou_b
    }

    pub fn chikou(&self) -> &[Option<Decimal>] {
        &self.chikou
    }

    pub fn point(&self, position: usize) -> Option<OverlayPoint> {
        if position >= self.len() {
            return None;
        }
        Some(OverlayPoint {
            timestamp: self.timestamps[position],
            tenkan: self.tenkan[position],
            kijun: self.kijun[position],
            senkou_a: self.senkou_a[position],
            senkou_b: self.senkou_b[position],
            chikou: self.chikou[position],
        })
    }

    pub fn points(&self) -> impl Iterator<Item = OverlayPoint> + '_ {
        (0..self.len()).filter_map(move |i| self.point(i))
    }
}

/// Compute the Ichimoku overlay for a completed bar table.
///
/// Pure: the table is only read, and no state survives the call.
pub fn compute_overlay(table: &BarTable, params: &IchimokuParams) -> Overlay {
    let bars = table.bars();
    let real_len = bars.len();
    let d = params.displacement;
    let total = real_len + d;

    let timestamps = extended_index(table, d);

    let mut tenkan = rolling_midpoint(bars, params.tenkan);
    let mut kijun = rolling_midpoint(bars, params.kijun);
    tenkan.resize(total, None);
    kijun.resize(total, None);
    let wide = rolling_midpoint(bars, params.senkou_b);

    let lagged = |i: usize| i.checked_sub(d);

    let senkou_a = (0..total)
        .map(|i| lagged(i).and_then(|j| midpoint(tenkan[j], kijun[j])))
        .collect();
    let senkou_b = (0..total)
        .map(|i| lagged(i).and_then(|j| wide.get(j).copied().flatten()))
        .collect();
    let chikou = (0..total)
        .map(|i| bars.get(i + d).map(|bar| bar.close))
        .collect();

    tracing::debug!(bars = real_len, projected = d, "computed ichimoku overlay");

    Overlay {
        timestamps,
        real_len,
        displacement: d,
        tenkan,
        kijun,
        senkou_a,
        senkou_b,
        chikou,
    }
}

/// Table timestamps followed by `slots` projected timestamps.
fn extended_index(table: &BarTable, slots: usize) -> Vec<Option<NaiveDateTime>> {
    let mut index: Vec<Option<NaiveDateTime>> = table.timestamps().map(Some).collect();
    let anchor = table.last().map(|bar| bar.timestamp);
    let step = table.projection_step();
    for k in 1..=slots {
        let projected = match (anchor, step) {
            (Some(last), Some(step)) => i32::try_from(k).ok().map(|k| last + step * k),
            _ => None,
        };
        index.push(projected);
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CalendarUnit;
    use crate::indicators::{make_bars, make_ohlc_bars};
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn ramp(n: usize) -> BarTable {
        let closes: Vec<Decimal> = (0..n).map(|i| Decimal::from(100 + i as i64)).collect();
        BarTable::from_bars(make_bars(&closes)).with_unit(CalendarUnit::Minute)
    }

    #[test]
    fn index_is_extended_by_displacement() {
        let table = ramp(60);
        let overlay = compute_overlay(&table, &IchimokuParams::default());
        assert_eq!(overlay.len(), 86);
        assert_eq!(overlay.real_len(), 60);
        assert!(overlay.is_projected(60));
        assert!(!overlay.is_projected(59));

        let last = table.last().unwrap().timestamp;
        assert_eq!(overlay.timestamp(60), Some(last + Duration::minutes(1)));
        assert_eq!(overlay.timestamp(85), Some(last + Duration::minutes(26)));
    }

    #[test]
    fn warmup_positions_are_absent() {
        let overlay = compute_overlay(&ramp(120), &IchimokuParams::default());

        assert!(overlay.tenkan()[..8].iter().all(Option::is_none));
        assert!(overlay.tenkan()[8].is_some());
        assert!(overlay.kijun()[..25].iter().all(Option::is_none));
        assert!(overlay.kijun()[25].is_some());
        // senkou_a needs kijun 26 bars earlier: 25 + 26.
        assert!(overlay.senkou_a()[..51].iter().all(Option::is_none));
        assert!(overlay.senkou_a()[51].is_some());
        // senkou_b needs the 52-bar window 26 bars earlier: 51 + 26.
        assert!(overlay.senkou_b()[..77].iter().all(Option::is_none));
        assert!(overlay.senkou_b()[77].is_some());
    }

    #[test]
    fn projected_slots_have_no_price_lines() {
        let overlay = compute_overlay(&ramp(120), &IchimokuParams::default());
        for i in 120..146 {
            assert_eq!(overlay.tenkan()[i], None);
            assert_eq!(overlay.kijun()[i], None);
            assert_eq!(overlay.chikou()[i], None);
            assert!(overlay.senkou_a()[i].is_some());
            assert!(overlay.senkou_b()[i].is_some());
        }
    }

    #[test]
    fn chikou_is_close_shifted_back() {
        let table = ramp(80);
        let overlay = compute_overlay(&table, &IchimokuParams::default());
        for t in 0..overlay.len() {
            let expected = table.get(t + 26).map(|bar| bar.close);
            assert_eq!(overlay.chikou()[t], expected, "chikou mismatch at {t}");
        }
    }

    #[test]
    fn spans_are_shifted_forward() {
        let table = ramp(120);
        let params = IchimokuParams::default();
        let overlay = compute_overlay(&table, &params);
        let wide = rolling_midpoint(table.bars(), 52);
        for t in 26..overlay.len() {
            let j = t - 26;
            assert_eq!(
                overlay.senkou_a()[t],
                midpoint(overlay.tenkan()[j], overlay.kijun()[j])
            );
            assert_eq!(overlay.senkou_b()[t], wide.get(j).copied().flatten());
        }
    }

    #[test]
    fn tenkan_on_known_window() {
        // Highs 1..=9 (+1), lows 1..=9 (-1): tenkan[8] = (10 + 0) / 2.
        let rows: Vec<_> = (1..=9)
            .map(|i| {
                let p = Decimal::from(i);
                (p, p + Decimal::ONE, p - Decimal::ONE, p)
            })
            .collect();
        let table = BarTable::from_bars(make_ohlc_bars(&rows));
        let overlay = compute_overlay(&table, &IchimokuParams::default());
        assert_eq!(overlay.tenkan()[8], Some(dec!(5)));
    }

    #[test]
    fn short_table_is_entirely_absent() {
        let overlay = compute_overlay(&ramp(8), &IchimokuParams::default());
        assert_eq!(overlay.len(), 34);
        for point in overlay.points() {
            assert_eq!(point.tenkan, None);
            assert_eq!(point.kijun, None);
            assert_eq!(point.senkou_a, None);
            assert_eq!(point.senkou_b, None);
        }
    }

    #[test]
    fn empty_table_projects_unstamped_slots() {
        let overlay = compute_overlay(&BarTable::default(), &IchimokuParams::default());
        assert_eq!(overlay.len(), 26);
        assert_eq!(overlay.timestamp(0), None);
        assert!(overlay.points().all(|p| p == OverlayPoint::default()));
    }

    #[test]
    fn kumo_bounds_skip_missing_spans() {
        let mut point = OverlayPoint {
            senkou_a: Some(dec!(2)),
            senkou_b: Some(dec!(1)),
            ..Default::default()
        };
        assert_eq!(point.kumo_top(), Some(dec!(2)));
        assert_eq!(point.kumo_bottom(), Some(dec!(1)));

        point.senkou_b = None;
        assert_eq!(point.kumo_top(), Some(dec!(2)));
        assert_eq!(point.kumo_bottom(), Some(dec!(2)));

        point.senkou_a = None;
        point.senkou_b = Some(dec!(1));
        assert_eq!(point.kumo_top(), Some(dec!(1)));
        assert_eq!(point.kumo_bottom(), Some(dec!(1)));

        point.senkou_b = None;
        assert_eq!(point.kumo_top(), None);
        assert_eq!(point.kumo_bottom(), None);
    }

    #[test]
    fn cloud_is_defined_once_senkou_a_warms_up() {
        let overlay = compute_overlay(&ramp(100), &IchimokuParams::default());
        let before = overlay.point(50).unwrap();
        let at = overlay.point(51).unwrap();
        assert_eq!(before.kumo_top(), None);
        assert!(at.senkou_b.is_none());
        assert_eq!(at.kumo_top(), at.senkou_a);
        assert_eq!(at.kumo_bottom(), at.senkou_a);
    }

    #[test]
    fn custom_params_shift_by_displacement() {
        let params = IchimokuParams {
            tenkan: 2,
            kijun: 3,
            senkou_b: 4,
            displacement: 1,
        };
        let overlay = compute_overlay(&ramp(10), &params);
        assert_eq!(overlay.len(), 11);
        assert_eq!(overlay.tenkan()[0], None);
        assert!(overlay.tenkan()[1].is_some());
        assert!(overlay.senkou_b()[4].is_some());
        assert_eq!(overlay.senkou_b()[3], None);
    }
}
