//! Per-bar signal rules.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::BarTable;
use crate::indicators::Overlay;

/// Bullish / bearish flags at one bar.
///
/// The two are not forced to be exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalState {
    pub bullish: bool,
    pub bearish: bool,
}

/// A pure per-bar rule over a bar table and its overlay.
///
/// # Invariants
/// - `evaluate()` MUST NOT mutate or cache anything
/// - a missing operand makes a condition false, never true
pub trait SignalRule: Send + Sync {
    fn evaluate(&self, table: &BarTable, overlay: &Overlay, t: usize) -> SignalState;

    /// Rule name for logging.
    fn name(&self) -> &str;
}

/// The four-condition Ichimoku entry checklist.
///
/// Bullish at `t` when all hold (`d` = overlay displacement):
/// 1. close[t] >= kumo_top[t]
/// 2. tenkan[t] >= kijun[t]
/// 3. mid[t-d] >= chikou[t-d], with mid = (high + low) / 2
/// 4. senkou_a[t+d] >= senkou_b[t+d]
///
/// Bearish uses the mirrored strict comparisons against kumo_bottom.
#[derive(Debug, Clone, Copy, Default)]
pub struct CloudChecklist;

/// Both operands present and `cmp` holds.
fn holds(lhs: Option<Decimal>, rhs: Option<Decimal>, cmp: fn(&Decimal, &Decimal) -> bool) -> bool {
    lhs.zip(rhs).is_some_and(|(a, b)| cmp(&a, &b))
}

impl SignalRule for CloudChecklist {
    fn evaluate(&self, table: &BarTable, overlay: &Overlay, t: usize) -> SignalState {
        let Some(bar) = table.get(t) else {
            return SignalState::default();
        };
        let Some(point) = overlay.point(t) else {
            return SignalState::default();
        };
        let d = overlay.displacement();

        let close = Some(bar.close);
        let (lagged_mid, lagged_chikou) = match t.checked_sub(d) {
            Some(lag) => (
                table.get(lag).map(|b| b.mid()),
                overlay.chikou().get(lag).copied().flatten(),
            ),
            None => (None, None),
        };
        let lead = t + d;
        let lead_a = overlay.senkou_a().get(lead).copied().flatten();
        let lead_b = overlay.senkou_b().get(lead).copied().flatten();

        let bullish = holds(close, point.kumo_top(), Decimal::ge)
            && holds(point.tenkan, point.kijun, Decimal::ge)
            && holds(lagged_mid, lagged_chikou, Decimal::ge)
            && holds(lead_a, lead_b, Decimal::ge);

        let bearish = holds(close, point.kumo_bottom(), Decimal::lt)
            && holds(point.tenkan, point.kijun, Decimal::lt)
            && holds(lagged_mid, lagged_chikou, Decimal::lt)
            && holds(lead_a, lead_b, Decimal::lt);

        SignalState { bullish, bearish }
    }

    fn name(&self) -> &str {
        "cloud_checklist"
    }
}
