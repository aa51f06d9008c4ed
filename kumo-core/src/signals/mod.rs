//! Signal detection over a bar table and its Ichimoku overlay.
//!
//! Rules are pure: they read the table and overlay and never keep state
//! between calls. A rule yields a per-bar [`SignalState`]; trade windows are
//! then cut from the state changes of each side independently.

pub mod rules;
pub mod trades;

pub use rules::{CloudChecklist, SignalRule, SignalState};
pub use trades::{extract_trades, transitions, OpenPosition, Side, TradeLog, TradeWindow};

use serde::{Deserialize, Serialize};

use crate::domain::BarTable;
use crate::indicators::Overlay;

/// Long and short trade windows found in one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalReport {
    pub longs: TradeLog,
    pub shorts: TradeLog,
}

/// Evaluate `rule` at every real bar.
pub fn evaluate_states(
    rule: &dyn SignalRule,
    table: &BarTable,
    overlay: &Overlay,
) -> Vec<SignalState> {
    (0..table.len())
        .map(|t| rule.evaluate(table, overlay, t))
        .collect()
}

/// Detect trade windows with a specific rule.
pub fn detect_signals_with(
    rule: &dyn SignalRule,
    table: &BarTable,
    overlay: &Overlay,
) -> SignalReport {
    let states = evaluate_states(rule, table, overlay);
    let bullish: Vec<bool> = states.iter().map(|s| s.bullish).collect();
    let bearish: Vec<bool> = states.iter().map(|s| s.bearish).collect();

    let report = SignalReport {
        longs: extract_trades(Side::Long, &bullish, table),
        shorts: extract_trades(Side::Short, &bearish, table),
    };
    tracing::debug!(
        rule = rule.name(),
        longs = report.longs.closed.len(),
        shorts = report.shorts.closed.len(),
        open_long = report.longs.open.is_some(),
        open_short = report.shorts.open.is_some(),
        "signals detected"
    );
    report
}

/// Detect trade windows with the four-condition cloud checklist.
pub fn detect_signals(table: &BarTable, overlay: &Overlay) -> SignalReport {
    detect_signals_with(&CloudChecklist, table, overlay)
}
