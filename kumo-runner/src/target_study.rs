//! Fixed-target excursion study.
//!
//! Buy at the high of a chosen entry bar, then walk forward until a bar's low
//! clears `entry + target`. The position is sold at that bar's close; if the
//! target is never reached it is sold at the low of the last bar. The
//! drawdown is the lowest low seen after entry, relative to the entry price.

use anyhow::Context;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use kumo_core::domain::BarTable;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StudyError {
    #[error("entry bar {entry_bar} is out of range for a table of {len} bars")]
    EntryOutOfRange { entry_bar: usize, len: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetStudyParams {
    /// Position of the bar whose high is the entry price.
    pub entry_bar: usize,
    /// Profit target above the entry price.
    pub target: Decimal,
}

impl Default for TargetStudyParams {
    fn default() -> Self {
        Self {
            entry_bar: 9,
            target: Decimal::new(5, 2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetOutcome {
    pub target_reached: bool,
    pub entry_time: NaiveDateTime,
    pub entry_price: Decimal,
    pub exit_time: NaiveDateTime,
    pub exit_price: Decimal,
    /// `exit_price - entry_price`.
    pub profit: Decimal,
    /// Lowest low after entry minus the entry price; never positive.
    pub drawdown: Decimal,
}

/// Run the study on one table.
pub fn target_study(
    table: &BarTable,
    params: &TargetStudyParams,
) -> Result<TargetOutcome, StudyError> {
    let bars = table.bars();
    let entry = bars.get(params.entry_bar).ok_or(StudyError::EntryOutOfRange {
        entry_bar: params.entry_bar,
        len: bars.len(),
    })?;
    let entry_price = entry.high;
    let threshold = entry_price + params.target;

    let mut lowest = entry_price;
    let mut hit = None;
    for bar in &bars[params.entry_bar + 1..] {
        lowest = lowest.min(bar.low);
        if bar.low > threshold {
            hit = Some(bar);
            break;
        }
    }

    let (target_reached, exit_time, exit_price) = match hit {
        Some(bar) => (true, bar.timestamp, bar.close),
        None => {
            // `entry` exists, so the table is non-empty.
            let last = bars.last().unwrap_or(entry);
            (false, last.timestamp, last.low)
        }
    };

    Ok(TargetOutcome {
        target_reached,
        entry_time: entry.timestamp,
        entry_price,
        exit_time,
        exit_price,
        profit: exit_price - entry_price,
        drawdown: lowest - entry_price,
    })
}

/// Run the study on every table.
pub fn run_target_studies(
    tables: &[BarTable],
    params: &TargetStudyParams,
) -> Result<Vec<TargetOutcome>, StudyError> {
    let outcomes = tables
        .iter()
        .map(|table| target_study(table, params))
        .collect::<Result<Vec<_>, _>>()?;
    let reached = outcomes.iter().filter(|o| o.target_reached).count();
    tracing::info!(runs = outcomes.len(), reached, "target study complete");
    Ok(outcomes)
}

/// Export outcomes as CSV, one row per run.
///
/// Columns: run, target_reached, entry_time, entry_price, exit_time,
/// exit_price, profit, drawdown
pub fn export_outcomes_csv(outcomes: &[TargetOutcome]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "run",
        "target_reached",
        "entry_time",
        "entry_price",
        "exit_time",
        "exit_price",
        "profit",
        "drawdown",
    ])?;
    for (run, o) in outcomes.iter().enumerate() {
        wtr.write_record([
            run.to_string(),
            o.target_reached.to_string(),
            o.entry_time.to_string(),
            o.entry_price.to_string(),
            o.exit_time.to_string(),
            o.exit_price.to_string(),
            o.profit.to_string(),
            o.drawdown.to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}
