//! Persistence and reporting: CSV bars, overlay and trade tapes, JSON summaries,
//! Markdown reports.
//!
//! Bar CSVs use the header `timestamp,open,high,low,close` and are validated
//! on load. JSON summaries carry a `schema_version`; unknown versions are
//! rejected.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;

use kumo_core::domain::{Bar, BarTable, CalendarUnit};
use kumo_core::indicators::Overlay;
use kumo_core::signals::{Side, SignalReport, TradeLog};

use crate::runner::{short_id, PipelineRun, RunSummary, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `RunSummary` to pretty JSON.
pub fn export_json(summary: &RunSummary) -> Result<String> {
    serde_json::to_string_pretty(summary).context("failed to serialize RunSummary to JSON")
}

/// Deserialize a `RunSummary` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<RunSummary> {
    let summary: RunSummary =
        serde_json::from_str(json).context("failed to deserialize RunSummary from JSON")?;
    if summary.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            summary.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(summary)
}

// ─── Bar CSV ────────────────────────────────────────────────────────

/// Export bars as CSV: `timestamp,open,high,low,close`.
pub fn export_bars_csv(table: &BarTable) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for bar in table {
        wtr.serialize(bar)?;
    }
    finish(wtr)
}

/// Parse and validate a bar CSV.
///
/// Rows must be strictly increasing in time and every bar must satisfy
/// `low <= min(open, close)` and `max(open, close) <= high`.
pub fn import_bars_csv(text: &str, unit: Option<CalendarUnit>) -> Result<BarTable> {
    let mut rdr = csv::Reader::from_reader(text.as_bytes());
    let bars = rdr
        .deserialize::<Bar>()
        .enumerate()
        .map(|(row, bar)| bar.with_context(|| format!("malformed bar on data row {}", row + 1)))
        .collect::<Result<Vec<_>>>()?;

    let table = BarTable::from_bars(bars);
    table.validate().context("bar table failed validation")?;
    Ok(match unit {
        Some(unit) => table.with_unit(unit),
        None => table,
    })
}

pub fn write_bars_csv(table: &BarTable, path: &Path) -> Result<()> {
    let text = export_bars_csv(table)?;
    std::fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
}

pub fn read_bars_csv(path: &Path, unit: Option<CalendarUnit>) -> Result<BarTable> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let table = import_bars_csv(&text, unit)
        .with_context(|| format!("invalid bar file {}", path.display()))?;
    tracing::debug!(path = %path.display(), bars = table.len(), "loaded bar table");
    Ok(table)
}

// ─── Overlay and trade CSV ──────────────────────────────────────────

#[derive(Serialize)]
struct OverlayRow {
    position: usize,
    timestamp: Option<NaiveDateTime>,
    projected: bool,
    tenkan: Option<Decimal>,
    kijun: Option<Decimal>,
    senkou_a: Option<Decimal>,
    senkou_b: Option<Decimal>,
    chikou: Option<Decimal>,
}

/// Export the overlay, projection slots included. Undefined values are
/// written as empty cells.
pub fn export_overlay_csv(overlay: &Overlay) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for (position, point) in overlay.points().enumerate() {
        wtr.serialize(OverlayRow {
            position,
            timestamp: point.timestamp,
            projected: overlay.is_projected(position),
            tenkan: point.tenkan,
            kijun: point.kijun,
            senkou_a: point.senkou_a,
            senkou_b: point.senkou_b,
            chikou: point.chikou,
        })?;
    }
    finish(wtr)
}

#[derive(Serialize)]
struct TradeRow {
    side: &'static str,
    entry_index: usize,
    entry_time: NaiveDateTime,
    exit_index: Option<usize>,
    exit_time: Option<NaiveDateTime>,
    bars_held: Option<usize>,
}

/// Export both trade logs. Still-open positions have empty exit columns.
///
/// Columns: side, entry_index, entry_time, exit_index, exit_time, bars_held
pub fn export_trades_csv(report: &SignalReport) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for (side, log) in [(Side::Long, &report.longs), (Side::Short, &report.shorts)] {
        write_trade_log(&mut wtr, side, log)?;
    }
    finish(wtr)
}

fn write_trade_log(wtr: &mut csv::Writer<Vec<u8>>, side: Side, log: &TradeLog) -> Result<()> {
    let label = side_label(side);
    for trade in &log.closed {
        wtr.serialize(TradeRow {
            side: label,
            entry_index: trade.entry_index,
            entry_time: trade.entry_time,
            exit_index: Some(trade.exit_index),
            exit_time: Some(trade.exit_time),
            bars_held: Some(trade.bars_held()),
        })?;
    }
    if let Some(open) = &log.open {
        wtr.serialize(TradeRow {
            side: label,
            entry_index: open.entry_index,
            entry_time: open.entry_time,
            exit_index: None,
            exit_time: None,
            bars_held: None,
        })?;
    }
    Ok(())
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a run.
///
/// Creates `{run_id[..12]}/` under `output_dir` containing:
/// - `summary.json`: the `RunSummary`
/// - `bars.csv`: the analyzed bar table
/// - `overlay.csv`: all five Ichimoku series including projection slots
/// - `trades.csv`: long and short trade windows
/// - `report.md`: human-readable summary
///
/// Returns the path to the created directory.
pub fn save_artifacts(run: &PipelineRun, output_dir: &Path) -> Result<PathBuf> {
    let run_dir = output_dir.join(short_id(&run.summary.run_id));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("summary.json"), export_json(&run.summary)?)?;
    write_bars_csv(&run.table, &run_dir.join("bars.csv"))?;
    std::fs::write(run_dir.join("overlay.csv"), export_overlay_csv(&run.overlay)?)?;
    std::fs::write(run_dir.join("trades.csv"), export_trades_csv(&run.signals)?)?;
    std::fs::write(run_dir.join("report.md"), generate_report(&run.summary))?;

    tracing::info!(dir = %run_dir.display(), "artifacts saved");
    Ok(run_dir)
}

/// Load a `RunSummary` from an artifact directory's summary.json.
pub fn load_artifacts(dir: &Path) -> Result<RunSummary> {
    let path = dir.join("summary.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

// ─── Markdown report ────────────────────────────────────────────────

/// Generate a Markdown report for a single run.
pub fn generate_report(summary: &RunSummary) -> String {
    let mut md = String::with_capacity(1024);

    md.push_str("# Ichimoku Signal Report\n\n");

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Run | {} |\n", short_id(&summary.run_id)));
    md.push_str(&format!(
        "| Source | {} |\n",
        match &summary.config {
            Some(config) => format!("synthetic walk (seed {})", config.walk.seed),
            None => "bar file".to_string(),
        }
    ));
    md.push_str(&format!(
        "| Unit | {} |\n",
        summary.unit.map_or("unknown", CalendarUnit::as_str)
    ));
    md.push_str(&format!("| Bars | {} |\n", summary.bar_count));
    if let (Some(first), Some(last)) = (summary.first_bar, summary.last_bar) {
        md.push_str(&format!("| Period | {first} to {last} |\n"));
    }
    let p = summary.ichimoku;
    md.push_str(&format!(
        "| Ichimoku | {}/{}/{} shift {} |\n\n",
        p.tenkan, p.kijun, p.senkou_b, p.displacement
    ));

    for (title, log) in [("Longs", &summary.signals.longs), ("Shorts", &summary.signals.shorts)] {
        md.push_str(&format!("## {title}\n\n"));
        if log.closed.is_empty() && log.open.is_none() {
            md.push_str("No signals.\n\n");
            continue;
        }
        md.push_str("| Entry | Exit | Bars |\n");
        md.push_str("| --- | --- | --- |\n");
        for trade in &log.closed {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                trade.entry_time,
                trade.exit_time,
                trade.bars_held()
            ));
        }
        if let Some(open) = &log.open {
            md.push_str(&format!("| {} | open | - |\n", open.entry_time));
        }
        md.push('\n');
    }

    md
}

// ─── Helpers ────────────────────────────────────────────────────────

fn side_label(side: Side) -> &'static str {
    match side {
        Side::Long => "long",
        Side::Short => "short",
    }
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}
