//! Pipeline runner: wires the tick source, aggregation, overlay and signals.
//!
//! Two entry points:
//! - `run_pipeline()`: simulates bars from a `PipelineConfig`, then analyzes them.
//! - `run_analysis()`: analyzes a pre-loaded `BarTable` (e.g. from CSV).

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use kumo_core::aggregate::{aggregate_seconds, resample, AggregationError};
use kumo_core::domain::{Bar, BarTable, CalendarUnit};
use kumo_core::indicators::{compute_overlay, IchimokuParams, Overlay};
use kumo_core::signals::{detect_signals, SignalReport};
use kumo_core::synthetic::{RandomWalk, WalkError};

use crate::config::{ConfigError, PipelineConfig, RunId};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("tick source error: {0}")]
    Walk(#[from] WalkError),
    #[error("aggregation failed: {0}")]
    Aggregation(#[from] AggregationError),
    #[error("bar source ended after {got} of {wanted} bars")]
    SourceExhausted { got: usize, wanted: usize },
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Serializable record of a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    /// Present for synthetic runs only.
    pub config: Option<PipelineConfig>,
    pub ichimoku: IchimokuParams,
    pub unit: Option<CalendarUnit>,
    pub bar_count: usize,
    pub first_bar: Option<NaiveDateTime>,
    pub last_bar: Option<NaiveDateTime>,
    pub dataset_hash: String,
    pub signals: SignalReport,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Everything one run produces.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub table: BarTable,
    pub overlay: Overlay,
    pub signals: SignalReport,
    pub summary: RunSummary,
}

/// Pull `config.bar_count` closed unit bars out of the synthetic chain.
///
/// Only as many ticks as needed to close the last requested bar are drawn.
pub fn simulate_bars(config: &PipelineConfig) -> Result<BarTable, RunError> {
    let walk = RandomWalk::new(&config.walk)?;
    let bars = resample(aggregate_seconds(walk), config.unit)
        .take(config.bar_count)
        .collect::<Result<Vec<Bar>, _>>()?;

    if bars.len() < config.bar_count {
        return Err(RunError::SourceExhausted {
            got: bars.len(),
            wanted: config.bar_count,
        });
    }
    Ok(BarTable::from_bars(bars).with_unit(config.unit))
}

/// Compute the overlay and signal report for a table.
pub fn analyze(table: &BarTable, params: &IchimokuParams) -> (Overlay, SignalReport) {
    let overlay = compute_overlay(table, params);
    let signals = detect_signals(table, &overlay);
    (overlay, signals)
}

/// Simulate bars from `config` and analyze them.
pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineRun, RunError> {
    config.validate()?;
    let run_id = config.run_id()?;

    let table = simulate_bars(config)?;
    info!(
        run_id = %short_id(&run_id),
        unit = %config.unit,
        bars = table.len(),
        "simulated bar table"
    );

    Ok(finish_run(run_id, Some(config.clone()), table, config.ichimoku))
}

/// Analyze a pre-loaded table. The run id is derived from the data and params.
pub fn run_analysis(table: BarTable, params: IchimokuParams) -> PipelineRun {
    let dataset_hash = dataset_hash(&table);
    let mut hasher = blake3::Hasher::new();
    hasher.update(dataset_hash.as_bytes());
    for period in [
        params.tenkan,
        params.kijun,
        params.senkou_b,
        params.displacement,
    ] {
        hasher.update(&(period as u64).to_le_bytes());
    }
    let run_id = hasher.finalize().to_hex().to_string();
    finish_run(run_id, None, table, params)
}

fn finish_run(
    run_id: RunId,
    config: Option<PipelineConfig>,
    table: BarTable,
    params: IchimokuParams,
) -> PipelineRun {
    let (overlay, signals) = analyze(&table, &params);
    info!(
        run_id = %short_id(&run_id),
        longs = signals.longs.closed.len(),
        shorts = signals.shorts.closed.len(),
        open_long = signals.longs.open.is_some(),
        open_short = signals.shorts.open.is_some(),
        "signal detection complete"
    );

    let summary = RunSummary {
        schema_version: SCHEMA_VERSION,
        run_id,
        config,
        ichimoku: params,
        unit: table.unit(),
        bar_count: table.len(),
        first_bar: table.first().map(|b| b.timestamp),
        last_bar: table.last().map(|b| b.timestamp),
        dataset_hash: dataset_hash(&table),
        signals: signals.clone(),
    };
    PipelineRun {
        table,
        overlay,
        signals,
        summary,
    }
}

/// BLAKE3 hash over every bar's timestamp and prices.
pub fn dataset_hash(table: &BarTable) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in table {
        hasher.update(&bar.timestamp.and_utc().timestamp_millis().to_le_bytes());
        for price in [bar.open, bar.high, bar.low, bar.close] {
            hasher.update(&price.serialize());
        }
    }
    hasher.finalize().to_hex().to_string()
}

/// First 12 hex digits, enough to tell runs apart in logs and directory names.
pub fn short_id(run_id: &str) -> &str {
    run_id.get(..12).unwrap_or(run_id)
}
