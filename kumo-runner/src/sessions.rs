//! Multi-session generation and chaining.
//!
//! Each session is an independent synthetic run whose seed is derived from a
//! master seed, so adding sessions never changes the earlier ones. Merging
//! chains sessions into one continuous series by rescaling each one to start
//! where the previous one ended.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Duration;
use rust_decimal::Decimal;

use kumo_core::domain::{Bar, BarTable, PRICE_SCALE};
use kumo_core::rng::SeedHierarchy;

use crate::config::PipelineConfig;
use crate::export::write_bars_csv;
use crate::runner::{simulate_bars, RunError};

/// Seed used for session `index` under `master_seed`.
pub fn session_seed(master_seed: u64, index: usize) -> u64 {
    SeedHierarchy::new(master_seed).sub_seed("session", index as u64)
}

/// Simulate `count` sessions of `base.bar_count` bars each.
///
/// Every session shares `base`'s walk parameters except the seed, which is
/// derived from `base.walk.seed`.
pub fn generate_sessions(base: &PipelineConfig, count: usize) -> Result<Vec<BarTable>, RunError> {
    base.validate()?;
    (0..count)
        .map(|index| {
            let mut config = base.clone();
            config.walk.seed = session_seed(base.walk.seed, index);
            let table = simulate_bars(&config)?;
            tracing::debug!(session = index, seed = config.walk.seed, "generated session");
            Ok(table)
        })
        .collect()
}

/// Write sessions as `session-0000.csv`, `session-0001.csv`, ... under `dir`.
pub fn write_sessions(sessions: &[BarTable], dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create session dir: {}", dir.display()))?;
    sessions
        .iter()
        .enumerate()
        .map(|(index, table)| {
            let path = dir.join(format!("session-{index:04}.csv"));
            write_bars_csv(table, &path)?;
            Ok(path)
        })
        .collect()
}

/// Chain sessions into one table.
///
/// The first session is kept as is. Every later session is multiplied by
/// `last_close / base_price`, where `last_close` is the merged series' last
/// close so far, and shifted in time to continue one step after it. Prices
/// are rounded back to the price resolution. Empty sessions are skipped.
pub fn merge_sessions(sessions: &[BarTable], base_price: Decimal) -> BarTable {
    let mut merged: Vec<Bar> = Vec::with_capacity(sessions.iter().map(BarTable::len).sum());
    let unit = sessions.iter().find_map(BarTable::unit);

    for session in sessions.iter().filter(|s| !s.is_empty()) {
        let Some(prev) = merged.last().copied() else {
            merged.extend(session.iter().copied());
            continue;
        };

        let factor = if base_price.is_zero() {
            Decimal::ONE
        } else {
            prev.close / base_price
        };
        let step = session
            .projection_step()
            .or_else(|| unit.map(|u| u.duration()))
            .unwrap_or_else(|| Duration::seconds(1));
        let first_ts = session.bars()[0].timestamp;
        let offset = prev.timestamp + step - first_ts;

        merged.extend(session.iter().map(|bar| Bar {
            timestamp: bar.timestamp + offset,
            open: scale(bar.open, factor),
            high: scale(bar.high, factor),
            low: scale(bar.low, factor),
            close: scale(bar.close, factor),
        }));
    }

    let table = BarTable::from_bars(merged);
    match unit {
        Some(unit) => table.with_unit(unit),
        None => table,
    }
}

fn scale(price: Decimal, factor: Decimal) -> Decimal {
    let mut scaled = (price * factor).round_dp(PRICE_SCALE);
    scaled.rescale(PRICE_SCALE);
    scaled
}
