//! End-to-end runs through the runner: synthetic walk to signals, and
//! analysis of persisted bar files.

use chrono::Duration;
use kumo_core::domain::CalendarUnit;
use kumo_core::indicators::IchimokuParams;
use kumo_runner::{
    generate_sessions, merge_sessions, read_bars_csv, run_analysis, run_pipeline,
    run_target_studies, save_artifacts, write_bars_csv, PipelineConfig, TargetStudyParams,
};
use rust_decimal::Decimal;

fn quick_config() -> PipelineConfig {
    PipelineConfig {
        bar_count: 90,
        ..PipelineConfig::default()
    }
}

// ── Synthetic run ──

#[test]
fn default_overlay_extends_by_displacement() {
    let run = run_pipeline(&quick_config()).unwrap();
    assert_eq!(run.table.len(), 90);
    assert_eq!(run.overlay.len(), 90 + 26);
    assert_eq!(run.overlay.real_len(), 90);
    let last = run.table.last().unwrap().timestamp;
    assert_eq!(
        run.overlay.timestamp(run.overlay.len() - 1),
        Some(last + Duration::minutes(26))
    );
}

#[test]
fn trades_are_ordered_and_inside_the_table() {
    let run = run_pipeline(&quick_config()).unwrap();
    for log in [&run.signals.longs, &run.signals.shorts] {
        for trade in &log.closed {
            assert!(trade.entry_index < trade.exit_index);
            assert!(trade.exit_index < run.table.len());
            assert_eq!(trade.entry_time, run.table.bars()[trade.entry_index].timestamp);
        }
        for pair in log.closed.windows(2) {
            assert!(pair[0].exit_index < pair[1].entry_index);
        }
        if let (Some(last), Some(open)) = (log.closed.last(), log.open) {
            assert!(last.exit_index < open.entry_index);
        }
    }
}

#[test]
fn no_signal_before_cloud_warmup() {
    let run = run_pipeline(&quick_config()).unwrap();
    // The cloud first appears with senkou_a at 26 + 26 - 1.
    let warmup = 26 + 26 - 1;
    for log in [&run.signals.longs, &run.signals.shorts] {
        let entries = log
            .closed
            .iter()
            .map(|t| t.entry_index)
            .chain(log.open.map(|o| o.entry_index));
        for entry in entries {
            assert!(entry >= warmup, "entry at {entry} before warmup");
        }
    }
}

#[test]
fn hourly_run_uses_hour_buckets() {
    let config = PipelineConfig {
        unit: CalendarUnit::Hour,
        bar_count: 2,
        walk: kumo_core::synthetic::WalkParams {
            interval_ms: 1000,
            ..Default::default()
        },
        ichimoku: IchimokuParams {
            tenkan: 1,
            kijun: 1,
            senkou_b: 2,
            displacement: 1,
        },
    };
    let run = run_pipeline(&config).unwrap();
    let times: Vec<_> = run.table.timestamps().collect();
    assert_eq!(times[1] - times[0], Duration::hours(1));
    assert_eq!(run.summary.unit, Some(CalendarUnit::Hour));
}

// ── Persisted tables ──

#[test]
fn analysis_of_saved_bars_matches_the_run() {
    let config = quick_config();
    let run = run_pipeline(&config).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bars.csv");
    write_bars_csv(&run.table, &path).unwrap();

    let table = read_bars_csv(&path, Some(config.unit)).unwrap();
    let reloaded = run_analysis(table, config.ichimoku);
    assert_eq!(reloaded.overlay, run.overlay);
    assert_eq!(reloaded.signals, run.signals);
    assert_eq!(reloaded.summary.dataset_hash, run.summary.dataset_hash);
}

#[test]
fn artifacts_land_in_run_directory() {
    let run = run_pipeline(&quick_config()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let run_dir = save_artifacts(&run, dir.path()).unwrap();
    assert!(run_dir.ends_with(&run.summary.run_id[..12]));
    let report = std::fs::read_to_string(run_dir.join("report.md")).unwrap();
    assert!(report.contains("synthetic walk (seed 42)"));
}

// ── Sessions and studies ──

#[test]
fn merged_sessions_form_one_valid_table() {
    let base = PipelineConfig {
        bar_count: 15,
        ..PipelineConfig::default()
    };
    let sessions = generate_sessions(&base, 3).unwrap();
    let merged = merge_sessions(&sessions, Decimal::ONE_HUNDRED);
    assert_eq!(merged.len(), 45);
    assert!(merged.validate().is_ok());
    assert_eq!(merged.bars()[..15], sessions[0].bars()[..]);
}

#[test]
fn target_study_runs_over_sessions() {
    let base = PipelineConfig {
        bar_count: 30,
        ..PipelineConfig::default()
    };
    let sessions = generate_sessions(&base, 4).unwrap();
    let outcomes = run_target_studies(&sessions, &TargetStudyParams::default()).unwrap();
    assert_eq!(outcomes.len(), 4);
    for (outcome, session) in outcomes.iter().zip(&sessions) {
        assert_eq!(outcome.entry_time, session.bars()[9].timestamp);
        assert_eq!(outcome.entry_price, session.bars()[9].high);
        assert!(outcome.drawdown <= Decimal::ZERO);
        assert_eq!(outcome.profit, outcome.exit_price - outcome.entry_price);
    }
}
