//! Kumo Runner: pipeline orchestration, configuration, persistence, studies.
//!
//! This crate builds on `kumo-core` to provide:
//! - TOML pipeline configuration with content-addressed run ids
//! - Synthetic runs (tick walk to unit bars to overlay to signals)
//! - Analysis of bar tables loaded from CSV
//! - CSV, JSON and Markdown artifacts
//! - Multi-session generation and merging
//! - The fixed-target excursion study

pub mod config;
pub mod export;
pub mod runner;
pub mod sessions;
pub mod target_study;

pub use config::{ConfigError, PipelineConfig, RunId};
pub use export::{
    export_bars_csv, export_json, export_overlay_csv, export_trades_csv, generate_report,
    import_bars_csv, import_json, load_artifacts, read_bars_csv, save_artifacts, write_bars_csv,
};
pub use runner::{
    analyze, dataset_hash, run_analysis, run_pipeline, simulate_bars, PipelineRun, RunError,
    RunSummary, SCHEMA_VERSION,
};
pub use sessions::{generate_sessions, merge_sessions, session_seed, write_sessions};
pub use target_study::{
    export_outcomes_csv, run_target_studies, target_study, StudyError, TargetOutcome,
    TargetStudyParams,
};
