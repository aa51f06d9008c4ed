//! Kumo CLI: simulate, analyze, generate and target-study commands.
//!
//! Commands:
//! - `simulate`: run the synthetic pipeline and save its artifacts
//! - `analyze`: compute the overlay and signals for a bar CSV
//! - `generate`: write independent benchmark sessions (optionally merged)
//! - `target-study`: fixed-target excursion study over a bar CSV or sessions

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use kumo_core::domain::{BarTable, CalendarUnit};
use kumo_runner::runner::short_id;
use kumo_runner::{
    export_outcomes_csv, generate_sessions, merge_sessions, read_bars_csv, run_analysis,
    run_pipeline, run_target_studies, save_artifacts, write_bars_csv, write_sessions,
    PipelineConfig, PipelineRun, TargetStudyParams,
};

#[derive(Parser)]
#[command(name = "kumo", about = "Kumo: tick aggregation and Ichimoku signal pipeline")]
struct Cli {
    /// Emit logs as JSON lines instead of human-readable text.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate ticks, aggregate them into unit bars and detect signals.
    Simulate {
        /// Path to a TOML pipeline config. Defaults are used when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Number of unit bars to produce (overrides the config).
        #[arg(long)]
        bars: Option<usize>,

        /// Bar unit: second, minute, hour or day (overrides the config).
        #[arg(long)]
        unit: Option<CalendarUnit>,

        /// Random-walk seed (overrides the config).
        #[arg(long)]
        seed: Option<u64>,

        /// Directory receiving the run's artifact folder.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Compute the Ichimoku overlay and signals for a persisted bar table.
    Analyze {
        /// Bar CSV with header timestamp,open,high,low,close.
        #[arg(long)]
        bars_csv: PathBuf,

        /// Path to a TOML pipeline config; only its ichimoku section is used.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Unit the bars were built at, used to stamp projected slots.
        #[arg(long)]
        unit: Option<CalendarUnit>,

        /// Directory receiving the run's artifact folder.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Generate independent benchmark sessions, one CSV per session.
    Generate {
        /// Number of sessions.
        #[arg(long)]
        count: usize,

        /// Unit bars per session. Defaults to one 8-hour day of minute bars.
        #[arg(long, default_value_t = 8 * 60)]
        session_len: usize,

        /// Master seed; each session derives its own seed from it.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Also write the chained series as merged.csv.
        #[arg(long, default_value_t = false)]
        merge: bool,

        #[arg(long, default_value = "sessions")]
        output_dir: PathBuf,
    },
    /// Buy at one bar's high and track the run-up to a fixed target.
    TargetStudy {
        /// Bar CSV to study. Mutually exclusive with --sessions.
        #[arg(long)]
        bars_csv: Option<PathBuf>,

        /// Study this many freshly generated sessions instead of a file.
        #[arg(long)]
        sessions: Option<usize>,

        /// Master seed for --sessions.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Position of the entry bar.
        #[arg(long, default_value_t = 9)]
        entry_bar: usize,

        /// Profit target above the entry price.
        #[arg(long, default_value = "0.05")]
        target: Decimal,

        /// Write outcomes to this CSV instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json);

    match cli.command {
        Commands::Simulate {
            config,
            bars,
            unit,
            seed,
            output_dir,
        } => run_simulate(config.as_deref(), bars, unit, seed, &output_dir),
        Commands::Analyze {
            bars_csv,
            config,
            unit,
            output_dir,
        } => run_analyze(&bars_csv, config.as_deref(), unit, &output_dir),
        Commands::Generate {
            count,
            session_len,
            seed,
            merge,
            output_dir,
        } => run_generate(count, session_len, seed, merge, &output_dir),
        Commands::TargetStudy {
            bars_csv,
            sessions,
            seed,
            entry_bar,
            target,
            output,
        } => {
            let params = TargetStudyParams { entry_bar, target };
            run_target_study_cmd(bars_csv.as_deref(), sessions, seed, params, output.as_deref())
        }
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the default `info`
/// filter. Logs go to stderr so command output on stdout stays clean.
fn init_logging(json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

fn run_simulate(
    config_path: Option<&Path>,
    bars: Option<usize>,
    unit: Option<CalendarUnit>,
    seed: Option<u64>,
    output_dir: &Path,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(bars) = bars {
        config.bar_count = bars;
    }
    if let Some(unit) = unit {
        config.unit = unit;
    }
    if let Some(seed) = seed {
        config.walk.seed = seed;
    }

    let run = run_pipeline(&config)?;
    finish(&run, output_dir)
}

fn run_analyze(
    bars_csv: &Path,
    config_path: Option<&Path>,
    unit: Option<CalendarUnit>,
    output_dir: &Path,
) -> Result<()> {
    let config = load_config(config_path)?;
    let table = read_bars_csv(bars_csv, unit)?;
    if table.is_empty() {
        bail!("{} contains no bars", bars_csv.display());
    }
    info!(path = %bars_csv.display(), bars = table.len(), "loaded bar table");

    let run = run_analysis(table, config.ichimoku);
    finish(&run, output_dir)
}

fn finish(run: &PipelineRun, output_dir: &Path) -> Result<()> {
    print_summary(run);
    let run_dir = save_artifacts(run, output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());
    Ok(())
}

fn run_generate(
    count: usize,
    session_len: usize,
    seed: u64,
    merge: bool,
    output_dir: &Path,
) -> Result<()> {
    if count == 0 {
        bail!("--count must be at least 1");
    }
    let mut base = PipelineConfig::default();
    base.bar_count = session_len;
    base.walk.seed = seed;

    let sessions = generate_sessions(&base, count)?;
    let paths = write_sessions(&sessions, output_dir)?;
    info!(sessions = paths.len(), dir = %output_dir.display(), "sessions written");

    if merge {
        let base_price = Decimal::try_from(base.walk.initial_price)
            .context("initial price is not representable as a decimal")?;
        let merged = merge_sessions(&sessions, base_price);
        let path = output_dir.join("merged.csv");
        write_bars_csv(&merged, &path)?;
        println!("Merged {} bars into {}", merged.len(), path.display());
    }

    println!("Wrote {} sessions to {}", paths.len(), output_dir.display());
    Ok(())
}

fn run_target_study_cmd(
    bars_csv: Option<&Path>,
    sessions: Option<usize>,
    seed: u64,
    params: TargetStudyParams,
    output: Option<&Path>,
) -> Result<()> {
    let tables: Vec<BarTable> = match (bars_csv, sessions) {
        (Some(_), Some(_)) => bail!("--bars-csv and --sessions are mutually exclusive"),
        (None, None) => bail!("one of --bars-csv or --sessions is required"),
        (Some(path), None) => vec![read_bars_csv(path, None)?],
        (None, Some(count)) => {
            let mut base = PipelineConfig::default();
            base.walk.seed = seed;
            generate_sessions(&base, count)?
        }
    };

    let outcomes = run_target_studies(&tables, &params)?;
    let csv = export_outcomes_csv(&outcomes)?;
    match output {
        Some(path) => {
            std::fs::write(path, csv)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Outcomes saved to: {}", path.display());
        }
        None => print!("{csv}"),
    }

    let reached = outcomes.iter().filter(|o| o.target_reached).count();
    println!("Target reached in {reached} of {} runs", outcomes.len());
    Ok(())
}

fn print_summary(run: &PipelineRun) {
    let summary = &run.summary;
    println!("Run:    {}", short_id(&summary.run_id));
    println!("Bars:   {}", summary.bar_count);
    if let (Some(first), Some(last)) = (summary.first_bar, summary.last_bar) {
        println!("Period: {first} to {last}");
    }
    for (label, log) in [("Longs", &run.signals.longs), ("Shorts", &run.signals.shorts)] {
        let open = if log.open.is_some() { " (+1 open)" } else { "" };
        println!("{label}:  {}{open}", log.closed.len());
    }
}
