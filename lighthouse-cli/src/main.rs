//! Lighthouse CLI: feature computation, scoring runs and demo data.
//!
//! Commands:
//! - `features`: compute indicators for every ticker in a price table
//! - `score`: filter, score, rank and explain a candidate snapshot
//! - `sample`: write a seeded synthetic price table (and fundamentals)
//! - `config init`: write the default scoring configuration

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use lighthouse_core::data::{
    merge_fundamentals, read_candidates_parquet, read_prices, write_bytes_atomic, write_candidates_parquet,
    write_feature_parquet, write_prices_csv, write_prices_parquet,
};
use lighthouse_core::features::{
    check_feature_coverage, compute_universe_features, group_price_table, latest_snapshot,
    DEFAULT_COVERAGE_THRESHOLD,
};
use lighthouse_core::sample::{generate_fundamentals, generate_price_table, SampleConfig};
use lighthouse_scoring::export::{export_ranks_csv, save_run_artifacts, top_table_markdown};
use lighthouse_scoring::{publish_top_candidates, RedisSink, ScoringConfig, ScoringEngine};

#[derive(Parser)]
#[command(
    name = "lighthouse",
    about = "Lighthouse CLI: stock indicator and scoring engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute technical indicators for every ticker in a price table.
    Features {
        /// Price table (.parquet or .csv) with ticker, date, close and optional OHLV columns.
        #[arg(long)]
        prices: PathBuf,

        /// Output Parquet file for the full feature table.
        #[arg(long)]
        out: PathBuf,

        /// Also write each ticker's latest row (the scoring input) here.
        #[arg(long)]
        snapshot_out: Option<PathBuf>,

        /// Snapshot date (YYYY-MM-DD). Defaults to each ticker's last row.
        #[arg(long)]
        as_of: Option<String>,
    },
    /// Run the scoring engine over a candidate snapshot.
    Score {
        /// Candidate snapshot (Parquet), e.g. from `features --snapshot-out`.
        #[arg(long)]
        features: PathBuf,

        /// Fundamentals table (Parquet) left-joined by symbol.
        #[arg(long)]
        fundamentals: Option<PathBuf>,

        /// Scoring config (TOML). Defaults to the built-in configuration.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Run date (YYYY-MM-DD) used to key the artifacts. Defaults to today.
        #[arg(long)]
        date: Option<String>,

        /// Output directory for ranks, explanations and run report.
        #[arg(long, default_value = "data/ranks")]
        output_dir: PathBuf,

        /// Publish the top candidates to this Redis URL.
        #[arg(long)]
        redis_url: Option<String>,

        /// Number of ranked candidates to print.
        #[arg(long, default_value_t = 10)]
        show: usize,

        /// Also write `{date}_ranks.csv` next to the Parquet table.
        #[arg(long, default_value_t = false)]
        csv: bool,
    },
    /// Generate a seeded synthetic price table for demos.
    Sample {
        /// Output file (.parquet or .csv).
        #[arg(long)]
        out: PathBuf,

        /// Also write synthetic metadata and fundamentals (Parquet) here.
        #[arg(long)]
        fundamentals_out: Option<PathBuf>,

        #[arg(long, default_value_t = 20)]
        tickers: usize,

        /// Trading days per ticker.
        #[arg(long, default_value_t = 300)]
        days: usize,

        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Scoring configuration commands.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write the default scoring configuration as TOML.
    Init {
        #[arg(long, default_value = "config/scoring.toml")]
        out: PathBuf,

        /// Overwrite an existing file.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Features {
            prices,
            out,
            snapshot_out,
            as_of,
        } => run_features(&prices, &out, snapshot_out.as_deref(), as_of.as_deref()),
        Commands::Score {
            features,
            fundamentals,
            config,
            date,
            output_dir,
            redis_url,
            show,
            csv,
        } => run_score(
            &features,
            fundamentals.as_deref(),
            config.as_deref(),
            date.as_deref(),
            &output_dir,
            redis_url.as_deref(),
            show,
            csv,
        ),
        Commands::Sample {
            out,
            fundamentals_out,
            tickers,
            days,
            seed,
        } => run_sample(&out, fundamentals_out.as_deref(), tickers, days, seed),
        Commands::Config { action } => match action {
            ConfigAction::Init { out, force } => run_config_init(&out, force),
        },
    }
}

/// Human-readable logs by default, JSON when `LIGHTHOUSE_LOG_FORMAT=json`.
/// The level comes from `RUST_LOG` (default `info`).
fn init_tracing() {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    let json_logging = std::env::var("LIGHTHOUSE_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .init();
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{raw}' (expected YYYY-MM-DD)"))
}

fn run_features(
    prices: &Path,
    out: &Path,
    snapshot_out: Option<&Path>,
    as_of: Option<&str>,
) -> Result<()> {
    let as_of = as_of.map(parse_date).transpose()?;

    let rows = read_prices(prices)?;
    let series = group_price_table(rows)?;
    let tables = compute_universe_features(&series)?;

    let all_rows: Vec<_> = tables.iter().flat_map(|t| t.rows.iter().cloned()).collect();
    write_feature_parquet(out, &all_rows)?;
    info!(rows = all_rows.len(), tickers = tables.len(), path = %out.display(), "wrote feature table");

    let coverage = check_feature_coverage(&all_rows, DEFAULT_COVERAGE_THRESHOLD);
    info!(
        dates = coverage.total_dates(),
        meeting_threshold = coverage.dates_meeting_threshold,
        average = coverage.average_coverage(),
        "feature coverage"
    );

    if let Some(path) = snapshot_out {
        let snapshot = latest_snapshot(&tables, as_of);
        if snapshot.is_empty() {
            warn!(as_of = ?as_of, "no ticker has a row on or before the snapshot date");
        }
        write_feature_parquet(path, &snapshot)?;
        info!(tickers = snapshot.len(), path = %path.display(), "wrote snapshot");
    }

    println!(
        "Computed features for {} tickers ({} rows) -> {}",
        tables.len(),
        all_rows.len(),
        out.display()
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_score(
    features: &Path,
    fundamentals: Option<&Path>,
    config_path: Option<&Path>,
    date: Option<&str>,
    output_dir: &Path,
    redis_url: Option<&str>,
    show: usize,
    csv: bool,
) -> Result<()> {
    let config = match config_path {
        Some(path) => ScoringConfig::from_file(path)?,
        None => ScoringConfig::default(),
    };
    let run_date = match date {
        Some(raw) => parse_date(raw)?,
        None => chrono::Local::now().date_naive(),
    };

    let technical = config.technical_names();
    let fundamental = config.fundamental_names();
    let mut candidates = read_candidates_parquet(features, &technical, &fundamental)?;
    if let Some(path) = fundamentals {
        let extra = read_candidates_parquet(path, &[], &fundamental)?;
        candidates = merge_fundamentals(candidates, extra);
    }

    let engine = ScoringEngine::new(config)?;
    let outcome = engine.run(candidates)?;
    let artifacts = save_run_artifacts(&outcome, engine.config(), output_dir, run_date)?;
    if csv {
        let path = output_dir.join(format!("{}_ranks.csv", run_date.format("%Y-%m-%d")));
        let content = export_ranks_csv(&outcome, engine.config())?;
        write_bytes_atomic(&path, content.as_bytes())?;
        println!("Ranks CSV: {}", path.display());
    }

    if let Some(url) = redis_url {
        match RedisSink::open(url) {
            Ok(sink) => {
                publish_top_candidates(&sink, &outcome, &engine.config().top_candidates);
            }
            Err(e) => warn!(error = %e, "invalid redis url; skipping top-candidate cache"),
        }
    }

    let report = &outcome.report;
    println!(
        "Scored {} of {} candidates in {:.2}s{}",
        report.passed_count,
        report.input_count,
        report.elapsed_secs,
        if report.sla_met { "" } else { " (over runtime budget)" }
    );
    if outcome.is_empty() {
        println!("No candidates passed the filters.");
    } else {
        print!("{}", top_table_markdown(&outcome, show));
    }
    println!("Ranks: {}", artifacts.ranks.display());
    println!("Explanations: {}", artifacts.explanations.display());
    println!("Run report: {}", artifacts.run_report.display());
    Ok(())
}

fn run_sample(
    out: &Path,
    fundamentals_out: Option<&Path>,
    tickers: usize,
    days: usize,
    seed: u64,
) -> Result<()> {
    if tickers == 0 || days == 0 {
        bail!("--tickers and --days must be positive");
    }
    let config = SampleConfig {
        seed,
        tickers,
        days,
        ..Default::default()
    };

    let rows = generate_price_table(&config);
    match out.extension().and_then(|e| e.to_str()) {
        Some("parquet") => write_prices_parquet(out, &rows)?,
        Some("csv") => write_prices_csv(out, &rows)?,
        _ => bail!("unsupported output format: {} (expected .parquet or .csv)", out.display()),
    }
    println!("Wrote {} rows for {} tickers -> {}", rows.len(), tickers, out.display());

    if let Some(path) = fundamentals_out {
        let fundamentals = generate_fundamentals(&config);
        write_candidates_parquet(path, &fundamentals)?;
        println!("Wrote fundamentals for {} tickers -> {}", fundamentals.len(), path.display());
    }
    Ok(())
}

fn run_config_init(out: &Path, force: bool) -> Result<()> {
    if out.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", out.display());
    }
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let toml = ScoringConfig::default().to_toml()?;
    std::fs::write(out, toml).with_context(|| format!("failed to write {}", out.display()))?;
    println!("Wrote default scoring config -> {}", out.display());
    Ok(())
}
