//! quotelab CLI — download, upload, run, and forecast commands.
//!
//! Commands:
//! - `download` — fetch snapshots from Yahoo Finance into the working dir
//! - `upload` — normalize the working dir and bulk-write into PostgreSQL
//! - `run` — download every configured window, uploading after each one
//! - `forecast` — train the classifier on the stored history and print picks

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use quotelab_core::config::Config;
use quotelab_core::data::{download_tickers, CsvStore, StdoutProgress, YahooProvider};
use quotelab_core::db::{PriceStore, WriteMode};
use quotelab_core::domain::DateWindow;
use quotelab_core::forecast::{run_forecast, ForecastReport};
use quotelab_core::pipeline::{upload_snapshots, IngestOutcome};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "quotelab", about = "quotelab — price-history ETL and forecast")]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, global = true, default_value = "quotelab.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download snapshot CSVs for tickers (defaults to the configured universe).
    Download {
        /// Tickers in canonical form (e.g. PETR4.SA ^BVSP). Empty: universe.
        tickers: Vec<String>,

        /// Start date (YYYY-MM-DD). Defaults to the configured fallback start.
        #[arg(long)]
        start: Option<String>,

        /// End date, exclusive (YYYY-MM-DD). Defaults to tomorrow.
        #[arg(long)]
        end: Option<String>,
    },
    /// Normalize the working directory and write rows into PostgreSQL.
    Upload {
        /// Write mode: replace, append, or upsert.
        #[arg(long, default_value = "upsert")]
        mode: String,
    },
    /// Full pass: download every configured window, uploading after each.
    Run {
        /// Write mode: replace, append, or upsert.
        #[arg(long, default_value = "upsert")]
        mode: String,

        /// Remove existing snapshot files before the first window.
        #[arg(long, default_value_t = false)]
        fresh: bool,
    },
    /// Train and evaluate the classifier, then print ranked picks.
    Forecast {
        /// Write the full report as JSON to this path.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Download {
            tickers,
            start,
            end,
        } => run_download(&config, tickers, start, end),
        Commands::Upload { mode } => run_upload(&config, &mode),
        Commands::Run { mode, fresh } => run_full(&config, &mode, fresh),
        Commands::Forecast { output } => run_forecast_cmd(&config, output),
    }
}

fn load_config(path: &PathBuf) -> Result<Config> {
    if path.exists() {
        Config::from_file(path).with_context(|| format!("loading {}", path.display()))
    } else {
        Ok(Config::default())
    }
}

fn store(config: &Config) -> CsvStore {
    CsvStore::new(
        &config.storage.data_dir,
        config.download.default_suffix.clone(),
    )
}

fn connect_db(config: &Config) -> Result<PriceStore> {
    PriceStore::connect(&config.database.resolved_url(), &config.database.table)
        .context("connecting to the database")
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date '{s}'"))
}

fn run_download(
    config: &Config,
    tickers: Vec<String>,
    start: Option<String>,
    end: Option<String>,
) -> Result<()> {
    let today = chrono::Local::now().date_naive();
    let start = match start {
        Some(s) => parse_date(&s)?,
        None => config.download.fallback_start,
    };
    let end = match end {
        Some(s) => parse_date(&s)?,
        None => today + chrono::Duration::days(1),
    };

    let tickers = if tickers.is_empty() {
        config
            .universe
            .all_tickers()
            .iter()
            .map(|t| t.to_string())
            .collect()
    } else {
        tickers
    };
    let refs: Vec<&str> = tickers.iter().map(|t| t.as_str()).collect();

    let provider = YahooProvider::new();
    let summary = download_tickers(
        &provider,
        &store(config),
        &refs,
        DateWindow::new(start, end),
        config.download.pause(),
        &StdoutProgress,
    );

    for (ticker, err) in &summary.errors {
        eprintln!("Skipped {ticker}: {err}");
    }
    Ok(())
}

fn run_upload(config: &Config, mode: &str) -> Result<()> {
    let mode: WriteMode = mode.parse().map_err(anyhow::Error::msg)?;
    let mut db = connect_db(config)?;
    let outcome = upload_snapshots(&store(config), &mut db, mode)?;
    print_ingest_outcome(&outcome);
    Ok(())
}

fn run_full(config: &Config, mode: &str, fresh: bool) -> Result<()> {
    let mode: WriteMode = mode.parse().map_err(anyhow::Error::msg)?;
    let csv_store = store(config);

    if fresh {
        let removed = csv_store.clean_snapshots()?;
        println!("Removed {removed} stale snapshot file(s).");
    }

    let today = chrono::Local::now().date_naive();
    let windows = config.download.effective_windows(today);
    let tickers = config.universe.all_tickers();
    let provider = YahooProvider::new();
    let mut db = connect_db(config)?;

    for (i, window) in windows.iter().enumerate() {
        println!(
            "\n=== Window {}/{}: {} to {} ===",
            i + 1,
            windows.len(),
            window.start,
            window.end
        );
        let summary = download_tickers(
            &provider,
            &csv_store,
            &tickers,
            *window,
            config.download.pause(),
            &StdoutProgress,
        );
        for (ticker, err) in &summary.errors {
            eprintln!("Skipped {ticker}: {err}");
        }

        let outcome = upload_snapshots(&csv_store, &mut db, mode)?;
        print_ingest_outcome(&outcome);
    }

    Ok(())
}

fn run_forecast_cmd(config: &Config, output: Option<PathBuf>) -> Result<()> {
    let mut db = connect_db(config)?;
    let bars = db.load_all().context("loading price history")?;
    println!("Loaded {} rows from '{}'.", bars.len(), config.database.table);

    let report = run_forecast(bars, &config.forecast.to_options())?;
    print_forecast_report(&report, config.forecast.horizon, config.forecast.threshold);

    if let Some(path) = output {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        std::fs::write(&path, report.to_json()?)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Report saved to: {}", path.display());
    }

    Ok(())
}

fn print_ingest_outcome(outcome: &IngestOutcome) {
    println!();
    println!("=== Ingestion ===");
    println!("Files found:    {}", outcome.files_found);
    println!("Files ingested: {}", outcome.files_ingested);
    println!("Rows written:   {}", outcome.rows_written);
    if !outcome.missing_adj_close.is_empty() {
        println!();
        println!("Tickers with adjusted_close missing on every row (likely delisted or source gap):");
        for ticker in &outcome.missing_adj_close {
            println!("  {ticker}");
        }
    }
}

fn print_forecast_report(report: &ForecastReport, horizon: usize, threshold: f64) {
    println!();
    println!("=== Model evaluation ===");
    println!("Train rows:     {}", report.train_rows);
    println!("Test rows:      {}", report.test_rows);
    println!("Accuracy:       {:.2}%", report.metrics.accuracy * 100.0);
    println!("Precision:      {:.2}%", report.metrics.precision * 100.0);
    println!("Recall:         {:.2}%", report.metrics.recall * 100.0);
    println!("F1:             {:.3}", report.metrics.f1_score);
    let base_rate =
        report.metrics.test_positives as f64 / report.metrics.test_rows.max(1) as f64;
    println!("Base rate:      {:.2}% positive", base_rate * 100.0);
    println!();
    println!(
        "=== Picks: P(+{:.0}% in {} trading days) >= {:.0}% ===",
        threshold * 100.0,
        horizon,
        report.confidence * 100.0
    );
    if report.picks.is_empty() {
        println!(
            "No ticker reached the confidence threshold ({} scored).",
            report.scored_tickers
        );
        return;
    }
    println!(
        "{:<10} {:<12} {:>10} {:>8} {:>13}",
        "Ticker", "Date", "Close", "RSI", "Probability"
    );
    println!("{}", "-".repeat(56));
    for pick in &report.picks {
        println!(
            "{:<10} {:<12} {:>10.2} {:>8.1} {:>12.1}%",
            pick.ticker,
            pick.date.to_string(),
            pick.close,
            pick.rsi,
            pick.probability * 100.0
        );
    }
}
