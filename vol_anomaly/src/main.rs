//! Volatility anomaly runner
//!
//! Reads a price history from CSV, runs the pipeline once and writes the
//! results for charting.
//!
//! Usage:
//!   cargo run --release --bin vol_anomaly -- --prices data/btc.csv --config configs/daily.toml

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use chrono::{DateTime, NaiveDate, Utc};
use clap::Parser;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;
use vol_anomaly::output::write_all;
use vol_anomaly::{compute, PipelineConfig, PricePoint, PriceSeries, Projection};

#[derive(Debug, Parser)]
#[command(name = "vol_anomaly", about = "GARCH volatility anomaly check with Monte Carlo projection")]
struct Args {
    /// CSV file with `timestamp,price` columns
    #[arg(long)]
    prices: PathBuf,

    /// TOML pipeline configuration; defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for report.json and the CSV tables
    #[arg(long, default_value = "results")]
    output_dir: PathBuf,

    /// Fix the simulation seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the number of simulated steps
    #[arg(long)]
    horizon: Option<usize>,

    /// Override the number of simulated paths
    #[arg(long)]
    paths: Option<usize>,

    /// Override the anomaly threshold multiplier
    #[arg(long)]
    multiplier: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct PriceRecord {
    timestamp: String,
    price: f64,
}

fn parse_timestamp(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("unrecognised timestamp '{}'", raw))?;
    match date.and_hms_opt(0, 0, 0) {
        Some(dt) => Ok(dt.and_utc()),
        None => bail!("invalid date '{}'", raw),
    }
}

fn load_prices(path: &Path) -> anyhow::Result<PriceSeries> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("opening price file {}", path.display()))?;
    let mut points = Vec::new();
    for (line, record) in rdr.deserialize::<PriceRecord>().enumerate() {
        let record = record.with_context(|| format!("reading price row {}", line + 1))?;
        points.push(PricePoint {
            timestamp: parse_timestamp(record.timestamp.trim())?,
            price: record.price,
        });
    }
    Ok(PriceSeries::new(points)?)
}

fn load_config(args: &Args) -> anyhow::Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            toml::from_str::<PipelineConfig>(&raw)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => PipelineConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(horizon) = args.horizon {
        config.horizon_steps = horizon;
    }
    if let Some(paths) = args.paths {
        config.path_count = paths;
    }
    if let Some(multiplier) = args.multiplier {
        config.threshold_multiplier = multiplier;
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let prices = load_prices(&args.prices)?;

    println!("=== Volatility Anomaly Check ===\n");
    println!(
        "Prices: {} observations ({} sampling)",
        prices.len(),
        config.interval
    );

    let report = compute(&prices, config.clone()).context("running pipeline")?;

    println!("\nCurrent market state:");
    println!(
        "  Estimated volatility: {:.4}",
        report.assessment.current_volatility
    );
    println!("  Volatility threshold: {:.4}", report.assessment.threshold);
    println!(
        "  GARCH(1,1): omega={:.4} alpha={:.4} beta={:.4}",
        report.forecast.params.omega, report.forecast.params.alpha, report.forecast.params.beta
    );

    match &report.projection {
        Projection::Skipped => {
            println!("\nVolatility within normal range; no simulation generated.");
        }
        Projection::Simulated { ensemble, summary } => {
            println!(
                "\nAnomalous volatility detected; simulated {} paths × {} steps (seed={}).",
                ensemble.path_count(),
                ensemble.steps(),
                ensemble.base_seed()
            );
            if let Some(outlook) = summary.terminal() {
                println!("  Current price: {:.2}", outlook.anchor);
                println!(
                    "  Expected price in {} steps: {:.2}",
                    summary.len(),
                    outlook.expected
                );
                println!(
                    "  {:.0}% range: {:.2} - {:.2}",
                    summary.coverage(),
                    outlook.low,
                    outlook.high
                );
            }
        }
        Projection::Failed { error } => {
            println!("\nAnomalous volatility detected but simulation failed: {}", error);
        }
    }

    write_all(&report, &prices, &config, &args.output_dir)
        .with_context(|| format!("writing results to {}", args.output_dir.display()))?;
    println!("\nResults saved to: {}", args.output_dir.display());

    Ok(())
}
