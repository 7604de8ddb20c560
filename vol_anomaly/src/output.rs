//! Export of a pipeline run for charting and later analysis
//!
//! Writes a JSON summary with run metadata plus CSV tables for the
//! conditional volatility, the percentile bands and the raw paths.

use std::fs;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::anomaly::AnomalyAssessment;
use crate::garch::GarchParams;
use crate::params::PipelineConfig;
use crate::pipeline::{Projection, Report};
use crate::series::PriceSeries;
use crate::summary::TerminalOutlook;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Metadata for reproducibility
#[derive(Debug, Clone, Serialize)]
pub struct RunMetadata {
    pub config: PipelineConfig,
    /// Seed the ensemble was drawn from, if one was simulated
    pub ensemble_seed: Option<u64>,
    pub price_count: usize,
    pub first_timestamp: Option<String>,
    pub last_timestamp: Option<String>,
    pub generated_at: String,
}

/// Fitted model headline
#[derive(Debug, Clone, Serialize)]
pub struct ForecastSummary {
    pub current_volatility: f64,
    pub params: GarchParams,
    pub persistence: f64,
    pub log_likelihood: Option<f64>,
    pub iterations: usize,
}

/// Top-level JSON document of a run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub metadata: RunMetadata,
    pub mean_return: f64,
    pub window: usize,
    pub forecast: ForecastSummary,
    pub assessment: AnomalyAssessment,
    /// "skipped", "simulated" or "failed"
    pub projection: String,
    pub outlook: Option<TerminalOutlook>,
    pub error: Option<String>,
}

impl RunSummary {
    pub fn new(report: &Report, prices: &PriceSeries, config: &PipelineConfig) -> Self {
        let (projection, error) = match &report.projection {
            Projection::Skipped => ("skipped", None),
            Projection::Simulated { .. } => ("simulated", None),
            Projection::Failed { error } => ("failed", Some(error.clone())),
        };
        let points = prices.points();

        RunSummary {
            metadata: RunMetadata {
                config: config.clone(),
                ensemble_seed: report.ensemble().map(|e| e.base_seed()),
                price_count: prices.len(),
                first_timestamp: points.first().map(|p| p.timestamp.to_rfc3339()),
                last_timestamp: points.last().map(|p| p.timestamp.to_rfc3339()),
                generated_at: chrono::Utc::now().to_rfc3339(),
            },
            mean_return: report.mean_return,
            window: report.window,
            forecast: ForecastSummary {
                current_volatility: report.forecast.current_volatility,
                params: report.forecast.params,
                persistence: report.forecast.params.persistence(),
                log_likelihood: report.forecast.log_likelihood,
                iterations: report.forecast.iterations,
            },
            assessment: report.assessment,
            projection: projection.to_string(),
            outlook: report.summary().and_then(|s| s.terminal()),
            error,
        }
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<(), OutputError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Write the conditional volatility next to the constant threshold
///
/// Row `i` belongs to the return ending at price `i + 1`.
pub fn write_volatility_csv<P: AsRef<Path>>(
    report: &Report,
    prices: &PriceSeries,
    path: P,
) -> Result<(), OutputError> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["timestamp", "conditional_volatility", "threshold"])?;

    let points = prices.points();
    for (i, vol) in report.forecast.conditional_volatility.iter().enumerate() {
        let timestamp = points
            .get(i + 1)
            .map(|p| p.timestamp.to_rfc3339())
            .unwrap_or_default();
        wtr.write_record(&[
            timestamp,
            vol.to_string(),
            report.assessment.threshold.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write expected path and percentile bands, one row per step
pub fn write_summary_csv<P: AsRef<Path>>(report: &Report, path: P) -> Result<(), OutputError> {
    let Some(summary) = report.summary() else {
        return Ok(());
    };
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record([
        "step".to_string(),
        "expected".to_string(),
        format!("p{}", summary.low_percentile),
        format!("p{}", summary.high_percentile),
    ])?;

    for step in 0..summary.len() {
        wtr.write_record(&[
            step.to_string(),
            summary.expected_path[step].to_string(),
            summary.low_band[step].to_string(),
            summary.high_band[step].to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write the raw ensemble: one row per step, one column per run
pub fn write_paths_csv<P: AsRef<Path>>(report: &Report, path: P) -> Result<(), OutputError> {
    let Some(ensemble) = report.ensemble() else {
        return Ok(());
    };
    let mut wtr = csv::Writer::from_path(path)?;

    let mut header = vec!["step".to_string()];
    header.extend((0..ensemble.path_count()).map(|run| format!("run_{}", run)));
    wtr.write_record(&header)?;

    for step in 0..ensemble.steps() {
        let mut record = vec![step.to_string()];
        record.extend(ensemble.row(step).iter().map(|p| p.to_string()));
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write all outputs to a directory
///
/// Creates:
/// - report.json
/// - conditional_volatility.csv
/// - summary.csv and paths.csv (only when an ensemble was simulated)
pub fn write_all<P: AsRef<Path>>(
    report: &Report,
    prices: &PriceSeries,
    config: &PipelineConfig,
    dir: P,
) -> Result<(), OutputError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    RunSummary::new(report, prices, config).write_json(dir.join("report.json"))?;
    write_volatility_csv(report, prices, dir.join("conditional_volatility.csv"))?;
    if report.ensemble().is_some() {
        write_summary_csv(report, dir.join("summary.csv"))?;
        write_paths_csv(report, dir.join("paths.csv"))?;
    }

    Ok(())
}
